use std::collections::{HashMap, HashSet};

use axum::http::StatusCode;
use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    access::{self, Operation},
    audit,
    cart::{self, Line, PriceSource},
    dto::cart::{CartList, CartRequest, RequestedItem},
    entity::{
        accounts::{Column as AccountCol, Entity as Accounts, Model as AccountModel},
        cart_items::{ActiveModel as CartItemActive, Column as CartItemCol, Entity as CartItems},
        carts::{ActiveModel as CartActive, Column as CartCol, Entity as Carts, Model as CartModel},
        listings::{Column as ListingCol, Entity as Listings},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Cart, LineItem, ListingSummary, OwnerSummary},
    response::{ApiResponse, Meta},
    services::is_unique_violation,
    state::AppState,
};

/// Attempts at a version-conditional cart write before giving up with `Conflict`.
pub const MAX_WRITE_ATTEMPTS: usize = 3;

/// Which branch a cart write took.
#[derive(Debug)]
pub enum CartOutcome {
    Created(Cart),
    Updated(Cart),
}

impl CartOutcome {
    pub fn status(&self) -> StatusCode {
        match self {
            CartOutcome::Created(_) => StatusCode::CREATED,
            CartOutcome::Updated(_) => StatusCode::OK,
        }
    }

    pub fn cart(&self) -> &Cart {
        match self {
            CartOutcome::Created(cart) | CartOutcome::Updated(cart) => cart,
        }
    }

    pub fn into_body(self) -> ApiResponse<Cart> {
        match self {
            CartOutcome::Created(cart) => ApiResponse::success("Cart created", cart, None),
            CartOutcome::Updated(cart) => ApiResponse::success("Cart updated", cart, None),
        }
    }
}

pub async fn create_cart(
    state: &AppState,
    user: &AuthUser,
    payload: CartRequest,
) -> AppResult<CartOutcome> {
    let account = access::load_account(&state.orm, user).await?;
    access::ensure(Operation::CreateCart, &account, Some(account.id), &state.access)?;

    let items = cart::decode_items(payload.items)?;
    let listings = resolve_listings(state, &items).await?;
    cart::aggregate(Vec::new(), &items, &listings)?;

    let outcome = write_active_cart(state, &account, &items, &listings).await?;
    after_write(state, &account, &outcome, "cart_create").await;
    Ok(outcome)
}

/// Merges into `cart_id` while it is unpaid. A paid or missing target is left
/// alone and the items go to the caller's own active cart, as with [`create_cart`].
pub async fn update_cart(
    state: &AppState,
    user: &AuthUser,
    cart_id: Uuid,
    payload: CartRequest,
) -> AppResult<CartOutcome> {
    let account = access::load_account(&state.orm, user).await?;
    let items = cart::decode_items(payload.items)?;
    let listings = resolve_listings(state, &items).await?;
    cart::aggregate(Vec::new(), &items, &listings)?;

    for attempt in 1..=MAX_WRITE_ATTEMPTS {
        let target = Carts::find_by_id(cart_id).one(&state.orm).await?;

        let outcome = match target {
            Some(cart) if !cart.paid => {
                access::ensure(Operation::UpdateCart, &account, Some(cart.user_id), &state.access)?;
                merge_into(state, cart.id, &items, &listings)
                    .await?
                    .map(CartOutcome::Updated)
            }
            _ => {
                access::ensure(Operation::CreateCart, &account, Some(account.id), &state.access)?;
                Some(write_active_cart(state, &account, &items, &listings).await?)
            }
        };

        if let Some(outcome) = outcome {
            after_write(state, &account, &outcome, "cart_update").await;
            return Ok(outcome);
        }
        tracing::debug!(attempt, cart_id = %cart_id, "cart write lost a race, retrying");
    }

    Err(contended())
}

pub async fn get_one_cart(
    state: &AppState,
    user: &AuthUser,
    cart_id: Uuid,
) -> AppResult<ApiResponse<Cart>> {
    let account = access::load_account(&state.orm, user).await?;

    let Some(found) = Carts::find_by_id(cart_id).one(&state.orm).await? else {
        return Err(AppError::Unauthorized(
            "Not authorized to view this cart".into(),
        ));
    };
    access::ensure(Operation::ViewCart, &account, Some(found.user_id), &state.access)?;

    let cart = expand_carts(&state.orm, vec![found])
        .await?
        .pop()
        .ok_or_else(|| AppError::not_found("Cart"))?;

    tracing::info!(user_id = %account.id, cart_id = %cart.id, "cart retrieved");
    Ok(ApiResponse::success("Cart", cart, None))
}

pub async fn list_user_carts(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<CartList>> {
    let account = access::load_account(&state.orm, user).await?;
    access::ensure(Operation::ListOwnCarts, &account, Some(account.id), &state.access)?;

    let carts = Carts::find()
        .filter(CartCol::UserId.eq(account.id))
        .order_by_desc(CartCol::CreatedAt)
        .all(&state.orm)
        .await?;
    let items = expand_carts(&state.orm, carts).await?;
    let total = items.len() as i64;

    Ok(ApiResponse::success(
        "Carts",
        CartList { items },
        Some(Meta::new(1, total, total)),
    ))
}

/// Writes into the account's single unpaid cart, creating it when there is none.
async fn write_active_cart(
    state: &AppState,
    account: &AccountModel,
    items: &[RequestedItem],
    listings: &HashMap<Uuid, PriceSource>,
) -> AppResult<CartOutcome> {
    for attempt in 1..=MAX_WRITE_ATTEMPTS {
        let active = Carts::find()
            .filter(CartCol::UserId.eq(account.id))
            .filter(CartCol::Paid.eq(false))
            .one(&state.orm)
            .await?;

        let written = match active {
            Some(existing) => merge_into(state, existing.id, items, listings)
                .await?
                .map(CartOutcome::Updated),
            None => insert_cart(state, account, items, listings)
                .await?
                .map(CartOutcome::Created),
        };

        if let Some(outcome) = written {
            return Ok(outcome);
        }
        tracing::debug!(attempt, user_id = %account.id, "active cart write lost a race, retrying");
    }

    Err(contended())
}

/// `None` when the cart is gone or no longer unpaid once its row lock is held.
/// Concurrent merges into one cart queue on that lock.
async fn merge_into(
    state: &AppState,
    cart_id: Uuid,
    items: &[RequestedItem],
    listings: &HashMap<Uuid, PriceSource>,
) -> AppResult<Option<Cart>> {
    let txn = state.orm.begin().await?;

    let locked = Carts::find_by_id(cart_id)
        .lock_exclusive()
        .one(&txn)
        .await?;
    let Some(target) = locked.filter(|cart| !cart.paid) else {
        txn.rollback().await?;
        return Ok(None);
    };

    let existing: Vec<Line> = CartItems::find()
        .filter(CartItemCol::CartId.eq(target.id))
        .order_by_asc(CartItemCol::Position)
        .all(&txn)
        .await?
        .iter()
        .map(Line::from)
        .collect();

    let lines = cart::aggregate(existing, items, listings)?;
    let total = cart::total_amount(&lines)?;
    let now: DateTimeWithTimeZone = Utc::now().into();

    let result = Carts::update_many()
        .col_expr(CartCol::TotalAmount, Expr::value(total))
        .col_expr(CartCol::Version, Expr::col(CartCol::Version).add(1))
        .col_expr(CartCol::UpdatedAt, Expr::value(now))
        .filter(CartCol::Id.eq(target.id))
        .filter(CartCol::Version.eq(target.version))
        .filter(CartCol::Paid.eq(false))
        .exec(&txn)
        .await?;

    if result.rows_affected == 0 {
        txn.rollback().await?;
        return Ok(None);
    }

    replace_items(&txn, target.id, &lines).await?;

    let updated = Carts::find_by_id(target.id)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::not_found("Cart"))?;
    txn.commit().await?;

    Ok(expand_carts(&state.orm, vec![updated]).await?.pop())
}

/// `None` when another request created the account's unpaid cart first.
async fn insert_cart(
    state: &AppState,
    account: &AccountModel,
    items: &[RequestedItem],
    listings: &HashMap<Uuid, PriceSource>,
) -> AppResult<Option<Cart>> {
    let lines = cart::aggregate(Vec::new(), items, listings)?;
    let total = cart::total_amount(&lines)?;

    let txn = state.orm.begin().await?;
    let inserted = CartActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(account.id),
        user_name: Set(account.username.clone()),
        total_amount: Set(total),
        paid: Set(false),
        version: Set(0),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&txn)
    .await;

    let created = match inserted {
        Ok(created) => created,
        Err(err) if is_unique_violation(&err) => {
            txn.rollback().await?;
            return Ok(None);
        }
        Err(err) => return Err(err.into()),
    };

    replace_items(&txn, created.id, &lines).await?;
    txn.commit().await?;

    Ok(expand_carts(&state.orm, vec![created]).await?.pop())
}

async fn replace_items<C: ConnectionTrait>(conn: &C, cart_id: Uuid, lines: &[Line]) -> AppResult<()> {
    CartItems::delete_many()
        .filter(CartItemCol::CartId.eq(cart_id))
        .exec(conn)
        .await?;

    if lines.is_empty() {
        return Ok(());
    }

    let rows = lines.iter().enumerate().map(|(position, line)| CartItemActive {
        id: Set(Uuid::new_v4()),
        cart_id: Set(cart_id),
        product_id: Set(line.product_id),
        product_name: Set(line.product_name.clone()),
        image: Set(line.image.clone()),
        quantity: Set(line.quantity),
        amount: Set(line.amount),
        position: Set(position as i32),
        created_at: NotSet,
    });
    CartItems::insert_many(rows).exec(conn).await?;

    Ok(())
}

async fn resolve_listings(
    state: &AppState,
    items: &[RequestedItem],
) -> AppResult<HashMap<Uuid, PriceSource>> {
    let ids: Vec<Uuid> = items
        .iter()
        .map(|item| item.shop_id)
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();

    let listings = Listings::find()
        .filter(ListingCol::Id.is_in(ids))
        .all(&state.orm)
        .await?;

    Ok(listings
        .iter()
        .map(|listing| (listing.id, PriceSource::from(listing)))
        .collect())
}

async fn after_write(state: &AppState, account: &AccountModel, outcome: &CartOutcome, action: &str) {
    let cart = outcome.cart();
    let created = matches!(outcome, CartOutcome::Created(_));

    audit::record(
        &state.pool,
        Some(account.id),
        action,
        "carts",
        serde_json::json!({
            "cart_id": cart.id,
            "created": created,
            "total_amount": cart.total_amount,
        }),
    )
    .await;
    tracing::info!(
        user_id = %account.id,
        cart_id = %cart.id,
        created,
        total_amount = cart.total_amount,
        "cart written"
    );
}

fn contended() -> AppError {
    AppError::Conflict("Cart was modified concurrently, please retry".into())
}

/// Loads items, listing summaries and owners for each cart, preserving order.
pub(crate) async fn expand_carts<C: ConnectionTrait>(
    conn: &C,
    carts: Vec<CartModel>,
) -> AppResult<Vec<Cart>> {
    if carts.is_empty() {
        return Ok(Vec::new());
    }

    let cart_ids: Vec<Uuid> = carts.iter().map(|c| c.id).collect();
    let items = CartItems::find()
        .filter(CartItemCol::CartId.is_in(cart_ids))
        .order_by_asc(CartItemCol::Position)
        .all(conn)
        .await?;

    let product_ids: HashSet<Uuid> = items.iter().map(|i| i.product_id).collect();
    let products: HashMap<Uuid, ListingSummary> = if product_ids.is_empty() {
        HashMap::new()
    } else {
        Listings::find()
            .filter(ListingCol::Id.is_in(product_ids))
            .all(conn)
            .await?
            .into_iter()
            .map(|listing| {
                (
                    listing.id,
                    ListingSummary {
                        id: listing.id,
                        name: listing.name,
                        address: listing.address,
                        images: listing.images,
                        contact_email: listing.contact_email,
                        contact_number: listing.contact_number,
                    },
                )
            })
            .collect()
    };

    let owner_ids: HashSet<Uuid> = carts.iter().map(|c| c.user_id).collect();
    let owners: HashMap<Uuid, OwnerSummary> = Accounts::find()
        .filter(AccountCol::Id.is_in(owner_ids))
        .all(conn)
        .await?
        .into_iter()
        .map(|account| {
            (
                account.id,
                OwnerSummary {
                    id: account.id,
                    username: account.username,
                    first_name: account.first_name,
                    email: account.email,
                },
            )
        })
        .collect();

    let mut lines_by_cart: HashMap<Uuid, Vec<LineItem>> = HashMap::new();
    for item in items {
        lines_by_cart.entry(item.cart_id).or_default().push(LineItem {
            product: products.get(&item.product_id).cloned(),
            product_id: item.product_id,
            product_name: item.product_name,
            image: item.image,
            quantity: item.quantity,
            amount: item.amount,
        });
    }

    Ok(carts
        .into_iter()
        .map(|model| Cart {
            id: model.id,
            owner: owners.get(&model.user_id).cloned(),
            items: lines_by_cart.remove(&model.id).unwrap_or_default(),
            user_id: model.user_id,
            user_name: model.user_name,
            total_amount: model.total_amount,
            paid: model.paid,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        })
        .collect())
}
