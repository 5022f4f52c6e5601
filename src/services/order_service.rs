use chrono::Utc;
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, Condition, EntityTrait, QueryFilter, QueryOrder};
use uuid::Uuid;

use crate::{
    access::{self, Operation},
    audit,
    dto::orders::{OrderList, UpdateOrderStatusRequest},
    entity::carts::{Column as CartCol, Entity as Carts},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::Cart,
    response::{ApiResponse, Meta},
    services::{cart_service::expand_carts, is_unique_violation},
    state::AppState,
};

pub async fn list_user_orders(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<OrderList>> {
    let account = access::load_account(&state.orm, user).await?;
    access::ensure(Operation::ListOwnOrders, &account, Some(account.id), &state.access)?;

    let orders = Carts::find()
        .filter(CartCol::UserId.eq(account.id))
        .order_by_desc(CartCol::CreatedAt)
        .all(&state.orm)
        .await?;
    let items = expand_carts(&state.orm, orders).await?;
    let total = items.len() as i64;

    Ok(ApiResponse::success(
        "Ok",
        OrderList { items },
        Some(Meta::new(1, total, total)),
    ))
}

pub async fn get_user_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Cart>> {
    let account = access::load_account(&state.orm, user).await?;

    let order = Carts::find()
        .filter(
            Condition::all()
                .add(CartCol::Id.eq(id))
                .add(CartCol::UserId.eq(account.id)),
        )
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Order"))?;
    access::ensure(Operation::ViewOwnOrder, &account, Some(order.user_id), &state.access)?;

    let order = expand_carts(&state.orm, vec![order])
        .await?
        .pop()
        .ok_or_else(|| AppError::not_found("Order"))?;

    Ok(ApiResponse::success("OK", order, Some(Meta::empty())))
}

pub async fn list_all_orders(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<OrderList>> {
    let admin = access::load_account(&state.orm, user).await?;
    access::ensure(Operation::ListAllOrders, &admin, None, &state.access)?;

    let orders = Carts::find()
        .order_by_desc(CartCol::CreatedAt)
        .all(&state.orm)
        .await?;
    let items = expand_carts(&state.orm, orders).await?;
    let total = items.len() as i64;

    Ok(ApiResponse::success(
        "Ok",
        OrderList { items },
        Some(Meta::new(1, total, total)),
    ))
}

/// Sets `paid` either way; reopening is an administrative override.
pub async fn update_order_status(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateOrderStatusRequest,
) -> AppResult<ApiResponse<Cart>> {
    let admin = access::load_account(&state.orm, user).await?;
    access::ensure(Operation::UpdateOrderStatus, &admin, None, &state.access)?;

    let previous = Carts::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Order"))?
        .paid;

    // Bumped in SQL, never from a previously read version.
    let now: DateTimeWithTimeZone = Utc::now().into();
    let result = Carts::update_many()
        .col_expr(CartCol::Paid, Expr::value(payload.paid))
        .col_expr(CartCol::Version, Expr::col(CartCol::Version).add(1))
        .col_expr(CartCol::UpdatedAt, Expr::value(now))
        .filter(CartCol::Id.eq(id))
        .exec(&state.orm)
        .await
        .map_err(|err| {
            if is_unique_violation(&err) {
                AppError::Conflict("Owner already has an unpaid cart".into())
            } else {
                err.into()
            }
        })?;
    if result.rows_affected == 0 {
        return Err(AppError::not_found("Order"));
    }

    let order = Carts::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Order"))?;

    audit::record(
        &state.pool,
        Some(admin.id),
        "order_status_update",
        "carts",
        serde_json::json!({ "order_id": order.id, "from": previous, "paid": order.paid }),
    )
    .await;
    tracing::info!(
        admin_id = %admin.id,
        order_id = %order.id,
        from = previous,
        paid = order.paid,
        "order status updated"
    );

    let order = expand_carts(&state.orm, vec![order])
        .await?
        .pop()
        .ok_or_else(|| AppError::not_found("Order"))?;

    Ok(ApiResponse::success("Order updated", order, Some(Meta::empty())))
}
