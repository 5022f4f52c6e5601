use chrono::{DateTime, Utc};
use sea_orm::ActiveValue::NotSet;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use sqlx::FromRow;
use uuid::Uuid;

use crate::{
    access::{self, Operation, is_superadmin},
    audit,
    dto::listings::{CreateListingRequest, ListingList, UpdateListingRequest},
    entity::listings::{ActiveModel, Column, Entity as Listings, Model as ListingModel},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Category, Listing},
    response::{ApiResponse, Meta},
    routes::params::{ListingQuery, Pagination, SearchQuery},
    services::is_unique_violation,
    state::AppState,
};

fn duplicate_name(err: sea_orm::DbErr) -> AppError {
    if is_unique_violation(&err) {
        AppError::Conflict("Shop name already exists".into())
    } else {
        err.into()
    }
}

pub async fn create_listing(
    state: &AppState,
    user: &AuthUser,
    payload: CreateListingRequest,
) -> AppResult<ApiResponse<Listing>> {
    let owner = access::load_account(&state.orm, user).await?;
    access::ensure(Operation::CreateListing, &owner, None, &state.access)?;

    let name = payload.name.trim().to_string();
    if name.is_empty() {
        return Err(AppError::BadRequest("name cannot be empty".into()));
    }
    if payload.price < 0 {
        return Err(AppError::BadRequest("price cannot be negative".into()));
    }

    let listing = ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name),
        address: Set(payload.address),
        keywords: Set(payload.keywords),
        images: Set(payload.images),
        description: Set(payload.description),
        category: Set(payload.category.as_str().to_string()),
        price: Set(payload.price),
        contact_email: Set(owner.email.clone()),
        contact_number: Set(owner.phone_number.clone()),
        owner_id: Set(owner.id),
        approved: Set(false),
        available: Set(payload.available.unwrap_or(false)),
        subscription: Set(owner.subscription.clone()),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await
    .map_err(duplicate_name)?;

    audit::record(
        &state.pool,
        Some(owner.id),
        "listing_create",
        "listings",
        serde_json::json!({ "listing_id": listing.id }),
    )
    .await;
    tracing::info!(owner_id = %owner.id, listing_id = %listing.id, "listing created");

    Ok(ApiResponse::success(
        "Shop created",
        listing_from_entity(listing),
        Some(Meta::empty()),
    ))
}

pub async fn list_listings(
    state: &AppState,
    query: ListingQuery,
) -> AppResult<ApiResponse<ListingList>> {
    access::ensure_anonymous(Operation::BrowseListings)?;

    let mut condition = Condition::all();
    if let Some(category) = query.category {
        condition = condition.add(Column::Category.eq(category.as_str()));
    }
    paginate(state, condition, &query.pagination, "Shops").await
}

pub async fn list_my_listings(
    state: &AppState,
    user: &AuthUser,
    pagination: Pagination,
) -> AppResult<ApiResponse<ListingList>> {
    let owner = access::load_account(&state.orm, user).await?;
    access::ensure(Operation::ListOwnListings, &owner, Some(owner.id), &state.access)?;

    let condition = Condition::all().add(Column::OwnerId.eq(owner.id));
    paginate(state, condition, &pagination, "My shops").await
}

async fn paginate(
    state: &AppState,
    condition: Condition,
    pagination: &Pagination,
    message: &str,
) -> AppResult<ApiResponse<ListingList>> {
    let (page, limit, offset) = pagination.normalize();

    let finder = Listings::find()
        .filter(condition)
        .order_by_desc(Column::CreatedAt);

    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(listing_from_entity)
        .collect();

    Ok(ApiResponse::success(
        message,
        ListingList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

pub async fn get_listing(state: &AppState, id: Uuid) -> AppResult<ApiResponse<Listing>> {
    access::ensure_anonymous(Operation::BrowseListings)?;
    let listing = Listings::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Shop"))?;
    Ok(ApiResponse::success("Shop", listing_from_entity(listing), None))
}

pub async fn update_listing(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateListingRequest,
) -> AppResult<ApiResponse<Listing>> {
    let existing = Listings::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Shop"))?;

    let actor = access::load_account(&state.orm, user).await?;
    access::ensure(
        Operation::UpdateListing,
        &actor,
        Some(existing.owner_id),
        &state.access,
    )?;

    if payload.approved.is_some() && !is_superadmin(&actor, &state.access) {
        return Err(AppError::Forbidden(
            "only a superadmin can change approval".into(),
        ));
    }

    let mut active: ActiveModel = existing.into();
    if let Some(name) = payload.name {
        let name = name.trim().to_string();
        if name.is_empty() {
            return Err(AppError::BadRequest("name cannot be empty".into()));
        }
        active.name = Set(name);
    }
    if let Some(address) = payload.address {
        active.address = Set(Some(address));
    }
    if let Some(keywords) = payload.keywords {
        active.keywords = Set(Some(keywords));
    }
    if let Some(images) = payload.images {
        active.images = Set(Some(images));
    }
    if let Some(description) = payload.description {
        active.description = Set(Some(description));
    }
    if let Some(category) = payload.category {
        active.category = Set(category.as_str().to_string());
    }
    if let Some(price) = payload.price {
        if price < 0 {
            return Err(AppError::BadRequest("price cannot be negative".into()));
        }
        active.price = Set(price);
    }
    if let Some(available) = payload.available {
        active.available = Set(available);
    }
    if let Some(approved) = payload.approved {
        active.approved = Set(approved);
    }
    if let Some(contact_email) = payload.contact_email {
        active.contact_email = Set(contact_email);
    }
    if let Some(contact_number) = payload.contact_number {
        active.contact_number = Set(contact_number);
    }
    active.updated_at = Set(Utc::now().into());

    let listing = active.update(&state.orm).await.map_err(duplicate_name)?;

    audit::record(
        &state.pool,
        Some(actor.id),
        "listing_update",
        "listings",
        serde_json::json!({ "listing_id": listing.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Updated",
        listing_from_entity(listing),
        Some(Meta::empty()),
    ))
}

pub async fn delete_listing(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let existing = Listings::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Shop"))?;

    let actor = access::load_account(&state.orm, user).await?;
    access::ensure(
        Operation::DeleteListing,
        &actor,
        Some(existing.owner_id),
        &state.access,
    )?;

    let result = Listings::delete_by_id(id).exec(&state.orm).await?;
    if result.rows_affected == 0 {
        return Err(AppError::not_found("Shop"));
    }

    audit::record(
        &state.pool,
        Some(actor.id),
        "listing_delete",
        "listings",
        serde_json::json!({ "listing_id": id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Deleted",
        serde_json::json!({ "success": true }),
        Some(Meta::empty()),
    ))
}

#[derive(FromRow)]
struct ListingRow {
    id: Uuid,
    name: String,
    address: Option<String>,
    keywords: Option<String>,
    images: Option<String>,
    description: Option<String>,
    category: String,
    price: i64,
    contact_email: String,
    contact_number: String,
    owner_id: Uuid,
    approved: bool,
    available: bool,
    subscription: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Full-text search over the generated `search_document` column, newest first.
pub async fn search_listings(
    state: &AppState,
    query: SearchQuery,
) -> AppResult<ApiResponse<ListingList>> {
    access::ensure_anonymous(Operation::BrowseListings)?;
    let terms = query
        .q
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .ok_or_else(|| AppError::BadRequest("search query cannot be empty".into()))?;
    let (page, limit, offset) = query.pagination.normalize();

    let rows = sqlx::query_as::<_, ListingRow>(
        r#"
        SELECT id, name, address, keywords, images, description, category, price,
               contact_email, contact_number, owner_id, approved, available, subscription,
               created_at, updated_at
        FROM listings
        WHERE search_document @@ plainto_tsquery('simple', $1)
        ORDER BY created_at DESC
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(terms)
    .bind(limit)
    .bind(offset)
    .fetch_all(&state.pool)
    .await?;

    let total: (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM listings WHERE search_document @@ plainto_tsquery('simple', $1)",
    )
    .bind(terms)
    .fetch_one(&state.pool)
    .await?;

    let items = rows
        .into_iter()
        .map(|row| Listing {
            id: row.id,
            name: row.name,
            address: row.address,
            keywords: row.keywords,
            images: row.images,
            description: row.description,
            category: Category::from(row.category.as_str()),
            price: row.price,
            contact_email: row.contact_email,
            contact_number: row.contact_number,
            owner_id: row.owner_id,
            approved: row.approved,
            available: row.available,
            subscription: row.subscription,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
        .collect();

    Ok(ApiResponse::success(
        "Search results",
        ListingList { items },
        Some(Meta::new(page, limit, total.0)),
    ))
}

pub(crate) fn listing_from_entity(model: ListingModel) -> Listing {
    Listing {
        id: model.id,
        category: Category::from(model.category.as_str()),
        name: model.name,
        address: model.address,
        keywords: model.keywords,
        images: model.images,
        description: model.description,
        price: model.price,
        contact_email: model.contact_email,
        contact_number: model.contact_number,
        owner_id: model.owner_id,
        approved: model.approved,
        available: model.available,
        subscription: model.subscription,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}
