use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{delete, get, post, put},
};
use uuid::Uuid;

use crate::{
    dto::listings::{CreateListingRequest, ListingList, UpdateListingRequest},
    error::AppResult,
    extract::{JsonBody, PathParam, QueryParams},
    middleware::auth::AuthUser,
    models::Listing,
    response::ApiResponse,
    routes::params::{ListingQuery, Pagination, SearchQuery},
    services::listing_service,
    session::{Renewed, renewed},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(create_listing))
        .route("/getall", get(list_listings))
        .route("/search", get(search_listings))
        .route("/mine", get(list_my_listings))
        .route("/one/{id}", get(get_listing))
        .route("/update/{id}", put(update_listing))
        .route("/delete/{id}", delete(delete_listing))
}

#[utoipa::path(
    post,
    path = "/api/v1/shops/register",
    request_body = CreateListingRequest,
    responses(
        (status = 201, description = "Shop created", body = ApiResponse<Listing>),
        (status = 403, description = "Only admins can register shops"),
        (status = 409, description = "Shop name already exists"),
    ),
    security(("bearer_auth" = [])),
    tag = "Shops"
)]
pub async fn create_listing(
    State(state): State<AppState>,
    user: AuthUser,
    JsonBody(payload): JsonBody<CreateListingRequest>,
) -> AppResult<Renewed<Listing>> {
    let resp = listing_service::create_listing(&state, &user, payload).await?;
    renewed(&state, &user, StatusCode::CREATED, resp).await
}

#[utoipa::path(
    get,
    path = "/api/v1/shops/getall",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("pageSize" = Option<i64>, Query, description = "Items per page, default 10, max 100"),
        ("category" = Option<String>, Query, description = "coffee, barbers, salon, spa or other"),
    ),
    responses(
        (status = 200, description = "List shops", body = ApiResponse<ListingList>),
    ),
    tag = "Shops"
)]
pub async fn list_listings(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<ListingQuery>,
) -> AppResult<Json<ApiResponse<ListingList>>> {
    let resp = listing_service::list_listings(&state, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/v1/shops/search",
    params(
        ("q" = String, Query, description = "Search terms"),
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("pageSize" = Option<i64>, Query, description = "Items per page, default 10, max 100"),
    ),
    responses(
        (status = 200, description = "Matching shops", body = ApiResponse<ListingList>),
        (status = 400, description = "Missing search terms"),
    ),
    tag = "Shops"
)]
pub async fn search_listings(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<SearchQuery>,
) -> AppResult<Json<ApiResponse<ListingList>>> {
    let resp = listing_service::search_listings(&state, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/v1/shops/mine",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("pageSize" = Option<i64>, Query, description = "Items per page, default 10, max 100"),
    ),
    responses(
        (status = 200, description = "Shops owned by the current account", body = ApiResponse<ListingList>),
    ),
    security(("bearer_auth" = [])),
    tag = "Shops"
)]
pub async fn list_my_listings(
    State(state): State<AppState>,
    user: AuthUser,
    QueryParams(pagination): QueryParams<Pagination>,
) -> AppResult<Renewed<ListingList>> {
    let resp = listing_service::list_my_listings(&state, &user, pagination).await?;
    renewed(&state, &user, StatusCode::OK, resp).await
}

#[utoipa::path(
    get,
    path = "/api/v1/shops/one/{id}",
    params(("id" = Uuid, Path, description = "Shop ID")),
    responses(
        (status = 200, description = "Shop", body = ApiResponse<Listing>),
        (status = 404, description = "Shop not found"),
    ),
    tag = "Shops"
)]
pub async fn get_listing(
    State(state): State<AppState>,
    PathParam(id): PathParam<Uuid>,
) -> AppResult<Json<ApiResponse<Listing>>> {
    let resp = listing_service::get_listing(&state, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/v1/shops/update/{id}",
    params(("id" = Uuid, Path, description = "Shop ID")),
    request_body = UpdateListingRequest,
    responses(
        (status = 200, description = "Shop updated", body = ApiResponse<Listing>),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Shop not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Shops"
)]
pub async fn update_listing(
    State(state): State<AppState>,
    user: AuthUser,
    PathParam(id): PathParam<Uuid>,
    JsonBody(payload): JsonBody<UpdateListingRequest>,
) -> AppResult<Renewed<Listing>> {
    let resp = listing_service::update_listing(&state, &user, id, payload).await?;
    renewed(&state, &user, StatusCode::OK, resp).await
}

#[utoipa::path(
    delete,
    path = "/api/v1/shops/delete/{id}",
    params(("id" = Uuid, Path, description = "Shop ID")),
    responses(
        (status = 200, description = "Shop deleted"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Shop not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Shops"
)]
pub async fn delete_listing(
    State(state): State<AppState>,
    user: AuthUser,
    PathParam(id): PathParam<Uuid>,
) -> AppResult<Renewed<serde_json::Value>> {
    let resp = listing_service::delete_listing(&state, &user, id).await?;
    renewed(&state, &user, StatusCode::OK, resp).await
}
