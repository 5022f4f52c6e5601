use axum::{
    Router,
    extract::State,
    http::StatusCode,
    routing::{get, post, put},
};
use uuid::Uuid;

use crate::{
    dto::cart::{CartList, CartRequest},
    error::AppResult,
    extract::{JsonBody, PathParam},
    middleware::auth::AuthUser,
    models::Cart,
    response::ApiResponse,
    services::cart_service,
    session::{Renewed, renewed},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/create", post(create_cart))
        .route("/updatebooking/{cart_id}", put(update_cart))
        .route("/user", get(list_user_carts))
        .route("/one/{cart_id}", put(get_one_cart))
}

#[utoipa::path(
    post,
    path = "/api/v1/cart/create",
    request_body = CartRequest,
    responses(
        (status = 201, description = "Cart created", body = ApiResponse<Cart>),
        (status = 200, description = "Items merged into the active cart", body = ApiResponse<Cart>),
        (status = 400, description = "Malformed items"),
        (status = 403, description = "Listing cannot be carted"),
        (status = 404, description = "Account or listing not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn create_cart(
    State(state): State<AppState>,
    user: AuthUser,
    JsonBody(payload): JsonBody<CartRequest>,
) -> AppResult<Renewed<Cart>> {
    let outcome = cart_service::create_cart(&state, &user, payload).await?;
    renewed(&state, &user, outcome.status(), outcome.into_body()).await
}

#[utoipa::path(
    put,
    path = "/api/v1/cart/updatebooking/{cart_id}",
    params(("cart_id" = Uuid, Path, description = "Cart ID")),
    request_body = CartRequest,
    responses(
        (status = 200, description = "Items merged into the cart", body = ApiResponse<Cart>),
        (status = 201, description = "Target was paid or missing; a new cart was created", body = ApiResponse<Cart>),
        (status = 400, description = "Malformed items"),
        (status = 403, description = "Cart belongs to another account"),
        (status = 404, description = "Account or listing not found"),
        (status = 409, description = "Concurrent modification"),
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn update_cart(
    State(state): State<AppState>,
    user: AuthUser,
    PathParam(cart_id): PathParam<Uuid>,
    JsonBody(payload): JsonBody<CartRequest>,
) -> AppResult<Renewed<Cart>> {
    let outcome = cart_service::update_cart(&state, &user, cart_id, payload).await?;
    renewed(&state, &user, outcome.status(), outcome.into_body()).await
}

#[utoipa::path(
    get,
    path = "/api/v1/cart/user",
    responses(
        (status = 200, description = "Every cart of the current account", body = ApiResponse<CartList>),
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn list_user_carts(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Renewed<CartList>> {
    let resp = cart_service::list_user_carts(&state, &user).await?;
    renewed(&state, &user, StatusCode::OK, resp).await
}

#[utoipa::path(
    put,
    path = "/api/v1/cart/one/{cart_id}",
    params(("cart_id" = Uuid, Path, description = "Cart ID")),
    responses(
        (status = 200, description = "Cart", body = ApiResponse<Cart>),
        (status = 401, description = "Not the owner of this cart"),
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn get_one_cart(
    State(state): State<AppState>,
    user: AuthUser,
    PathParam(cart_id): PathParam<Uuid>,
) -> AppResult<Renewed<Cart>> {
    let resp = cart_service::get_one_cart(&state, &user, cart_id).await?;
    renewed(&state, &user, StatusCode::OK, resp).await
}
