use axum::{
    Router,
    extract::State,
    http::StatusCode,
    routing::{get, put},
};
use uuid::Uuid;

use crate::{
    dto::orders::{OrderList, UpdateOrderStatusRequest},
    error::AppResult,
    extract::{JsonBody, PathParam},
    middleware::auth::AuthUser,
    models::Cart,
    response::ApiResponse,
    services::order_service,
    session::{Renewed, renewed},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/getalusersorders", get(list_user_orders))
        .route("/getoneorder/{id}", get(get_user_order))
        .route("/admin/orders/{id}", put(update_order_status))
        .route("/admin/getorders/{id}", get(list_all_orders))
}

#[utoipa::path(
    get,
    path = "/api/v1/orders/getalusersorders",
    responses(
        (status = 200, description = "Orders of the current account", body = ApiResponse<OrderList>),
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn list_user_orders(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Renewed<OrderList>> {
    let resp = order_service::list_user_orders(&state, &user).await?;
    renewed(&state, &user, StatusCode::OK, resp).await
}

#[utoipa::path(
    get,
    path = "/api/v1/orders/getoneorder/{id}",
    params(("id" = Uuid, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Order", body = ApiResponse<Cart>),
        (status = 404, description = "Order not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn get_user_order(
    State(state): State<AppState>,
    user: AuthUser,
    PathParam(id): PathParam<Uuid>,
) -> AppResult<Renewed<Cart>> {
    let resp = order_service::get_user_order(&state, &user, id).await?;
    renewed(&state, &user, StatusCode::OK, resp).await
}

#[utoipa::path(
    put,
    path = "/api/v1/orders/admin/orders/{id}",
    params(("id" = Uuid, Path, description = "Order ID")),
    request_body = UpdateOrderStatusRequest,
    responses(
        (status = 200, description = "Order status updated", body = ApiResponse<Cart>),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Order not found"),
        (status = 409, description = "Owner already has an unpaid cart"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn update_order_status(
    State(state): State<AppState>,
    user: AuthUser,
    PathParam(id): PathParam<Uuid>,
    JsonBody(payload): JsonBody<UpdateOrderStatusRequest>,
) -> AppResult<Renewed<Cart>> {
    let resp = order_service::update_order_status(&state, &user, id, payload).await?;
    renewed(&state, &user, StatusCode::OK, resp).await
}

// The trailing segment is the requesting admin's id in existing clients; the
// identity used for the check always comes from the bearer credential.
#[utoipa::path(
    get,
    path = "/api/v1/orders/admin/getorders/{id}",
    params(("id" = Uuid, Path, description = "Requesting admin ID")),
    responses(
        (status = 200, description = "Every order in the system", body = ApiResponse<OrderList>),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn list_all_orders(
    State(state): State<AppState>,
    user: AuthUser,
    PathParam(_admin_id): PathParam<Uuid>,
) -> AppResult<Renewed<OrderList>> {
    let resp = order_service::list_all_orders(&state, &user).await?;
    renewed(&state, &user, StatusCode::OK, resp).await
}
