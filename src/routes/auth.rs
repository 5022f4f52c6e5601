use axum::{
    Json, Router,
    extract::State,
    http::{StatusCode, header},
    response::IntoResponse,
    routing::{get, post, put},
};
use uuid::Uuid;

use crate::{
    dto::auth::{
        LoginRequest, ReferralSummary, RegisterRequest, UpdateProfileRequest, UpdateRoleRequest,
    },
    error::AppResult,
    extract::{JsonBody, PathParam},
    middleware::auth::AuthUser,
    models::Account,
    response::{ApiResponse, Meta},
    services::account_service,
    session::{Renewed, renewed, with_token},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/me", get(me).put(update_me))
        .route("/role/{id}", put(change_role))
        .route("/deactivate/{id}", put(deactivate))
        .route("/referrals", get(referrals))
}

#[utoipa::path(
    post,
    path = "/api/v1/users/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created; the credential is in the Authorization header", body = ApiResponse<Account>),
        (status = 400, description = "Missing fields or unknown referral code"),
        (status = 403, description = "Role cannot be self-assigned"),
        (status = 409, description = "Email or username already taken"),
    ),
    tag = "Auth"
)]
pub async fn register(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<RegisterRequest>,
) -> AppResult<Renewed<Account>> {
    let signed_in = account_service::register_account(&state, payload).await?;
    Ok(with_token(&signed_in.token, StatusCode::CREATED, signed_in.response))
}

#[utoipa::path(
    post,
    path = "/api/v1/users/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in; the credential is in the Authorization header", body = ApiResponse<Account>),
        (status = 401, description = "Invalid credentials"),
        (status = 403, description = "Account deactivated"),
    ),
    tag = "Auth"
)]
pub async fn login(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<LoginRequest>,
) -> AppResult<Renewed<Account>> {
    let signed_in = account_service::login(&state, payload).await?;
    Ok(with_token(&signed_in.token, StatusCode::OK, signed_in.response))
}

#[utoipa::path(
    post,
    path = "/api/v1/users/auth/logout",
    responses(
        (status = 200, description = "Client credential cleared"),
        (status = 403, description = "Missing or invalid credential"),
    ),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn logout(user: AuthUser) -> impl IntoResponse {
    tracing::debug!(user_id = %user.user_id, "logged out");
    (
        StatusCode::OK,
        [(header::AUTHORIZATION, String::new())],
        Json(ApiResponse::success("Logged out", (), Some(Meta::empty()))),
    )
}

#[utoipa::path(
    get,
    path = "/api/v1/users/auth/me",
    responses(
        (status = 200, description = "Current account", body = ApiResponse<Account>),
    ),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn me(State(state): State<AppState>, user: AuthUser) -> AppResult<Renewed<Account>> {
    let resp = account_service::get_profile(&state, &user).await?;
    renewed(&state, &user, StatusCode::OK, resp).await
}

#[utoipa::path(
    put,
    path = "/api/v1/users/auth/me",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Profile updated", body = ApiResponse<Account>),
    ),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn update_me(
    State(state): State<AppState>,
    user: AuthUser,
    JsonBody(payload): JsonBody<UpdateProfileRequest>,
) -> AppResult<Renewed<Account>> {
    let resp = account_service::update_profile(&state, &user, payload).await?;
    renewed(&state, &user, StatusCode::OK, resp).await
}

#[utoipa::path(
    put,
    path = "/api/v1/users/auth/role/{id}",
    params(("id" = Uuid, Path, description = "Account ID")),
    request_body = UpdateRoleRequest,
    responses(
        (status = 200, description = "Role changed", body = ApiResponse<Account>),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Account not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn change_role(
    State(state): State<AppState>,
    user: AuthUser,
    PathParam(id): PathParam<Uuid>,
    JsonBody(payload): JsonBody<UpdateRoleRequest>,
) -> AppResult<Renewed<Account>> {
    let resp = account_service::change_role(&state, &user, id, payload).await?;
    renewed(&state, &user, StatusCode::OK, resp).await
}

#[utoipa::path(
    put,
    path = "/api/v1/users/auth/deactivate/{id}",
    params(("id" = Uuid, Path, description = "Account ID")),
    responses(
        (status = 200, description = "Account deactivated", body = ApiResponse<Account>),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Account not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn deactivate(
    State(state): State<AppState>,
    user: AuthUser,
    PathParam(id): PathParam<Uuid>,
) -> AppResult<Renewed<Account>> {
    let resp = account_service::deactivate(&state, &user, id).await?;
    renewed(&state, &user, StatusCode::OK, resp).await
}

#[utoipa::path(
    get,
    path = "/api/v1/users/auth/referrals",
    responses(
        (status = 200, description = "Referral code and referred accounts", body = ApiResponse<ReferralSummary>),
    ),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn referrals(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Renewed<ReferralSummary>> {
    let resp = account_service::referrals(&state, &user).await?;
    renewed(&state, &user, StatusCode::OK, resp).await
}
