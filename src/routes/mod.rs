use axum::{
    Router,
    http::{Uri, header},
    routing::get,
};
use tower_http::cors::{Any, CorsLayer};

use crate::{error::AppError, state::AppState};

pub mod auth;
pub mod cart;
pub mod doc;
pub mod health;
pub mod listings;
pub mod orders;
pub mod params;

// Build the API router without binding state; it is provided by `create_app`.
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .nest("/cart", cart::router())
        .nest("/orders", orders::router())
        .nest("/shops", listings::router())
        .nest("/users/auth", auth::router())
}

/// The full application: health, versioned API, docs and the JSON fallback.
pub fn create_app(state: AppState) -> Router {
    // Clients read the renewed credential from the response, so it must be exposed.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
        .expose_headers([header::AUTHORIZATION]);

    Router::new()
        .route("/health", get(health::health_check))
        .nest("/api/v1", create_api_router())
        .merge(doc::scalar_docs())
        .fallback(not_found)
        .layer(cors)
        .with_state(state)
}

async fn not_found(uri: Uri) -> AppError {
    AppError::NotFound(format!("No route for {}", uri.path()))
}
