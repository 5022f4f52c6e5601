use std::sync::Arc;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode, header},
};
use marketplace_api::{
    access::AccessConfig,
    db::create_orm_conn,
    models::Role,
    routes::create_app,
    session::{SessionKeys, bearer},
    state::AppState,
};
use serde_json::Value;
use sqlx::postgres::PgPoolOptions;
use tower::ServiceExt;
use uuid::Uuid;

// The pool never connects: these requests are answered before any query runs.
fn app() -> Router {
    let pool = PgPoolOptions::new()
        .connect_lazy("postgres://marketplace@localhost/unused")
        .unwrap();
    let orm = create_orm_conn(&pool);
    create_app(AppState {
        pool,
        orm,
        sessions: SessionKeys::new(b"router-secret"),
        access: Arc::new(AccessConfig::default()),
    })
}

async fn send(request: Request<Body>) -> (StatusCode, axum::http::HeaderMap, Value) {
    let response = app().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, headers, json)
}

#[tokio::test]
async fn health_is_public_and_exposes_authorization() {
    let (status, headers, json) = send(
        Request::builder()
            .uri("/health")
            .header(header::ORIGIN, "http://localhost:5173")
            .body(Body::empty())
            .unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["status"], "ok");
    let exposed = headers
        .get(header::ACCESS_CONTROL_EXPOSE_HEADERS)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_ascii_lowercase();
    assert!(exposed.contains("authorization"), "exposed: {exposed}");
}

#[tokio::test]
async fn unknown_routes_return_json_not_found() {
    let (status, _, json) = send(
        Request::builder()
            .uri("/api/v1/nope")
            .body(Body::empty())
            .unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["message"], "No route for /api/v1/nope");
}

#[tokio::test]
async fn cart_routes_require_a_credential() {
    let (status, _, json) = send(
        Request::builder()
            .method(Method::POST)
            .uri("/api/v1/cart/create")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"items":[]}"#))
            .unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(json["message"], "Not authorized");

    let (status, _, _) = send(
        Request::builder()
            .uri("/api/v1/orders/getalusersorders")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn malformed_input_is_a_json_bad_request() {
    let token = SessionKeys::new(b"router-secret")
        .issue(Uuid::new_v4(), Role::User)
        .unwrap();
    let requests = [
        Request::builder()
            .method(Method::POST)
            .uri("/api/v1/cart/create")
            .header(header::AUTHORIZATION, bearer(&token))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{}"))
            .unwrap(),
        Request::builder()
            .method(Method::POST)
            .uri("/api/v1/cart/create")
            .header(header::AUTHORIZATION, bearer(&token))
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from("items=1"))
            .unwrap(),
        Request::builder()
            .method(Method::PUT)
            .uri("/api/v1/cart/updatebooking/not-a-uuid")
            .header(header::AUTHORIZATION, bearer(&token))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"items":[]}"#))
            .unwrap(),
    ];

    for request in requests {
        let uri = request.uri().clone();
        let (status, _, json) = send(request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert!(json["message"].is_string(), "{uri}: {json}");
    }
}
