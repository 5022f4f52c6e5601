use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
    routing::get,
};
use chrono::{Duration, Utc};
use marketplace_api::{middleware::auth::AuthUser, models::Role, session::SessionKeys};
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

async fn whoami(user: AuthUser) -> String {
    format!("{}:{}", user.user_id, user.role.as_str())
}

fn app(keys: SessionKeys) -> Router {
    Router::new().route("/whoami", get(whoami)).with_state(keys)
}

async fn call(keys: &SessionKeys, authorization: Option<String>) -> (StatusCode, String) {
    let mut request = Request::builder().uri("/whoami");
    if let Some(value) = authorization {
        request = request.header(header::AUTHORIZATION, value);
    }
    let response = app(keys.clone())
        .oneshot(request.body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

fn message(body: &str) -> String {
    let json: Value = serde_json::from_str(body).unwrap();
    json["message"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn missing_or_malformed_credentials_are_forbidden() {
    let keys = SessionKeys::new(b"guard-secret");

    let (status, body) = call(&keys, None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(message(&body), "Not authorized");

    let (status, _) = call(&keys, Some("Token abc".into())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = call(&keys, Some("Bearer not-a-jwt".into())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn expired_credentials_are_unauthorized() {
    let keys = SessionKeys::new(b"guard-secret");
    let issued = Utc::now() - Duration::hours(49);
    let token = keys.issue_at(Uuid::new_v4(), Role::User, issued).unwrap();

    let (status, body) = call(&keys, Some(format!("Bearer {token}"))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(!message(&body).is_empty());
}

#[tokio::test]
async fn valid_credentials_reach_the_handler() {
    let keys = SessionKeys::new(b"guard-secret");
    let id = Uuid::new_v4();
    let token = keys.issue(id, Role::Admin).unwrap();

    let (status, body) = call(&keys, Some(format!("Bearer {token}"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, format!("{id}:admin"));
}
