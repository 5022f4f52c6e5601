#![allow(dead_code)]

use std::sync::Arc;

use marketplace_api::{
    access::AccessConfig,
    db::{create_orm_conn, create_pool, run_migrations},
    dto::{auth::RegisterRequest, listings::CreateListingRequest},
    middleware::auth::AuthUser,
    models::{Category, Role},
    services::{account_service, listing_service},
    session::SessionKeys,
    state::AppState,
};
use sea_orm::{ConnectionTrait, Statement};
use uuid::Uuid;

pub const TEST_SECRET: &[u8] = b"integration-test-secret";
pub const ROOT_USERNAME: &str = "root";

/// `None` when no database is configured, so DB-backed flows can skip.
pub async fn test_state() -> anyhow::Result<Option<AppState>> {
    let database_url = match std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
    {
        Ok(url) => url,
        Err(_) => {
            eprintln!("Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run flow tests.");
            return Ok(None);
        }
    };

    let pool = create_pool(&database_url).await?;
    let orm = create_orm_conn(&pool);
    run_migrations(&orm).await?;

    let backend = orm.get_database_backend();
    orm.execute(Statement::from_string(
        backend,
        "TRUNCATE TABLE cart_items, carts, listings, audit_logs, accounts RESTART IDENTITY CASCADE",
    ))
    .await?;

    Ok(Some(AppState {
        pool,
        orm,
        sessions: SessionKeys::new(TEST_SECRET),
        access: Arc::new(AccessConfig::new([ROOT_USERNAME])),
    }))
}

pub fn register_request(username: &str, role: Option<Role>) -> RegisterRequest {
    RegisterRequest {
        first_name: "Test".into(),
        middle_name: None,
        last_name: username.into(),
        username: username.into(),
        email: format!("{username}@example.com"),
        password: "correct horse".into(),
        phone_number: "5550100".into(),
        role,
        referral_code: None,
    }
}

pub async fn sign_up(state: &AppState, username: &str, role: Option<Role>) -> anyhow::Result<AuthUser> {
    let signed_in =
        account_service::register_account(state, register_request(username, role)).await?;
    let account = signed_in
        .response
        .data
        .ok_or_else(|| anyhow::anyhow!("register returned no account"))?;
    Ok(AuthUser {
        user_id: account.id,
        role: account.role,
    })
}

pub async fn open_shop(
    state: &AppState,
    owner: &AuthUser,
    name: &str,
    category: Category,
    price: i64,
) -> anyhow::Result<Uuid> {
    let resp = listing_service::create_listing(
        state,
        owner,
        CreateListingRequest {
            name: name.into(),
            address: Some("1 Test Street".into()),
            keywords: Some("test".into()),
            images: None,
            description: None,
            category,
            price,
            available: Some(true),
        },
    )
    .await?;
    let listing = resp
        .data
        .ok_or_else(|| anyhow::anyhow!("create listing returned no shop"))?;
    Ok(listing.id)
}
