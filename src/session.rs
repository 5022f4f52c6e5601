//! Bearer sessions.
//!
//! Every credential lives for [`SESSION_TTL_SECS`] after issuance. Authenticated
//! responses go through [`renewed`], which attaches a freshly issued credential
//! to the `Authorization` header so an active client never runs out of session.

use std::sync::Arc;

use axum::{
    Json,
    http::{HeaderName, StatusCode, header},
};
use chrono::{DateTime, Utc};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use sea_orm::EntityTrait;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    entity::Accounts,
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::Role,
    response::ApiResponse,
    state::AppState,
};

/// Maximum age of a credential, counted from its `iat`.
pub const SESSION_TTL_SECS: i64 = 48 * 60 * 60;

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct Claims {
    pub sub: String,
    pub role: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Clone)]
pub struct SessionKeys {
    inner: Arc<KeyPair>,
}

struct KeyPair {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl SessionKeys {
    pub fn new(secret: &[u8]) -> Self {
        Self {
            inner: Arc::new(KeyPair {
                encoding: EncodingKey::from_secret(secret),
                decoding: DecodingKey::from_secret(secret),
            }),
        }
    }

    pub fn issue(&self, account_id: Uuid, role: Role) -> AppResult<String> {
        self.issue_at(account_id, role, Utc::now())
    }

    pub fn issue_at(
        &self,
        account_id: Uuid,
        role: Role,
        issued_at: DateTime<Utc>,
    ) -> AppResult<String> {
        let iat = issued_at.timestamp();
        let claims = Claims {
            sub: account_id.to_string(),
            role: role.as_str().to_string(),
            iat,
            exp: iat + SESSION_TTL_SECS,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.inner.encoding)
            .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))
    }

    /// Expired credentials are `Unauthorized`; anything else that fails to verify is `Forbidden`.
    pub fn verify(&self, token: &str) -> AppResult<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        let decoded = decode::<Claims>(token, &self.inner.decoding, &validation).map_err(
            |err| match err.kind() {
                ErrorKind::ExpiredSignature => AppError::Unauthorized("Session expired".into()),
                _ => AppError::forbidden(),
            },
        )?;

        if Utc::now().timestamp() - decoded.claims.iat > SESSION_TTL_SECS {
            return Err(AppError::Unauthorized("Session expired".into()));
        }

        Ok(decoded.claims)
    }
}

pub fn bearer(token: &str) -> String {
    format!("Bearer {token}")
}

pub type Renewed<T> = (StatusCode, [(HeaderName, String); 1], Json<ApiResponse<T>>);

pub fn with_token<T>(token: &str, status: StatusCode, body: ApiResponse<T>) -> Renewed<T> {
    (status, [(header::AUTHORIZATION, bearer(token))], Json(body))
}

pub fn renew<T>(
    keys: &SessionKeys,
    account_id: Uuid,
    role: Role,
    status: StatusCode,
    body: ApiResponse<T>,
) -> AppResult<Renewed<T>> {
    let token = keys.issue(account_id, role)?;
    Ok(with_token(&token, status, body))
}

/// Wraps an authenticated response with a freshly issued credential.
///
/// The role is read back from the account, so a role change shows up in the
/// next credential instead of riding along from the incoming one.
pub async fn renewed<T>(
    state: &AppState,
    user: &AuthUser,
    status: StatusCode,
    body: ApiResponse<T>,
) -> AppResult<Renewed<T>> {
    let role = Accounts::find_by_id(user.user_id)
        .one(&state.orm)
        .await?
        .map_or(user.role, |account| Role::from(account.role.as_str()));
    renew(&state.sessions, user.user_id, role, status, body)
}
