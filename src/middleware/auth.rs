use axum::{
    extract::{FromRef, FromRequestParts},
    http::header,
};
use uuid::Uuid;

use crate::{error::AppError, models::Role, session::SessionKeys};

/// Identity decoded from a verified bearer credential.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub role: Role,
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    SessionKeys: FromRef<S>,
{
    type Rejection = AppError;
    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        state: &S,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .ok_or_else(AppError::forbidden)?;

        let auth_str = auth_header.to_str().map_err(|_| AppError::forbidden())?;

        let token = auth_str
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(AppError::forbidden)?;

        let keys = SessionKeys::from_ref(state);
        let claims = keys.verify(token)?;

        let user_id = Uuid::parse_str(&claims.sub).map_err(|_| AppError::forbidden())?;

        Ok(AuthUser {
            user_id,
            role: Role::from(claims.role.as_str()),
        })
    }
}
