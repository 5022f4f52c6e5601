use std::sync::Arc;

use axum::extract::FromRef;

use crate::{
    access::AccessConfig,
    db::{DbPool, OrmConn},
    session::SessionKeys,
};

#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub orm: OrmConn,
    pub sessions: SessionKeys,
    pub access: Arc<AccessConfig>,
}

impl FromRef<AppState> for SessionKeys {
    fn from_ref(state: &AppState) -> Self {
        state.sessions.clone()
    }
}
