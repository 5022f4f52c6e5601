use sea_orm::{DbErr, SqlErr};

pub mod account_service;
pub mod cart_service;
pub mod listing_service;
pub mod order_service;

pub(crate) fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}
