//! Database repository implementations
//!
//! Per-aggregate SeaORM repositories + unified RepositoryProvider.

pub mod booking_repository;
pub mod repository_provider;
pub mod room_repository;
pub mod user_repository;

pub use repository_provider::SeaOrmRepositoryProvider;

use sea_orm::{DbErr, SqlErr};

use crate::domain::DomainError;

fn db_err(e: DbErr) -> DomainError {
    DomainError::Storage(e.to_string())
}

/// Map a unique-constraint violation to `Conflict`, anything else to `Storage`.
fn conflict_or_db_err(e: DbErr, conflict: &str) -> DomainError {
    match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => DomainError::Conflict(conflict.to_string()),
        _ => db_err(e),
    }
}
