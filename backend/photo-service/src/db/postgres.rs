//! PostgreSQL-backed repositories
//!
//! The trait impls live next to their tables in `users.rs`, `sessions.rs`
//! and `social.rs`.

use sqlx::PgPool;

use crate::error::AppError;

const UNIQUE_VIOLATION: &str = "23505";
const FOREIGN_KEY_VIOLATION: &str = "23503";

/// Repository handle over a shared connection pool
#[derive(Clone)]
pub struct PgStore {
    pub(crate) pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Translate constraint violations into domain errors.
///
/// `on_foreign_key` names the entity reported as missing when a foreign
/// key rejects the write.
pub(crate) fn map_write_error(err: sqlx::Error, on_foreign_key: &str) -> AppError {
    if let sqlx::Error::Database(db_err) = &err {
        match db_err.code().as_deref() {
            Some(UNIQUE_VIOLATION) => match db_err.constraint() {
                Some("users_username_key") => return AppError::DuplicateUsername,
                Some("users_email_key") => return AppError::DuplicateEmail,
                _ => {}
            },
            Some(FOREIGN_KEY_VIOLATION) => {
                return AppError::NotFound(format!("{} not found", on_foreign_key))
            }
            _ => {}
        }
    }
    AppError::from(err)
}
