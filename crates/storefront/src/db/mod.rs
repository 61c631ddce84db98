//! Database access for the storefront `PostgreSQL` database.
//!
//! One repository struct per table group: `users`/`auth_tokens`,
//! `products`/`product_variants`, `orders`, `reviews`. Repositories convert
//! rows into the domain types of [`crate::models`] at this boundary - this
//! is where legacy order-line shapes get normalized, so nothing downstream
//! ever sees raw rows.
//!
//! Migrations live in `crates/storefront/migrations/` and are applied with
//! `cargo run -p velostore-cli -- migrate`; the server never runs them on
//! startup.

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub mod catalog;
pub mod orders;
pub mod reviews;
pub mod users;

/// Errors from repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Open the `PostgreSQL` connection pool.
///
/// # Errors
///
/// Returns `sqlx::Error` if no connection can be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(16)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(5))
        .idle_timeout(Duration::from_secs(600))
        .connect(database_url.expose_secret())
        .await
}
