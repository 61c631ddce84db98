//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::StorefrontConfig;
use crate::services::auth::AuthService;

/// State handed to every handler.
///
/// Both fields are cheap to clone (the pool is internally reference-counted,
/// the config sits behind an `Arc`). This is the only cross-request shared
/// state in the process; all domain state lives in the database.
#[derive(Clone)]
pub struct AppState {
    config: Arc<StorefrontConfig>,
    pool: PgPool,
}

impl AppState {
    /// Create the application state.
    #[must_use]
    pub fn new(config: StorefrontConfig, pool: PgPool) -> Self {
        Self {
            config: Arc::new(config),
            pool,
        }
    }

    /// The storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.config
    }

    /// The database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// An authentication service bound to this state.
    #[must_use]
    pub fn auth(&self) -> AuthService<'_> {
        AuthService::new(self.pool(), self.config.token_ttl())
    }
}
