//! Storefront configuration loaded from environment variables.
//!
//! Required: `VELOSTORE_DATABASE_URL` (the generic `DATABASE_URL` is
//! accepted as a fallback).
//!
//! Optional: `VELOSTORE_HOST` (default 127.0.0.1), `VELOSTORE_PORT`
//! (default 4000), `AUTH_TOKEN_TTL_DAYS` (default 7), `SENTRY_DSN`,
//! `SENTRY_ENVIRONMENT`.

use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

use chrono::Duration;
use secrecy::SecretString;
use thiserror::Error;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// Database connection URL; wrapped because it carries the password.
    pub database_url: SecretString,
    pub host: IpAddr,
    pub port: u16,
    /// Bearer token lifetime in days.
    pub auth_token_ttl_days: i64,
    pub sentry_dsn: Option<String>,
    pub sentry_environment: Option<String>,
}

impl StorefrontConfig {
    /// Load configuration from the environment, reading a `.env` file first
    /// when one is present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when a required variable is missing or a value
    /// does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        Ok(Self {
            database_url: database_url_from_env()?,
            host: parsed_env("VELOSTORE_HOST", IpAddr::from([127, 0, 0, 1]))?,
            port: parsed_env("VELOSTORE_PORT", 4000)?,
            auth_token_ttl_days: parsed_env("AUTH_TOKEN_TTL_DAYS", 7)?,
            sentry_dsn: std::env::var("SENTRY_DSN").ok(),
            sentry_environment: std::env::var("SENTRY_ENVIRONMENT").ok(),
        })
    }

    /// The socket address the server binds to.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// The bearer token lifetime.
    #[must_use]
    pub fn token_ttl(&self) -> Duration {
        Duration::days(self.auth_token_ttl_days)
    }
}

/// The database URL, preferring the service-specific variable over the
/// generic `DATABASE_URL`.
fn database_url_from_env() -> Result<SecretString, ConfigError> {
    std::env::var("VELOSTORE_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| ConfigError::MissingEnvVar("VELOSTORE_DATABASE_URL".to_owned()))
}

/// Parse an optional environment variable, falling back to `default` when
/// the variable is unset.
fn parsed_env<T: FromStr>(key: &str, default: T) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .parse()
            .map_err(|e: T::Err| ConfigError::InvalidEnvVar(key.to_owned(), e.to_string())),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn test_config() -> StorefrontConfig {
        StorefrontConfig {
            database_url: SecretString::from("postgres://localhost/velostore_test"),
            host: "127.0.0.1".parse().unwrap(),
            port: 4000,
            auth_token_ttl_days: 7,
            sentry_dsn: None,
            sentry_environment: None,
        }
    }

    #[test]
    fn test_socket_addr() {
        let addr = test_config().socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 4000);
    }

    #[test]
    fn test_token_ttl() {
        assert_eq!(test_config().token_ttl(), Duration::days(7));
    }
}
