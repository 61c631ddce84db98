//! Authentication and profile service.
//!
//! Registration and login issue opaque bearer tokens; resolving a token to
//! an identity happens in the auth extractors. Anything beyond
//! issue-and-resolve (refresh, revocation, password reset) is out of scope.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{Duration, Utc};
use rand::RngCore;
use sqlx::PgPool;
use thiserror::Error;
use tracing::instrument;

use velostore_core::{Email, EmailError, UserId};

use crate::db::RepositoryError;
use crate::db::users::{NewUser, ProfileUpdate, UserRepository};
use crate::models::user::User;

/// Authentication and profile failures.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("email and password are required")]
    RegisterMissingFields,

    #[error("invalid email: {0}")]
    RegisterEmailInvalid(#[from] EmailError),

    #[error("email is already registered")]
    RegisterEmailExists,

    #[error("email and password are required")]
    LoginMissingFields,

    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("password hashing failed")]
    PasswordHash,

    #[error("user not found")]
    UserNotFound,

    #[error("no recognized profile fields in the update")]
    ProfileNoFields,

    #[error("invalid profile email: {0}")]
    ProfileEmailInvalid(EmailError),

    #[error("email is already taken by another account")]
    ProfileEmailExists,

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Registration input.
#[derive(Debug, Default)]
pub struct RegisterInput {
    pub email: Option<String>,
    pub password: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub delivery_address: Option<String>,
    pub phone: Option<String>,
}

/// Authentication service.
pub struct AuthService<'a> {
    users: UserRepository<'a>,
    token_ttl: Duration,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(pool: &'a PgPool, token_ttl: Duration) -> Self {
        Self {
            users: UserRepository::new(pool),
            token_ttl,
        }
    }

    /// Register a new user and issue a bearer token.
    ///
    /// # Errors
    ///
    /// Returns `RegisterMissingFields` without email or password,
    /// `RegisterEmailInvalid` for a malformed email, and
    /// `RegisterEmailExists` when the email is already registered.
    #[instrument(skip(self, input))]
    pub async fn register(&self, input: RegisterInput) -> Result<(String, User), AuthError> {
        let (Some(email), Some(password)) = (input.email, input.password) else {
            return Err(AuthError::RegisterMissingFields);
        };
        if password.is_empty() {
            return Err(AuthError::RegisterMissingFields);
        }
        let email = Email::parse(&email)?;

        let password_hash = hash_password(&password)?;

        let user = self
            .users
            .create(NewUser {
                first_name: input.first_name.unwrap_or_default().trim().to_owned(),
                last_name: input.last_name.unwrap_or_default().trim().to_owned(),
                email,
                delivery_address: input.delivery_address.unwrap_or_default().trim().to_owned(),
                phone: input.phone.unwrap_or_default().trim().to_owned(),
                password_hash,
            })
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::RegisterEmailExists,
                other => AuthError::Repository(other),
            })?;

        let token = self.issue_token(user.id).await?;
        Ok((token, user))
    }

    /// Login with email and password, issuing a bearer token.
    ///
    /// Unknown emails and wrong passwords return the same error so callers
    /// cannot enumerate accounts.
    ///
    /// # Errors
    ///
    /// Returns `LoginMissingFields` or `InvalidCredentials`.
    #[instrument(skip(self, email, password))]
    pub async fn login(
        &self,
        email: Option<&str>,
        password: Option<&str>,
    ) -> Result<(String, User), AuthError> {
        let (Some(email), Some(password)) = (email, password) else {
            return Err(AuthError::LoginMissingFields);
        };
        if email.is_empty() || password.is_empty() {
            return Err(AuthError::LoginMissingFields);
        }

        let email = Email::parse(email).map_err(|_| AuthError::InvalidCredentials)?;

        let (user, password_hash) = self
            .users
            .get_with_password_hash(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &password_hash)?;

        let token = self.issue_token(user.id).await?;
        Ok((token, user))
    }

    /// Load the caller's profile.
    ///
    /// # Errors
    ///
    /// Returns `UserNotFound` when the account no longer exists.
    pub async fn me(&self, user_id: UserId) -> Result<User, AuthError> {
        self.users
            .get_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)
    }

    /// Apply a partial profile update.
    ///
    /// # Errors
    ///
    /// Returns `ProfileNoFields` for an empty update and
    /// `ProfileEmailExists` when the new email belongs to another account.
    #[instrument(skip(self, update), fields(user_id = %user_id))]
    pub async fn update_profile(
        &self,
        user_id: UserId,
        update: ProfileUpdate,
    ) -> Result<User, AuthError> {
        if update.is_empty() {
            return Err(AuthError::ProfileNoFields);
        }

        if let Some(ref email) = update.email
            && self.users.email_taken_by_other(email, user_id).await?
        {
            return Err(AuthError::ProfileEmailExists);
        }

        self.users
            .update_profile(user_id, update)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => AuthError::UserNotFound,
                RepositoryError::Conflict(_) => AuthError::ProfileEmailExists,
                other => AuthError::Repository(other),
            })
    }

    /// Generate and store a fresh bearer token for the user.
    async fn issue_token(&self, user_id: UserId) -> Result<String, AuthError> {
        let token = generate_token();
        let expires_at = Utc::now() + self.token_ttl;
        self.users
            .create_token(user_id, &token, expires_at)
            .await?;
        Ok(token)
    }
}

/// Generate an opaque bearer token (256 random bits, base64url).
fn generate_token() -> String {
    let mut bytes = [0u8; 32];
    rand::rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Hash a password using Argon2id.
fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a stored Argon2 hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .map_err(|_| AuthError::InvalidCredentials)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_password_hash_round_trip() {
        let hash = hash_password("correct horse battery staple").unwrap();
        assert!(verify_password("correct horse battery staple", &hash).is_ok());
        assert!(matches!(
            verify_password("wrong password", &hash),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_hashes_are_salted() {
        let a = hash_password("same password").unwrap();
        let b = hash_password("same password").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_generated_tokens_are_unique_and_url_safe() {
        let a = generate_token();
        let b = generate_token();
        assert_ne!(a, b);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
        // 32 bytes -> 43 base64url chars without padding
        assert_eq!(a.len(), 43);
    }
}
