//! User and bearer-token repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use velostore_core::{Email, UserId};

use super::RepositoryError;
use crate::models::user::{CurrentUser, User};

/// Repository for user accounts and their bearer tokens.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

/// Parameters for creating a user.
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub email: Email,
    pub delivery_address: String,
    pub phone: String,
    pub password_hash: String,
}

/// Partial profile update; `None` fields are left unchanged.
#[derive(Debug, Default)]
pub struct ProfileUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<Email>,
    pub delivery_address: Option<String>,
    pub phone: Option<String>,
}

impl ProfileUpdate {
    /// Whether the update carries at least one recognized field.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.first_name.is_none()
            && self.last_name.is_none()
            && self.email.is_none()
            && self.delivery_address.is_none()
            && self.phone.is_none()
    }
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    first_name: String,
    last_name: String,
    email: String,
    delivery_address: String,
    phone: String,
    is_admin: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        Ok(Self {
            id: UserId::new(row.id),
            first_name: row.first_name,
            last_name: row.last_name,
            email,
            delivery_address: row.delivery_address,
            phone: row.phone,
            is_admin: row.is_admin,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const USER_COLUMNS: &str = "id, first_name, last_name, email, delivery_address, phone, \
     is_admin, created_at, updated_at";

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Create a new user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email already exists.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(&self, user: NewUser) -> Result<User, RepositoryError> {
        let row: UserRow = sqlx::query_as(&format!(
            "INSERT INTO users \
             (first_name, last_name, email, delivery_address, phone, password_hash) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.email)
        .bind(&user.delivery_address)
        .bind(&user.phone)
        .bind(&user.password_hash)
        .fetch_one(self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return RepositoryError::Conflict("email already exists".to_owned());
            }
            RepositoryError::Database(e)
        })?;

        User::try_from(row)
    }

    /// Get a user by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let row: Option<UserRow> =
            sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
                .bind(id.as_uuid())
                .fetch_optional(self.pool)
                .await?;

        row.map(User::try_from).transpose()
    }

    /// Get a user with their password hash by email.
    ///
    /// Returns `None` if no user has this email.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_with_password_hash(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        let row: Option<(Uuid, String)> =
            sqlx::query_as("SELECT id, password_hash FROM users WHERE email = $1")
                .bind(email)
                .fetch_optional(self.pool)
                .await?;

        let Some((id, password_hash)) = row else {
            return Ok(None);
        };

        let user = self
            .get_by_id(UserId::new(id))
            .await?
            .ok_or(RepositoryError::NotFound)?;

        Ok(Some((user, password_hash)))
    }

    /// Whether another user already owns this email.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn email_taken_by_other(
        &self,
        email: &Email,
        user_id: UserId,
    ) -> Result<bool, RepositoryError> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE email = $1 AND id <> $2")
                .bind(email)
                .bind(user_id.as_uuid())
                .fetch_one(self.pool)
                .await?;

        Ok(count > 0)
    }

    /// Apply a partial profile update and return the updated user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user does not exist.
    /// Returns `RepositoryError::Conflict` if the new email is taken.
    pub async fn update_profile(
        &self,
        id: UserId,
        update: ProfileUpdate,
    ) -> Result<User, RepositoryError> {
        let row: Option<UserRow> = sqlx::query_as(&format!(
            "UPDATE users SET \
               first_name = COALESCE($2, first_name), \
               last_name = COALESCE($3, last_name), \
               email = COALESCE($4, email), \
               delivery_address = COALESCE($5, delivery_address), \
               phone = COALESCE($6, phone), \
               updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(id.as_uuid())
        .bind(update.first_name)
        .bind(update.last_name)
        .bind(update.email)
        .bind(update.delivery_address)
        .bind(update.phone)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return RepositoryError::Conflict("email already exists".to_owned());
            }
            RepositoryError::Database(e)
        })?;

        row.map_or(Err(RepositoryError::NotFound), User::try_from)
    }

    // =========================================================================
    // Bearer tokens
    // =========================================================================

    /// Store a bearer token for a user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create_token(
        &self,
        user_id: UserId,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        sqlx::query("INSERT INTO auth_tokens (token, user_id, expires_at) VALUES ($1, $2, $3)")
            .bind(token)
            .bind(user_id.as_uuid())
            .bind(expires_at)
            .execute(self.pool)
            .await?;

        Ok(())
    }

    /// Resolve an unexpired bearer token to the calling identity.
    ///
    /// Returns `None` for unknown or expired tokens.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn resolve_token(&self, token: &str) -> Result<Option<CurrentUser>, RepositoryError> {
        let row: Option<(Uuid, String, bool)> = sqlx::query_as(
            "SELECT u.id, u.email, u.is_admin \
             FROM auth_tokens t JOIN users u ON u.id = t.user_id \
             WHERE t.token = $1 AND t.expires_at > NOW()",
        )
        .bind(token)
        .fetch_optional(self.pool)
        .await?;

        row.map(|(id, email, is_admin)| {
            let email = Email::parse(&email).map_err(|e| {
                RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
            })?;
            Ok(CurrentUser {
                id: UserId::new(id),
                email,
                is_admin,
            })
        })
        .transpose()
    }
}
