//! User profile route handlers.

use axum::{Json, extract::State};
use serde::Deserialize;
use tracing::instrument;

use velostore_core::Email;

use crate::db::users::ProfileUpdate;
use crate::error::{ApiError, Result};
use crate::middleware::RequireAuth;
use crate::models::user::UserProfile;
use crate::services::auth::AuthError;
use crate::state::AppState;

/// Partial profile update body; absent fields are left unchanged.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub delivery_address: Option<String>,
    pub phone: Option<String>,
}

/// GET /users/me - the caller's profile.
#[instrument(skip(state, caller))]
pub async fn me(
    State(state): State<AppState>,
    RequireAuth(caller): RequireAuth,
) -> Result<Json<UserProfile>> {
    let user = state.auth().me(caller.id).await?;
    Ok(Json(UserProfile::from(&user)))
}

/// PUT /users/me - partial profile update.
#[instrument(skip(state, caller, request))]
pub async fn update_me(
    State(state): State<AppState>,
    RequireAuth(caller): RequireAuth,
    request: Option<Json<UpdateProfileRequest>>,
) -> Result<Json<UserProfile>> {
    let request = request.map(|Json(r)| r).unwrap_or_default();

    let email = request
        .email
        .as_deref()
        .map(Email::parse)
        .transpose()
        .map_err(|e| ApiError::Auth(AuthError::ProfileEmailInvalid(e)))?;

    let update = ProfileUpdate {
        first_name: request.first_name.map(|s| s.trim().to_owned()),
        last_name: request.last_name.map(|s| s.trim().to_owned()),
        email,
        delivery_address: request.delivery_address.map(|s| s.trim().to_owned()),
        phone: request.phone.map(|s| s.trim().to_owned()),
    };

    let user = state.auth().update_profile(caller.id, update).await?;
    Ok(Json(UserProfile::from(&user)))
}
