//! Auth route handlers.

use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::error::Result;
use crate::models::user::UserProfile;
use crate::services::auth::RegisterInput;
use crate::state::AppState;

/// Registration request body.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub delivery_address: Option<String>,
    pub phone: Option<String>,
}

/// Login request body.
#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Token plus profile, returned by both register and login.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserProfile,
}

/// POST /auth/register - create an account and issue a bearer token.
#[instrument(skip(state, request))]
pub async fn register(
    State(state): State<AppState>,
    request: Option<Json<RegisterRequest>>,
) -> Result<(StatusCode, Json<AuthResponse>)> {
    let request = request.map(|Json(r)| r).unwrap_or_default();

    let (token, user) = state
        .auth()
        .register(RegisterInput {
            email: request.email,
            password: request.password,
            first_name: request.first_name,
            last_name: request.last_name,
            delivery_address: request.delivery_address,
            phone: request.phone,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            token,
            user: UserProfile::from(&user),
        }),
    ))
}

/// POST /auth/login - issue a bearer token.
#[instrument(skip(state, request))]
pub async fn login(
    State(state): State<AppState>,
    request: Option<Json<LoginRequest>>,
) -> Result<Json<AuthResponse>> {
    let request = request.map(|Json(r)| r).unwrap_or_default();

    let (token, user) = state
        .auth()
        .login(request.email.as_deref(), request.password.as_deref())
        .await?;

    Ok(Json(AuthResponse {
        token,
        user: UserProfile::from(&user),
    }))
}
