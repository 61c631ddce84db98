//! Authentication extractors.
//!
//! Identity is a per-request resolved value: the extractors read the
//! `Authorization: Bearer <token>` header, look the token up in the store,
//! and hand the resolved [`CurrentUser`] to the handler. There is no
//! ambient "current user" state anywhere else.

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};

use crate::db::users::UserRepository;
use crate::error::ApiError;
use crate::models::user::CurrentUser;
use crate::state::AppState;

/// Extractor that requires an authenticated caller.
///
/// Rejects with `AUTH_REQUIRED` (401) when the header is missing or the
/// token does not resolve to an unexpired identity.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAuth(caller): RequireAuth,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", caller.email)
/// }
/// ```
pub struct RequireAuth(pub CurrentUser);

impl FromRequestParts<AppState> for RequireAuth {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        match resolve_bearer(parts, state).await? {
            Some(caller) => Ok(Self(caller)),
            None => Err(ApiError::AuthRequired),
        }
    }
}

/// Extractor that optionally resolves the caller.
///
/// Unlike [`RequireAuth`] this never rejects: a missing or invalid token
/// means the request proceeds as a guest.
pub struct OptionalAuth(pub Option<CurrentUser>);

impl FromRequestParts<AppState> for OptionalAuth {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let caller = match resolve_bearer(parts, state).await {
            Ok(caller) => caller,
            Err(e) => {
                // A guest flow must not fail because identity resolution
                // did; log and continue anonymous.
                tracing::warn!(error = %e, "optional auth resolution failed");
                None
            }
        };

        Ok(Self(caller))
    }
}

/// Resolve the bearer token in the request, if any.
async fn resolve_bearer(
    parts: &Parts,
    state: &AppState,
) -> Result<Option<CurrentUser>, ApiError> {
    let Some(header) = parts.headers.get(header::AUTHORIZATION) else {
        return Ok(None);
    };
    let Ok(value) = header.to_str() else {
        return Ok(None);
    };
    let Some(token) = value.strip_prefix("Bearer ") else {
        return Ok(None);
    };

    let caller = UserRepository::new(state.pool()).resolve_token(token).await?;
    Ok(caller)
}
