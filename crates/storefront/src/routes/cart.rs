//! Cart route handlers.

use axum::{Json, extract::State};
use serde_json::Value;
use tracing::instrument;

use crate::error::Result;
use crate::services::pricing::{self, CartPriceResult};
use crate::state::AppState;

/// POST /cart/price - authoritative cart pricing.
///
/// The body is taken as raw JSON so the pricing engine owns every
/// validation error code, including "items missing entirely".
#[instrument(skip(state, body))]
pub async fn price(
    State(state): State<AppState>,
    body: Option<Json<Value>>,
) -> Result<Json<CartPriceResult>> {
    let body = body.map(|Json(value)| value);
    let items = body.as_ref().and_then(|value| value.get("items"));

    let result = pricing::price_cart(state.pool(), items).await?;
    Ok(Json(result))
}
