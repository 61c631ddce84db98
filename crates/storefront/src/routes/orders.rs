//! Order route handlers.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Serialize;
use serde_json::Value;
use tracing::instrument;

use velostore_core::OrderId;

use crate::error::Result;
use crate::middleware::{OptionalAuth, RequireAuth};
use crate::models::order::Order;
use crate::services::checkout;
use crate::services::orders::{self, OrderSummary};
use crate::state::AppState;

/// Response body for order creation.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderCreatedResponse {
    pub order_id: OrderId,
}

/// Response body for the order history listing.
#[derive(Debug, Serialize)]
pub struct MyOrdersResponse {
    pub orders: Vec<OrderSummary>,
}

/// POST /orders - assemble and persist an order.
///
/// Guests may order; the caller identity, when present, is snapshotted onto
/// the order and drives profile-based address resolution.
#[instrument(skip(state, caller, body))]
pub async fn create(
    State(state): State<AppState>,
    OptionalAuth(caller): OptionalAuth,
    body: Option<Json<Value>>,
) -> Result<(StatusCode, Json<OrderCreatedResponse>)> {
    let body = body.map(|Json(value)| value);

    let order_id = checkout::create_order(state.pool(), caller.as_ref(), body.as_ref()).await?;

    Ok((
        StatusCode::CREATED,
        Json(OrderCreatedResponse { order_id }),
    ))
}

/// GET /orders/my - the caller's order history, newest first, with the
/// per-line `reviewed` flag.
#[instrument(skip(state, caller))]
pub async fn my_orders(
    State(state): State<AppState>,
    RequireAuth(caller): RequireAuth,
) -> Result<Json<MyOrdersResponse>> {
    let orders = orders::list_my_orders(state.pool(), &caller).await?;
    Ok(Json(MyOrdersResponse { orders }))
}

/// GET /orders/{id} - a single order, for its owner or an administrator.
#[instrument(skip(state, caller))]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(caller): RequireAuth,
    Path(id): Path<String>,
) -> Result<Json<Order>> {
    let order = orders::get_order(state.pool(), &caller, &id).await?;
    Ok(Json(order))
}
