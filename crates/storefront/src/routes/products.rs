//! Catalog route handlers.
//!
//! Read-only product endpoints plus review submission. Admin CRUD on the
//! catalog is out of scope; the seed command populates it.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use serde_json::Value;
use tracing::instrument;

use velostore_core::{ProductId, ProductType};

use crate::error::{ApiError, Result};
use crate::db::catalog::ProductRepository;
use crate::middleware::RequireAuth;
use crate::models::product::{Product, ProductVariant};
use crate::models::review::Review;
use crate::services::reviews;
use crate::state::AppState;

/// Query parameters for the product listing.
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    /// Optional filter over the closed product type set; unknown values
    /// simply match nothing rather than erroring.
    #[serde(rename = "type")]
    pub product_type: Option<String>,
}

/// GET /products - product listing.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Product>>> {
    let product_type = query.product_type.as_deref().and_then(ProductType::parse);

    let products = ProductRepository::new(state.pool())
        .list(product_type)
        .await?;
    Ok(Json(products))
}

/// GET /products/{id} - product detail.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Product>> {
    let id = parse_product_id(&id)?;

    let product = ProductRepository::new(state.pool())
        .get_by_id(id)
        .await?
        .ok_or(ApiError::ProductNotFound)?;
    Ok(Json(product))
}

/// GET /products/{id}/variants - variants of a product.
#[instrument(skip(state))]
pub async fn variants(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<ProductVariant>>> {
    let id = parse_product_id(&id)?;
    let repo = ProductRepository::new(state.pool());

    repo.get_by_id(id).await?.ok_or(ApiError::ProductNotFound)?;

    let variants = repo.variants_for_product(id).await?;
    Ok(Json(variants))
}

/// GET /products/{id}/reviews - reviews of a product, newest first.
#[instrument(skip(state))]
pub async fn reviews(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<Review>>> {
    let reviews = reviews::list_reviews(state.pool(), &id).await?;
    Ok(Json(reviews))
}

/// POST /products/{id}/reviews - submit a review (auth required).
#[instrument(skip(state, caller, body))]
pub async fn create_review(
    State(state): State<AppState>,
    RequireAuth(caller): RequireAuth,
    Path(id): Path<String>,
    body: Option<Json<Value>>,
) -> Result<(StatusCode, Json<Review>)> {
    let body = body.map(|Json(value)| value);

    let review = reviews::create_review(state.pool(), &caller, &id, body.as_ref()).await?;
    Ok((StatusCode::CREATED, Json(review)))
}

fn parse_product_id(raw: &str) -> Result<ProductId> {
    ProductId::parse(raw).map_err(|_| ApiError::InvalidProductId)
}
