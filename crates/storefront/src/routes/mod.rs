//! HTTP route handlers for the storefront API.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                 - Liveness check
//! GET  /health/ready           - Readiness check (verifies database)
//!
//! # Cart
//! POST /cart/price             - Authoritative cart pricing
//!
//! # Orders
//! POST /orders                 - Create an order (guest or authenticated)
//! GET  /orders/my              - Caller's order history with review flags
//! GET  /orders/{id}            - Single order (owner or admin)
//!
//! # Catalog
//! GET  /products               - Product listing (optional ?type= filter)
//! GET  /products/{id}          - Product detail
//! GET  /products/{id}/variants - Variants of a product
//! GET  /products/{id}/reviews  - Reviews of a product
//! POST /products/{id}/reviews  - Submit a review (auth)
//!
//! # Auth & profile
//! POST /auth/register          - Create an account, issue a bearer token
//! POST /auth/login             - Issue a bearer token
//! GET  /users/me               - Caller's profile
//! PUT  /users/me               - Partial profile update
//! ```

pub mod auth;
pub mod cart;
pub mod health;
pub mod orders;
pub mod products;
pub mod users;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new().route("/price", post(cart::price))
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(orders::create))
        .route("/my", get(orders::my_orders))
        .route("/{id}", get(orders::show))
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/{id}", get(products::show))
        .route("/{id}/variants", get(products::variants))
        .route(
            "/{id}/reviews",
            get(products::reviews).post(products::create_review),
        )
}

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
}

/// Create the user profile routes router.
pub fn user_routes() -> Router<AppState> {
    Router::new().route("/me", get(users::me).put(users::update_me))
}

/// Create all routes for the storefront API.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::live))
        .route("/health/ready", get(health::ready))
        .nest("/cart", cart_routes())
        .nest("/orders", order_routes())
        .nest("/products", product_routes())
        .nest("/auth", auth_routes())
        .nest("/users", user_routes())
}
