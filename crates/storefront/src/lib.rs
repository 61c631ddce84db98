//! Velostore Storefront library.
//!
//! The storefront API as a library, so the router can be assembled in tests
//! without binding a socket.

#![cfg_attr(not(test), forbid(unsafe_code))]

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;

use state::AppState;

/// Assemble the full application router.
///
/// CORS is permissive: the single-page client is served from another
/// origin. The Sentry tower layers sit outermost so they observe every
/// request, including ones rejected by inner layers.
pub fn app(state: AppState) -> Router {
    routes::routes()
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
}
