//! Velostore Core - Shared types library.
//!
//! This crate provides common types used across all Velostore components:
//! - `storefront` - Public JSON API serving the single-page client
//! - `cli` - Command-line tools for migrations and seeding
//!
//! # Architecture
//!
//! The core crate contains only types and pure helpers - no I/O, no database
//! access, no HTTP clients. This keeps it lightweight and allows it to be
//! used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, emails, money rounding,
//!   and the closed-set enums of the order domain

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
