//! Folio Core - Shared types library.
//!
//! This crate provides the domain types used across Folio components:
//! - `site` - Public portfolio, blog, and the admin area
//! - `cli` - Migrations and admin-flag management
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no database access,
//! no HTTP clients. Database codecs are available behind the `postgres`
//! feature.
//!
//! # Modules
//!
//! - [`types`] - Type-safe IDs, emails, slugs, and tag lists

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
