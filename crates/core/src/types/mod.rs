//! Core types for Folio.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod slug;
pub mod tags;

pub use email::{Email, EmailError};
pub use id::*;
pub use slug::{Slug, SlugError};
pub use tags::{join_tags, parse_tags};
