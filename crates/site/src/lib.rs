//! Folio site library.
//!
//! This crate provides the portfolio site as a library, allowing the router
//! to be tested in-process and the CLI to reuse its repositories.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod filters;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;

#[cfg(test)]
mod testing;
