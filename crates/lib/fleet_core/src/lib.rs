//! # fleet_core
//!
//! Core auth domain logic for the fleet platform.

pub mod auth;
pub mod db;
pub mod migrate;
pub mod models;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
