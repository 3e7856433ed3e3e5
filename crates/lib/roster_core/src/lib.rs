//! # roster_core
//!
//! Core domain logic for Roster: password hashing, bearer tokens, the access
//! policy and the credential store.

pub mod auth;
pub mod migrate;
pub mod models;
pub mod seed;
pub mod store;
pub mod uuid;
pub mod validation;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
