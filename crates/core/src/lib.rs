//! Domain types and rules shared by the ChefBot client crates.
//!
//! Everything here is free of I/O: recipe and user models, device
//! identity generation, persisted storage keys, endpoint paths, input
//! validation, and classification of backend error responses.

pub mod api_error;
pub mod auth;
pub mod credentials;
pub mod device;
pub mod endpoints;
pub mod error;
pub mod recipe;
pub mod storage_keys;
pub mod types;
pub mod user;
