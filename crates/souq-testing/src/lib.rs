//! Test utilities for Souq services.
//!
//! Import from `[dev-dependencies]` only.

pub mod auth;
