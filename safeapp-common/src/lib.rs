//! # SafeApp Common Library
//!
//! Shared code for the SafeApp dashboard crates:
//! - Error taxonomy (transport, validation, permission)
//! - Configuration loading (TOML + environment + defaults)
//! - Response normalization for webhook payloads

pub mod config;
pub mod error;
pub mod normalize;

pub use error::{Error, Result};
pub use normalize::{normalize, CanonicalRow, ResponseShape};
