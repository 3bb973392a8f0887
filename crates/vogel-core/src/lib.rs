//! vogel-core: shared error type and configuration.
//!
//! This crate is the foundational dependency for the other vogel-* crates,
//! providing a unified error type with HTTP status mapping and the
//! application configuration.

pub mod config;
pub mod error;

// Re-export the most commonly used items at the crate root.
pub use error::{Error, Result};
