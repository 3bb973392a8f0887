//! vogel-store: models and persistence.
//!
//! This crate provides the species and observation models, a single-file
//! JSON store with atomic saves, and query modules that implement the
//! CRUD operations on top of it.

pub mod models;
pub mod queries;
pub mod store;

pub use store::{Database, JsonStore};
