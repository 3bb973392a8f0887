//! Query modules for each entity type.

pub mod observations;
pub mod species;
