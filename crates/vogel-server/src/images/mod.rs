//! Uploaded images and on-demand resized derivatives.

pub mod encode;
pub mod params;
pub mod store;

pub use params::{ImageQuery, OutputFormat, ResizeParams};
pub use store::{ImageStore, Rendered};
