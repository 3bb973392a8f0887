//! Application context shared by all request handlers.

use std::sync::Arc;

use vogel_core::config::Config;
use vogel_store::JsonStore;

use crate::images::ImageStore;

/// Shared handler state (via Axum state).
///
/// Cheaply cloneable because it only holds `Arc`s.
#[derive(Clone)]
pub struct AppContext {
    /// Species and observations.
    pub store: Arc<JsonStore>,
    /// Immutable configuration snapshot.
    pub config: Arc<Config>,
    /// Uploaded originals and resized derivatives.
    pub images: Arc<ImageStore>,
}

impl AppContext {
    pub fn new(config: Config, store: JsonStore) -> Self {
        let images = ImageStore::new(config.uploads.dir.clone(), config.uploads.cache_dir());
        Self {
            store: Arc::new(store),
            config: Arc::new(config),
            images: Arc::new(images),
        }
    }
}
