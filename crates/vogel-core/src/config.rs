//! Application configuration types.
//!
//! The top-level [`Config`] struct is deserialized from JSON and carries the
//! server, storage, upload, auth and image sub-configs. Every section
//! defaults sensibly so a completely empty `{}` file is valid. Environment
//! variables are layered on top by [`Config::apply_env`].

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::Error;

/// Edit key used when neither the config file nor `EDIT_LINK_KEY` sets one.
pub const DEFAULT_EDIT_KEY: &str = "default_edit_key";

// ---------------------------------------------------------------------------
// Top-level Config
// ---------------------------------------------------------------------------

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub uploads: UploadConfig,
    pub auth: AuthConfig,
    pub images: ImageConfig,
}

impl Config {
    /// Deserialize a `Config` from a JSON string.
    pub fn from_json(json_str: &str) -> Result<Self> {
        serde_json::from_str(json_str)
            .map_err(|e| Error::Validation(format!("config parse error: {e}")))
    }

    /// Load configuration from a file path, falling back to defaults if the
    /// path is `None` or the file does not exist.
    pub fn load_or_default(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            return Self::default();
        };

        match std::fs::read_to_string(path) {
            Ok(contents) => Self::from_json(&contents).unwrap_or_else(|e| {
                tracing::warn!("Failed to parse config file {}: {e}", path.display());
                Self::default()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("No config file at {}; using defaults", path.display());
                Self::default()
            }
            Err(e) => {
                tracing::warn!("Failed to read config file {}: {e}", path.display());
                Self::default()
            }
        }
    }

    /// Override settings from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_env_from(|key| std::env::var(key).ok());
    }

    /// Override settings from an arbitrary variable lookup.
    ///
    /// Recognised keys: `EDIT_LINK_KEY`, `VOGEL_HOST`, `VOGEL_PORT`,
    /// `VOGEL_DATA_FILE`, `VOGEL_UPLOAD_DIR`. Empty values are ignored.
    pub fn apply_env_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());

        if let Some(key) = get("EDIT_LINK_KEY") {
            self.auth.edit_key = key;
        }
        if let Some(host) = get("VOGEL_HOST") {
            self.server.host = host;
        }
        if let Some(port) = get("VOGEL_PORT") {
            match port.parse() {
                Ok(p) => self.server.port = p,
                Err(_) => tracing::warn!("Ignoring invalid VOGEL_PORT value {port:?}"),
            }
        }
        if let Some(path) = get("VOGEL_DATA_FILE") {
            self.storage.data_file = PathBuf::from(path);
        }
        if let Some(dir) = get("VOGEL_UPLOAD_DIR") {
            self.uploads.dir = PathBuf::from(dir);
        }
    }

    /// Return a list of validation warnings (non-fatal issues).
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.server.port == 0 {
            warnings.push("server.port is 0; a random port will be assigned".into());
        }

        if self.auth.edit_key.is_empty() {
            warnings.push("auth.edit_key is empty; every mutating request will fail".into());
        } else if self.auth.edit_key == DEFAULT_EDIT_KEY {
            warnings.push(
                "auth.edit_key is the built-in default; set EDIT_LINK_KEY in production".into(),
            );
        }

        if !(10..=100).contains(&self.images.default_quality) {
            warnings.push(format!(
                "images.default_quality {} is outside 10..=100",
                self.images.default_quality
            ));
        }

        if self.images.max_dimension == 0 {
            warnings.push("images.max_dimension is 0; every resize request will fail".into());
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Sub-configs
// ---------------------------------------------------------------------------

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Built frontend to serve as a fallback for unmatched routes.
    pub static_dir: Option<PathBuf>,
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 8000,
            static_dir: None,
            max_upload_bytes: 20 * 1024 * 1024,
        }
    }
}

/// JSON data file location.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub data_file: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_file: PathBuf::from("./birds.data.json"),
        }
    }
}

/// Upload and resize-cache directories.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    pub dir: PathBuf,
    /// Defaults to `<dir>/_cache` when unset.
    pub cache_dir: Option<PathBuf>,
}

impl UploadConfig {
    /// Directory holding resized image variants.
    pub fn cache_dir(&self) -> PathBuf {
        self.cache_dir
            .clone()
            .unwrap_or_else(|| self.dir.join("_cache"))
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("./uploads"),
            cache_dir: None,
        }
    }
}

/// Shared edit key settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub edit_key: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            edit_key: DEFAULT_EDIT_KEY.into(),
        }
    }
}

/// Image resize defaults and limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageConfig {
    pub default_quality: u8,
    pub max_dimension: u32,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            default_quality: 85,
            max_dimension: 4096,
        }
    }
}
