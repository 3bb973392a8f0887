//! Upload directory and derived-image cache on disk.

use std::path::{Path, PathBuf};

use uuid::Uuid;
use vogel_core::{Error, Result};

use super::encode;
use super::params::{OutputFormat, ResizeParams};

/// Result of [`ImageStore::render`].
#[derive(Debug)]
pub enum Rendered {
    /// Served from an existing cache file.
    Cached { path: PathBuf, format: OutputFormat },
    /// Freshly produced (and written to the cache).
    Fresh { bytes: Vec<u8>, format: OutputFormat },
}

/// Uploaded originals plus their resized derivatives.
#[derive(Debug, Clone)]
pub struct ImageStore {
    upload_dir: PathBuf,
    cache_dir: PathBuf,
}

impl ImageStore {
    pub fn new(upload_dir: impl Into<PathBuf>, cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            upload_dir: upload_dir.into(),
            cache_dir: cache_dir.into(),
        }
    }

    pub fn upload_dir(&self) -> &Path {
        &self.upload_dir
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Create the upload and cache directories if missing.
    pub fn ensure_dirs(&self) -> Result<()> {
        std::fs::create_dir_all(&self.upload_dir)?;
        std::fs::create_dir_all(&self.cache_dir)?;
        Ok(())
    }

    /// Persist uploaded bytes under a fresh random name, keeping the
    /// original extension. Returns the stored filename.
    pub fn store_upload(&self, original_name: &str, data: &[u8]) -> Result<String> {
        let name = format!("{}{}", Uuid::new_v4().simple(), upload_suffix(original_name));
        std::fs::create_dir_all(&self.upload_dir)?;
        std::fs::write(self.upload_dir.join(&name), data)?;
        tracing::info!(file = %name, bytes = data.len(), "Image uploaded");
        Ok(name)
    }

    /// Resolve an uploaded file by name.
    ///
    /// Names that could escape the upload directory are rejected with a
    /// validation error; names that do not refer to a file are not found.
    pub fn source_path(&self, filename: &str) -> Result<PathBuf> {
        if !is_safe_filename(filename) {
            return Err(Error::validation(format!("Invalid image filename '{filename}'")));
        }
        let path = self.upload_dir.join(filename);
        if !path.is_file() {
            return Err(Error::not_found("Image", filename));
        }
        Ok(path)
    }

    /// Produce the derivative of `filename` described by `params`, reusing
    /// the cache file when present.
    ///
    /// Blocking: call from `spawn_blocking`.
    pub fn render(&self, filename: &str, params: &ResizeParams) -> Result<Rendered> {
        let source = self.source_path(filename)?;
        let format = params.output_format(filename);
        let cached = self.cached_path(&params.cache_key(filename), format);

        if cached.is_file() {
            tracing::debug!(file = %filename, cache = %cached.display(), "Image cache hit");
            return Ok(Rendered::Cached { path: cached, format });
        }

        let original = std::fs::read(&source)?;
        let bytes = encode::render(&original, params, format)?;

        if let Err(e) = write_atomic(&cached, &bytes) {
            // The response can still be served; the next request retries.
            tracing::warn!(cache = %cached.display(), "Failed to write image cache: {e}");
        } else {
            tracing::debug!(file = %filename, cache = %cached.display(), "Image cached");
        }

        Ok(Rendered::Fresh { bytes, format })
    }

    /// Cache file for a key and output format.
    pub fn cached_path(&self, key: &str, format: OutputFormat) -> PathBuf {
        self.cache_dir.join(format!("{key}.{}", format.extension()))
    }

    /// Delete every cached derivative. Returns the number of files removed.
    pub fn clear_cache(&self) -> Result<usize> {
        let entries = match std::fs::read_dir(&self.cache_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e.into()),
        };

        let mut removed = 0;
        for entry in entries {
            let path = entry?.path();
            if path.is_file() {
                std::fs::remove_file(&path)?;
                removed += 1;
            }
        }
        Ok(removed)
    }

    /// Number of uploaded originals (files directly in the upload dir).
    pub fn upload_count(&self) -> Result<usize> {
        count_files(&self.upload_dir)
    }

    /// Number of cached derivatives.
    pub fn cache_count(&self) -> Result<usize> {
        count_files(&self.cache_dir)
    }
}

/// Extension of the client-supplied name, including the dot, if it is
/// short and alphanumeric. Anything else is dropped.
fn upload_suffix(original_name: &str) -> String {
    Path::new(original_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty() && ext.len() <= 10)
        .filter(|ext| ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|ext| format!(".{ext}"))
        .unwrap_or_default()
}

/// A single path component of safe ASCII characters, not hidden.
fn is_safe_filename(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= 255
        && !name.starts_with('.')
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

/// Write to a unique temporary sibling and rename into place, so concurrent
/// renders of the same key never expose a partial file.
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(format!(".{}.tmp", Uuid::new_v4().simple()));
    let tmp = PathBuf::from(tmp);

    std::fs::write(&tmp, bytes)?;
    if let Err(e) = std::fs::rename(&tmp, path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(e.into());
    }
    Ok(())
}

fn count_files(dir: &Path) -> Result<usize> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(e.into()),
    };
    let mut count = 0;
    for entry in entries {
        if entry?.path().is_file() {
            count += 1;
        }
    }
    Ok(count)
}
