//! Unified error type for vogelvortrag.
//!
//! All crates funnel their failures into [`Error`], which carries enough context
//! for API handlers to derive an HTTP status code via [`Error::http_status`].

use std::fmt;

/// Unified error type covering all failure modes in vogelvortrag.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The requested entity could not be found.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// The kind of entity (e.g. "species", "observation").
        entity: String,
        /// The identifier that was looked up.
        id: String,
    },

    /// The caller supplied a wrong or missing edit key.
    #[error("Unauthorized: {0}")]
    Forbidden(String),

    /// Request data failed validation.
    #[error("{0}")]
    Validation(String),

    /// Reading, parsing or writing the data file failed.
    #[error("Storage error: {source}")]
    Storage {
        /// The underlying error.
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// An I/O operation failed.
    #[error("IO error: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Decoding, resizing or encoding an image failed.
    #[error("Image processing failed: {0}")]
    Image(String),

    /// The server is running with an unusable configuration.
    #[error("Server misconfiguration: {0}")]
    Misconfigured(String),

    /// Catch-all for unexpected internal errors.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Map this error to an appropriate HTTP status code.
    pub fn http_status(&self) -> u16 {
        match self {
            Error::NotFound { .. } => 404,
            Error::Forbidden(_) => 403,
            Error::Validation(_) => 400,
            Error::Storage { .. } => 500,
            Error::Io { .. } => 500,
            Error::Image(_) => 500,
            Error::Misconfigured(_) => 500,
            Error::Internal(_) => 500,
        }
    }

    /// Convenience constructor for [`Error::NotFound`].
    pub fn not_found(entity: impl Into<String>, id: impl fmt::Display) -> Self {
        Error::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    /// Convenience constructor for [`Error::Storage`].
    pub fn storage(source: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Error::Storage {
            source: source.into(),
        }
    }

    /// Convenience constructor for [`Error::Validation`].
    pub fn validation(msg: impl Into<String>) -> Self {
        Error::Validation(msg.into())
    }
}

/// Result alias using the crate-level [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_display() {
        let err = Error::not_found("species", "amsel");
        assert_eq!(err.to_string(), "species not found: amsel");
        assert_eq!(err.http_status(), 404);
    }

    #[test]
    fn forbidden_display() {
        let err = Error::Forbidden("invalid or missing edit key".into());
        assert_eq!(err.to_string(), "Unauthorized: invalid or missing edit key");
        assert_eq!(err.http_status(), 403);
    }

    #[test]
    fn validation_display() {
        let err = Error::validation("Path id and body id differ");
        assert_eq!(err.to_string(), "Path id and body id differ");
        assert_eq!(err.http_status(), 400);
    }

    #[test]
    fn storage_display() {
        let err = Error::storage("unexpected end of file");
        assert!(err.to_string().contains("unexpected end of file"));
        assert_eq!(err.http_status(), 500);
    }

    #[test]
    fn io_from_std() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file missing");
        let err = Error::from(io_err);
        assert!(matches!(err, Error::Io { .. }));
        assert_eq!(err.http_status(), 500);
    }

    #[test]
    fn image_display() {
        let err = Error::Image("unsupported format".into());
        assert_eq!(err.to_string(), "Image processing failed: unsupported format");
        assert_eq!(err.http_status(), 500);
    }

    #[test]
    fn misconfigured_display() {
        let err = Error::Misconfigured("missing EDIT_LINK_KEY".into());
        assert_eq!(err.to_string(), "Server misconfiguration: missing EDIT_LINK_KEY");
        assert_eq!(err.http_status(), 500);
    }
}
