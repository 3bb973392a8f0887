//! Resize request parameters, output formats and cache-key derivation.

use serde::Deserialize;
use sha2::{Digest, Sha256};
use vogel_core::config::ImageConfig;
use vogel_core::{Error, Result};

/// Encodable output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputFormat {
    Jpeg,
    Png,
    WebP,
    Gif,
}

impl OutputFormat {
    /// Parse a `fmt` query value or a file extension (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "png" => Some(Self::Png),
            "webp" => Some(Self::WebP),
            "gif" => Some(Self::Gif),
            _ => None,
        }
    }

    /// Format implied by a filename's extension, if encodable.
    pub fn from_filename(filename: &str) -> Option<Self> {
        std::path::Path::new(filename)
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::parse)
    }

    /// Extension used for cache files.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
            Self::WebP => "webp",
            Self::Gif => "gif",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::WebP => "image/webp",
            Self::Gif => "image/gif",
        }
    }
}

/// Raw query string of `GET /image/{filename}`.
#[derive(Debug, Default, Deserialize)]
pub struct ImageQuery {
    pub w: Option<u32>,
    pub h: Option<u32>,
    pub q: Option<u32>,
    pub fmt: Option<String>,
}

/// Validated resize request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResizeParams {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub quality: u8,
    /// Explicitly requested format; `None` keeps the source format.
    pub format: Option<OutputFormat>,
    /// Upper bound for either output side, including a derived one.
    pub max_dimension: u32,
}

impl ResizeParams {
    /// Validate query values against the configured limits.
    pub fn from_query(query: &ImageQuery, limits: &ImageConfig) -> Result<Self> {
        let max = limits.max_dimension;
        for (name, value) in [("w", query.w), ("h", query.h)] {
            if let Some(v) = value {
                if v < 1 || v > max {
                    return Err(Error::validation(format!(
                        "{name} must be between 1 and {max}, got {v}"
                    )));
                }
            }
        }

        let quality = query.q.unwrap_or(u32::from(limits.default_quality));
        if !(10..=100).contains(&quality) {
            return Err(Error::validation(format!(
                "q must be between 10 and 100, got {quality}"
            )));
        }

        let format = match query.fmt.as_deref() {
            None => None,
            Some(raw) => Some(OutputFormat::parse(raw).ok_or_else(|| {
                Error::validation(format!(
                    "Unsupported fmt '{raw}'. Valid values: jpg, jpeg, png, webp, gif"
                ))
            })?),
        };

        Ok(Self {
            width: query.w,
            height: query.h,
            // Range-checked above.
            quality: quality as u8,
            format,
            max_dimension: max,
        })
    }

    /// No resizing and no conversion requested: serve the original.
    pub fn is_passthrough(&self) -> bool {
        self.width.is_none() && self.height.is_none() && self.format.is_none()
    }

    /// Output format for a given source file: the requested one, else the
    /// source's own (when encodable), else JPEG.
    pub fn output_format(&self, filename: &str) -> OutputFormat {
        self.format
            .or_else(|| OutputFormat::from_filename(filename))
            .unwrap_or(OutputFormat::Jpeg)
    }

    /// Deterministic cache key: first 16 hex chars of SHA-256 over the
    /// filename and every parameter.
    pub fn cache_key(&self, filename: &str) -> String {
        let render = |v: Option<u32>| v.map_or_else(|| "none".to_string(), |v| v.to_string());
        let key_data = format!(
            "{filename}|w={}|h={}|q={}|fmt={}",
            render(self.width),
            render(self.height),
            self.quality,
            self.format.map_or("none", |f| f.extension()),
        );

        let digest = Sha256::digest(key_data.as_bytes());
        hex::encode(&digest[..8])
    }

    /// Target size for a source of `orig_w` x `orig_h`.
    ///
    /// A single dimension scales the other one proportionally (rounded
    /// down); both dimensions are used as given; neither keeps the original.
    /// A derived side never exceeds `max_dimension`.
    pub fn target_dimensions(&self, orig_w: u32, orig_h: u32) -> (u32, u32) {
        let max = u64::from(self.max_dimension.max(1));
        let scale = |value: u32, num: u32, den: u32| -> u32 {
            if den == 0 {
                return 1;
            }
            let scaled = (u64::from(value) * u64::from(num) / u64::from(den)).clamp(1, max);
            u32::try_from(scaled).unwrap_or(u32::MAX)
        };

        match (self.width, self.height) {
            (Some(w), Some(h)) => (w, h),
            (Some(w), None) => (w, scale(orig_h, w, orig_w)),
            (None, Some(h)) => (scale(orig_w, h, orig_h), h),
            (None, None) => (orig_w.max(1), orig_h.max(1)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(w: Option<u32>, h: Option<u32>, fmt: Option<&str>) -> ResizeParams {
        let query = ImageQuery {
            w,
            h,
            q: None,
            fmt: fmt.map(String::from),
        };
        ResizeParams::from_query(&query, &ImageConfig::default()).unwrap()
    }

    #[test]
    fn defaults_quality_from_config() {
        let p = params(Some(100), None, None);
        assert_eq!(p.quality, 85);
        assert!(!p.is_passthrough());
    }

    #[test]
    fn no_params_is_passthrough() {
        assert!(params(None, None, None).is_passthrough());
        assert!(!params(None, None, Some("webp")).is_passthrough());
    }

    #[test]
    fn rejects_out_of_range_values() {
        let limits = ImageConfig::default();
        let too_wide = ImageQuery {
            w: Some(4097),
            ..Default::default()
        };
        assert!(ResizeParams::from_query(&too_wide, &limits).is_err());

        let zero = ImageQuery {
            h: Some(0),
            ..Default::default()
        };
        assert!(ResizeParams::from_query(&zero, &limits).is_err());

        let low_quality = ImageQuery {
            w: Some(10),
            q: Some(9),
            ..Default::default()
        };
        assert!(ResizeParams::from_query(&low_quality, &limits).is_err());

        let bad_fmt = ImageQuery {
            fmt: Some("tiff".into()),
            ..Default::default()
        };
        let err = ResizeParams::from_query(&bad_fmt, &limits).unwrap_err();
        assert!(err.to_string().contains("tiff"));
    }

    #[test]
    fn format_aliases() {
        assert_eq!(OutputFormat::parse("JPG"), Some(OutputFormat::Jpeg));
        assert_eq!(OutputFormat::parse("jpeg"), Some(OutputFormat::Jpeg));
        assert_eq!(OutputFormat::parse("WebP"), Some(OutputFormat::WebP));
        assert_eq!(OutputFormat::parse("bmp"), None);
    }

    #[test]
    fn output_format_negotiation() {
        assert_eq!(
            params(Some(10), None, Some("webp")).output_format("a.png"),
            OutputFormat::WebP
        );
        assert_eq!(params(Some(10), None, None).output_format("a.PNG"), OutputFormat::Png);
        assert_eq!(params(Some(10), None, None).output_format("a.bmp"), OutputFormat::Jpeg);
        assert_eq!(params(Some(10), None, None).output_format("noext"), OutputFormat::Jpeg);
    }

    #[test]
    fn cache_key_is_deterministic_and_parameter_sensitive() {
        let a = params(Some(300), None, None);
        let key = a.cache_key("bird.jpg");
        assert_eq!(key.len(), 16);
        assert!(key.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(key, params(Some(300), None, None).cache_key("bird.jpg"));

        assert_ne!(key, a.cache_key("other.jpg"));
        assert_ne!(key, params(Some(301), None, None).cache_key("bird.jpg"));
        assert_ne!(key, params(None, Some(300), None).cache_key("bird.jpg"));
        assert_ne!(key, params(Some(300), None, Some("png")).cache_key("bird.jpg"));
    }

    #[test]
    fn jpg_and_jpeg_share_a_cache_key() {
        assert_eq!(
            params(Some(50), None, Some("jpg")).cache_key("x.png"),
            params(Some(50), None, Some("jpeg")).cache_key("x.png"),
        );
    }

    #[test]
    fn width_only_preserves_aspect_ratio() {
        assert_eq!(params(Some(400), None, None).target_dimensions(800, 600), (400, 300));
        // 333 * 600 / 800 = 249.75
        assert_eq!(params(Some(333), None, None).target_dimensions(800, 600), (333, 249));
    }

    #[test]
    fn height_only_preserves_aspect_ratio() {
        assert_eq!(params(None, Some(150), None).target_dimensions(800, 600), (200, 150));
    }

    #[test]
    fn both_dimensions_are_exact() {
        assert_eq!(
            params(Some(100), Some(100), None).target_dimensions(800, 600),
            (100, 100)
        );
    }

    #[test]
    fn format_only_keeps_original_size() {
        assert_eq!(params(None, None, Some("png")).target_dimensions(640, 480), (640, 480));
    }

    #[test]
    fn extreme_ratio_never_yields_zero() {
        assert_eq!(params(Some(1), None, None).target_dimensions(4000, 10), (1, 1));
    }

    #[test]
    fn derived_height_is_capped_for_tall_sources() {
        // 4096 * 1000 / 1 would be 4_096_000.
        assert_eq!(
            params(Some(4096), None, None).target_dimensions(1, 1000),
            (4096, 4096)
        );
    }

    #[test]
    fn derived_width_is_capped_for_wide_sources() {
        assert_eq!(
            params(None, Some(4096), None).target_dimensions(1000, 1),
            (4096, 4096)
        );
    }

    #[test]
    fn derived_side_follows_configured_limit() {
        let limits = ImageConfig {
            max_dimension: 64,
            ..Default::default()
        };
        let query = ImageQuery {
            w: Some(64),
            ..Default::default()
        };
        let p = ResizeParams::from_query(&query, &limits).unwrap();
        assert_eq!(p.target_dimensions(2, 100), (64, 64));
        assert_eq!(p.target_dimensions(100, 50), (64, 32));
    }
}
