//! Decode, resize and re-encode image bytes.

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat};
use vogel_core::{Error, Result};

use super::params::{OutputFormat, ResizeParams};

/// Decode `source`, resize it per `params` and encode it as `format`.
pub fn render(source: &[u8], params: &ResizeParams, format: OutputFormat) -> Result<Vec<u8>> {
    let img = image::load_from_memory(source).map_err(|e| Error::Image(e.to_string()))?;

    let (width, height) = params.target_dimensions(img.width(), img.height());
    let img = if (width, height) == (img.width(), img.height()) {
        img
    } else {
        img.resize_exact(width, height, FilterType::Lanczos3)
    };

    encode(&img, format, params.quality)
}

/// Encode `img` as `format`. `quality` only affects lossy formats.
pub fn encode(img: &DynamicImage, format: OutputFormat, quality: u8) -> Result<Vec<u8>> {
    let mut buf = Vec::new();

    match format {
        OutputFormat::Jpeg => {
            // JPEG has no alpha channel.
            let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
            let encoder = JpegEncoder::new_with_quality(&mut buf, quality);
            rgb.write_with_encoder(encoder)
                .map_err(|e| Error::Image(e.to_string()))?;
        }
        OutputFormat::Png => {
            img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
                .map_err(|e| Error::Image(e.to_string()))?;
        }
        OutputFormat::Gif => {
            let rgba = DynamicImage::ImageRgba8(img.to_rgba8());
            rgba.write_to(&mut Cursor::new(&mut buf), ImageFormat::Gif)
                .map_err(|e| Error::Image(e.to_string()))?;
        }
        OutputFormat::WebP => {
            let converted = if img.color().has_alpha() {
                DynamicImage::ImageRgba8(img.to_rgba8())
            } else {
                DynamicImage::ImageRgb8(img.to_rgb8())
            };
            let encoder = webp::Encoder::from_image(&converted)
                .map_err(|e| Error::Image(format!("WebP encoding: {e}")))?;
            buf.extend_from_slice(&encoder.encode(f32::from(quality)));
        }
    }

    Ok(buf)
}
