//! Image upload and resize-on-request handlers.

use axum::body::Body;
use axum::extract::{Multipart, Path, Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Redirect, Response};
use axum::Json;
use serde::Serialize;
use tokio_util::io::ReaderStream;
use vogel_core::Error;

use crate::context::AppContext;
use crate::error::AppError;
use crate::images::{ImageQuery, Rendered, ResizeParams};

/// Derivatives never change for a given URL.
const CACHE_CONTROL_IMMUTABLE: &str = "public, max-age=31536000, immutable";

/// Response of `POST /upload-image`.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct UploadResponse {
    /// Public URL of the stored original.
    pub url: String,
    pub description: String,
}

/// Multipart form accepted by `POST /upload-image` (documentation only).
#[derive(Debug, utoipa::ToSchema)]
#[allow(dead_code)]
pub struct UploadForm {
    #[schema(value_type = String, format = Binary)]
    file: Vec<u8>,
}

/// POST /upload-image
///
/// Expects a multipart form with a `file` part carrying an `image/*` body.
#[utoipa::path(
    post,
    path = "/upload-image",
    request_body(content = UploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Image stored", body = UploadResponse),
        (status = 400, description = "No file or not an image"),
        (status = 403, description = "Missing or wrong edit key")
    )
)]
pub async fn upload_image(
    State(ctx): State<AppContext>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    let mut upload = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::validation(format!("Invalid multipart body: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field.file_name().unwrap_or_default().to_string();
        let content_type = field.content_type().map(String::from);
        let data = field
            .bytes()
            .await
            .map_err(|e| Error::validation(format!("Failed to read upload: {e}")))?;
        upload = Some((filename, content_type, data));
        break;
    }

    let Some((filename, content_type, data)) = upload.filter(|(name, _, _)| !name.is_empty())
    else {
        return Err(Error::validation("No file uploaded").into());
    };

    if !content_type.is_some_and(|ct| ct.starts_with("image/")) {
        return Err(Error::validation("Only image uploads are allowed").into());
    }

    let images = ctx.images.clone();
    let original = filename.clone();
    let stored =
        tokio::task::spawn_blocking(move || images.store_upload(&original, &data)).await??;

    Ok(Json(UploadResponse {
        url: format!("/uploads/{stored}"),
        description: format!("Uploaded {filename}"),
    }))
}

/// GET /image/:filename
///
/// Without `w`, `h` or `fmt` the client is redirected to the original.
#[utoipa::path(
    get,
    path = "/image/{filename}",
    params(
        ("filename" = String, Path, description = "Stored upload name"),
        ("w" = Option<u32>, Query, description = "Target width, 1 to 4096"),
        ("h" = Option<u32>, Query, description = "Target height, 1 to 4096"),
        ("q" = Option<u32>, Query, description = "Quality for JPEG and WebP, 10 to 100"),
        ("fmt" = Option<String>, Query, description = "jpg, jpeg, png, webp or gif")
    ),
    responses(
        (status = 200, description = "Resized image bytes"),
        (status = 307, description = "Redirect to the unmodified original"),
        (status = 400, description = "Invalid parameters or filename"),
        (status = 404, description = "Image not found"),
        (status = 500, description = "Image processing failed")
    )
)]
pub async fn serve_image(
    State(ctx): State<AppContext>,
    Path(filename): Path<String>,
    Query(query): Query<ImageQuery>,
) -> Result<Response, AppError> {
    let params = ResizeParams::from_query(&query, &ctx.config.images)?;
    ctx.images.source_path(&filename)?;

    if params.is_passthrough() {
        return Ok(Redirect::temporary(&format!("/uploads/{filename}")).into_response());
    }

    let images = ctx.images.clone();
    let rendered = tokio::task::spawn_blocking(move || images.render(&filename, &params)).await??;

    let response = match rendered {
        Rendered::Cached { path, format } => {
            let file = tokio::fs::File::open(&path).await.map_err(Error::from)?;
            let body = Body::from_stream(ReaderStream::new(file));
            (
                [
                    (header::CONTENT_TYPE, format.content_type()),
                    (header::CACHE_CONTROL, CACHE_CONTROL_IMMUTABLE),
                ],
                body,
            )
                .into_response()
        }
        Rendered::Fresh { bytes, format } => (
            [
                (header::CONTENT_TYPE, format.content_type()),
                (header::CACHE_CONTROL, CACHE_CONTROL_IMMUTABLE),
            ],
            bytes,
        )
            .into_response(),
    };

    Ok(response)
}
