//! Image upload and delivery handlers.
//!
//! Originals are streamed verbatim from the store. Derivatives are rendered
//! per request from `{dimensions}/{quality}/{filename}` and never cached.

use axum::body::Body;
use axum::extract::{Multipart, Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tokio_util::io::ReaderStream;
use vt_core::{AttachmentKind, Error, ItemId, MediaError};
use vt_imaging::Upload;

use crate::context::AppContext;
use crate::error::AppError;
use crate::routes::parse_id;

/// Multipart field carrying the uploaded file.
pub const UPLOAD_FIELD: &str = "image";

/// Client-facing paths for a stored original.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentLink {
    pub file_name: String,
    pub original_path: String,
    pub derivative_path_template: String,
    pub default_derivative_path: String,
}

impl AttachmentLink {
    pub fn new(name: &str, default_derivative: &str) -> Self {
        Self {
            file_name: name.to_string(),
            original_path: format!("item/image/{name}"),
            derivative_path_template: format!("item/image/{{dimensions}}/{{quality}}/{name}"),
            default_derivative_path: format!("item/image/{default_derivative}/{name}"),
        }
    }
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct UploadResponse {
    pub message: String,
    #[serde(flatten)]
    pub link: AttachmentLink,
    pub media_type: String,
    pub size_bytes: u64,
}

fn multipart_error(e: axum::extract::multipart::MultipartError, limit: u64) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        MediaError::PayloadTooLarge { limit }.into()
    } else {
        Error::Validation(format!("malformed multipart body: {}", e.body_text())).into()
    }
}

/// POST /item/image/upload/{item_id}
#[utoipa::path(
    post,
    path = "/item/image/upload/{item_id}",
    params(("item_id" = String, Path, description = "Owning item ID")),
    request_body(content_type = "multipart/form-data", description = "Single file in field `image`"),
    responses(
        (status = 201, description = "Original stored", body = UploadResponse),
        (status = 400, description = "No file or unsupported media type"),
        (status = 404, description = "Item not found"),
        (status = 413, description = "Upload exceeds the size limit"),
        (status = 500, description = "Original could not be persisted")
    ),
    security(("bearer" = []))
)]
pub async fn upload_image(
    State(ctx): State<AppContext>,
    Path(item_id): Path<String>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<UploadResponse>), AppError> {
    let item_id: ItemId = parse_id(&item_id, "item")?;
    {
        let conn = vt_db::pool::get_conn(&ctx.db)?;
        if !vt_db::queries::items::item_exists(&conn, item_id)? {
            return Err(Error::not_found("item", item_id).into());
        }
    }

    let ingestor = ctx.images.ingestor();
    let limit = ingestor.max_bytes();

    let mut upload: Option<Upload> = None;
    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, limit))?
    {
        if field.name() != Some(UPLOAD_FIELD) || upload.is_some() {
            continue;
        }

        let declared = field.content_type().unwrap_or_default().to_string();
        let filename = field.file_name().map(str::to_owned);
        let mut current = ingestor.begin(item_id, &declared, filename.as_deref(), None)?;

        while let Some(chunk) = field.chunk().await.map_err(|e| multipart_error(e, limit))? {
            current.push(&chunk)?;
        }
        upload = Some(current);
    }

    let upload = upload
        .filter(|u| !u.is_empty())
        .ok_or_else(|| Error::Validation("No file uploaded".into()))?;

    let stored = ingestor.commit(upload).await?;

    let conn = vt_db::pool::get_conn(&ctx.db)?;
    vt_db::queries::attachments::create_attachment(
        &conn,
        item_id,
        &stored.storage_name,
        AttachmentKind::Image,
        stored.media_type,
        stored.size_bytes,
    )?;

    Ok((
        StatusCode::CREATED,
        Json(UploadResponse {
            message: "Image uploaded successfully".into(),
            link: AttachmentLink::new(&stored.storage_name, ctx.images.default_derivative()),
            media_type: stored.media_type.mime().to_string(),
            size_bytes: stored.size_bytes,
        }),
    ))
}

/// GET /item/image/{filename}
#[utoipa::path(
    get,
    path = "/item/image/{filename}",
    params(("filename" = String, Path, description = "Storage name of the original")),
    responses(
        (status = 200, description = "Original bytes"),
        (status = 404, description = "No such original")
    )
)]
pub async fn get_original(
    State(ctx): State<AppContext>,
    Path(filename): Path<String>,
) -> Result<Response, AppError> {
    let original = ctx.images.open_original(&filename).await?;
    let content_type = original
        .media_type
        .map(|m| m.mime())
        .unwrap_or("application/octet-stream");

    let body = Body::from_stream(ReaderStream::new(original.file));
    Ok((
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (header::CONTENT_LENGTH, original.len.to_string()),
        ],
        body,
    )
        .into_response())
}

/// GET /item/image/{dimensions}/{quality}/{filename}
#[utoipa::path(
    get,
    path = "/item/image/{dimensions}/{quality}/{filename}",
    params(
        ("dimensions" = String, Path, description = "`N` or `WxH`"),
        ("quality" = String, Path, description = "Encoder quality, 1-100"),
        ("filename" = String, Path, description = "Storage name of the original")
    ),
    responses(
        (status = 200, description = "JPEG derivative", content_type = "image/jpeg"),
        (status = 400, description = "Malformed dimensions or quality"),
        (status = 404, description = "No such original"),
        (status = 500, description = "Decode or transform failure")
    )
)]
pub async fn get_derivative(
    State(ctx): State<AppContext>,
    Path((dimensions, quality, filename)): Path<(String, String, String)>,
) -> Result<Response, AppError> {
    let derivative = ctx
        .images
        .render_derivative(&dimensions, &quality, &filename)
        .await?;

    Ok((
        [(header::CONTENT_TYPE, derivative.media_type.mime())],
        derivative.bytes,
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn link_paths() {
        let link = AttachmentLink::new("17-42.jpg", "500X500/50");
        assert_eq!(link.original_path, "item/image/17-42.jpg");
        assert_eq!(
            link.derivative_path_template,
            "item/image/{dimensions}/{quality}/17-42.jpg"
        );
        assert_eq!(link.default_derivative_path, "item/image/500X500/50/17-42.jpg");
    }

    #[test]
    fn link_serializes_camel_case() {
        let json = serde_json::to_value(AttachmentLink::new("a.png", "10/10")).unwrap();
        assert_eq!(json["fileName"], "a.png");
        assert_eq!(json["originalPath"], "item/image/a.png");
        assert!(json.get("derivativePathTemplate").is_some());
        assert!(json.get("defaultDerivativePath").is_some());
    }
}
