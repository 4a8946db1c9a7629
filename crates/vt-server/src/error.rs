//! Error-to-HTTP response conversion.
//!
//! Implements `IntoResponse` for [`vt_core::Error`] (through [`AppError`]) so
//! that route handlers can return `Result<T, AppError>` and use `?` on any
//! lower-layer result.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use vt_core::MediaError;

use crate::middleware::request_id;

/// Wrapper so we can implement `IntoResponse` for an external type.
#[derive(Debug)]
pub struct AppError(vt_core::Error);

impl AppError {
    pub fn new(inner: vt_core::Error) -> Self {
        Self(inner)
    }

    /// Client-facing message. Database and I/O failures are replaced by a
    /// generic text; their detail only goes to the log.
    fn public_message(&self) -> String {
        match &self.0 {
            vt_core::Error::Database { .. } | vt_core::Error::Io { .. } => {
                "internal server error".to_string()
            }
            other => other.to_string(),
        }
    }
}

impl From<vt_core::Error> for AppError {
    fn from(e: vt_core::Error) -> Self {
        Self::new(e)
    }
}

impl From<MediaError> for AppError {
    fn from(e: MediaError) -> Self {
        Self::new(e.into())
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::new(vt_core::Error::Validation(rejection.body_text()))
    }
}

/// Render an error and all of its sources on one line.
fn error_chain(err: &dyn std::error::Error) -> String {
    let mut out = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        out.push_str(": ");
        out.push_str(&cause.to_string());
        source = cause.source();
    }
    out
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.0.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let request_id = request_id::current();

        if status.is_server_error() {
            tracing::error!(
                status = %status,
                request_id = request_id.as_deref().unwrap_or("-"),
                error = %error_chain(&self.0),
                "Server error in API handler"
            );
        }

        let body = json!({
            "error": self.public_message(),
            "code": self.0.code(),
            "request_id": request_id,
        });

        (status, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_produces_404() {
        let err = AppError::new(vt_core::Error::not_found("item", "abc"));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn unauthorized_produces_401() {
        let err = AppError::new(vt_core::Error::Unauthorized("no token".into()));
        assert_eq!(err.into_response().status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn media_errors_map_to_their_status() {
        let err = AppError::from(MediaError::PayloadTooLarge { limit: 5 });
        assert_eq!(err.into_response().status(), StatusCode::PAYLOAD_TOO_LARGE);

        let err = AppError::from(MediaError::InvalidQuality { token: "0".into() });
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    async fn body_of(err: AppError) -> serde_json::Value {
        let bytes = axum::body::to_bytes(err.into_response().into_body(), 4096)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn database_detail_stays_out_of_the_body() {
        let body = body_of(AppError::new(vt_core::Error::database("no such table: items"))).await;
        assert_eq!(body["error"], "internal server error");
        assert_eq!(body["code"], "database_error");
        assert!(body["request_id"].is_null());

        let io = std::io::Error::new(std::io::ErrorKind::Other, "/var/lib/vitrine: read-only");
        let body = body_of(AppError::new(vt_core::Error::from(io))).await;
        assert_eq!(body["error"], "internal server error");
    }

    #[tokio::test]
    async fn client_errors_keep_their_message() {
        let body = body_of(AppError::from(MediaError::InvalidQuality { token: "0".into() })).await;
        assert_eq!(body["code"], "invalid_quality");
        assert!(body["error"].as_str().unwrap().contains("'0'"));
    }

    #[test]
    fn chain_includes_sources() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk full");
        let err = vt_core::Error::from(MediaError::StorageWriteError { source: io });
        let chain = error_chain(&err);
        assert!(chain.starts_with("failed to persist uploaded image"));
        assert!(chain.ends_with("disk full"));
    }
}
