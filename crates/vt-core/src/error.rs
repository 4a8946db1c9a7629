//! Error types shared by every vitrine crate.
//!
//! Lower layers return [`Error`]; the HTTP layer turns it into a status with
//! [`Error::http_status`] and a stable [`Error::code`]. Image pipeline
//! failures live in their own enum, [`MediaError`], wrapped by
//! [`Error::Media`].

use std::fmt;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// No credential was presented.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// A credential was presented and rejected.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Validation error: {0}")]
    Validation(String),

    /// Unique constraint hit (duplicate keyword, e-mail, storage name).
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error: {source}")]
    Database {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    #[error(transparent)]
    Media(#[from] MediaError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    pub fn http_status(&self) -> u16 {
        match self {
            Self::NotFound { .. } => 404,
            Self::Unauthorized(_) => 401,
            Self::Forbidden(_) => 403,
            Self::Validation(_) => 400,
            Self::Conflict(_) => 409,
            Self::Media(e) => e.http_status(),
            Self::Database { .. } | Self::Io { .. } | Self::Internal(_) => 500,
        }
    }

    /// Machine-readable code carried in error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "not_found",
            Self::Unauthorized(_) => "unauthorized",
            Self::Forbidden(_) => "forbidden",
            Self::Validation(_) => "validation_error",
            Self::Conflict(_) => "conflict",
            Self::Database { .. } => "database_error",
            Self::Io { .. } => "io_error",
            Self::Media(e) => e.code(),
            Self::Internal(_) => "internal_error",
        }
    }

    pub fn not_found(entity: impl Into<String>, id: impl fmt::Display) -> Self {
        Self::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    pub fn database(source: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::Database {
            source: source.into(),
        }
    }
}

/// Error taxonomy of the image pipeline (ingestion, parsing, transform, delivery).
///
/// Display strings are client-facing: they name the violated constraint and
/// never include filesystem paths. Underlying I/O errors are only reachable
/// through [`std::error::Error::source`].
#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    #[error("unsupported media type '{declared}': only image/jpeg, image/png and image/gif are accepted")]
    UnsupportedMediaType { declared: String },

    #[error("upload exceeds the {limit} byte limit")]
    PayloadTooLarge { limit: u64 },

    #[error("invalid dimensions '{token}': {reason}")]
    InvalidDimensions { token: String, reason: String },

    #[error("invalid quality '{token}': expected an integer between 1 and 100")]
    InvalidQuality { token: String },

    #[error("original image not found: {name}")]
    OriginalNotFound { name: String },

    #[error("original image could not be decoded: {0}")]
    DecodeError(String),

    #[error("image transform failed: {0}")]
    TransformFailed(String),

    #[error("failed to persist uploaded image")]
    StorageWriteError {
        #[source]
        source: std::io::Error,
    },
}

impl MediaError {
    /// Map this error to an appropriate HTTP status code.
    pub fn http_status(&self) -> u16 {
        match self {
            MediaError::UnsupportedMediaType { .. } => 400,
            MediaError::PayloadTooLarge { .. } => 413,
            MediaError::InvalidDimensions { .. } => 400,
            MediaError::InvalidQuality { .. } => 400,
            MediaError::OriginalNotFound { .. } => 404,
            MediaError::DecodeError(_) => 500,
            MediaError::TransformFailed(_) => 500,
            MediaError::StorageWriteError { .. } => 500,
        }
    }

    /// Stable machine-readable code for API responses.
    pub fn code(&self) -> &'static str {
        match self {
            MediaError::UnsupportedMediaType { .. } => "unsupported_media_type",
            MediaError::PayloadTooLarge { .. } => "payload_too_large",
            MediaError::InvalidDimensions { .. } => "invalid_dimensions",
            MediaError::InvalidQuality { .. } => "invalid_quality",
            MediaError::OriginalNotFound { .. } => "original_not_found",
            MediaError::DecodeError(_) => "decode_error",
            MediaError::TransformFailed(_) => "transform_failed",
            MediaError::StorageWriteError { .. } => "storage_write_error",
        }
    }

    /// Convenience constructor for [`MediaError::InvalidDimensions`].
    pub fn dimensions(token: &str, reason: impl Into<String>) -> Self {
        MediaError::InvalidDimensions {
            token: token.to_string(),
            reason: reason.into(),
        }
    }

    /// Convenience constructor for [`MediaError::OriginalNotFound`].
    pub fn not_found(name: impl Into<String>) -> Self {
        MediaError::OriginalNotFound { name: name.into() }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
