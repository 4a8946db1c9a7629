//! Request extractors that reject with [`AppError`] bodies.

use axum::extract::FromRequest;

use crate::error::AppError;

/// `axum::Json` whose rejection is a 400 in the API error format.
///
/// Unknown fields, wrong types and malformed JSON all surface as
/// `validation_error` instead of axum's plain-text 415/422 responses.
#[derive(Debug, Clone, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);
