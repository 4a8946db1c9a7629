//! Authentication middleware.
//!
//! Protected routes require an `Authorization` header carrying a token
//! issued by `/admin/login`, either as `Bearer <token>` or bare. A missing
//! header is 401; a present but unacceptable token is 403. The verified
//! [`Claims`] are inserted into request extensions.

use axum::extract::State;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::Response;
use vt_core::Error;

use crate::context::AppContext;
use crate::error::AppError;
use crate::token::Claims;

/// Strip an optional `Bearer` scheme (case-insensitive) from a header value.
pub fn bearer_token(header: &str) -> &str {
    let header = header.trim();
    match header.split_once(' ') {
        Some((scheme, rest)) if scheme.eq_ignore_ascii_case("bearer") => rest.trim(),
        _ => header,
    }
}

/// Authentication middleware. Applied to protected routes only.
pub async fn auth_middleware(
    State(ctx): State<AppContext>,
    mut request: Request<axum::body::Body>,
    next: Next,
) -> Result<Response, AppError> {
    let header = request
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .ok_or_else(|| Error::Unauthorized("Access denied. No token provided.".into()))?;

    let raw = header
        .to_str()
        .map_err(|_| Error::Forbidden("Invalid or expired token".into()))?;

    let claims: Claims = ctx.tokens.verify(bearer_token(raw))?;
    tracing::debug!(user_id = %claims.sub, role = %claims.role, "Authenticated request");

    request.extensions_mut().insert(claims);
    Ok(next.run(request).await)
}
