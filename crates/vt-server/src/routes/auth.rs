//! Administrator login.

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use vt_core::Error;

use crate::context::AppContext;
use crate::error::AppError;
use crate::extract::ApiJson;
use crate::token::verify_password;

/// Login request payload.
#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Public view of an administrator (no password hash).
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct UserResponse {
    pub id: String,
    pub email: String,
    pub role: String,
    pub last_login: Option<String>,
    pub created_at: String,
}

impl UserResponse {
    fn from_model(user: &vt_db::models::User) -> Self {
        Self {
            id: user.id.to_string(),
            email: user.email.clone(),
            role: user.role.clone(),
            last_login: user.last_login.clone(),
            created_at: user.created_at.clone(),
        }
    }
}

/// Login response.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct LoginResponse {
    pub message: String,
    pub token: String,
    pub user: UserResponse,
}

/// POST /admin/login
#[utoipa::path(
    post,
    path = "/admin/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 400, description = "Email or password missing"),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login(
    State(ctx): State<AppContext>,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let email = payload.email.trim().to_string();
    if email.is_empty() || payload.password.is_empty() {
        return Err(Error::Validation("Email and password are required".into()).into());
    }

    let conn = vt_db::pool::get_conn(&ctx.db)?;
    let user = vt_db::queries::users::get_user_by_email(&conn, &email)?
        .ok_or_else(|| Error::Unauthorized("Invalid email or password".into()))?;
    drop(conn);

    // bcrypt verification blocks; run it on the blocking pool.
    let hash = user.password_hash.clone();
    let password = payload.password;
    let valid = tokio::task::spawn_blocking(move || verify_password(&password, &hash))
        .await
        .map_err(|e| Error::Internal(format!("password check aborted: {e}")))?;

    if !valid {
        tracing::info!(email = %email, "Rejected login");
        return Err(Error::Unauthorized("Invalid email or password".into()).into());
    }

    let token = ctx.tokens.issue(user.id, &user.email, &user.role)?;

    let conn = vt_db::pool::get_conn(&ctx.db)?;
    vt_db::queries::users::touch_last_login(&conn, user.id)?;
    let user = vt_db::queries::users::get_user_by_id(&conn, user.id)?
        .ok_or_else(|| Error::not_found("user", user.id))?;

    tracing::info!(user_id = %user.id, "Administrator logged in");

    Ok(Json(LoginResponse {
        message: "Login successful".into(),
        token,
        user: UserResponse::from_model(&user),
    }))
}
