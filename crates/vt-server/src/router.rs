//! Axum router construction.
//!
//! Builds the full application router with all route groups, middleware
//! layers, and the OpenAPI document.

use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::routing::{delete, get, patch, post};
use axum::{Json, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::context::AppContext;
use crate::middleware::auth::auth_middleware;
use crate::middleware::request_id::request_id_middleware;
use crate::routes;

/// Room for multipart boundaries and part headers above the upload ceiling.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

#[derive(OpenApi)]
#[openapi(
    paths(
        routes::health::health_check,
        routes::auth::login,
        routes::items::list_items,
        routes::items::add_item,
        routes::items::get_item,
        routes::items::update_item,
        routes::items::delete_item,
        routes::keywords::add_keywords,
        routes::keywords::search_keywords,
        routes::keywords::item_keywords,
        routes::keywords::link_keywords,
        routes::images::upload_image,
        routes::images::get_original,
        routes::images::get_derivative,
    ),
    components(schemas(
        routes::PageRequest,
        routes::health::HealthResponse,
        routes::auth::LoginRequest,
        routes::auth::LoginResponse,
        routes::auth::UserResponse,
        routes::items::ItemResponse,
        routes::items::ItemPageResponse,
        routes::items::ItemDetailResponse,
        routes::items::ItemMutationResponse,
        routes::items::MessageResponse,
        routes::keywords::KeywordResponse,
        routes::keywords::NewKeyword,
        routes::keywords::KeywordsAddedResponse,
        routes::keywords::KeywordSearchRequest,
        routes::keywords::KeywordPageResponse,
        routes::keywords::ItemKeywords,
        routes::keywords::ItemKeywordsResponse,
        routes::keywords::KeywordRef,
        routes::keywords::LinkKeywordsResponse,
        routes::images::AttachmentLink,
        routes::images::UploadResponse,
    )),
    modifiers(&BearerAuth)
)]
pub struct ApiDoc;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
            );
        }
    }
}

/// GET /api-docs/openapi.json
async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// Build the complete Axum router.
pub fn build_router(ctx: AppContext) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let upload_limit = usize::try_from(ctx.config.images.max_upload_bytes)
        .unwrap_or(usize::MAX)
        .saturating_add(MULTIPART_OVERHEAD);

    // Public routes: login and image delivery.
    let public_routes = Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/api-docs/openapi.json", get(openapi_json))
        .route("/admin/login", post(routes::auth::login))
        .route("/item/image/{filename}", get(routes::images::get_original))
        .route(
            "/item/image/{dimensions}/{quality}/{filename}",
            get(routes::images::get_derivative),
        );

    // Protected catalog routes.
    let protected_routes = Router::new()
        // Items
        .route("/items", post(routes::items::list_items))
        .route("/item/add", post(routes::items::add_item))
        .route("/item/get/{item_id}", get(routes::items::get_item))
        .route("/item/update/{item_id}", patch(routes::items::update_item))
        .route("/item/delete/{item_id}", delete(routes::items::delete_item))
        // Keywords
        .route("/keyword/add", post(routes::keywords::add_keywords))
        .route("/keywords", post(routes::keywords::search_keywords))
        .route(
            "/item/keywords/{item_id}",
            get(routes::keywords::item_keywords).post(routes::keywords::link_keywords),
        )
        // Images
        .route(
            "/item/image/upload/{item_id}",
            post(routes::images::upload_image).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .layer(middleware::from_fn_with_state(ctx.clone(), auth_middleware));

    public_routes
        .merge(protected_routes)
        .layer(middleware::from_fn(request_id_middleware))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(ctx)
}
