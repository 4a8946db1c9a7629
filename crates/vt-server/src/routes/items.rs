//! Catalog item route handlers.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use vt_core::{Error, ItemId};
use vt_db::fields::{ItemDraft, ItemPatch};
use vt_db::queries::{attachments, items, keywords};

use crate::context::AppContext;
use crate::error::AppError;
use crate::extract::ApiJson;
use crate::routes::images::AttachmentLink;
use crate::routes::keywords::KeywordResponse;
use crate::routes::{parse_id, PageRequest};

/// Item response.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ItemResponse {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub sku: Option<String>,
    pub price_cents: Option<i64>,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl ItemResponse {
    pub(crate) fn from_model(item: &vt_db::models::Item) -> Self {
        Self {
            id: item.id.to_string(),
            name: item.name.clone(),
            description: item.description.clone(),
            sku: item.sku.clone(),
            price_cents: item.price_cents,
            is_active: item.is_active,
            created_at: item.created_at.clone(),
            updated_at: item.updated_at.clone(),
        }
    }
}

/// One page of items.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ItemPageResponse {
    pub message: String,
    pub page: i64,
    pub page_size: i64,
    pub total: i64,
    pub data: Vec<ItemResponse>,
}

/// Item with its keywords and image attachments.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ItemDetailResponse {
    pub message: String,
    pub item: ItemResponse,
    pub keywords: Vec<KeywordResponse>,
    pub attachments: Vec<AttachmentLink>,
}

/// Result of an insert or update.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ItemMutationResponse {
    pub message: String,
    pub item: ItemResponse,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

/// POST /items
#[utoipa::path(
    post,
    path = "/items",
    request_body = PageRequest,
    responses(
        (status = 200, description = "One page of items", body = ItemPageResponse),
        (status = 400, description = "Invalid paging values")
    ),
    security(("bearer" = []))
)]
pub async fn list_items(
    State(ctx): State<AppContext>,
    ApiJson(req): ApiJson<PageRequest>,
) -> Result<Json<ItemPageResponse>, AppError> {
    let page = req.page()?;
    let conn = vt_db::pool::get_conn(&ctx.db)?;
    let rows = items::list_items(&conn, page)?;
    let total = items::count_items(&conn)?;

    Ok(Json(ItemPageResponse {
        message: if rows.is_empty() { "No data found" } else { "Success" }.into(),
        page: page.page,
        page_size: page.page_size,
        total,
        data: rows.iter().map(ItemResponse::from_model).collect(),
    }))
}

/// POST /item/add
#[utoipa::path(
    post,
    path = "/item/add",
    responses(
        (status = 201, description = "Item created", body = ItemMutationResponse),
        (status = 400, description = "Missing name or unknown field")
    ),
    security(("bearer" = []))
)]
pub async fn add_item(
    State(ctx): State<AppContext>,
    ApiJson(draft): ApiJson<ItemDraft>,
) -> Result<(StatusCode, Json<ItemMutationResponse>), AppError> {
    let conn = vt_db::pool::get_conn(&ctx.db)?;
    let item = items::create_item(&conn, &draft)?;
    tracing::info!(item_id = %item.id, "Item created");

    Ok((
        StatusCode::CREATED,
        Json(ItemMutationResponse {
            message: "Item added successfully".into(),
            item: ItemResponse::from_model(&item),
        }),
    ))
}

/// GET /item/get/{item_id}
#[utoipa::path(
    get,
    path = "/item/get/{item_id}",
    params(("item_id" = String, Path, description = "Item ID")),
    responses(
        (status = 200, description = "Item details", body = ItemDetailResponse),
        (status = 404, description = "Item not found")
    ),
    security(("bearer" = []))
)]
pub async fn get_item(
    State(ctx): State<AppContext>,
    Path(item_id): Path<String>,
) -> Result<Json<ItemDetailResponse>, AppError> {
    let item_id: ItemId = parse_id(&item_id, "item")?;
    let conn = vt_db::pool::get_conn(&ctx.db)?;

    let item = items::get_item(&conn, item_id)?.ok_or_else(|| Error::not_found("item", item_id))?;
    let kws = keywords::list_keywords_for_item(&conn, item_id)?;
    let links = attachments::list_attachments_by_item(&conn, item_id)?;

    let default_derivative = ctx.images.default_derivative();
    Ok(Json(ItemDetailResponse {
        message: "Success".into(),
        item: ItemResponse::from_model(&item),
        keywords: kws.iter().map(KeywordResponse::from_model).collect(),
        attachments: links
            .iter()
            .map(|a| AttachmentLink::new(&a.name, default_derivative))
            .collect(),
    }))
}

/// PATCH /item/update/{item_id}
#[utoipa::path(
    patch,
    path = "/item/update/{item_id}",
    params(("item_id" = String, Path, description = "Item ID")),
    responses(
        (status = 200, description = "Item updated", body = ItemMutationResponse),
        (status = 400, description = "No valid fields or unknown field"),
        (status = 404, description = "Item not found")
    ),
    security(("bearer" = []))
)]
pub async fn update_item(
    State(ctx): State<AppContext>,
    Path(item_id): Path<String>,
    ApiJson(patch): ApiJson<ItemPatch>,
) -> Result<Json<ItemMutationResponse>, AppError> {
    let item_id: ItemId = parse_id(&item_id, "item")?;
    let conn = vt_db::pool::get_conn(&ctx.db)?;

    if !items::update_item(&conn, item_id, &patch)? {
        return Err(Error::not_found("item", item_id).into());
    }
    let item = items::get_item(&conn, item_id)?.ok_or_else(|| Error::not_found("item", item_id))?;

    Ok(Json(ItemMutationResponse {
        message: "Item updated successfully".into(),
        item: ItemResponse::from_model(&item),
    }))
}

/// DELETE /item/delete/{item_id}
///
/// Keyword links and attachment rows go with the item. Stored originals stay
/// in the image store.
#[utoipa::path(
    delete,
    path = "/item/delete/{item_id}",
    params(("item_id" = String, Path, description = "Item ID")),
    responses(
        (status = 200, description = "Item deleted", body = MessageResponse),
        (status = 404, description = "Item not found")
    ),
    security(("bearer" = []))
)]
pub async fn delete_item(
    State(ctx): State<AppContext>,
    Path(item_id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    let item_id: ItemId = parse_id(&item_id, "item")?;
    let conn = vt_db::pool::get_conn(&ctx.db)?;

    if !items::delete_item(&conn, item_id)? {
        return Err(Error::not_found("item", item_id).into());
    }
    tracing::info!(item_id = %item_id, "Item deleted");

    Ok(Json(MessageResponse {
        message: "Item deleted successfully".into(),
    }))
}
