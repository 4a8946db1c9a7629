//! Keyword dictionary and item tagging handlers.

use std::collections::HashSet;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use vt_core::{Error, ItemId, KeywordId};
use vt_db::queries::{items, keywords};

use crate::context::AppContext;
use crate::error::AppError;
use crate::extract::ApiJson;
use crate::routes::{parse_id, PageRequest};

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct KeywordResponse {
    pub keyword_id: String,
    pub keyword_name: String,
}

impl KeywordResponse {
    pub(crate) fn from_model(k: &vt_db::models::Keyword) -> Self {
        Self {
            keyword_id: k.id.to_string(),
            keyword_name: k.name.clone(),
        }
    }
}

/// One entry of a bulk keyword insert.
#[derive(Debug, Deserialize, utoipa::ToSchema)]
#[serde(deny_unknown_fields)]
pub struct NewKeyword {
    pub keyword_name: String,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct KeywordsAddedResponse {
    pub message: String,
    pub inserted_rows: usize,
    pub data: Vec<KeywordResponse>,
}

/// Keyword search body: substring plus paging.
#[derive(Debug, Default, Deserialize, utoipa::ToSchema)]
pub struct KeywordSearchRequest {
    #[serde(default)]
    pub keyword_name: Option<String>,
    #[serde(default)]
    pub page: Option<i64>,
    #[serde(default, alias = "pageSize")]
    pub page_size: Option<i64>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct KeywordPageResponse {
    pub message: String,
    pub page: i64,
    pub page_size: i64,
    pub total: i64,
    pub data: Vec<KeywordResponse>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ItemKeywords {
    pub item_id: String,
    pub item_name: String,
    pub keywords: Vec<KeywordResponse>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ItemKeywordsResponse {
    pub message: String,
    pub data: ItemKeywords,
}

/// One entry of a link request. Entries whose `keyword_id` is not a valid
/// keyword identifier are skipped.
#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct KeywordRef {
    #[serde(default)]
    #[schema(value_type = String)]
    pub keyword_id: serde_json::Value,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct LinkKeywordsResponse {
    pub message: String,
    pub linked_keywords: Vec<String>,
    pub new_links: usize,
}

/// POST /keyword/add
#[utoipa::path(
    post,
    path = "/keyword/add",
    request_body = Vec<NewKeyword>,
    responses(
        (status = 201, description = "Keywords inserted", body = KeywordsAddedResponse),
        (status = 400, description = "Empty or malformed list"),
        (status = 409, description = "A keyword already exists; nothing was inserted")
    ),
    security(("bearer" = []))
)]
pub async fn add_keywords(
    State(ctx): State<AppContext>,
    ApiJson(entries): ApiJson<Vec<NewKeyword>>,
) -> Result<(StatusCode, Json<KeywordsAddedResponse>), AppError> {
    if entries.is_empty() {
        return Err(Error::Validation("Invalid data format or empty data".into()).into());
    }
    let names: Vec<String> = entries.into_iter().map(|e| e.keyword_name).collect();

    let conn = vt_db::pool::get_conn(&ctx.db)?;
    let created = keywords::create_keywords(&conn, &names)?;

    Ok((
        StatusCode::CREATED,
        Json(KeywordsAddedResponse {
            message: "Keywords added successfully".into(),
            inserted_rows: created.len(),
            data: created.iter().map(KeywordResponse::from_model).collect(),
        }),
    ))
}

/// POST /keywords
#[utoipa::path(
    post,
    path = "/keywords",
    request_body = KeywordSearchRequest,
    responses(
        (status = 200, description = "Matching keywords", body = KeywordPageResponse),
        (status = 400, description = "Invalid paging values")
    ),
    security(("bearer" = []))
)]
pub async fn search_keywords(
    State(ctx): State<AppContext>,
    ApiJson(req): ApiJson<KeywordSearchRequest>,
) -> Result<Json<KeywordPageResponse>, AppError> {
    let page = PageRequest {
        page: req.page,
        page_size: req.page_size,
    }
    .page()?;
    let search = req.keyword_name.as_deref();

    let conn = vt_db::pool::get_conn(&ctx.db)?;
    let rows = keywords::search_keywords(&conn, search, page)?;
    let total = keywords::count_keywords(&conn, search)?;

    Ok(Json(KeywordPageResponse {
        message: if rows.is_empty() { "No data found" } else { "Success" }.into(),
        page: page.page,
        page_size: page.page_size,
        total,
        data: rows.iter().map(KeywordResponse::from_model).collect(),
    }))
}

/// GET /item/keywords/{item_id}
#[utoipa::path(
    get,
    path = "/item/keywords/{item_id}",
    params(("item_id" = String, Path, description = "Item ID")),
    responses(
        (status = 200, description = "Keywords of the item", body = ItemKeywordsResponse),
        (status = 404, description = "Item not found or has no keywords")
    ),
    security(("bearer" = []))
)]
pub async fn item_keywords(
    State(ctx): State<AppContext>,
    Path(item_id): Path<String>,
) -> Result<Json<ItemKeywordsResponse>, AppError> {
    let item_id: ItemId = parse_id(&item_id, "item")?;
    let conn = vt_db::pool::get_conn(&ctx.db)?;

    let item = items::get_item(&conn, item_id)?.ok_or_else(|| Error::not_found("item", item_id))?;
    let kws = keywords::list_keywords_for_item(&conn, item_id)?;
    if kws.is_empty() {
        return Err(Error::not_found("keywords for item", item_id).into());
    }

    Ok(Json(ItemKeywordsResponse {
        message: "Success".into(),
        data: ItemKeywords {
            item_id: item.id.to_string(),
            item_name: item.name,
            keywords: kws.iter().map(KeywordResponse::from_model).collect(),
        },
    }))
}

/// POST /item/keywords/{item_id}
#[utoipa::path(
    post,
    path = "/item/keywords/{item_id}",
    params(("item_id" = String, Path, description = "Item ID")),
    request_body = Vec<KeywordRef>,
    responses(
        (status = 200, description = "Keywords linked", body = LinkKeywordsResponse),
        (status = 400, description = "No valid keyword IDs, or an unknown keyword"),
        (status = 404, description = "Item not found")
    ),
    security(("bearer" = []))
)]
pub async fn link_keywords(
    State(ctx): State<AppContext>,
    Path(item_id): Path<String>,
    ApiJson(refs): ApiJson<Vec<KeywordRef>>,
) -> Result<Json<LinkKeywordsResponse>, AppError> {
    let item_id: ItemId = parse_id(&item_id, "item")?;
    if refs.is_empty() {
        return Err(Error::Validation("Invalid or empty keywords array.".into()).into());
    }

    let mut ids: Vec<KeywordId> = refs
        .iter()
        .filter_map(|r| r.keyword_id.as_str())
        .filter_map(|s| s.parse().ok())
        .collect();
    let mut seen = HashSet::new();
    ids.retain(|id| seen.insert(*id));
    if ids.is_empty() {
        return Err(Error::Validation("No valid keyword IDs provided.".into()).into());
    }

    let conn = vt_db::pool::get_conn(&ctx.db)?;
    if !items::item_exists(&conn, item_id)? {
        return Err(Error::not_found("item", item_id).into());
    }
    let new_links = keywords::link_keywords(&conn, item_id, &ids)?;

    Ok(Json(LinkKeywordsResponse {
        message: "Keywords successfully linked to item".into(),
        linked_keywords: ids.iter().map(ToString::to_string).collect(),
        new_links,
    }))
}
