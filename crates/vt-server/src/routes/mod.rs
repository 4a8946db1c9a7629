//! Route handlers for the HTTP API.

pub mod auth;
pub mod health;
pub mod images;
pub mod items;
pub mod keywords;

use serde::Deserialize;
use vt_db::page::Page;

use crate::error::AppError;

/// Paging fields accepted in list request bodies.
///
/// `pageSize` is accepted as an alias of `page_size`.
#[derive(Debug, Default, Deserialize, utoipa::ToSchema)]
pub struct PageRequest {
    #[serde(default)]
    pub page: Option<i64>,
    #[serde(default, alias = "pageSize")]
    pub page_size: Option<i64>,
}

impl PageRequest {
    pub fn page(&self) -> Result<Page, AppError> {
        Ok(Page::new(self.page, self.page_size)?)
    }
}

/// Parse a path identifier, mapping failure to a 400.
pub(crate) fn parse_id<T: std::str::FromStr>(raw: &str, what: &str) -> Result<T, AppError> {
    raw.parse()
        .map_err(|_| vt_core::Error::Validation(format!("Invalid {what} ID")).into())
}
