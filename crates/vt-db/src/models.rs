//! Rust structs mapping to database tables.
//!
//! Each model implements `from_row` for constructing itself from a
//! `rusqlite::Row` whose columns follow the module's `COLS` constant.

use std::str::FromStr;

use serde::Serialize;
use uuid::Uuid;
use vt_core::{AttachmentId, AttachmentKind, ItemId, KeywordId, MediaType, UserId};

// ---------------------------------------------------------------------------
// helpers
// ---------------------------------------------------------------------------

fn conversion_error(
    idx: usize,
    e: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
}

/// Parse a UUID-based ID from a text column.
fn parse_id<T: From<Uuid>>(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<T> {
    let s: String = row.get(idx)?;
    let uuid = Uuid::parse_str(&s).map_err(|e| conversion_error(idx, e))?;
    Ok(T::from(uuid))
}

/// Parse a text column through `FromStr<Err = String>`.
fn parse_text<T: FromStr<Err = String>>(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<T> {
    let s: String = row.get(idx)?;
    s.parse::<T>()
        .map_err(|e| conversion_error(idx, std::io::Error::new(std::io::ErrorKind::InvalidData, e)))
}

// ---------------------------------------------------------------------------
// User
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub password_hash: String,
    pub role: String,
    pub last_login: Option<String>,
    pub created_at: String,
}

impl User {
    pub fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: parse_id(row, 0)?,
            email: row.get(1)?,
            password_hash: row.get(2)?,
            role: row.get(3)?,
            last_login: row.get(4)?,
            created_at: row.get(5)?,
        })
    }
}

// ---------------------------------------------------------------------------
// Item
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct Item {
    pub id: ItemId,
    pub name: String,
    pub description: Option<String>,
    pub sku: Option<String>,
    pub price_cents: Option<i64>,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl Item {
    pub fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: parse_id(row, 0)?,
            name: row.get(1)?,
            description: row.get(2)?,
            sku: row.get(3)?,
            price_cents: row.get(4)?,
            is_active: row.get::<_, i32>(5)? != 0,
            created_at: row.get(6)?,
            updated_at: row.get(7)?,
        })
    }
}

// ---------------------------------------------------------------------------
// Keyword
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct Keyword {
    pub id: KeywordId,
    pub name: String,
    pub created_at: String,
}

impl Keyword {
    pub fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: parse_id(row, 0)?,
            name: row.get(1)?,
            created_at: row.get(2)?,
        })
    }
}

// ---------------------------------------------------------------------------
// Attachment
// ---------------------------------------------------------------------------

/// Link between a stored original and the catalog item that owns it.
#[derive(Debug, Clone, Serialize)]
pub struct Attachment {
    pub id: AttachmentId,
    pub item_id: ItemId,
    /// Storage name of the original in the image store.
    pub name: String,
    pub kind: AttachmentKind,
    pub media_type: MediaType,
    pub size_bytes: i64,
    pub created_at: String,
}

impl Attachment {
    pub fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: parse_id(row, 0)?,
            item_id: parse_id(row, 1)?,
            name: row.get(2)?,
            kind: parse_text(row, 3)?,
            media_type: parse_text(row, 4)?,
            size_bytes: row.get(5)?,
            created_at: row.get(6)?,
        })
    }
}
