//! Attachment link rows tying stored originals to items.

use chrono::Utc;
use rusqlite::Connection;
use vt_core::{AttachmentId, AttachmentKind, Error, ItemId, MediaType, Result};

use crate::models::Attachment;

const COLS: &str = "id, item_id, name, kind, media_type, size_bytes, created_at";

/// Record a stored original as an attachment of `item_id`.
pub fn create_attachment(
    conn: &Connection,
    item_id: ItemId,
    name: &str,
    kind: AttachmentKind,
    media_type: MediaType,
    size_bytes: u64,
) -> Result<Attachment> {
    let id = AttachmentId::new();
    let created_at = Utc::now().to_rfc3339();
    let size_bytes = i64::try_from(size_bytes)
        .map_err(|_| Error::Validation(format!("attachment size {size_bytes} out of range")))?;

    conn.execute(
        "INSERT INTO attachments (id, item_id, name, kind, media_type, size_bytes, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        rusqlite::params![
            id.to_string(),
            item_id.to_string(),
            name,
            kind.to_string(),
            media_type.to_string(),
            size_bytes,
            created_at,
        ],
    )
    .map_err(|e| {
        let msg = e.to_string();
        if msg.contains("FOREIGN KEY constraint failed") {
            Error::not_found("item", item_id)
        } else if msg.contains("UNIQUE constraint failed") {
            Error::Conflict(format!("Attachment '{name}' already exists"))
        } else {
            Error::database(msg)
        }
    })?;

    Ok(Attachment {
        id,
        item_id,
        name: name.to_string(),
        kind,
        media_type,
        size_bytes,
        created_at,
    })
}

/// Attachments of an item in upload order.
pub fn list_attachments_by_item(conn: &Connection, item_id: ItemId) -> Result<Vec<Attachment>> {
    let q = format!("SELECT {COLS} FROM attachments WHERE item_id = ?1 ORDER BY created_at, name");
    let mut stmt = conn.prepare(&q).map_err(|e| Error::database(e.to_string()))?;
    let rows = stmt
        .query_map([item_id.to_string()], Attachment::from_row)
        .map_err(|e| Error::database(e.to_string()))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::database(e.to_string()))?;
    Ok(rows)
}

/// Look up an attachment by the storage name of its original.
pub fn get_attachment_by_name(conn: &Connection, name: &str) -> Result<Option<Attachment>> {
    let q = format!("SELECT {COLS} FROM attachments WHERE name = ?1");
    match conn.query_row(&q, [name], Attachment::from_row) {
        Ok(a) => Ok(Some(a)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(Error::database(e.to_string())),
    }
}
