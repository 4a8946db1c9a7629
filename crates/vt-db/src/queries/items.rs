//! Catalog item CRUD operations.

use chrono::Utc;
use rusqlite::types::Value;
use rusqlite::Connection;
use vt_core::{Error, ItemId, Result};

use crate::fields::{ItemDraft, ItemPatch};
use crate::models::Item;
use crate::page::Page;

const COLS: &str = "id, name, description, sku, price_cents, is_active, created_at, updated_at";

/// Insert a new item from a validated draft.
pub fn create_item(conn: &Connection, draft: &ItemDraft) -> Result<Item> {
    draft.validate()?;

    let id = ItemId::new();
    let now = Utc::now().to_rfc3339();
    let is_active = draft.is_active.unwrap_or(true);

    conn.execute(
        "INSERT INTO items (id, name, description, sku, price_cents, is_active, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
        rusqlite::params![
            id.to_string(),
            draft.name,
            draft.description,
            draft.sku,
            draft.price_cents,
            is_active,
            now,
        ],
    )
    .map_err(|e| Error::database(e.to_string()))?;

    Ok(Item {
        id,
        name: draft.name.clone(),
        description: draft.description.clone(),
        sku: draft.sku.clone(),
        price_cents: draft.price_cents,
        is_active,
        created_at: now.clone(),
        updated_at: now,
    })
}

/// Get an item by ID.
pub fn get_item(conn: &Connection, id: ItemId) -> Result<Option<Item>> {
    let q = format!("SELECT {COLS} FROM items WHERE id = ?1");
    match conn.query_row(&q, [id.to_string()], Item::from_row) {
        Ok(item) => Ok(Some(item)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(Error::database(e.to_string())),
    }
}

/// Whether an item with this ID exists.
pub fn item_exists(conn: &Connection, id: ItemId) -> Result<bool> {
    conn.query_row(
        "SELECT COUNT(*) > 0 FROM items WHERE id = ?1",
        [id.to_string()],
        |row| row.get(0),
    )
    .map_err(|e| Error::database(e.to_string()))
}

/// List one page of items, newest first.
pub fn list_items(conn: &Connection, page: Page) -> Result<Vec<Item>> {
    let q = format!(
        "SELECT {COLS} FROM items ORDER BY created_at DESC, id ASC LIMIT ?1 OFFSET ?2"
    );
    let mut stmt = conn.prepare(&q).map_err(|e| Error::database(e.to_string()))?;
    let rows = stmt
        .query_map([page.limit(), page.offset()], Item::from_row)
        .map_err(|e| Error::database(e.to_string()))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::database(e.to_string()))?;
    Ok(rows)
}

/// Total number of items.
pub fn count_items(conn: &Connection) -> Result<i64> {
    conn.query_row("SELECT COUNT(*) FROM items", [], |row| row.get(0))
        .map_err(|e| Error::database(e.to_string()))
}

/// Apply a partial update. Returns `false` if the item does not exist.
pub fn update_item(conn: &Connection, id: ItemId, patch: &ItemPatch) -> Result<bool> {
    let changes = patch.changes()?;

    let mut assignments = Vec::with_capacity(changes.len() + 1);
    let mut values: Vec<Value> = Vec::with_capacity(changes.len() + 2);
    for (field, value) in changes {
        values.push(value);
        assignments.push(format!("{} = ?{}", field.column(), values.len()));
    }
    values.push(Value::Text(Utc::now().to_rfc3339()));
    assignments.push(format!("updated_at = ?{}", values.len()));
    values.push(Value::Text(id.to_string()));

    let sql = format!(
        "UPDATE items SET {} WHERE id = ?{}",
        assignments.join(", "),
        values.len()
    );

    let n = conn
        .execute(&sql, rusqlite::params_from_iter(values.iter()))
        .map_err(|e| Error::database(e.to_string()))?;
    Ok(n > 0)
}

/// Delete an item (keyword links and attachment rows cascade).
pub fn delete_item(conn: &Connection, id: ItemId) -> Result<bool> {
    let n = conn
        .execute("DELETE FROM items WHERE id = ?1", [id.to_string()])
        .map_err(|e| Error::database(e.to_string()))?;
    Ok(n > 0)
}
