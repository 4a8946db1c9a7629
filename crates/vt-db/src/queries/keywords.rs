//! Keyword dictionary and item/keyword link operations.

use chrono::Utc;
use rusqlite::Connection;
use vt_core::{Error, ItemId, KeywordId, Result};

use crate::models::Keyword;
use crate::page::Page;

const COLS: &str = "id, name, created_at";

/// Insert a batch of keywords atomically.
///
/// Either every name is inserted or none is: a name that already exists (or
/// appears twice in the batch) rolls the whole batch back with a conflict.
pub fn create_keywords(conn: &Connection, names: &[String]) -> Result<Vec<Keyword>> {
    if names.is_empty() {
        return Err(Error::Validation("at least one keyword is required".into()));
    }
    if let Some(blank) = names.iter().position(|n| n.trim().is_empty()) {
        return Err(Error::Validation(format!("keyword {blank} has an empty name")));
    }

    let tx = conn
        .unchecked_transaction()
        .map_err(|e| Error::database(e.to_string()))?;

    let now = Utc::now().to_rfc3339();
    let mut created = Vec::with_capacity(names.len());
    for name in names {
        let name = name.trim();
        let id = KeywordId::new();
        tx.execute(
            "INSERT INTO keywords (id, name, created_at) VALUES (?1, ?2, ?3)",
            rusqlite::params![id.to_string(), name, now],
        )
        .map_err(|e| {
            if e.to_string().contains("UNIQUE constraint failed") {
                Error::Conflict(format!("Keyword '{name}' already exists"))
            } else {
                Error::database(e.to_string())
            }
        })?;
        created.push(Keyword {
            id,
            name: name.to_string(),
            created_at: now.clone(),
        });
    }

    tx.commit().map_err(|e| Error::database(e.to_string()))?;
    Ok(created)
}

/// Get a keyword by ID.
pub fn get_keyword(conn: &Connection, id: KeywordId) -> Result<Option<Keyword>> {
    let q = format!("SELECT {COLS} FROM keywords WHERE id = ?1");
    match conn.query_row(&q, [id.to_string()], Keyword::from_row) {
        Ok(k) => Ok(Some(k)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(Error::database(e.to_string())),
    }
}

/// Escape `%`, `_` and the escape character itself for a `LIKE ... ESCAPE '\'`.
fn escape_like(term: &str) -> String {
    let mut out = String::with_capacity(term.len() + 2);
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn like_pattern(search: Option<&str>) -> String {
    match search.map(str::trim).filter(|s| !s.is_empty()) {
        Some(term) => format!("%{}%", escape_like(term)),
        None => "%".to_string(),
    }
}

/// Search keywords by case-insensitive substring, alphabetically.
///
/// The search term is matched literally; wildcard characters in it carry no
/// special meaning.
pub fn search_keywords(conn: &Connection, search: Option<&str>, page: Page) -> Result<Vec<Keyword>> {
    let q = format!(
        "SELECT {COLS} FROM keywords WHERE name LIKE ?1 ESCAPE '\\'
         ORDER BY name COLLATE NOCASE ASC LIMIT ?2 OFFSET ?3"
    );
    let mut stmt = conn.prepare(&q).map_err(|e| Error::database(e.to_string()))?;
    let rows = stmt
        .query_map(
            rusqlite::params![like_pattern(search), page.limit(), page.offset()],
            Keyword::from_row,
        )
        .map_err(|e| Error::database(e.to_string()))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::database(e.to_string()))?;
    Ok(rows)
}

/// Number of keywords matching a search term.
pub fn count_keywords(conn: &Connection, search: Option<&str>) -> Result<i64> {
    conn.query_row(
        "SELECT COUNT(*) FROM keywords WHERE name LIKE ?1 ESCAPE '\\'",
        [like_pattern(search)],
        |row| row.get(0),
    )
    .map_err(|e| Error::database(e.to_string()))
}

/// Keywords linked to an item, alphabetically.
pub fn list_keywords_for_item(conn: &Connection, item_id: ItemId) -> Result<Vec<Keyword>> {
    let mut stmt = conn
        .prepare(
            "SELECT k.id, k.name, k.created_at FROM keywords k
             JOIN item_keywords ik ON ik.keyword_id = k.id
             WHERE ik.item_id = ?1
             ORDER BY k.name COLLATE NOCASE ASC",
        )
        .map_err(|e| Error::database(e.to_string()))?;
    let rows = stmt
        .query_map([item_id.to_string()], Keyword::from_row)
        .map_err(|e| Error::database(e.to_string()))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::database(e.to_string()))?;
    Ok(rows)
}

/// Link keywords to an item, ignoring links that already exist.
///
/// Runs in one transaction. Returns the number of new links. A keyword ID
/// that does not exist fails the whole batch with a validation error.
pub fn link_keywords(conn: &Connection, item_id: ItemId, keyword_ids: &[KeywordId]) -> Result<usize> {
    let tx = conn
        .unchecked_transaction()
        .map_err(|e| Error::database(e.to_string()))?;

    let mut inserted = 0;
    for keyword_id in keyword_ids {
        inserted += tx
            .execute(
                "INSERT OR IGNORE INTO item_keywords (item_id, keyword_id) VALUES (?1, ?2)",
                rusqlite::params![item_id.to_string(), keyword_id.to_string()],
            )
            .map_err(|e| {
                if e.to_string().contains("FOREIGN KEY constraint failed") {
                    Error::Validation(format!("Unknown keyword: {keyword_id}"))
                } else {
                    Error::database(e.to_string())
                }
            })?;
    }

    tx.commit().map_err(|e| Error::database(e.to_string()))?;
    Ok(inserted)
}
