//! Versioned schema, compiled into the binary.

use rusqlite::Connection;
use vt_core::{Error, Result};

/// V1: initial schema -- users, catalog items, keywords, and attachments.
const V1_INITIAL: &str = r#"
CREATE TABLE users (
    id            TEXT PRIMARY KEY,
    email         TEXT UNIQUE NOT NULL,
    password_hash TEXT NOT NULL,
    role          TEXT NOT NULL DEFAULT 'admin',
    last_login    TEXT,
    created_at    TEXT NOT NULL
);

CREATE TABLE items (
    id          TEXT PRIMARY KEY,
    name        TEXT NOT NULL,
    description TEXT,
    sku         TEXT,
    price_cents INTEGER,
    is_active   INTEGER NOT NULL DEFAULT 1,
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL
);

CREATE TABLE keywords (
    id         TEXT PRIMARY KEY,
    name       TEXT UNIQUE NOT NULL,
    created_at TEXT NOT NULL
);

CREATE TABLE item_keywords (
    item_id    TEXT NOT NULL REFERENCES items(id) ON DELETE CASCADE,
    keyword_id TEXT NOT NULL REFERENCES keywords(id) ON DELETE CASCADE,
    PRIMARY KEY (item_id, keyword_id)
);

CREATE TABLE attachments (
    id         TEXT PRIMARY KEY,
    item_id    TEXT NOT NULL REFERENCES items(id) ON DELETE CASCADE,
    name       TEXT UNIQUE NOT NULL,
    kind       TEXT NOT NULL,
    media_type TEXT NOT NULL,
    size_bytes INTEGER NOT NULL,
    created_at TEXT NOT NULL
);

CREATE INDEX idx_items_created ON items(created_at);
CREATE INDEX idx_item_keywords_keyword ON item_keywords(keyword_id);
CREATE INDEX idx_attachments_item ON attachments(item_id);
"#;

const MIGRATIONS: &[(i64, &str)] = &[(1, V1_INITIAL)];

/// Bring the schema on `conn` up to the newest version.
///
/// Each pending version runs in its own transaction together with its row in
/// `schema_migrations`, so a failed step leaves the previous version intact.
pub fn run_migrations(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version    INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        )",
    )
    .map_err(|e| Error::database(format!("cannot create schema_migrations: {e}")))?;

    let current: i64 = conn
        .query_row("SELECT COALESCE(MAX(version), 0) FROM schema_migrations", [], |row| {
            row.get(0)
        })
        .map_err(|e| Error::database(e.to_string()))?;

    for &(version, sql) in MIGRATIONS.iter().filter(|(v, _)| *v > current) {
        let tx = conn
            .unchecked_transaction()
            .map_err(|e| Error::database(e.to_string()))?;
        tx.execute_batch(sql)
            .and_then(|()| tx.execute("INSERT INTO schema_migrations (version) VALUES (?1)", [version]))
            .map_err(|e| Error::database(format!("migration V{version} failed: {e}")))?;
        tx.commit().map_err(|e| Error::database(e.to_string()))?;
        tracing::debug!(version, "Applied schema migration");
    }

    Ok(())
}
