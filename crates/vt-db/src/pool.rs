//! SQLite connection pooling.
//!
//! Every connection handed out has foreign keys enforced; the schema relies
//! on `ON DELETE CASCADE` for keyword links and attachments.

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use vt_core::{Error, Result};

use crate::migrations;

pub type DbPool = Pool<SqliteConnectionManager>;

pub type PooledConnection = r2d2::PooledConnection<SqliteConnectionManager>;

/// Open (or create) the database file at `db_path` and migrate it.
///
/// File-backed connections also run in WAL mode so readers do not block the
/// writer.
pub fn init_pool(db_path: &str) -> Result<DbPool> {
    let manager = SqliteConnectionManager::file(db_path).with_init(|conn| {
        conn.execute_batch("PRAGMA foreign_keys = ON; PRAGMA journal_mode = WAL;")
    });
    build(manager, 8)
}

/// A private in-memory database, migrated and ready.
///
/// The database is shared between the pool's connections but not with any
/// other pool, so tests can each take their own.
pub fn init_memory_pool() -> Result<DbPool> {
    use std::sync::atomic::{AtomicU64, Ordering};
    static NEXT: AtomicU64 = AtomicU64::new(0);

    let uri = format!(
        "file:vitrine-{}-{}?mode=memory&cache=shared",
        std::process::id(),
        NEXT.fetch_add(1, Ordering::Relaxed)
    );
    let manager = SqliteConnectionManager::file(uri)
        .with_init(|conn| conn.execute_batch("PRAGMA foreign_keys = ON;"));
    build(manager, 4)
}

fn build(manager: SqliteConnectionManager, max_size: u32) -> Result<DbPool> {
    let pool = Pool::builder()
        .max_size(max_size)
        .build(manager)
        .map_err(|e| Error::database(format!("cannot open database pool: {e}")))?;

    migrations::run_migrations(&*get_conn(&pool)?)?;

    Ok(pool)
}

/// Check a connection out of the pool.
pub fn get_conn(pool: &DbPool) -> Result<PooledConnection> {
    pool.get()
        .map_err(|e| Error::database(format!("no database connection available: {e}")))
}
