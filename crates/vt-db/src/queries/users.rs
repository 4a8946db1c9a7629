//! Administrative user operations.

use chrono::Utc;
use rusqlite::Connection;
use vt_core::{Error, Result, UserId};

use crate::models::User;

const COLS: &str = "id, email, password_hash, role, last_login, created_at";

/// Create a new user and return it.
pub fn create_user(
    conn: &Connection,
    email: &str,
    password_hash: &str,
    role: &str,
) -> Result<User> {
    let id = UserId::new();
    let created_at = Utc::now().to_rfc3339();

    conn.execute(
        "INSERT INTO users (id, email, password_hash, role, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        rusqlite::params![id.to_string(), email, password_hash, role, created_at],
    )
    .map_err(|e| {
        if e.to_string().contains("UNIQUE constraint failed") {
            Error::Conflict(format!("User '{email}' already exists"))
        } else {
            Error::database(e.to_string())
        }
    })?;

    Ok(User {
        id,
        email: email.to_string(),
        password_hash: password_hash.to_string(),
        role: role.to_string(),
        last_login: None,
        created_at,
    })
}

/// Get a user by primary key.
pub fn get_user_by_id(conn: &Connection, id: UserId) -> Result<Option<User>> {
    let q = format!("SELECT {COLS} FROM users WHERE id = ?1");
    match conn.query_row(&q, [id.to_string()], User::from_row) {
        Ok(u) => Ok(Some(u)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(Error::database(e.to_string())),
    }
}

/// Get a user by e-mail address.
pub fn get_user_by_email(conn: &Connection, email: &str) -> Result<Option<User>> {
    let q = format!("SELECT {COLS} FROM users WHERE email = ?1");
    match conn.query_row(&q, [email], User::from_row) {
        Ok(u) => Ok(Some(u)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(Error::database(e.to_string())),
    }
}

/// Record a successful login.
pub fn touch_last_login(conn: &Connection, id: UserId) -> Result<()> {
    conn.execute(
        "UPDATE users SET last_login = ?1 WHERE id = ?2",
        rusqlite::params![Utc::now().to_rfc3339(), id.to_string()],
    )
    .map_err(|e| Error::database(e.to_string()))?;
    Ok(())
}
