//! vt-db: database access and persistence layer.
//!
//! This crate provides SQLite-backed storage with connection pooling,
//! embedded migrations, typed models, per-entity field allowlists, and
//! query modules for users, items, keywords, and attachment links.

pub mod fields;
pub mod migrations;
pub mod models;
pub mod page;
pub mod pool;
pub mod queries;
