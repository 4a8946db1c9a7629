//! vt-core: shared types, IDs, errors, and configuration.
//!
//! This crate is the foundational dependency for all other vt-* crates,
//! providing type-safe identifiers, a unified error type (including the
//! image pipeline's error taxonomy), media types, and application
//! configuration.

pub mod config;
pub mod error;
pub mod ids;
pub mod media;

// Re-export the most commonly used items at the crate root.
pub use error::{Error, MediaError, Result};
pub use ids::*;
pub use media::*;
