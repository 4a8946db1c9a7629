//! Database query modules.

pub mod attachments;
pub mod items;
pub mod keywords;
pub mod users;
