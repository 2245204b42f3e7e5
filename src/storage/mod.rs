//! Storage layer for sitesync.
//!
//! SQLite-based persistence for documents that must survive restarts,
//! most importantly the offline action queue.

mod database;
mod migrations;

pub use database::Database;
