//! SQLite-backed storage capability.

mod connection;
mod kv;

pub use connection::{ensure_schema, ensure_schema_in_memory};
pub use kv::SqliteStorage;
