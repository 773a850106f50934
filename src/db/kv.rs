use std::path::Path;

use anyhow::Result;
use rusqlite::{params, Connection, OptionalExtension};

use super::connection::{ensure_schema, ensure_schema_in_memory};
use crate::error::StorageError;
use crate::storage::Storage;

/// Key/value storage on a single `kv_store` table. Each key maps to one blob;
/// saving again replaces it.
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    pub fn open(path: &Path) -> Result<Self> {
        Ok(Self {
            conn: ensure_schema(path)?,
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        Ok(Self {
            conn: ensure_schema_in_memory()?,
        })
    }
}

impl Storage for SqliteStorage {
    fn save(&self, key: &str, value: &[u8]) -> Result<(), StorageError> {
        self.conn.execute(
            "INSERT INTO kv_store (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )?;
        Ok(())
    }

    fn load(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM kv_store WHERE key = ?1",
                params![key],
                |row| row.get::<_, Vec<u8>>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn clear(&self, key: &str) -> Result<(), StorageError> {
        self.conn
            .execute("DELETE FROM kv_store WHERE key = ?1", params![key])?;
        Ok(())
    }
}
