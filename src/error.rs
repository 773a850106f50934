//! Error types for the storage boundary. The store itself never returns these
//! to its callers; it records and logs them instead.

/// Failure reported by a [`Storage`](crate::storage::Storage) capability.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The backend refused the request for a reason of its own.
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Problems turning the entry list into bytes or back.
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("persisted RSVP list is malformed: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("failed to encode RSVP list: {0}")]
    Encode(#[source] serde_json::Error),

    /// Decoded fine, but two entries share a player id.
    #[error("persisted RSVP list repeats player id '{0}'")]
    DuplicateId(String),
}
