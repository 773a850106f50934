//! Core library surface for the RSVP manager.
//!
//! [`RsvpStore`] is the heart of it: it owns the roster, keeps player ids
//! unique, publishes live views and mirrors every change into a [`Storage`]
//! capability. The remaining modules supply the concrete capabilities
//! (SQLite storage, tracing logger, UUID ids) and the terminal front-end that
//! the binary wires together.
pub mod config;
pub mod db;
pub mod error;
pub mod ids;
pub mod logging;
pub mod models;
pub mod observable;
pub mod storage;
pub mod store;
pub mod ui;

pub use config::AppConfig;
pub use db::SqliteStorage;
pub use error::{SnapshotError, StorageError};
pub use ids::{IdGenerator, UuidGenerator};
pub use logging::{init_tracing, Logger, TracingLogger};
pub use models::{Player, RsvpCounts, RsvpEntry, RsvpStatus};
pub use observable::{Feed, MappedFeed, Observable, Subscription};
pub use storage::{MemoryStorage, Storage, StorageCall};
pub use store::{Outcome, RsvpStore, STORAGE_KEY};

/// The interactive application entry point and state container.
pub use ui::{run_app, App};
