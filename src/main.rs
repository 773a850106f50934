//! Binary entry point: resolve configuration, start file logging, open the
//! SQLite roster and hand everything to the TUI.
use rsvp_manager::{
    init_tracing, run_app, App, AppConfig, RsvpStore, SqliteStorage, TracingLogger, UuidGenerator,
};

fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env()?;
    init_tracing(&config)?;
    tracing::info!(database = %config.database_path.display(), "rsvp-manager starting");

    let storage = SqliteStorage::open(&config.database_path)?;
    let store = RsvpStore::open(Box::new(storage), Box::new(TracingLogger));

    let mut app = App::new(store, Box::new(UuidGenerator));
    let result = run_app(&mut app);
    if let Err(err) = &result {
        tracing::error!(error = %err, "rsvp-manager stopped with an error");
    }
    result
}
