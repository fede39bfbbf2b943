//! Binary entry point that glues the SQLite-backed registry to the TUI: parse
//! configuration, start logging, open the database once, drive the Ratatui
//! event loop, and close the database on the way out.
use anyhow::Context;
use clap::Parser;
use tracing::{error, info};
use user_registry::config::AppConfig;
use user_registry::ids::id_source;
use user_registry::telemetry::init_tracing;
use user_registry::{run_app, App, RecordStore, Registry};

/// Returning a `Result` bubbles up fatal problems (an unreadable database, a
/// schema from a newer build) to the terminal instead of crashing silently.
fn main() -> anyhow::Result<()> {
    let config = AppConfig::parse();
    init_tracing(&config);

    let db_path = config.resolve_db_path()?;
    let store = RecordStore::open_with_busy_timeout(&db_path, config.busy_timeout())
        .with_context(|| format!("failed to open {}", db_path.display()))?;
    let registry = Registry::new(store, id_source(config.ids));
    info!(path = %db_path.display(), ids = ?config.ids, "starting user registry");

    let mut app = App::new(registry)?;
    let result = run_app(&mut app);
    if let Err(err) = &result {
        error!(error = %err, "event loop stopped");
    }

    app.into_registry()
        .shutdown()
        .context("failed to close database")?;
    result
}
