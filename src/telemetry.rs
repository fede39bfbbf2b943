//! File-backed tracing. The terminal belongs to the TUI, so log output goes to
//! a file and only when enabled.

use std::fs::OpenOptions;
use std::sync::{Mutex, OnceLock};

use crate::config::AppConfig;

static TRACING_INIT: OnceLock<()> = OnceLock::new();

fn init_tracing_once(config: &AppConfig, once: &OnceLock<()>) {
    if !config.logs {
        return;
    }

    let _ = once.get_or_init(|| {
        let path = config.log_path();
        let file = match OpenOptions::new().create(true).append(true).open(&path) {
            Ok(file) => file,
            Err(_) => return,
        };
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .with_target(false)
            .with_writer(Mutex::new(file))
            .finish();
        let _ = tracing::subscriber::set_global_default(subscriber);
    });
}

/// Install the global subscriber once per process.
pub fn init_tracing(config: &AppConfig) {
    init_tracing_once(config, &TRACING_INIT);
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn disabled_logging_creates_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("disabled.log");
        let mut config = AppConfig::parse_from(["user-registry"]);
        config.log_file = Some(path.clone());

        init_tracing_once(&config, &OnceLock::new());

        assert!(!path.exists());
    }

    #[test]
    fn enabled_logging_creates_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("enabled.log");
        let mut config = AppConfig::parse_from(["user-registry", "--logs"]);
        config.log_file = Some(path.clone());

        init_tracing_once(&config, &OnceLock::new());

        assert!(path.exists());
    }
}
