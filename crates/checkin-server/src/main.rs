//! Checkin - a single-user check-in reminder service.
//!
//! The operator logs in, checks in, and picks how many hours must pass
//! before the next check-in is accepted. History is kept in a JSON file.

mod config;
mod page;
mod server;
mod utils;

use std::io;
use std::path::Path;

use anyhow::{Context, Result};
use checkin_core::{LedgerStore, SessionAuthority};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use config::Config;
use server::AppState;

/// File name prefix for the rolling log in `LOG_DIR`
const LOG_FILE_PREFIX: &str = "checkin.log";

/// Initialize the tracing subscriber for logging.
/// The returned guard must stay alive for file logs to be flushed.
fn init_tracing(log_dir: Option<&Path>) -> Option<WorkerGuard> {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (Some(fmt::layer().with_writer(writer).with_ansi(false)), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .with(filter)
        .init();

    guard
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let config = Config::from_env()?;
    let _log_guard = init_tracing(config.log_dir.as_deref());

    info!(
        username = %config.username,
        data_dir = %config.data_dir.display(),
        reset = config.reset,
        "Checkin starting"
    );

    if config.reset {
        LedgerStore::reset(&config.data_dir);
    }

    let ledger = LedgerStore::open(&config.data_dir, &config.username)
        .with_context(|| format!("Failed to open ledger in {}", config.data_dir.display()))?;
    let sessions = SessionAuthority::new(config.credentials());

    server::run(config.bind_address(), AppState::new(ledger, sessions)).await
}
