//! Subscriber setup for the server and the command-line client.
//!
//! The server writes human-readable lines to stdout and mirrors them, without colour codes, into
//! a log file: `DOCQA_LOG_FILE` when set, `logs/docqa.log` otherwise. The CLI only logs to
//! stderr so its stdout stays clean for answers.
use std::path::Path;
use std::sync::OnceLock;

use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

const LOG_FILE_ENV: &str = "DOCQA_LOG_FILE";
const DEFAULT_LOG_DIR: &str = "logs";
const DEFAULT_LOG_NAME: &str = "docqa.log";

/// Keeps the background log writer alive until the process exits.
static FILE_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

fn filter_or(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

/// Install the server subscriber. `RUST_LOG` overrides the `info` default.
pub fn init_tracing() {
    let file_layer = server_log_writer().map(|writer| {
        fmt::layer()
            .with_writer(writer)
            .with_ansi(false)
            .compact()
    });

    tracing_subscriber::registry()
        .with(filter_or("info"))
        .with(fmt::layer().with_target(false).compact())
        .with(file_layer)
        .init();
}

/// Install the CLI subscriber: `warn` by default, `debug` with `verbose`.
pub fn init_cli_tracing(verbose: bool) {
    tracing_subscriber::registry()
        .with(filter_or(if verbose { "debug" } else { "warn" }))
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .compact(),
        )
        .init();
}

fn server_log_writer() -> Option<NonBlocking> {
    let (writer, guard) = match std::env::var(LOG_FILE_ENV) {
        Ok(path) => open_append(Path::new(&path))?,
        Err(_) => {
            if let Err(err) = std::fs::create_dir_all(DEFAULT_LOG_DIR) {
                eprintln!("Cannot create {DEFAULT_LOG_DIR}/: {err}; file logging disabled");
                return None;
            }
            tracing_appender::non_blocking(tracing_appender::rolling::never(
                DEFAULT_LOG_DIR,
                DEFAULT_LOG_NAME,
            ))
        }
    };
    let _ = FILE_GUARD.set(guard);
    Some(writer)
}

fn open_append(path: &Path) -> Option<(NonBlocking, WorkerGuard)> {
    match std::fs::OpenOptions::new().create(true).append(true).open(path) {
        Ok(file) => Some(tracing_appender::non_blocking(file)),
        Err(err) => {
            eprintln!("Cannot open {}: {err}; file logging disabled", path.display());
            None
        }
    }
}
