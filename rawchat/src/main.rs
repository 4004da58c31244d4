//! `rawchat` — raw line-protocol client for Twitch chat.
//!
//! Lines typed on stdin are sent to the server as-is; every line the
//! server sends is logged. Keepalive pings are answered automatically.
//!
//! ```bash
//! # TLS to irc.chat.twitch.tv:6697
//! TW_OAUTH=xxxxxxxx TW_NICK=mybot cargo run --bin rawchat
//!
//! # Plaintext, with control characters shown as \uXXXX
//! TW_OAUTH=xxxxxxxx cargo run --bin rawchat -- --insecure --replace-unprintables
//! ```

use std::io::BufReader;
use std::path::Path;
use std::process::ExitCode;

use clap::Parser;
use tracing_appender::non_blocking::WorkerGuard;

use rawchat::app::{self, StartupError};
use rawchat::config::{CliArgs, ClientConfig};
use rawchat::session;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = CliArgs::parse();

    // Logging comes first so configuration problems are reported through it.
    let _log_guard = init_logging(&cli.log_level, cli.log_file.as_deref());

    let config = match ClientConfig::load(&cli) {
        Ok(c) => c,
        Err(e) => {
            tracing::error!(error = %e, "configuration error");
            return StartupError::from(e).into();
        }
    };

    let conn = match app::start(&config).await {
        Ok(conn) => conn,
        Err(e) => {
            tracing::error!(error = %e, "startup failed");
            return e.into();
        }
    };

    let input = BufReader::new(std::io::stdin());
    match session::run(conn, input, config.session).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "session failed to start");
            StartupError::Input(e).into()
        }
    }
}

/// Initialize logging to stderr, or to `file_path` when given.
///
/// Returns a [`WorkerGuard`] for file logging that must be held until
/// shutdown so buffered entries are flushed.
fn init_logging(level: &str, file_path: Option<&Path>) -> Option<WorkerGuard> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let Some((log_dir, file_name)) = file_path.and_then(split_log_path) else {
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_env_filter(env_filter)
            .init();
        return None;
    };

    let file_appender = tracing_appender::rolling::never(log_dir, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_env_filter(env_filter)
        .with_ansi(false)
        .init();

    Some(guard)
}

fn split_log_path(path: &Path) -> Option<(&Path, &str)> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    Some((dir, path.file_name()?.to_str()?))
}
