//! Tracing bootstrap: a single entry point that initialises the global
//! `tracing` subscriber once at process startup.

use std::fs::OpenOptions;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

/// Initialise the global `tracing` subscriber.
///
/// `log_target` is the CLI's `-l` value: `"-"` logs to standard error,
/// anything else is treated as a file path to append to.
pub fn init_tracing(log_target: &str) -> std::io::Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    if log_target == "-" {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        let file = OpenOptions::new().create(true).append(true).open(log_target)?;
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_writer(Mutex::new(file))
            .with_ansi(false)
            .init();
    }

    Ok(())
}
