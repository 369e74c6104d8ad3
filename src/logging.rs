//! Tracing initialisation.

use std::fs::File;
use std::io;
use std::path::Path;
use std::sync::{Mutex, Once};

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

static INIT: Once = Once::new();

/// Reads `POPDASH_LOG` for per-module levels, falling back to
/// `pop_dashboard=info`.
fn env_filter() -> EnvFilter {
    EnvFilter::try_from_env("POPDASH_LOG").unwrap_or_else(|_| EnvFilter::new("pop_dashboard=info"))
}

/// Send logs to `path`. The terminal belongs to the UI while it runs.
/// Only the first call opens (and truncates) the file.
pub fn init_file_tracing(path: &Path) -> io::Result<()> {
    let mut result = Ok(());
    INIT.call_once(|| match File::create(path) {
        Ok(file) => {
            let _ = tracing_subscriber::registry()
                .with(
                    fmt::layer()
                        .with_writer(Mutex::new(file))
                        .with_ansi(false)
                        .with_target(true),
                )
                .with(env_filter())
                .try_init();
        }
        Err(err) => result = Err(err),
    });
    result
}

/// Send logs to stderr, keeping stdout for the report itself.
pub fn init_stderr_tracing() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::registry()
            .with(fmt::layer().with_writer(io::stderr).with_target(true))
            .with(env_filter())
            .try_init();
    });
}
