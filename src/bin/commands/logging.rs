use std::fs::{self, File};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;
use tracing_subscriber::{EnvFilter, filter::LevelFilter, fmt, prelude::*};

/// Installs the global subscriber: a compact stderr layer plus an optional plain-text file.
///
/// `RUST_LOG` takes precedence over the `-v`/`-q` level when set.
pub fn setup_logging(verbosity: u8, quiet: bool, log_file: Option<&Path>) -> Result<()> {
    let level = level_for(verbosity, quiet);
    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact();

    let subscriber = tracing_subscriber::registry().with(filter).with(stderr_layer);

    match log_file {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create log directory {}", parent.display())
                })?;
            }
            let file = File::create(path)
                .with_context(|| format!("Failed to create log file {}", path.display()))?;
            let file_layer = fmt::layer()
                .with_writer(file)
                .with_ansi(false)
                .with_target(true);
            subscriber.with(file_layer).init();
        }
        None => subscriber.init(),
    }
    Ok(())
}

fn level_for(verbosity: u8, quiet: bool) -> LevelFilter {
    if quiet {
        return LevelFilter::OFF;
    }
    match verbosity {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    }
}

/// `<log_dir>/protprep_<YYYYmmdd_HHMMSS>.log`, stamped with the current local time.
pub fn run_log_path(log_dir: &Path) -> PathBuf {
    log_dir.join(format!(
        "protprep_{}.log",
        Local::now().format("%Y%m%d_%H%M%S")
    ))
}
