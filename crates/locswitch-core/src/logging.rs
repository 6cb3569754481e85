//! Logging configuration using tracing

use std::path::PathBuf;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::error::Result;

/// Environment variable controlling the log filter
pub const LOG_ENV_VAR: &str = "LOCSWITCH_LOG";

const DEFAULT_FILTER: &str = "locswitch=info,warn";

const LOG_FILE_PREFIX: &str = "locswitch.log";

/// Initialize the logging subsystem
///
/// Logs are written to `~/.local/share/locswitch/logs/`.
/// Log level is controlled by the `LOCSWITCH_LOG` environment variable.
///
/// # Examples
/// ```bash
/// LOCSWITCH_LOG=debug locswitch --headless
/// LOCSWITCH_LOG=locswitch_app=trace locswitch --headless
/// ```
pub fn init() -> Result<()> {
    let log_dir = get_log_directory()?;
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = RollingFileAppender::new(Rotation::DAILY, &log_dir, LOG_FILE_PREFIX);

    tracing_subscriber::registry()
        .with(env_filter())
        .with(
            fmt::layer()
                .with_writer(file_appender)
                .with_ansi(false)
                .with_target(true)
                .with_thread_ids(false)
                .with_file(true)
                .with_line_number(true)
                .with_timer(fmt::time::ChronoLocal::new(
                    "%Y-%m-%d %H:%M:%S%.3f".to_string(),
                )),
        )
        .init();

    tracing::info!("═══════════════════════════════════════════════════════");
    tracing::info!("locswitch starting");
    tracing::info!("Log file: {}", get_current_log_file()?.display());
    tracing::info!("═══════════════════════════════════════════════════════");

    Ok(())
}

/// Build the filter from `LOCSWITCH_LOG`, defaulting to info for our crates
fn env_filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Get the log directory path
fn get_log_directory() -> Result<PathBuf> {
    let base = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    Ok(base.join("locswitch").join("logs"))
}

/// Get the log file path for the current day
///
/// The daily appender suffixes the prefix with the UTC date.
pub fn get_current_log_file() -> Result<PathBuf> {
    let dir = get_log_directory()?;
    let today = chrono::Utc::now().format("%Y-%m-%d");
    Ok(dir.join(format!("{}.{}", LOG_FILE_PREFIX, today)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_log_file_lives_in_locswitch_dir() {
        let path = get_current_log_file().unwrap();
        assert!(path.parent().unwrap().ends_with("locswitch/logs"));

        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("locswitch.log."));
        assert_eq!(name.len(), "locswitch.log.".len() + "YYYY-MM-DD".len());
    }

    #[test]
    #[serial]
    fn test_env_filter_falls_back_to_default() {
        std::env::remove_var(LOG_ENV_VAR);
        let filter = env_filter().to_string();
        assert!(filter.contains("locswitch=info"));
        assert!(filter.contains("warn"));
    }

    #[test]
    #[serial]
    fn test_env_filter_reads_env_var() {
        std::env::set_var(LOG_ENV_VAR, "debug");
        let filter = env_filter();
        std::env::remove_var(LOG_ENV_VAR);
        assert_eq!(filter.to_string(), "debug");
    }
}
