//! Tracing subscriber setup

use crate::error::{ClaimerError, ClaimerResult};
use std::fs;
use std::path::Path;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Install the global subscriber
///
/// Logs go to stderr and, when `log_file` is set, to a file next to it that
/// rolls over daily without ANSI colours: `logs/zro_claimer.log` is written
/// as `logs/zro_claimer.2026-01-31.log`. `RUST_LOG` overrides the default
/// `info` filter.
pub fn init_logging(log_file: Option<&Path>) -> ClaimerResult<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let console = fmt::layer().with_target(false).with_writer(std::io::stderr);

    let file = match log_file {
        Some(path) => Some(
            fmt::layer()
                .with_target(false)
                .with_ansi(false)
                .with_writer(daily_appender(path)?),
        ),
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file)
        .try_init()
        .map_err(|e| ClaimerError::ConfigError(format!("Failed to initialise logging: {}", e)))
}

fn daily_appender(path: &Path) -> ClaimerResult<RollingFileAppender> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(dir)?;

    let prefix = path
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| ClaimerError::ConfigError(format!("Invalid log file: {}", path.display())))?;

    let mut builder = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(prefix);
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        builder = builder.filename_suffix(ext);
    }

    builder
        .build(dir)
        .map_err(|e| ClaimerError::ConfigError(format!("Failed to open log file: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dated_logs(dir: &Path) -> Vec<String> {
        fs::read_dir(dir)
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn test_creates_log_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("claimer.log");

        // Another test may have installed a subscriber already; the log
        // directory is created either way.
        let _ = init_logging(Some(&path));
        assert!(path.parent().unwrap().is_dir());
    }

    #[test]
    fn test_log_file_is_dated() {
        let dir = tempfile::tempdir().unwrap();
        let _appender = daily_appender(&dir.path().join("claimer.log")).unwrap();

        let names = dated_logs(dir.path());
        assert_eq!(names.len(), 1);
        let name = &names[0];
        assert!(name.starts_with("claimer.") && name.ends_with(".log"), "{}", name);
        // claimer.YYYY-MM-DD.log
        assert_eq!(name.len(), "claimer.".len() + 10 + ".log".len());
    }
}
