//! Logging Infrastructure
//!
//! Structured logging setup with support for both development and production environments.

use std::path::Path;
use tracing_subscriber::EnvFilter;

/// Initialize the logger
pub fn init_logger() {
    init_logger_with_file(None, None, None);
}

/// Initialize the logger with optional file output
///
/// `RUST_LOG` 优先于 `log_level`。重复初始化（例如多个测试）静默忽略。
pub fn init_logger_with_file(log_level: Option<&str>, json: Option<bool>, log_dir: Option<&str>) {
    let level = log_level.unwrap_or("info");
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_file(false)
        .with_line_number(false)
        .with_thread_ids(false)
        .with_target(false);

    // Add file output if log_dir is provided
    if let Some(dir) = log_dir {
        let log_path = Path::new(dir);
        if log_path.exists()
            && let Some(dir_str) = log_path.to_str()
        {
            let file_appender = tracing_appender::rolling::daily(dir_str, "thali-core");
            let builder = builder.with_ansi(false).with_writer(file_appender);
            let _ = if json.unwrap_or(false) {
                builder.json().try_init()
            } else {
                builder.try_init()
            };
            return;
        }
        eprintln!("Log directory {} does not exist, logging to stdout", dir);
    }

    let _ = if json.unwrap_or(false) {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
}

/// Initialize from [`Config`](crate::core::Config) (`LOG_LEVEL`, `LOG_DIR`)
pub fn init_from_config(config: &crate::core::Config) {
    init_logger_with_file(Some(&config.log_level), None, config.log_dir.as_deref());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repeated_init_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let dir_str = dir.path().to_str().unwrap();
        init_logger_with_file(Some("debug"), Some(true), Some(dir_str));
        init_logger();
        tracing::info!("logger ready");
    }
}
