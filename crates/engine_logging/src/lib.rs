#![deny(missing_docs)]
//! Shared logging utilities for the LogMate workspace.
//!
//! This crate provides the `engine_*` logging macros used across the codebase,
//! the terminal/file logger setup used by the binary, and a minimal test
//! initializer for the global logger.

use std::fs::File;
use std::path::{Path, PathBuf};

use log::LevelFilter;
use simplelog::{
    ColorChoice, CombinedLogger, Config, ConfigBuilder, SharedLogger, TermLogger, TerminalMode,
    WriteLogger,
};

/// Logs a trace-level message using the global logging facade.
#[macro_export]
macro_rules! engine_trace {
    ($($arg:tt)*) => {{
        log::trace!($($arg)*);
    }};
}

/// Logs an info-level message using the global logging facade.
#[macro_export]
macro_rules! engine_info {
    ($($arg:tt)*) => {{
        log::info!($($arg)*);
    }};
}

/// Logs a debug-level message using the global logging facade.
#[macro_export]
macro_rules! engine_debug {
    ($($arg:tt)*) => {{
        log::debug!($($arg)*);
    }};
}

/// Logs a warn-level message using the global logging facade.
#[macro_export]
macro_rules! engine_warn {
    ($($arg:tt)*) => {{
        log::warn!($($arg)*);
    }};
}

/// Logs an error-level message using the global logging facade.
#[macro_export]
macro_rules! engine_error {
    ($($arg:tt)*) => {{
        log::error!($($arg)*);
    }};
}

/// Destination for log output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogDestination {
    /// Write to the terminal (stderr for warnings and errors, stdout otherwise).
    Terminal,
    /// Write to the given file, truncating it first.
    File(PathBuf),
    /// Write to both the terminal and the given file.
    Both(PathBuf),
}

/// Initialize the global logger with the specified level and destination.
///
/// When the log file cannot be created the file sink is skipped with a
/// warning on stderr; a `File` destination then falls back to the terminal.
/// Returns `false` if a global logger was already installed.
pub fn initialize(level: LevelFilter, destination: LogDestination) -> bool {
    let config = build_config();

    let mut loggers: Vec<Box<dyn SharedLogger>> = Vec::new();
    match &destination {
        LogDestination::Terminal => loggers.push(terminal_logger(level, config)),
        LogDestination::File(path) => match create_file_logger(level, config.clone(), path) {
            Some(file_logger) => loggers.push(file_logger),
            None => loggers.push(terminal_logger(level, config)),
        },
        LogDestination::Both(path) => {
            loggers.push(terminal_logger(level, config.clone()));
            if let Some(file_logger) = create_file_logger(level, config, path) {
                loggers.push(file_logger);
            }
        }
    }

    CombinedLogger::init(loggers).is_ok()
}

/// Initializes a simple terminal logger for use in unit tests.
///
/// This safely no-ops if another logger has already been initialized.
pub fn initialize_for_tests() {
    // Use debug level in debug builds, info in release builds.
    let level = if cfg!(debug_assertions) {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    // Ignore the error if a logger was already set by another test.
    let _ = CombinedLogger::init(vec![TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )]);
}

fn build_config() -> Config {
    ConfigBuilder::new()
        .set_time_format_rfc3339()
        .set_target_level(LevelFilter::Error)
        .build()
}

fn terminal_logger(level: LevelFilter, config: Config) -> Box<dyn SharedLogger> {
    TermLogger::new(level, config, TerminalMode::Mixed, ColorChoice::Auto)
}

fn create_file_logger(
    level: LevelFilter,
    config: Config,
    path: &Path,
) -> Option<Box<dyn SharedLogger>> {
    match File::create(path) {
        Ok(file) => {
            let logger: Box<dyn SharedLogger> = WriteLogger::new(level, config, file);
            Some(logger)
        }
        Err(err) => {
            eprintln!("Warning: Could not create log file at {:?}: {}", path, err);
            None
        }
    }
}
