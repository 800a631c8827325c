#![deny(missing_docs)]
//! Shared logging utilities for the harvester workspace.
//!
//! This crate provides the `harvest_*` logging macros used across the
//! codebase, the logger setup used by the server binary, and a minimal
//! test initializer for the global logger.
//!
//! The macros log under the `harvest` target so the harvesting pipeline can
//! be filtered separately from HTTP and database chatter.

use std::fs::File;
use std::path::{Path, PathBuf};

use log::LevelFilter;
use simplelog::{
    ColorChoice, CombinedLogger, Config, ConfigBuilder, SharedLogger, TermLogger, TerminalMode,
    WriteLogger,
};

#[doc(hidden)]
pub use log as __log;

/// Target used by every `harvest_*` macro.
pub const TARGET: &str = "harvest";

/// Logs a trace-level message under the harvest target.
#[macro_export]
macro_rules! harvest_trace {
    ($($arg:tt)*) => {{
        $crate::__log::trace!(target: $crate::TARGET, $($arg)*);
    }};
}

/// Logs a debug-level message under the harvest target.
#[macro_export]
macro_rules! harvest_debug {
    ($($arg:tt)*) => {{
        $crate::__log::debug!(target: $crate::TARGET, $($arg)*);
    }};
}

/// Logs an info-level message under the harvest target.
#[macro_export]
macro_rules! harvest_info {
    ($($arg:tt)*) => {{
        $crate::__log::info!(target: $crate::TARGET, $($arg)*);
    }};
}

/// Logs a warn-level message under the harvest target.
#[macro_export]
macro_rules! harvest_warn {
    ($($arg:tt)*) => {{
        $crate::__log::warn!(target: $crate::TARGET, $($arg)*);
    }};
}

/// Logs an error-level message under the harvest target.
#[macro_export]
macro_rules! harvest_error {
    ($($arg:tt)*) => {{
        $crate::__log::error!(target: $crate::TARGET, $($arg)*);
    }};
}

/// Destination for log output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogDestination {
    /// Write to the terminal only.
    Terminal,
    /// Write to the given file only.
    File(PathBuf),
    /// Write to both the terminal and the given file.
    Both(PathBuf),
}

/// Initialize the global logger.
///
/// A file sink that cannot be created is reported on stderr and skipped so
/// the service still starts with whatever sinks remain. Calling this twice
/// is a no-op.
pub fn initialize(destination: LogDestination, level: LevelFilter) {
    let config = build_config();

    let loggers: Vec<Box<dyn SharedLogger>> = match destination {
        LogDestination::Terminal => vec![terminal_logger(level, config)],
        LogDestination::File(path) => match create_file_logger(&path, level, config) {
            Some(file_logger) => vec![file_logger],
            None => return,
        },
        LogDestination::Both(path) => {
            let mut loggers: Vec<Box<dyn SharedLogger>> =
                vec![terminal_logger(level, config.clone())];
            if let Some(file_logger) = create_file_logger(&path, level, config) {
                loggers.push(file_logger);
            }
            loggers
        }
    };

    let _ = CombinedLogger::init(loggers);
}

/// Installs a debug-level stderr logger for test binaries that only lets
/// records under [`TARGET`] through.
///
/// Every test may call this; once a logger is installed later calls do
/// nothing.
pub fn initialize_for_tests() {
    let _ = TermLogger::init(
        LevelFilter::Debug,
        test_config(),
        TerminalMode::Stderr,
        ColorChoice::Never,
    );
}

fn build_config() -> Config {
    ConfigBuilder::new()
        .set_time_format_rfc3339()
        .set_target_level(LevelFilter::Error)
        .build()
}

fn test_config() -> Config {
    ConfigBuilder::new()
        .set_time_format_rfc3339()
        .add_filter_allow_str(TARGET)
        .build()
}

fn terminal_logger(level: LevelFilter, config: Config) -> Box<TermLogger> {
    TermLogger::new(level, config, TerminalMode::Mixed, ColorChoice::Auto)
}

fn create_file_logger(
    path: &Path,
    level: LevelFilter,
    config: Config,
) -> Option<Box<WriteLogger<File>>> {
    match File::create(path) {
        Ok(file) => Some(WriteLogger::new(level, config, file)),
        Err(err) => {
            eprintln!("Warning: Could not create log file at {:?}: {}", path, err);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{build_config, create_file_logger, test_config, TARGET};
    use log::{Level, LevelFilter, Log, Record};
    use simplelog::WriteLogger;

    #[test]
    fn file_logger_is_none_for_unwritable_path() {
        let temp = tempfile::TempDir::new().unwrap();
        let missing = temp.path().join("missing").join("harvest.log");
        assert!(create_file_logger(&missing, LevelFilter::Info, build_config()).is_none());
    }

    #[test]
    fn file_logger_creates_file() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("harvest.log");
        assert!(create_file_logger(&path, LevelFilter::Info, build_config()).is_some());
        assert!(path.exists());
    }

    #[test]
    fn test_logger_drops_other_targets() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("test.log");
        let file = std::fs::File::create(&path).unwrap();
        let logger = WriteLogger::new(LevelFilter::Debug, test_config(), file);

        for (target, text) in [(TARGET, "kept line"), ("selectors::matching", "noise line")] {
            logger.log(
                &Record::builder()
                    .target(target)
                    .level(Level::Debug)
                    .args(format_args!("{text}"))
                    .build(),
            );
        }
        logger.flush();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("kept line"));
        assert!(!written.contains("noise line"));
    }
}
