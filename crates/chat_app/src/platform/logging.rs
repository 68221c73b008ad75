//! Platform logging initialization for the chat client.
//!
//! The terminal belongs to the transcript, so logs only ever go to a file.

use std::fs::File;
use std::path::Path;

use log::LevelFilter;
use simplelog::{CombinedLogger, Config, ConfigBuilder, SharedLogger, WriteLogger};

/// Initialize the file logger, creating (truncating) `log_path`.
///
/// If the file cannot be created a warning goes to stderr and logging stays disabled.
pub fn initialize(log_path: &Path) {
    let level = LevelFilter::Info;

    let loggers: Vec<Box<dyn SharedLogger>> =
        match create_file_logger(level, build_config(), log_path) {
            Some(file_logger) => vec![file_logger],
            None => return,
        };

    let _ = CombinedLogger::init(loggers);
}

fn build_config() -> Config {
    ConfigBuilder::new()
        .set_time_format_rfc3339()
        .set_target_level(LevelFilter::Error)
        .build()
}

fn create_file_logger(
    level: LevelFilter,
    config: Config,
    log_path: &Path,
) -> Option<Box<WriteLogger<File>>> {
    match File::create(log_path) {
        Ok(file) => Some(WriteLogger::new(level, config, file)),
        Err(err) => {
            eprintln!("Warning: Could not create log file at {:?}: {}", log_path, err);
            None
        }
    }
}
