//! Client configuration: optional RON file overlaid by command-line flags.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chat_engine::QuerySettings;
use chat_logging::{chat_info, chat_warn};
use clap::Parser;
use serde::{Deserialize, Serialize};

const DEFAULT_LOG_FILE: &str = "./rag_chat.log";

#[derive(Debug, Parser)]
#[command(name = "rag-chat", about = "Terminal chat client for a RAG query server")]
pub struct Args {
    /// Base URL of the query server, e.g. http://127.0.0.1:8000
    #[arg(long)]
    pub server_url: Option<String>,
    /// RON configuration file.
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Where to write the log.
    #[arg(long)]
    pub log_file: Option<PathBuf>,
    /// Treat non-2xx responses as communication errors.
    #[arg(long)]
    pub check_status: bool,
}

impl Args {
    pub fn log_path(&self) -> PathBuf {
        self.log_file
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_FILE))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ClientConfig {
    pub server_url: Option<String>,
    pub connect_timeout_secs: Option<u64>,
    pub request_timeout_secs: Option<u64>,
    pub check_status: bool,
}

impl ClientConfig {
    /// Loads `path`, falling back to defaults when the file is missing or unusable.
    pub fn load(path: &Path) -> Self {
        let content = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Self::default();
            }
            Err(err) => {
                chat_warn!("Failed to read config from {:?}: {}", path, err);
                return Self::default();
            }
        };

        match ron::from_str(&content) {
            Ok(config) => {
                chat_info!("Loaded config from {:?}", path);
                config
            }
            Err(err) => {
                chat_warn!("Failed to parse config from {:?}: {}", path, err);
                Self::default()
            }
        }
    }

    pub fn apply_args(mut self, args: &Args) -> Self {
        if let Some(url) = &args.server_url {
            self.server_url = Some(url.clone());
        }
        if args.check_status {
            self.check_status = true;
        }
        self
    }

    pub fn query_settings(&self) -> QuerySettings {
        let defaults = QuerySettings::default();
        QuerySettings {
            base_url: self.server_url.clone().unwrap_or(defaults.base_url),
            connect_timeout: self.connect_timeout_secs.map(Duration::from_secs),
            request_timeout: self.request_timeout_secs.map(Duration::from_secs),
            check_status: self.check_status,
        }
    }
}
