//! Client configuration: an optional RON file, overridden by command-line flags.
use std::fs;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Parser;
use log::LevelFilter;
use logmate_engine::ClientSettings;
use serde::Deserialize;
use thiserror::Error;

/// Upload log files to a LogMate service and follow their analysis.
#[derive(Debug, Parser)]
#[command(name = "logmate", version, about, long_about = None)]
pub struct Args {
    /// Log files to upload, as one batch.
    #[arg(required = true, value_name = "FILE")]
    pub files: Vec<PathBuf>,

    /// Root url of the analysis service.
    #[arg(long, value_name = "URL")]
    pub server: Option<String>,

    /// Websocket url of the status stream; derived from --server when omitted.
    #[arg(long, value_name = "URL")]
    pub stream_url: Option<String>,

    /// Maximum uploads in flight; 0 sends every file at once.
    #[arg(long, value_name = "N")]
    pub max_concurrent: Option<usize>,

    /// RON configuration file.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Write the result of every completed task into this directory.
    #[arg(long, value_name = "DIR")]
    pub export_dir: Option<PathBuf>,

    /// Send logs to this file instead of the terminal.
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Refresh interval of the progress display, in milliseconds.
    #[arg(long, value_name = "MS")]
    pub refresh_ms: Option<u64>,

    /// Log at debug level.
    #[arg(short, long)]
    pub verbose: bool,
}

/// Shape of the configuration file. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub server: Option<String>,
    pub stream_url: Option<String>,
    pub connect_timeout_secs: Option<u64>,
    pub request_timeout_secs: Option<u64>,
    pub max_file_bytes: Option<u64>,
    pub max_concurrent: Option<usize>,
    pub export_dir: Option<PathBuf>,
    pub log_file: Option<PathBuf>,
    pub refresh_ms: Option<u64>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot parse config file {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: ron::error::SpannedError,
    },
    #[error("invalid setting: {0}")]
    Invalid(String),
}

/// Everything a session needs, after merging file and flags.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub settings: ClientSettings,
    pub export_dir: Option<PathBuf>,
    pub log_file: Option<PathBuf>,
    pub refresh: Duration,
    pub log_level: LevelFilter,
}

const DEFAULT_REFRESH_MS: u64 = 500;

pub fn load_file_config(path: &Path) -> Result<FileConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    ron::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

impl Args {
    /// Reads `--config` if given and merges it under the flags.
    pub fn run_config(&self) -> Result<RunConfig, ConfigError> {
        let file = match &self.config {
            Some(path) => load_file_config(path)?,
            None => FileConfig::default(),
        };
        resolve(self, file)
    }
}

/// Flags win over the file, the file wins over built-in defaults.
pub fn resolve(args: &Args, file: FileConfig) -> Result<RunConfig, ConfigError> {
    let mut settings = ClientSettings::default();
    if let Some(server) = args.server.clone().or(file.server) {
        settings.base_url = server;
    }
    settings.stream_url = args.stream_url.clone().or(file.stream_url);
    if let Some(secs) = file.connect_timeout_secs {
        settings.connect_timeout = Duration::from_secs(secs);
    }
    if let Some(secs) = file.request_timeout_secs {
        settings.request_timeout = Duration::from_secs(secs);
    }
    if let Some(max) = file.max_file_bytes {
        if max == 0 {
            return Err(ConfigError::Invalid("max_file_bytes must be positive".into()));
        }
        settings.max_file_bytes = max;
    }
    settings.max_concurrent_uploads = args
        .max_concurrent
        .or(file.max_concurrent)
        .and_then(NonZeroUsize::new);

    settings
        .endpoint("/")
        .map_err(|err| ConfigError::Invalid(format!("server url {:?}: {err}", settings.base_url)))?;
    settings
        .resolved_stream_url()
        .map_err(|err| ConfigError::Invalid(err.to_string()))?;

    let refresh_ms = args
        .refresh_ms
        .or(file.refresh_ms)
        .unwrap_or(DEFAULT_REFRESH_MS);
    if refresh_ms == 0 {
        return Err(ConfigError::Invalid("refresh interval must be positive".into()));
    }

    let log_file = args.log_file.clone().or(file.log_file);
    let log_level = match (args.verbose, log_file.is_some()) {
        (true, _) => LevelFilter::Debug,
        (false, true) => LevelFilter::Info,
        // Keep the terminal readable while the progress display is running.
        (false, false) => LevelFilter::Warn,
    };

    Ok(RunConfig {
        settings,
        export_dir: args.export_dir.clone().or(file.export_dir),
        log_file,
        refresh: Duration::from_millis(refresh_ms),
        log_level,
    })
}
