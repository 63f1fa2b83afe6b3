//! # Configuration
//!
//! Settings are layered, lowest precedence first:
//!
//! 1. Built-in defaults
//! 2. `moodlog.toml` (or the file named by `--config`)
//! 3. Command-line flags
//!
//! ```toml
//! database = "data/db.json"
//! backend = "file"          # or "redb"
//!
//! [server]
//! host = "127.0.0.1"
//! port = 3001
//!
//! [views]
//! calendar_weeks = 12
//! history_limit = 30
//! ```
//!
//! Security knobs (CORS, rate limit, API key) and the log format stay in the
//! environment; see `api` and `main`.

use crate::error::AppError;
use moodlog_core::{
    BackendKind,
    primitives::{DEFAULT_CALENDAR_WEEKS, DEFAULT_HISTORY_LIMIT, MAX_CALENDAR_WEEKS},
};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Config file looked up in the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "moodlog.toml";

/// Largest config file we are willing to read.
const MAX_CONFIG_SIZE: u64 = 64 * 1024;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 3001;

// =============================================================================
// FILE LAYER
// =============================================================================

/// Contents of the TOML file. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub database: Option<PathBuf>,
    pub backend: Option<String>,
    pub server: ServerSection,
    pub views: ViewsSection,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerSection {
    pub host: Option<String>,
    pub port: Option<u16>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ViewsSection {
    pub calendar_weeks: Option<u32>,
    pub history_limit: Option<usize>,
}

impl FileConfig {
    /// Parse a TOML document.
    pub fn parse(raw: &str) -> Result<Self, AppError> {
        toml::from_str(raw).map_err(|e| AppError::Config(format!("invalid config: {}", e)))
    }

    /// Load the config file.
    ///
    /// An explicit path must exist. Without one, `moodlog.toml` in the working
    /// directory is used if present, otherwise an empty config.
    pub fn load(explicit: Option<&Path>) -> Result<Self, AppError> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => {
                let fallback = PathBuf::from(DEFAULT_CONFIG_FILE);
                if !fallback.is_file() {
                    return Ok(Self::default());
                }
                fallback
            }
        };

        let metadata = std::fs::metadata(&path).map_err(|e| {
            AppError::Config(format!("cannot read '{}': {}", path.display(), e))
        })?;
        if metadata.len() > MAX_CONFIG_SIZE {
            return Err(AppError::Config(format!(
                "'{}' is {} bytes, maximum is {}",
                path.display(),
                metadata.len(),
                MAX_CONFIG_SIZE
            )));
        }

        let raw = std::fs::read_to_string(&path).map_err(|e| {
            AppError::Config(format!("cannot read '{}': {}", path.display(), e))
        })?;
        tracing::debug!(path = %path.display(), "Loaded config file");
        Self::parse(&raw)
    }
}

// =============================================================================
// RESOLVED SETTINGS
// =============================================================================

/// Values given on the command line; `None` means "not given".
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub database: Option<PathBuf>,
    pub backend: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
}

/// Fully resolved settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub database: PathBuf,
    pub backend: BackendKind,
    pub host: String,
    pub port: u16,
    pub calendar_weeks: u32,
    pub history_limit: usize,
}

impl Settings {
    /// Merge defaults, file and flags.
    pub fn resolve(file: FileConfig, overrides: Overrides) -> Result<Self, AppError> {
        let backend_name = overrides.backend.or(file.backend);
        let backend = match backend_name {
            Some(name) => name
                .parse::<BackendKind>()
                .map_err(|e| AppError::Config(e.to_string()))?,
            None => BackendKind::default(),
        };

        let database = overrides
            .database
            .or(file.database)
            .unwrap_or_else(|| default_database(backend));

        let calendar_weeks = file.views.calendar_weeks.unwrap_or(DEFAULT_CALENDAR_WEEKS);
        if calendar_weeks == 0 || calendar_weeks > MAX_CALENDAR_WEEKS {
            return Err(AppError::Config(format!(
                "views.calendar_weeks must be between 1 and {} (got {})",
                MAX_CALENDAR_WEEKS, calendar_weeks
            )));
        }

        Ok(Self {
            database,
            backend,
            host: overrides
                .host
                .or(file.server.host)
                .unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: overrides.port.or(file.server.port).unwrap_or(DEFAULT_PORT),
            calendar_weeks,
            history_limit: file.views.history_limit.unwrap_or(DEFAULT_HISTORY_LIMIT),
        })
    }

    /// `host:port` for the listener.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Default database location for a backend.
pub fn default_database(backend: BackendKind) -> PathBuf {
    match backend {
        BackendKind::File => PathBuf::from("data/db.json"),
        BackendKind::Redb => PathBuf::from("data/moodlog.redb"),
    }
}

// =============================================================================
// TESTS
// =============================================================================
