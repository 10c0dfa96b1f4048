//! Configuration for og-editable
//!
//! Configuration is loaded in order of precedence:
//! 1. Environment variables (highest priority)
//! 2. Config file (~/.config/og-editable/config.toml)
//! 3. Built-in defaults (lowest priority)

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

// ─────────────────────────────────────────────────────────────────────────────
// Submodules
// ─────────────────────────────────────────────────────────────────────────────

mod highlight;
mod observability;
mod serialization;


pub use highlight::{FileHighlight, HighlightConfig};
pub use observability::{FileLogging, LogRotation, LoggingConfig};

// ─────────────────────────────────────────────────────────────────────────────
// Constants
// ─────────────────────────────────────────────────────────────────────────────

/// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

const DEFAULT_ROUTE: &str = "/positions";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_RESOURCES: [&str; 3] = ["positions", "portfolios", "securities"];

// ─────────────────────────────────────────────────────────────────────────────
// Errors
// ─────────────────────────────────────────────────────────────────────────────

/// Config file problems; a broken file is fatal rather than silently ignored
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

// ─────────────────────────────────────────────────────────────────────────────
// Application Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Application configuration
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Base URL of the REST API; edits stay in memory when unset
    pub api_url: Option<String>,

    /// Per-request timeout for REST updates
    pub request_timeout_secs: u64,

    /// Route the session starts on, e.g. "/positions"
    pub route: String,

    /// Resource names registered with the REST client
    pub resources: Vec<String>,

    /// Hover highlight colours
    pub highlight: HighlightConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: None,
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
            route: DEFAULT_ROUTE.to_string(),
            resources: DEFAULT_RESOURCES.iter().map(|s| s.to_string()).collect(),
            highlight: HighlightConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// File Configuration (deserialization layer)
// ─────────────────────────────────────────────────────────────────────────────

/// Config file structure
#[derive(Debug, Deserialize, Default)]
pub(crate) struct FileConfig {
    pub api_url: Option<String>,
    pub request_timeout_secs: Option<u64>,
    pub route: Option<String>,
    pub resources: Option<Vec<String>>,

    /// Optional [highlight] section
    pub highlight: Option<FileHighlight>,

    /// Optional [logging] section
    pub logging: Option<FileLogging>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Configuration Loading
// ─────────────────────────────────────────────────────────────────────────────

impl Config {
    /// Get the config file path: ~/.config/og-editable/config.toml
    /// Uses Unix-style ~/.config on all platforms for consistency
    pub fn config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|p| p.join(".config").join("og-editable").join("config.toml"))
    }

    /// Create config file with defaults if it doesn't exist
    pub fn ensure_config_exists() {
        let Some(path) = Self::config_path() else {
            return;
        };

        // Don't overwrite existing config
        if path.exists() {
            return;
        }

        if let Some(parent) = path.parent() {
            if std::fs::create_dir_all(parent).is_err() {
                return; // Config is optional
            }
        }

        // Config::default().to_toml() is the single source of truth
        let _ = std::fs::write(&path, Self::default().to_toml());
    }

    /// Load file config if it exists
    fn load_file_config() -> Result<FileConfig, ConfigError> {
        let Some(path) = Self::config_path() else {
            return Ok(FileConfig::default());
        };

        match std::fs::read_to_string(&path) {
            Ok(contents) => {
                toml::from_str(&contents).map_err(|source| ConfigError::Parse { path, source })
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(FileConfig::default()),
            Err(source) => Err(ConfigError::Read { path, source }),
        }
    }

    /// Load configuration: env vars -> file -> defaults
    pub fn from_env() -> Result<Self, ConfigError> {
        let file = Self::load_file_config()?;
        Ok(Self::from_sources(file, |key| std::env::var(key).ok()))
    }

    /// Merge a parsed file with an environment lookup
    pub(crate) fn from_sources(file: FileConfig, env: impl Fn(&str) -> Option<String>) -> Self {
        // API URL: env > file > unset; empty string disables REST
        let api_url = env("OG_EDITABLE_API_URL")
            .or(file.api_url)
            .filter(|url| !url.trim().is_empty());

        // Route: env > file > default
        let route = env("OG_EDITABLE_ROUTE")
            .or(file.route)
            .unwrap_or_else(|| DEFAULT_ROUTE.to_string());

        let request_timeout_secs = file.request_timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS);

        let resources = file
            .resources
            .unwrap_or_else(|| DEFAULT_RESOURCES.iter().map(|s| s.to_string()).collect());

        let highlight = HighlightConfig::from_file(file.highlight);
        let mut logging = LoggingConfig::from_file(file.logging);
        if let Some(level) = env("OG_EDITABLE_LOG") {
            logging.level = level;
        }

        Self {
            api_url,
            request_timeout_secs,
            route,
            resources,
            highlight,
            logging,
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
