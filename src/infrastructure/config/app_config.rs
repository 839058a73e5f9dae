//! Application configuration.

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use super::args::ConfigOverrides;

const APP_NAME: &str = "picache";
const APP_QUALIFIER: &str = "com";
const APP_ORGANIZATION: &str = "picache";

/// Log level configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Trace level.
    Trace,
    /// Debug level.
    Debug,
    /// Info level.
    #[default]
    Info,
    /// Warning level.
    Warn,
    /// Error level.
    Error,
}

impl LogLevel {
    /// Converts to tracing level.
    #[must_use]
    pub const fn to_tracing_level(self) -> tracing::Level {
        match self {
            Self::Trace => tracing::Level::TRACE,
            Self::Debug => tracing::Level::DEBUG,
            Self::Info => tracing::Level::INFO,
            Self::Warn => tracing::Level::WARN,
            Self::Error => tracing::Level::ERROR,
        }
    }
}

/// Application configuration.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Log file path.
    #[serde(default)]
    pub log_path: Option<PathBuf>,

    /// Log verbosity level.
    #[serde(default)]
    pub log_level: LogLevel,

    /// Picture cache configuration.
    #[serde(default)]
    pub cache: CacheConfig,
}

/// Picture cache configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Cache root; entries live in `<root>/picturecache`.
    /// Defaults to the platform cache directory.
    #[serde(default)]
    pub root: Option<PathBuf>,

    /// Per-request network timeout in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Overall deadline for a load in seconds, enforced by cancelling.
    #[serde(default)]
    pub load_deadline_secs: Option<u64>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            root: None,
            request_timeout_secs: default_request_timeout(),
            load_deadline_secs: None,
        }
    }
}

impl CacheConfig {
    /// Returns the configured cache root or the platform default.
    #[must_use]
    pub fn effective_root(&self) -> PathBuf {
        self.root.clone().unwrap_or_else(AppConfig::default_cache_root)
    }

    /// Returns the request timeout.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Returns the load deadline, if any.
    #[must_use]
    pub fn load_deadline(&self) -> Option<Duration> {
        self.load_deadline_secs.map(Duration::from_secs)
    }
}

const fn default_request_timeout() -> u64 {
    30
}

impl AppConfig {
    /// Merges CLI overrides into the configuration.
    pub fn merge_with_args(&mut self, args: &ConfigOverrides) {
        if let Some(log_path) = &args.log_path {
            self.log_path = Some(log_path.clone());
        }
        if let Some(log_level) = args.log_level {
            self.log_level = log_level;
        }
        if let Some(root) = &args.cache_root {
            self.cache.root = Some(root.clone());
        }
        if let Some(timeout) = args.timeout {
            self.cache.request_timeout_secs = timeout;
        }
    }

    /// Returns default config directory.
    #[must_use]
    pub fn default_config_dir() -> Option<PathBuf> {
        ProjectDirs::from(APP_QUALIFIER, APP_ORGANIZATION, APP_NAME)
            .map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Returns default log file path.
    #[must_use]
    pub fn default_log_path() -> Option<PathBuf> {
        ProjectDirs::from(APP_QUALIFIER, APP_ORGANIZATION, APP_NAME)
            .map(|dirs| dirs.data_dir().join("picache.log"))
    }

    /// Returns the default cache root.
    #[must_use]
    pub fn default_cache_root() -> PathBuf {
        ProjectDirs::from(APP_QUALIFIER, APP_ORGANIZATION, APP_NAME).map_or_else(
            || std::env::temp_dir().join(APP_NAME).join("cache"),
            |dirs| dirs.cache_dir().to_path_buf(),
        )
    }

    /// Returns effective log path.
    #[must_use]
    pub fn effective_log_path(&self) -> Option<PathBuf> {
        self.log_path.clone().or_else(Self::default_log_path)
    }
}
