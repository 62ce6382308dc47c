//! Configuration for Skimmer.
//!
//! Configuration is read from `~/.config/skimmer/config.toml` at startup.
//! If the file doesn't exist, a default configuration with comments is created.

use serde::Deserialize;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::fetcher::http_fetcher::DEFAULT_USER_AGENT;
use crate::sync::{ManagerOptions, DEFAULT_FETCH_TIMEOUT, DEFAULT_SEED_FEEDS, DEFAULT_WORKERS};

/// Main configuration struct.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Database location; the platform data directory when unset.
    pub database_path: Option<PathBuf>,
    /// Maximum number of feeds refreshed at the same time.
    pub workers: usize,
    pub fetch_timeout_secs: u64,
    pub user_agent: String,
    /// Feeds subscribed on first run.
    pub seed_feeds: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: None,
            workers: DEFAULT_WORKERS,
            fetch_timeout_secs: DEFAULT_FETCH_TIMEOUT.as_secs(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            seed_feeds: DEFAULT_SEED_FEEDS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl Config {
    /// Load configuration from the default path.
    ///
    /// If the config file doesn't exist, creates a default one with comments.
    /// Missing fields in the config file will use default values.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::default_config_path()?;

        if !config_path.exists() {
            Self::create_default_config(&config_path)?;
            return Ok(Self::default());
        }

        Self::load_from(&config_path)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Get the default config file path: `~/.config/skimmer/config.toml`
    pub fn default_config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join("skimmer").join("config.toml"))
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs.max(1))
    }

    pub fn manager_options(&self) -> ManagerOptions {
        ManagerOptions {
            workers: self.workers.max(1),
            fetch_timeout: self.fetch_timeout(),
            seed_feeds: self.seed_feeds.clone(),
        }
    }

    fn create_default_config(path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let mut file = fs::File::create(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        file.write_all(Self::default_config_content().as_bytes())
            .map_err(|e| ConfigError::Io {
                path: path.to_path_buf(),
                source: e,
            })?;

        Ok(())
    }

    fn default_config_content() -> String {
        r##"# Skimmer Configuration

# Where the feed database lives. Defaults to the platform data directory,
# e.g. ~/.local/share/skimmer/feeds.db
# database_path = "/path/to/feeds.db"

# Maximum number of feeds refreshed concurrently
workers = 4

# Per-request timeout in seconds
fetch_timeout_secs = 20

# Feeds subscribed on first run
seed_feeds = [
    "https://news.ycombinator.com/rss",
    "https://xkcd.com/rss.xml",
]
"##
        .to_string()
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Failed to read/write config file at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}
