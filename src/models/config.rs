//! Application configuration structures.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// HTTP client settings
    #[serde(default)]
    pub http: HttpConfig,

    /// Input and state file locations
    #[serde(default)]
    pub paths: PathsConfig,

    /// Preprint API settings
    #[serde(default)]
    pub arxiv: ArxivConfig,

    /// Syndication feed settings
    #[serde(default)]
    pub rss: RssConfig,

    /// Messaging endpoint settings
    #[serde(default)]
    pub slack: SlackConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.http.user_agent.trim().is_empty() {
            return Err(AppError::validation("http.user_agent is empty"));
        }
        if self.http.timeout_secs == 0 {
            return Err(AppError::validation("http.timeout_secs must be > 0"));
        }
        if self.arxiv.endpoint.trim().is_empty() {
            return Err(AppError::validation("arxiv.endpoint is empty"));
        }
        if self.arxiv.max_results == 0 {
            return Err(AppError::validation("arxiv.max_results must be > 0"));
        }
        if self.rss.max_entries == 0 {
            return Err(AppError::validation("rss.max_entries must be > 0"));
        }
        if self.slack.endpoint.trim().is_empty() {
            return Err(AppError::validation("slack.endpoint is empty"));
        }
        if self.slack.token_env.trim().is_empty() {
            return Err(AppError::validation("slack.token_env is empty"));
        }
        Ok(())
    }
}

/// HTTP client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
        }
    }
}

/// File locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Topics JSON file
    #[serde(default = "defaults::topics_file")]
    pub topics_file: PathBuf,

    /// Persisted posted-ID JSON array
    #[serde(default = "defaults::posted_ids_file")]
    pub posted_ids_file: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            topics_file: defaults::topics_file(),
            posted_ids_file: defaults::posted_ids_file(),
        }
    }
}

/// arXiv query API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArxivConfig {
    #[serde(default = "defaults::arxiv_endpoint")]
    pub endpoint: String,

    /// Results requested per query, newest submissions first
    #[serde(default = "defaults::arxiv_max_results")]
    pub max_results: usize,
}

impl Default for ArxivConfig {
    fn default() -> Self {
        Self {
            endpoint: defaults::arxiv_endpoint(),
            max_results: defaults::arxiv_max_results(),
        }
    }
}

/// RSS/Atom feed settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RssConfig {
    /// Only the first N entries of a feed are considered
    #[serde(default = "defaults::rss_max_entries")]
    pub max_entries: usize,
}

impl Default for RssConfig {
    fn default() -> Self {
        Self {
            max_entries: defaults::rss_max_entries(),
        }
    }
}

/// Slack settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlackConfig {
    /// chat.postMessage endpoint
    #[serde(default = "defaults::slack_endpoint")]
    pub endpoint: String,

    /// Environment variable holding the bot token
    #[serde(default = "defaults::token_env")]
    pub token_env: String,

    /// Summary characters kept in a message
    #[serde(default = "defaults::summary_chars")]
    pub summary_chars: usize,

    /// Whether a failed send still marks the paper as posted
    #[serde(default = "defaults::mark_failed_as_posted")]
    pub mark_failed_as_posted: bool,
}

impl Default for SlackConfig {
    fn default() -> Self {
        Self {
            endpoint: defaults::slack_endpoint(),
            token_env: defaults::token_env(),
            summary_chars: defaults::summary_chars(),
            mark_failed_as_posted: defaults::mark_failed_as_posted(),
        }
    }
}

mod defaults {
    use std::path::PathBuf;

    // HTTP defaults
    pub fn user_agent() -> String {
        "paper-notifier/0.1".into()
    }
    pub fn timeout() -> u64 {
        30
    }

    // Path defaults
    pub fn topics_file() -> PathBuf {
        PathBuf::from("topics.json")
    }
    pub fn posted_ids_file() -> PathBuf {
        PathBuf::from("posted-ids.json")
    }

    // Source defaults
    pub fn arxiv_endpoint() -> String {
        "https://export.arxiv.org/api/query".into()
    }
    pub fn arxiv_max_results() -> usize {
        100
    }
    pub fn rss_max_entries() -> usize {
        10
    }

    // Slack defaults
    pub fn slack_endpoint() -> String {
        "https://slack.com/api/chat.postMessage".into()
    }
    pub fn token_env() -> String {
        "SLACK_BOT_TOKEN".into()
    }
    pub fn summary_chars() -> usize {
        200
    }
    pub fn mark_failed_as_posted() -> bool {
        true
    }
}
