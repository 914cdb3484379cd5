// src/models/topic.rs

//! Topic definitions read from the topics file.
//!
//! ```json
//! {
//!   "ml": {
//!     "keywords": ["transformer", "diffusion"],
//!     "authors": ["Yann LeCun"],
//!     "sources": [{"type": "arxiv"}, {"type": "rss", "url": "https://example.org/feed"}],
//!     "slack_channel": "C0123456"
//!   }
//! }
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Filter configuration for one destination channel.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Topic {
    /// Keywords, OR-matched
    #[serde(default)]
    pub keywords: Vec<String>,

    /// Author names, OR-matched. `None` disables author filtering.
    #[serde(default)]
    pub authors: Option<Vec<String>>,

    /// Upstream sources queried in order
    pub sources: Vec<SourceSpec>,

    /// Destination Slack channel ID
    pub slack_channel: String,
}

impl Topic {
    /// Author filter, or `None` when absent or empty.
    pub fn author_filter(&self) -> Option<&[String]> {
        self.authors
            .as_deref()
            .filter(|authors| !authors.is_empty())
    }
}

/// One configured source entry, kept loose so unknown types survive loading.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SourceSpec {
    #[serde(rename = "type")]
    pub kind: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Resolved source type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind<'a> {
    Arxiv,
    Rss { url: &'a str },
    Unknown(&'a str),
}

impl SourceSpec {
    /// Resolve the source type. An `rss` source without a URL is a
    /// configuration error.
    pub fn resolve(&self) -> Result<SourceKind<'_>> {
        match self.kind.as_str() {
            "arxiv" => Ok(SourceKind::Arxiv),
            "rss" => self
                .url
                .as_deref()
                .map(|url| SourceKind::Rss { url })
                .ok_or_else(|| AppError::config("rss source is missing \"url\"")),
            other => Ok(SourceKind::Unknown(other)),
        }
    }
}

/// Topics keyed by name, in file order.
#[derive(Debug, Clone, Default)]
pub struct Topics {
    entries: Vec<(String, Topic)>,
}

impl Topics {
    /// Load topics from a JSON file. Missing or malformed files are fatal.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            AppError::config(format!("Cannot read topics file {}: {e}", path.display()))
        })?;
        Self::from_json(&content)
    }

    /// Parse topics from a JSON document.
    pub fn from_json(content: &str) -> Result<Self> {
        let raw: serde_json::Map<String, serde_json::Value> = serde_json::from_str(content)?;
        let mut entries = Vec::with_capacity(raw.len());
        for (name, value) in raw {
            let topic: Topic = serde_json::from_value(value)
                .map_err(|e| AppError::config(format!("Invalid topic '{name}': {e}")))?;
            for source in &topic.sources {
                source
                    .resolve()
                    .map_err(|e| AppError::config(format!("Invalid topic '{name}': {e}")))?;
            }
            entries.push((name, topic));
        }
        Ok(Self { entries })
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Topic)> {
        self.entries.iter().map(|(name, topic)| (name.as_str(), topic))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Validate that every topic can route somewhere.
    pub fn validate(&self) -> Result<()> {
        for (name, topic) in self.iter() {
            if topic.slack_channel.trim().is_empty() {
                return Err(AppError::validation(format!(
                    "topic '{name}' has an empty slack_channel"
                )));
            }
            if topic.sources.is_empty() {
                log::warn!("Topic '{}' has no sources", name);
            }
        }
        Ok(())
    }
}
