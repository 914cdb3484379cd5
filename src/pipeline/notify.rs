// src/pipeline/notify.rs

//! Announcement of papers to a chat channel.
//!
//! Each paper is posted at most once: IDs already in the posted set are
//! skipped, and every attempted ID is added to the set straight away so a
//! paper listed twice in one batch is still posted once. The set is saved
//! after every batch, including batches where posting was disabled.

use crate::error::Result;
use crate::models::{Paper, SlackConfig};
use crate::services::{ChatSink, Delivery};
use crate::storage::{PostedIdStore, PostedIds};
use crate::utils::take_chars;

/// Appended to every summary, truncated or not.
pub const ELLIPSIS: &str = "...";

/// Where the bot token comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenSource {
    /// Read from this environment variable when the notifier is built.
    Env(String),
    Fixed(String),
}

impl TokenSource {
    /// The token, or `None` if it is unset or empty.
    pub fn resolve(&self) -> Option<String> {
        let token = match self {
            Self::Env(var) => std::env::var(var).ok()?,
            Self::Fixed(token) => token.clone(),
        };
        (!token.is_empty()).then_some(token)
    }
}

/// Message and retry policy knobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotifyOptions {
    pub summary_chars: usize,
    pub mark_failed_as_posted: bool,
}

impl Default for NotifyOptions {
    fn default() -> Self {
        Self::from(&SlackConfig::default())
    }
}

impl From<&SlackConfig> for NotifyOptions {
    fn from(config: &SlackConfig) -> Self {
        Self {
            summary_chars: config.summary_chars,
            mark_failed_as_posted: config.mark_failed_as_posted,
        }
    }
}

/// Counters for one batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NotifyStats {
    /// Accepted by the endpoint
    pub posted: usize,
    /// Already in the posted set
    pub skipped: usize,
    /// Rejected or not delivered
    pub failed: usize,
}

/// Result of a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyOutcome {
    /// No token was available; nothing was sent.
    Disabled,
    Delivered(NotifyStats),
}

/// Posts papers to a channel and records what was posted.
pub struct Notifier<'a> {
    sink: &'a dyn ChatSink,
    store: &'a dyn PostedIdStore,
    token: Option<String>,
    options: NotifyOptions,
}

impl<'a> Notifier<'a> {
    pub fn new(
        sink: &'a dyn ChatSink,
        store: &'a dyn PostedIdStore,
        token: TokenSource,
        options: NotifyOptions,
    ) -> Self {
        Self {
            sink,
            store,
            token: token.resolve(),
            options,
        }
    }

    /// Whether a bot token was found. Checked once per run.
    pub fn can_post(&self) -> bool {
        self.token.is_some()
    }

    /// Load the posted set once, before the first batch of a run.
    pub async fn load_posted(&self) -> Result<PostedIds> {
        self.store.load().await
    }

    /// Announce `papers` to `channel` in order, then persist `posted`.
    ///
    /// Send failures are logged and never returned; the only error is a
    /// failed save.
    pub async fn notify(
        &self,
        channel: &str,
        papers: &[Paper],
        posted: &mut PostedIds,
    ) -> Result<NotifyOutcome> {
        let Some(token) = self.token.as_deref() else {
            log::debug!("{}: posting disabled, {} papers not sent", channel, papers.len());
            self.store.save(posted).await?;
            return Ok(NotifyOutcome::Disabled);
        };

        let mut stats = NotifyStats::default();
        for paper in papers {
            if posted.contains(&paper.id) {
                stats.skipped += 1;
                continue;
            }

            let text = format_message(paper, self.options.summary_chars);
            let delivered = match self.sink.post_message(token, channel, &text).await {
                Ok(Delivery::Accepted) => true,
                Ok(Delivery::Rejected { body }) => {
                    log::warn!("Slack API error: {}", body);
                    false
                }
                Err(e) => {
                    log::warn!("Slack API error: {}", e);
                    false
                }
            };

            if delivered {
                stats.posted += 1;
            } else {
                stats.failed += 1;
            }
            if delivered || self.options.mark_failed_as_posted {
                posted.insert(paper.id.clone());
            }
        }

        self.store.save(posted).await?;
        log::info!(
            "{}: {} posted, {} already posted, {} failed",
            channel,
            stats.posted,
            stats.skipped,
            stats.failed
        );
        Ok(NotifyOutcome::Delivered(stats))
    }
}

/// First `max_chars` characters of `summary` followed by [`ELLIPSIS`].
pub fn truncate_summary(summary: &str, max_chars: usize) -> String {
    format!("{}{}", take_chars(summary, max_chars), ELLIPSIS)
}

/// Slack mrkdwn announcement for one paper.
pub fn format_message(paper: &Paper, summary_chars: usize) -> String {
    format!(
        "*{}*\n_Authors_: {}\n_Published_: {}\n_Link_: {}\n_Summary_: {}\n",
        paper.title,
        paper.author_line(),
        paper.published,
        paper.link,
        truncate_summary(&paper.summary, summary_chars),
    )
}
