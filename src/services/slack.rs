// src/services/slack.rs

//! Slack `chat.postMessage` client.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::SlackConfig;

/// Outcome of one message post that reached the endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    Accepted,
    /// The endpoint answered but refused the message; `body` is the raw reply.
    Rejected { body: String },
}

/// Destination for formatted announcements.
#[async_trait]
pub trait ChatSink: Send + Sync {
    /// Post `text` to `channel`. Transport failures are `Err`, refusals are
    /// `Ok(Delivery::Rejected)`.
    async fn post_message(&self, token: &str, channel: &str, text: &str) -> Result<Delivery>;
}

#[derive(Serialize)]
struct PostMessage<'a> {
    channel: &'a str,
    text: &'a str,
}

#[derive(Deserialize)]
struct ApiReply {
    #[serde(default)]
    ok: bool,
}

/// Slack Web API client authenticated with a bot token.
pub struct SlackClient {
    http: Client,
    endpoint: String,
}

impl SlackClient {
    pub fn new(http: Client, config: &SlackConfig) -> Self {
        Self {
            http,
            endpoint: config.endpoint.clone(),
        }
    }

    /// Slack answers HTTP 200 with `"ok": false` for most failures.
    fn classify(status: StatusCode, body: String) -> Delivery {
        let ok = status == StatusCode::OK
            && serde_json::from_str::<ApiReply>(&body)
                .map(|reply| reply.ok)
                .unwrap_or(false);

        if ok {
            Delivery::Accepted
        } else {
            Delivery::Rejected { body }
        }
    }
}

#[async_trait]
impl ChatSink for SlackClient {
    async fn post_message(&self, token: &str, channel: &str, text: &str) -> Result<Delivery> {
        let resp = self
            .http
            .post(&self.endpoint)
            .bearer_auth(token)
            .json(&PostMessage { channel, text })
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;
        Ok(Self::classify(status, body))
    }
}
