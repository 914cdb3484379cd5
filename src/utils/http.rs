// src/utils/http.rs

//! HTTP client utilities.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::error::Result;
use crate::models::HttpConfig;

/// Create a configured asynchronous HTTP client.
pub fn create_client(config: &HttpConfig) -> Result<Client> {
    let client = Client::builder()
        .user_agent(&config.user_agent)
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()?;
    Ok(client)
}

/// Plain GET used by the source fetchers.
#[async_trait]
pub trait HttpGet: Send + Sync {
    /// Fetch `url` and return the decoded body. Non-2xx statuses are errors.
    async fn get_text(&self, url: &str) -> Result<String>;
}

#[async_trait]
impl HttpGet for Client {
    async fn get_text(&self, url: &str) -> Result<String> {
        log::debug!("GET {}", url);
        let text = self
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        Ok(text)
    }
}
