//! services/api/src/adapters/pages.rs
//!
//! The raw page-fetching proxy: implements the `PageFetcher` port with a
//! plain HTTP GET presenting a configurable (mobile) User-Agent.

use async_trait::async_trait;
use reqwest::header::USER_AGENT;
use wordtrail_core::ports::{PageFetcher, PortError, PortResult};

#[derive(Clone)]
pub struct HttpPageFetcher {
    client: reqwest::Client,
    user_agent: String,
}

impl HttpPageFetcher {
    /// Creates a new `HttpPageFetcher`.
    pub fn new(client: reqwest::Client, user_agent: String) -> Self {
        Self { client, user_agent }
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn fetch(&self, url: &str) -> PortResult<String> {
        let response = self
            .client
            .get(url)
            .header(USER_AGENT, &self.user_agent)
            .send()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        if !response.status().is_success() {
            return Err(PortError::Unexpected(format!(
                "page fetch returned {}",
                response.status()
            )));
        }

        response
            .text()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))
    }
}
