//! HTTP transport behind a trait so the search engine can be driven by
//! scripted responses in tests.

use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

use crate::providers::SearchError;

const USER_AGENT: &str = concat!("litsearch/", env!("CARGO_PKG_VERSION"));

/// Fetches one URL and returns the response body.
#[async_trait]
pub trait Transport: Send + Sync + std::fmt::Debug {
    async fn fetch(&self, url: &str, headers: &[(String, String)]) -> Result<String, SearchError>;
}

/// Production transport over a shared reqwest client.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self, SearchError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(90))
            .pool_idle_timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| SearchError::Transport(e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn fetch(&self, url: &str, headers: &[(String, String)]) -> Result<String, SearchError> {
        debug!(url, "fetching");

        let mut request = self.client.get(url);
        for (name, value) in headers {
            request = request.header(name, value);
        }

        let response = request
            .send()
            .await
            .map_err(|e| SearchError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SearchError::Http {
                status: status.as_u16(),
            });
        }

        response
            .text()
            .await
            .map_err(|e| SearchError::Transport(e.to_string()))
    }
}
