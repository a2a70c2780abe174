use anyhow::{Context, Result};
use std::time::Duration;

use crate::config::ScraperConfig;
use crate::utils::get_random_user_agent;

/// A page body fetched with a success status
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub status: u16,
    pub body: String,
}

/// Shared HTTP handle for locate and extract calls.
///
/// Cloning is cheap and clones share one connection pool, so a single handle
/// can be borrowed by every concurrent task in a batch and dropped when the
/// batch finishes.
#[derive(Clone)]
pub struct HttpClient {
    client: reqwest::Client,
    user_agent: Option<String>,
}

impl HttpClient {
    pub fn new(config: &ScraperConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .cookie_store(true)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            user_agent: config.user_agent.clone(),
        })
    }

    fn user_agent(&self) -> &str {
        self.user_agent
            .as_deref()
            .unwrap_or_else(|| get_random_user_agent())
    }

    fn get(&self, url: &str) -> reqwest::RequestBuilder {
        self.client
            .get(url)
            .header("User-Agent", self.user_agent())
            .header("Accept", "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8")
            .header("Accept-Language", "en-US,en;q=0.5")
    }

    /// GET `url` and read its body. Network errors and non-2xx statuses are errors.
    pub async fn fetch(&self, url: &str) -> Result<FetchedPage> {
        let response = self.get(url).send().await.context("Failed to fetch page")?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("HTTP error: {}", status);
        }

        let body = response.text().await.context("Failed to read response body")?;

        Ok(FetchedPage {
            status: status.as_u16(),
            body,
        })
    }

    /// True when a GET on `url` answers with a success status
    pub async fn is_reachable(&self, url: &str) -> bool {
        match self.get(url).send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                log::debug!("Reachability check failed for {}: {}", url, e);
                false
            }
        }
    }
}
