//! Polite single-page fetcher.
//!
//! Consults the site's `robots.txt` first (fail-open when it cannot be read),
//! then issues a bounded GET, retrying only on server-side error statuses.

pub mod retry;
pub mod robots;

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_LANGUAGE};
use reqwest::Url;
use tracing::{debug, warn};

use crate::config::FetchSettings;
use crate::error::{AnalysisError, AnalysisResult};

pub use retry::RetryPolicy;
pub use robots::RobotsPolicy;

/// A fetched page.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub html: String,
    /// URL after redirects.
    pub final_url: String,
}

/// HTTP page fetcher with a pooled client, safe to share across requests.
#[derive(Clone)]
pub struct Fetcher {
    client: reqwest::Client,
    retry: RetryPolicy,
    user_agent: String,
}

impl Fetcher {
    pub fn new(settings: &FetchSettings) -> AnalysisResult<Self> {
        let mut headers = HeaderMap::new();
        let language = HeaderValue::from_str(&settings.accept_language)
            .map_err(|e| AnalysisError::Unexpected(format!("Invalid Accept-Language header: {}", e)))?;
        headers.insert(ACCEPT_LANGUAGE, language);

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .user_agent(settings.user_agent.clone())
            .default_headers(headers)
            .build()
            .map_err(|e| AnalysisError::Unexpected(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            retry: RetryPolicy::from_settings(settings),
            user_agent: settings.user_agent.clone(),
        })
    }

    /// Fetch a page, returning its body and final URL.
    pub async fn fetch(&self, url: &str) -> AnalysisResult<FetchedPage> {
        let url = parse_http_url(url)?;

        if !self.can_fetch(&url).await {
            return Err(AnalysisError::RobotsDisallowed(url.to_string()));
        }

        let mut attempt = 1;
        loop {
            let response = self
                .client
                .get(url.clone())
                .send()
                .await
                .map_err(|e| AnalysisError::fetch(format!("Error fetching {}: {}", url, e)))?;

            let status = response.status();
            if status.is_success() {
                let final_url = response.url().to_string();
                let html = response
                    .text()
                    .await
                    .map_err(|e| AnalysisError::fetch(format!("Error reading {}: {}", url, e)))?;
                debug!(url = %final_url, bytes = html.len(), attempt, "Fetched page");
                return Ok(FetchedPage { html, final_url });
            }

            if self.retry.should_retry(attempt, status.as_u16()) {
                let delay = self.retry.delay_for(attempt);
                warn!(
                    url = %url,
                    status = status.as_u16(),
                    attempt,
                    max = self.retry.max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    "Server error, will retry"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
                continue;
            }

            return Err(AnalysisError::fetch(format!(
                "Error fetching {}: HTTP {}",
                url, status
            )));
        }
    }

    /// Check the site's crawl policy. Any failure to obtain it allows the fetch.
    pub async fn can_fetch(&self, url: &Url) -> bool {
        let robots_url = match url.join("/robots.txt") {
            Ok(u) => u,
            Err(e) => {
                warn!(url = %url, error = %e, "Cannot resolve robots.txt, allowing");
                return true;
            }
        };

        let policy = match self.client.get(robots_url.clone()).send().await {
            Ok(resp) if resp.status().is_success() => match resp.text().await {
                Ok(text) => RobotsPolicy::parse(&text),
                Err(e) => {
                    warn!(url = %robots_url, error = %e, "Unreadable robots.txt, allowing");
                    return true;
                }
            },
            Ok(resp) => {
                debug!(url = %robots_url, status = resp.status().as_u16(), "No robots.txt, allowing");
                RobotsPolicy::allow_all()
            }
            Err(e) => {
                warn!(url = %robots_url, error = %e, "Error checking robots.txt, allowing");
                return true;
            }
        };

        let mut path = url.path().to_string();
        if let Some(query) = url.query() {
            path.push('?');
            path.push_str(query);
        }
        policy.is_allowed(&self.user_agent, &path)
    }
}

fn parse_http_url(raw: &str) -> AnalysisResult<Url> {
    let url = Url::parse(raw.trim())
        .map_err(|e| AnalysisError::fetch(format!("Invalid URL '{}': {}", raw.trim(), e)))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(AnalysisError::fetch(format!(
            "Unsupported URL scheme '{}'",
            other
        ))),
    }
}
