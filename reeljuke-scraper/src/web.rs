//! Gated page fetching shared by the scraping plugins.

use std::sync::Arc;

use reeljuke_lib::HostGate;
use tokio::time::Duration;

use crate::error::ScrapeError;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64; rv:128.0) Gecko/20100101 Firefox/128.0";

/// HTTP client that brackets every request with a host slot, so concurrent
/// scan workers stay within the per-host download limits.
#[derive(Clone)]
pub struct PageFetcher {
    http: reqwest::Client,
    gate: Arc<HostGate>,
}

impl PageFetcher {
    pub fn new(gate: Arc<HostGate>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()
            .unwrap_or_default();
        Self { http, gate }
    }

    /// Fetch a page as text. The host slot is held for the duration of the
    /// request and released on every path, success or failure.
    pub async fn fetch(&self, url: &str) -> Result<String, ScrapeError> {
        let host = host_of(url)?;
        let _slot = self.gate.slot(&host).await;

        let resp = self.http.get(url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(ScrapeError::ServerError {
                host,
                status: status.as_u16(),
            });
        }
        Ok(resp.text().await?)
    }
}

/// Host component of a URL, lowercased for use as a rate-gate key.
pub fn host_of(url: &str) -> Result<String, ScrapeError> {
    reqwest::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.to_ascii_lowercase()))
        .ok_or_else(|| ScrapeError::Config(format!("invalid URL: {url}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_extraction() {
        assert_eq!(
            host_of("https://www.imdb.com/title/tt0113277/").unwrap(),
            "www.imdb.com"
        );
        assert_eq!(
            host_of("http://Services.TVRage.com/feeds/search.php?show=x").unwrap(),
            "services.tvrage.com"
        );
        assert!(host_of("not a url").is_err());
    }
}
