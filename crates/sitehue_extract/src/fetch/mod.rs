//! Page and favicon retrieval.
//!
//! [`ContentFetcher`] walks its page strategies in order (direct HTTP, then
//! the headless browser) and returns the first success. Favicon bytes come
//! from a [`FaviconChain`]; a favicon failure never fails the page.

pub mod browser;
pub mod http;
pub mod socket;
pub mod webdriver;

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use sitehue_observability::strategy_span;
use tracing::Instrument;
use url::Url;

use crate::config::ExtractConfig;
use crate::error::{FetchError, StrategyFailure};

pub use browser::{Browser, BrowserFaviconStrategy, BrowserPage, BrowserPageStrategy, PageOptions};
pub use http::{HttpFaviconStrategy, HttpPageStrategy};
pub use socket::SocketFaviconStrategy;
pub use webdriver::WebDriverBrowser;

/// Raw material for one extraction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchResult {
    pub html: String,
    /// Absolute favicon URL, empty when none could be derived
    pub favicon_url: String,
    pub favicon: Option<Vec<u8>>,
}

/// Browser-like request headers shared by every fetch path.
pub fn browser_headers(user_agent: &str) -> Vec<(&'static str, String)> {
    vec![
        ("User-Agent", user_agent.to_string()),
        (
            "Accept",
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,image/apng,*/*;q=0.8"
                .to_string(),
        ),
        ("Accept-Language", "en-US,en;q=0.9".to_string()),
        ("Cache-Control", "no-cache".to_string()),
        ("Pragma", "no-cache".to_string()),
        ("Upgrade-Insecure-Requests", "1".to_string()),
    ]
}

/// `scheme://host[:port]` of a URL.
pub fn origin_of(url: &Url) -> String {
    url.origin().ascii_serialization()
}

#[async_trait]
pub trait PageStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    async fn fetch(&self, url: &Url) -> Result<FetchResult, FetchError>;
}

#[async_trait]
pub trait FaviconStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    async fn fetch(&self, favicon_url: &Url) -> Result<Vec<u8>, FetchError>;
}

/// Ordered favicon strategies, each bounded by the favicon timeout.
#[derive(Clone)]
pub struct FaviconChain {
    strategies: Vec<Arc<dyn FaviconStrategy>>,
    timeout: Duration,
}

impl FaviconChain {
    pub fn new(strategies: Vec<Arc<dyn FaviconStrategy>>, timeout: Duration) -> Self {
        Self {
            strategies,
            timeout,
        }
    }

    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// First non-empty body wins. `None` when every strategy fails.
    pub async fn fetch(&self, favicon_url: &str) -> Option<Vec<u8>> {
        if favicon_url.is_empty() {
            return None;
        }
        let url = match Url::parse(favicon_url) {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!(favicon_url, error = %e, "Invalid favicon URL");
                return None;
            }
        };

        for strategy in &self.strategies {
            let span = strategy_span!("favicon", strategy.name(), favicon_url);
            let started = Instant::now();
            let outcome = tokio::time::timeout(self.timeout, strategy.fetch(&url))
                .instrument(span.clone())
                .await
                .unwrap_or(Err(FetchError::Timeout(self.timeout)))
                .and_then(|bytes| {
                    if bytes.is_empty() {
                        Err(FetchError::EmptyBody)
                    } else {
                        Ok(bytes)
                    }
                });
            span.record("duration_ms", started.elapsed().as_millis() as u64);

            match outcome {
                Ok(bytes) => {
                    tracing::debug!(strategy = strategy.name(), favicon_url, len = bytes.len(), "Fetched favicon");
                    return Some(bytes);
                }
                Err(e) => {
                    tracing::warn!(strategy = strategy.name(), favicon_url, error = %e, "Favicon fetch failed")
                }
            }
        }

        tracing::warn!(favicon_url, "All favicon fetch strategies failed");
        None
    }
}

pub struct ContentFetcher {
    strategies: Vec<Arc<dyn PageStrategy>>,
}

impl ContentFetcher {
    pub fn new(strategies: Vec<Arc<dyn PageStrategy>>) -> Self {
        Self { strategies }
    }

    /// Direct HTTP first; the browser strategies join when a WebDriver
    /// endpoint is configured.
    pub fn from_config(config: &ExtractConfig) -> Result<Self, FetchError> {
        let client = http::build_client(&config.user_agent)?;
        let browser: Option<Arc<dyn Browser>> = match &config.webdriver_url {
            Some(endpoint) => Some(Arc::new(WebDriverBrowser::new(endpoint.clone())?)),
            None => {
                tracing::debug!("No WebDriver endpoint configured, browser strategies disabled");
                None
            }
        };

        let mut favicon_strategies: Vec<Arc<dyn FaviconStrategy>> =
            vec![Arc::new(HttpFaviconStrategy::new(client.clone(), config.favicon_timeout))];
        if let Some(browser) = &browser {
            favicon_strategies.push(Arc::new(BrowserFaviconStrategy::new(
                browser.clone(),
                &config.user_agent,
                config.favicon_timeout,
            )));
        }
        favicon_strategies.push(Arc::new(SocketFaviconStrategy::new(&config.user_agent)));
        let favicons = FaviconChain::new(favicon_strategies, config.favicon_timeout);

        let mut strategies: Vec<Arc<dyn PageStrategy>> = vec![Arc::new(HttpPageStrategy::new(
            client,
            config.page_timeout,
            favicons,
        ))];
        if let Some(browser) = browser {
            strategies.push(Arc::new(BrowserPageStrategy::new(
                browser,
                &config.user_agent,
                config.page_timeout,
                config.favicon_timeout,
            )));
        }

        Ok(Self::new(strategies))
    }

    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    pub async fn fetch(&self, url: &str) -> Result<FetchResult, FetchError> {
        let parsed = parse_page_url(url)?;

        let mut failures = Vec::new();
        for strategy in &self.strategies {
            let span = strategy_span!("page", strategy.name(), url);
            let started = Instant::now();
            let outcome = strategy.fetch(&parsed).instrument(span.clone()).await;
            span.record("duration_ms", started.elapsed().as_millis() as u64);

            match outcome {
                Ok(result) => {
                    tracing::info!(
                        strategy = strategy.name(),
                        url,
                        html_len = result.html.len(),
                        favicon = %result.favicon_url,
                        "Fetched page"
                    );
                    return Ok(result);
                }
                Err(error) => {
                    tracing::warn!(strategy = strategy.name(), url, error = %error, "Page fetch failed");
                    failures.push(StrategyFailure {
                        strategy: strategy.name(),
                        error,
                    });
                }
            }
        }

        Err(FetchError::Exhausted(failures))
    }
}

/// Only absolute `http`/`https` URLs are fetched. No scheme is added.
pub fn parse_page_url(url: &str) -> Result<Url, FetchError> {
    let parsed = Url::parse(url.trim()).map_err(|e| FetchError::InvalidUrl(format!("{url}: {e}")))?;
    match parsed.scheme() {
        "http" | "https" if parsed.has_host() => Ok(parsed),
        _ => Err(FetchError::InvalidUrl(url.to_string())),
    }
}
