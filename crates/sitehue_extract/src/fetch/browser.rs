//! Headless browser strategies.
//!
//! The browser is reached through the [`Browser`] / [`BrowserPage`] traits so
//! the strategies stay independent of the driver. Every opened page is held by
//! a [`PageGuard`], so it is closed even when the strategy future is dropped
//! mid-load by a timeout or a disconnected client.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use url::Url;

use super::{browser_headers, origin_of, FaviconStrategy, FetchResult, PageStrategy};
use crate::error::{BrowserError, FetchError};
use crate::html;

/// Settings applied to a page before it navigates anywhere.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageOptions {
    pub viewport: (u32, u32),
    pub user_agent: String,
    pub extra_headers: Vec<(String, String)>,
    /// Skip font, media and websocket sub-resources
    pub block_heavy_resources: bool,
}

impl PageOptions {
    /// Full-size page that loads a site the way a desktop browser would.
    pub fn for_page(user_agent: &str) -> Self {
        Self {
            viewport: (1280, 800),
            user_agent: user_agent.to_string(),
            extra_headers: browser_headers(user_agent)
                .into_iter()
                .filter(|(name, _)| *name != "User-Agent")
                .map(|(name, value)| (name.to_string(), value))
                .collect(),
            block_heavy_resources: true,
        }
    }

    /// Tiny page used only to pull a favicon.
    pub fn for_favicon(user_agent: &str) -> Self {
        Self {
            viewport: (100, 100),
            user_agent: user_agent.to_string(),
            extra_headers: Vec::new(),
            block_heavy_resources: false,
        }
    }
}

#[async_trait]
pub trait Browser: Send + Sync {
    async fn open(&self, options: &PageOptions) -> Result<Box<dyn BrowserPage>, BrowserError>;
}

#[async_trait]
pub trait BrowserPage: Send {
    async fn navigate(
        &mut self,
        url: &str,
        referrer: Option<&str>,
        timeout: Duration,
    ) -> Result<(), BrowserError>;

    /// Current serialized DOM, partial if navigation did not finish.
    async fn content(&mut self) -> Result<String, BrowserError>;

    /// Absolute href of the first favicon link, in the usual rel priority.
    async fn favicon_href(&mut self) -> Result<Option<String>, BrowserError>;

    /// Fetch a resource from inside the page context.
    async fn fetch_bytes(&mut self, url: &str, timeout: Duration) -> Result<Vec<u8>, BrowserError>;

    async fn close(self: Box<Self>) -> Result<(), BrowserError>;
}

async fn close_page(page: Box<dyn BrowserPage>) {
    if let Err(e) = page.close().await {
        tracing::warn!(error = %e, "Error closing browser page");
    }
}

/// Owns an open page until it is closed.
///
/// Dropping the guard without calling [`PageGuard::close`] hands the page to
/// a background task on the current runtime.
pub struct PageGuard {
    page: Option<Box<dyn BrowserPage>>,
}

impl PageGuard {
    pub fn new(page: Box<dyn BrowserPage>) -> Self {
        Self { page: Some(page) }
    }

    pub fn page(&mut self) -> Result<&mut dyn BrowserPage, BrowserError> {
        match self.page.as_mut() {
            Some(page) => Ok(page.as_mut()),
            None => Err(BrowserError::Session("page already closed".to_string())),
        }
    }

    pub async fn close(mut self) {
        if let Some(page) = self.page.take() {
            close_page(page).await;
        }
    }
}

impl Drop for PageGuard {
    fn drop(&mut self) {
        let Some(page) = self.page.take() else {
            return;
        };
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                tracing::debug!("Closing abandoned browser page in background");
                handle.spawn(close_page(page));
            }
            Err(_) => tracing::warn!("No runtime available to close abandoned browser page"),
        }
    }
}

pub struct BrowserPageStrategy {
    browser: Arc<dyn Browser>,
    options: PageOptions,
    page_timeout: Duration,
    favicon_timeout: Duration,
}

impl BrowserPageStrategy {
    pub fn new(
        browser: Arc<dyn Browser>,
        user_agent: &str,
        page_timeout: Duration,
        favicon_timeout: Duration,
    ) -> Self {
        Self {
            browser,
            options: PageOptions::for_page(user_agent),
            page_timeout,
            favicon_timeout,
        }
    }

    async fn load(&self, page: &mut dyn BrowserPage, url: &Url) -> Result<FetchResult, FetchError> {
        if let Err(nav_err) = page.navigate(url.as_str(), None, self.page_timeout).await {
            tracing::warn!(url = %url, error = %nav_err, "Browser navigation error");
            // Keep whatever the page managed to render.
            return match page.content().await {
                Ok(html) if !html.trim().is_empty() => {
                    tracing::info!(url = %url, html_len = html.len(), "Got partial HTML despite navigation error");
                    let favicon_url = html::find_favicon(&html, url);
                    Ok(FetchResult {
                        html,
                        favicon_url,
                        favicon: None,
                    })
                }
                Ok(_) => Err(nav_err.into()),
                Err(content_err) => {
                    tracing::error!(url = %url, error = %content_err, "Failed to read page content");
                    Err(nav_err.into())
                }
            };
        }

        let html = page.content().await?;

        let favicon_url = match page.favicon_href().await {
            Ok(Some(href)) if !href.is_empty() => href,
            Ok(_) => html::default_favicon(url),
            Err(e) => {
                tracing::warn!(url = %url, error = %e, "Favicon lookup in page failed");
                html::default_favicon(url)
            }
        };

        let favicon = if favicon_url.starts_with("http") {
            match page.fetch_bytes(&favicon_url, self.favicon_timeout).await {
                Ok(bytes) if !bytes.is_empty() => Some(bytes),
                Ok(_) => None,
                Err(e) => {
                    tracing::warn!(favicon_url, error = %e, "Failed to fetch favicon with browser");
                    None
                }
            }
        } else {
            None
        };

        Ok(FetchResult {
            html,
            favicon_url,
            favicon,
        })
    }
}

#[async_trait]
impl PageStrategy for BrowserPageStrategy {
    fn name(&self) -> &'static str {
        "browser"
    }

    async fn fetch(&self, url: &Url) -> Result<FetchResult, FetchError> {
        let mut guard = PageGuard::new(self.browser.open(&self.options).await?);
        let result = match guard.page() {
            Ok(page) => self.load(page, url).await,
            Err(e) => Err(e.into()),
        };
        guard.close().await;
        result
    }
}

pub struct BrowserFaviconStrategy {
    browser: Arc<dyn Browser>,
    options: PageOptions,
    timeout: Duration,
}

impl BrowserFaviconStrategy {
    pub fn new(browser: Arc<dyn Browser>, user_agent: &str, timeout: Duration) -> Self {
        Self {
            browser,
            options: PageOptions::for_favicon(user_agent),
            timeout,
        }
    }

    async fn load(&self, page: &mut dyn BrowserPage, favicon_url: &Url) -> Result<Vec<u8>, FetchError> {
        let referrer = origin_of(favicon_url);
        page.navigate(favicon_url.as_str(), Some(&referrer), self.timeout)
            .await?;
        Ok(page.fetch_bytes(favicon_url.as_str(), self.timeout).await?)
    }
}

#[async_trait]
impl FaviconStrategy for BrowserFaviconStrategy {
    fn name(&self) -> &'static str {
        "browser"
    }

    async fn fetch(&self, favicon_url: &Url) -> Result<Vec<u8>, FetchError> {
        let mut guard = PageGuard::new(self.browser.open(&self.options).await?);
        let result = match guard.page() {
            Ok(page) => self.load(page, favicon_url).await,
            Err(e) => Err(e.into()),
        };
        guard.close().await;
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_options() {
        let page = PageOptions::for_page("ua");
        assert_eq!(page.viewport, (1280, 800));
        assert!(page.block_heavy_resources);
        assert!(page.extra_headers.iter().all(|(name, _)| name != "User-Agent"));
        assert!(!page.extra_headers.is_empty());

        let favicon = PageOptions::for_favicon("ua");
        assert_eq!(favicon.viewport, (100, 100));
        assert!(!favicon.block_heavy_resources);
    }
}
