//! Direct HTTP fetches through reqwest.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Client;
use url::Url;

use super::{browser_headers, FaviconChain, FaviconStrategy, FetchResult, PageStrategy};
use crate::error::FetchError;
use crate::html;

/// Client carrying the browser-like default headers.
pub fn build_client(user_agent: &str) -> Result<Client, FetchError> {
    let mut headers = HeaderMap::new();
    for (name, value) in browser_headers(user_agent) {
        let header = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| FetchError::Request(format!("invalid header name {name}: {e}")))?;
        let value = HeaderValue::from_str(&value)
            .map_err(|e| FetchError::Request(format!("invalid {name} header: {e}")))?;
        headers.insert(header, value);
    }
    Client::builder()
        .default_headers(headers)
        .build()
        .map_err(|e| FetchError::Request(e.to_string()))
}

async fn send_get(client: &Client, url: &Url, timeout: Duration) -> Result<reqwest::Response, FetchError> {
    let response = client
        .get(url.clone())
        .timeout(timeout)
        .send()
        .await
        .map_err(|e| FetchError::from_reqwest(e, timeout))?;

    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status(status.as_u16()));
    }
    Ok(response)
}

pub struct HttpPageStrategy {
    client: Client,
    timeout: Duration,
    favicons: FaviconChain,
}

impl HttpPageStrategy {
    pub fn new(client: Client, timeout: Duration, favicons: FaviconChain) -> Self {
        Self {
            client,
            timeout,
            favicons,
        }
    }
}

#[async_trait]
impl PageStrategy for HttpPageStrategy {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn fetch(&self, url: &Url) -> Result<FetchResult, FetchError> {
        let response = send_get(&self.client, url, self.timeout).await?;
        let html = response
            .text()
            .await
            .map_err(|e| FetchError::from_reqwest(e, self.timeout))?;

        let favicon_url = html::find_favicon(&html, url);
        let favicon = self.favicons.fetch(&favicon_url).await;

        Ok(FetchResult {
            html,
            favicon_url,
            favicon,
        })
    }
}

pub struct HttpFaviconStrategy {
    client: Client,
    timeout: Duration,
}

impl HttpFaviconStrategy {
    pub fn new(client: Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }
}

#[async_trait]
impl FaviconStrategy for HttpFaviconStrategy {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn fetch(&self, favicon_url: &Url) -> Result<Vec<u8>, FetchError> {
        let response = send_get(&self.client, favicon_url, self.timeout).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| FetchError::from_reqwest(e, self.timeout))?;
        Ok(bytes.to_vec())
    }
}
