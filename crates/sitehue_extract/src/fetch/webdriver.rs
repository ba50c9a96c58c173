//! [`Browser`] backed by a W3C WebDriver endpoint such as chromedriver.
//!
//! Chrome-specific setup (resource blocking, extra headers) goes through
//! chromedriver's CDP passthrough and is skipped when the driver rejects it.

use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use reqwest::{Client, Method};
use serde_json::{json, Value as JsonValue};

use super::browser::{Browser, BrowserPage, PageOptions};
use crate::error::{BrowserError, FetchError};
use crate::html::FAVICON_RELS;

/// Bound on driver commands that are not navigation or page fetches.
const COMMAND_TIMEOUT: Duration = Duration::from_secs(30);

const BLOCKED_URL_PATTERNS: &[&str] = &[
    "*.woff", "*.woff2", "*.ttf", "*.otf", "*.eot", "*.mp4", "*.webm", "*.ogg", "*.mp3", "*.wav",
    "*.m4a", "*.m3u8", "ws://*", "wss://*",
];

const FETCH_SCRIPT: &str = r#"
const [url, done] = [arguments[0], arguments[arguments.length - 1]];
fetch(url, { credentials: 'include' })
  .then(r => { if (!r.ok) { throw new Error('HTTP ' + r.status); } return r.arrayBuffer(); })
  .then(buf => {
    const bytes = new Uint8Array(buf);
    let s = '';
    for (let i = 0; i < bytes.length; i += 0x8000) {
      s += String.fromCharCode.apply(null, bytes.subarray(i, i + 0x8000));
    }
    done({ ok: true, data: btoa(s) });
  })
  .catch(e => done({ ok: false, error: String(e) }));
"#;

fn favicon_script() -> String {
    let selectors: Vec<String> = FAVICON_RELS
        .iter()
        .map(|rel| format!("'link[rel=\"{rel}\"]'"))
        .collect();
    format!(
        "for (const s of [{}]) {{ const l = document.querySelector(s); if (l && l.href) {{ return l.href; }} }} return null;",
        selectors.join(", ")
    )
}

#[derive(Clone)]
pub struct WebDriverBrowser {
    endpoint: String,
    client: Client,
}

impl WebDriverBrowser {
    pub fn new(endpoint: impl Into<String>) -> Result<Self, FetchError> {
        let client = Client::builder()
            .build()
            .map_err(|e| FetchError::Request(e.to_string()))?;
        Ok(Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    fn capabilities(options: &PageOptions) -> JsonValue {
        let (width, height) = options.viewport;
        json!({
            "capabilities": {
                "alwaysMatch": {
                    "browserName": "chrome",
                    "pageLoadStrategy": "eager",
                    "goog:chromeOptions": {
                        "args": [
                            "--headless=new",
                            "--no-sandbox",
                            "--disable-gpu",
                            "--disable-dev-shm-usage",
                            format!("--window-size={width},{height}"),
                            format!("--user-agent={}", options.user_agent),
                        ]
                    }
                }
            }
        })
    }
}

#[async_trait]
impl Browser for WebDriverBrowser {
    async fn open(&self, options: &PageOptions) -> Result<Box<dyn BrowserPage>, BrowserError> {
        let value = send(
            &self.client,
            Method::POST,
            &format!("{}/session", self.endpoint),
            Some(Self::capabilities(options)),
            COMMAND_TIMEOUT,
        )
        .await
        .map_err(|e| BrowserError::Session(e.to_string()))?;

        let session_id = value
            .get("sessionId")
            .and_then(|id| id.as_str())
            .ok_or_else(|| BrowserError::Session("response carried no sessionId".to_string()))?;
        tracing::debug!(session_id, "Opened WebDriver session");

        let page = WebDriverPage {
            client: self.client.clone(),
            base: format!("{}/session/{}", self.endpoint, session_id),
            extra_headers: options.extra_headers.clone(),
        };

        // CDP setup is best effort: non-Chrome drivers reject it.
        if let Err(e) = page.configure(options).await {
            tracing::debug!(error = %e, "Skipping CDP page configuration");
        }
        Ok(Box::new(page))
    }
}

struct WebDriverPage {
    client: Client,
    base: String,
    extra_headers: Vec<(String, String)>,
}

impl WebDriverPage {
    async fn command(
        &self,
        method: Method,
        path: &str,
        body: Option<JsonValue>,
        timeout: Duration,
    ) -> Result<JsonValue, BrowserError> {
        send(&self.client, method, &format!("{}{}", self.base, path), body, timeout).await
    }

    async fn cdp(&self, cmd: &str, params: JsonValue) -> Result<JsonValue, BrowserError> {
        self.command(
            Method::POST,
            "/goog/cdp/execute",
            Some(json!({ "cmd": cmd, "params": params })),
            COMMAND_TIMEOUT,
        )
        .await
    }

    async fn configure(&self, options: &PageOptions) -> Result<(), BrowserError> {
        self.cdp("Network.enable", json!({})).await?;
        if options.block_heavy_resources {
            self.cdp("Network.setBlockedURLs", json!({ "urls": BLOCKED_URL_PATTERNS }))
                .await?;
        }
        self.set_headers(None).await
    }

    async fn set_headers(&self, referrer: Option<&str>) -> Result<(), BrowserError> {
        let mut headers = serde_json::Map::new();
        for (name, value) in &self.extra_headers {
            headers.insert(name.clone(), JsonValue::String(value.clone()));
        }
        if let Some(referrer) = referrer {
            headers.insert("Referer".to_string(), JsonValue::String(referrer.to_string()));
        }
        if headers.is_empty() {
            return Ok(());
        }
        self.cdp("Network.setExtraHTTPHeaders", json!({ "headers": headers }))
            .await
            .map(|_| ())
    }

    async fn set_timeouts(&self, timeout: Duration) -> Result<(), BrowserError> {
        let ms = timeout.as_millis() as u64;
        self.command(
            Method::POST,
            "/timeouts",
            Some(json!({ "pageLoad": ms, "script": ms })),
            COMMAND_TIMEOUT,
        )
        .await
        .map(|_| ())
    }
}

#[async_trait]
impl BrowserPage for WebDriverPage {
    async fn navigate(
        &mut self,
        url: &str,
        referrer: Option<&str>,
        timeout: Duration,
    ) -> Result<(), BrowserError> {
        self.set_timeouts(timeout).await?;
        if referrer.is_some() {
            if let Err(e) = self.set_headers(referrer).await {
                tracing::debug!(error = %e, "Could not set navigation referrer");
            }
        }
        // The driver enforces pageLoad; the outer bound covers a stuck driver.
        self.command(Method::POST, "/url", Some(json!({ "url": url })), timeout + COMMAND_TIMEOUT)
            .await
            .map(|_| ())
            .map_err(|e| match e {
                BrowserError::Command { message, .. } => BrowserError::Navigation(message),
                BrowserError::Timeout(_) => BrowserError::Timeout(timeout),
                other => other,
            })
    }

    async fn content(&mut self) -> Result<String, BrowserError> {
        let value = self.command(Method::GET, "/source", None, COMMAND_TIMEOUT).await?;
        value.as_str().map(str::to_string).ok_or_else(|| BrowserError::Command {
            command: "source".to_string(),
            message: "page source was not a string".to_string(),
        })
    }

    async fn favicon_href(&mut self) -> Result<Option<String>, BrowserError> {
        let value = self
            .command(
                Method::POST,
                "/execute/sync",
                Some(json!({ "script": favicon_script(), "args": [] })),
                COMMAND_TIMEOUT,
            )
            .await?;
        Ok(value.as_str().filter(|href| !href.is_empty()).map(str::to_string))
    }

    async fn fetch_bytes(&mut self, url: &str, timeout: Duration) -> Result<Vec<u8>, BrowserError> {
        self.set_timeouts(timeout).await?;
        let value = self
            .command(
                Method::POST,
                "/execute/async",
                Some(json!({ "script": FETCH_SCRIPT, "args": [url] })),
                timeout + COMMAND_TIMEOUT,
            )
            .await?;

        if value.get("ok").and_then(|ok| ok.as_bool()) != Some(true) {
            let message = value
                .get("error")
                .and_then(|e| e.as_str())
                .unwrap_or("in-page fetch failed")
                .to_string();
            return Err(BrowserError::Command {
                command: "fetch".to_string(),
                message,
            });
        }
        let data = value.get("data").and_then(|d| d.as_str()).unwrap_or_default();
        BASE64.decode(data).map_err(|e| BrowserError::Command {
            command: "fetch".to_string(),
            message: e.to_string(),
        })
    }

    async fn close(self: Box<Self>) -> Result<(), BrowserError> {
        self.command(Method::DELETE, "", None, COMMAND_TIMEOUT)
            .await
            .map(|_| ())
    }
}

/// Issue one WebDriver command and unwrap its `value`.
async fn send(
    client: &Client,
    method: Method,
    url: &str,
    body: Option<JsonValue>,
    timeout: Duration,
) -> Result<JsonValue, BrowserError> {
    let command = format!("{method} {url}");
    let mut request = client.request(method, url).timeout(timeout);
    if let Some(body) = body {
        request = request.json(&body);
    }

    let response = request.send().await.map_err(|e| {
        if e.is_timeout() {
            BrowserError::Timeout(timeout)
        } else {
            BrowserError::Command {
                command: command.clone(),
                message: e.to_string(),
            }
        }
    })?;
    let status = response.status();
    let payload: JsonValue = response.json().await.map_err(|e| BrowserError::Command {
        command: command.clone(),
        message: e.to_string(),
    })?;
    let value = payload.get("value").cloned().unwrap_or(JsonValue::Null);

    if status.is_success() {
        return Ok(value);
    }

    let error = value.get("error").and_then(|e| e.as_str()).unwrap_or_default();
    let message = value
        .get("message")
        .and_then(|m| m.as_str())
        .unwrap_or(status.as_str())
        .to_string();
    if error == "timeout" || error == "script timeout" {
        return Err(BrowserError::Timeout(timeout));
    }
    Err(BrowserError::Command { command, message })
}
