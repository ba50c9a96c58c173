//! Pipeline configuration.
//!
//! Timeouts bound every network and browser boundary; a timeout fails the
//! current strategy and the chain moves on.

use std::time::Duration;

use thiserror::Error;

pub const ENV_PAGE_TIMEOUT: &str = "SITEHUE_PAGE_TIMEOUT_SECS";
pub const ENV_FAVICON_TIMEOUT: &str = "SITEHUE_FAVICON_TIMEOUT_SECS";
pub const ENV_WEBDRIVER_URL: &str = "SITEHUE_WEBDRIVER_URL";
pub const ENV_USER_AGENT: &str = "SITEHUE_USER_AGENT";
pub const ENV_ICO_SIZE: &str = "SITEHUE_ICO_SIZE";

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{name} must be a positive integer, got {value:?}")]
    InvalidNumber { name: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractConfig {
    /// Bound on the page fetch and browser navigation
    pub page_timeout: Duration,
    /// Bound on each favicon fetch attempt
    pub favicon_timeout: Duration,
    /// W3C WebDriver endpoint (e.g. chromedriver). `None` disables browser strategies.
    pub webdriver_url: Option<String>,
    pub user_agent: String,
    /// Edge length of the PNG an ICO favicon is converted to
    pub ico_size: u32,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            page_timeout: Duration::from_secs(20),
            favicon_timeout: Duration::from_secs(5),
            webdriver_url: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            ico_size: 32,
        }
    }
}

impl ExtractConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page_timeout(mut self, timeout: Duration) -> Self {
        self.page_timeout = timeout;
        self
    }

    pub fn with_favicon_timeout(mut self, timeout: Duration) -> Self {
        self.favicon_timeout = timeout;
        self
    }

    pub fn with_webdriver_url(mut self, url: impl Into<String>) -> Self {
        self.webdriver_url = Some(url.into());
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_ico_size(mut self, size: u32) -> Self {
        self.ico_size = size;
        self
    }

    /// Load configuration from environment variables
    ///
    /// Optional: `SITEHUE_PAGE_TIMEOUT_SECS` (default 20)
    /// Optional: `SITEHUE_FAVICON_TIMEOUT_SECS` (default 5)
    /// Optional: `SITEHUE_WEBDRIVER_URL` (browser strategies disabled when unset)
    /// Optional: `SITEHUE_USER_AGENT`
    /// Optional: `SITEHUE_ICO_SIZE` (default 32)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`ExtractConfig::from_env`] with an injectable variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(secs) = positive(&lookup, ENV_PAGE_TIMEOUT)? {
            config.page_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = positive(&lookup, ENV_FAVICON_TIMEOUT)? {
            config.favicon_timeout = Duration::from_secs(secs);
        }
        if let Some(size) = positive(&lookup, ENV_ICO_SIZE)? {
            config.ico_size = u32::try_from(size).map_err(|_| ConfigError::InvalidNumber {
                name: ENV_ICO_SIZE,
                value: size.to_string(),
            })?;
        }
        config.webdriver_url = lookup(ENV_WEBDRIVER_URL).filter(|v| !v.trim().is_empty());
        if let Some(ua) = lookup(ENV_USER_AGENT).filter(|v| !v.trim().is_empty()) {
            config.user_agent = ua;
        }

        Ok(config)
    }
}

fn positive<F>(lookup: &F, name: &'static str) -> Result<Option<u64>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(name) else {
        return Ok(None);
    };
    match raw.trim().parse::<u64>() {
        Ok(value) if value > 0 => Ok(Some(value)),
        _ => Err(ConfigError::InvalidNumber { name, value: raw }),
    }
}
