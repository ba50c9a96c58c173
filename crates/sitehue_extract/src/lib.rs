//! sitehue extraction pipeline
//!
//! fetch → parse → extract → normalize → assemble. Page fetches fall back
//! from direct HTTP to a headless browser, favicon fetches from HTTP to the
//! browser to a raw socket, and favicon decoding from a direct decode to
//! format-specific conversions.
//!
//! ```no_run
//! use sitehue_extract::{ExtractConfig, WebsiteDataAssembler};
//!
//! # async fn run() -> anyhow::Result<()> {
//! let config = ExtractConfig::from_env()?;
//! let assembler = WebsiteDataAssembler::from_config(&config)?;
//! let data = assembler.extract("https://example.com").await?;
//! println!("{}", data.colors.palette.primary);
//! # Ok(())
//! # }
//! ```

pub mod assemble;
pub mod config;
pub mod error;
pub mod favicon;
pub mod fetch;
pub mod html;

#[cfg(test)]
mod tests;

pub use assemble::WebsiteDataAssembler;
pub use config::{ConfigError, ExtractConfig};
pub use error::{BrowserError, DecodeError, ExtractError, FailureCause, FetchError, StrategyFailure};
pub use favicon::{DecodeStrategy, FaviconExtractor};
pub use fetch::{
    Browser, BrowserPage, ContentFetcher, FaviconChain, FaviconStrategy, FetchResult, PageOptions,
    PageStrategy,
};
pub use html::PageMetadata;
