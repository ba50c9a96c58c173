//! Favicon color extraction.
//!
//! Each buffer runs through an ordered chain of [`DecodeStrategy`] values
//! picked by format. A strategy that errors hands over to the next. The first
//! successful decode wins, even when it finds no colors. When the chain runs
//! out the result is an empty list.

pub mod dominant;
pub mod ico;
pub mod mime;
pub mod sampling;
pub mod transcode;

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::time::Instant;

use sitehue_core::{css::dedupe, filter_similar, normalize};
use sitehue_observability::{record_duration, strategy_span};

use crate::error::DecodeError;

/// One way of turning favicon bytes into colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeStrategy {
    /// Decode the buffer as-is
    Direct,
    /// Re-encode the best icon entry as a PNG, then decode
    IcoToPng,
    /// Read raw bytes as RGB triples
    ByteSampling,
    /// Rasterize SVG to PNG, then decode
    Transcode,
}

const ICO_CHAIN: &[DecodeStrategy] = &[
    DecodeStrategy::Direct,
    DecodeStrategy::IcoToPng,
    DecodeStrategy::ByteSampling,
];
const IMAGE_CHAIN: &[DecodeStrategy] = &[DecodeStrategy::Direct, DecodeStrategy::Transcode];

impl DecodeStrategy {
    pub fn name(&self) -> &'static str {
        match self {
            DecodeStrategy::Direct => "direct",
            DecodeStrategy::IcoToPng => "ico_to_png",
            DecodeStrategy::ByteSampling => "byte_sampling",
            DecodeStrategy::Transcode => "transcode",
        }
    }

    pub fn chain(is_ico: bool) -> &'static [DecodeStrategy] {
        if is_ico { ICO_CHAIN } else { IMAGE_CHAIN }
    }

    fn run(&self, input: &FaviconInput<'_>, ico_size: u32) -> Result<Vec<String>, DecodeError> {
        match self {
            DecodeStrategy::Direct => dominant::dominant_colors_from_bytes(input.bytes),
            DecodeStrategy::IcoToPng => {
                let png = ico::ico_to_png(input.bytes, ico_size)?;
                dominant::dominant_colors_from_bytes(&png)
            }
            DecodeStrategy::ByteSampling => sampling::sample_colors(input.bytes),
            DecodeStrategy::Transcode => {
                let png = transcode::to_png(input.bytes, &input.ext)?;
                dominant::dominant_colors_from_bytes(&png)
            }
        }
    }
}

/// A favicon buffer with its routing hints.
#[derive(Debug, Clone)]
pub struct FaviconInput<'a> {
    pub url: &'a str,
    pub bytes: &'a [u8],
    /// Sniffed from the bytes; `application/octet-stream` when unknown
    pub content_type: &'static str,
    pub ext: String,
}

impl<'a> FaviconInput<'a> {
    pub fn new(url: &'a str, bytes: &'a [u8]) -> Self {
        let content_type = mime::sniff_mime(bytes);
        Self {
            url,
            bytes,
            content_type,
            ext: mime::resolve_extension(url, content_type),
        }
    }

    pub fn is_ico(&self) -> bool {
        mime::is_ico(self.content_type, &self.ext)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FaviconExtractor {
    ico_size: u32,
}

impl Default for FaviconExtractor {
    fn default() -> Self {
        Self::new(32)
    }
}

impl FaviconExtractor {
    pub fn new(ico_size: u32) -> Self {
        Self { ico_size }
    }

    /// Colors straight from the strategy chain, before filtering.
    pub fn raw_colors(&self, url: &str, bytes: &[u8]) -> Vec<String> {
        let input = FaviconInput::new(url, bytes);
        tracing::debug!(
            url,
            content_type = input.content_type,
            ext = %input.ext,
            len = bytes.len(),
            "Extracting favicon colors"
        );

        for strategy in DecodeStrategy::chain(input.is_ico()) {
            let span = strategy_span!("decode", strategy.name(), url);
            let _guard = span.enter();
            let started = Instant::now();

            let outcome = match catch_unwind(AssertUnwindSafe(|| strategy.run(&input, self.ico_size))) {
                Ok(result) => result,
                Err(_) => {
                    tracing::error!(strategy = strategy.name(), "Favicon decoder panicked");
                    return Vec::new();
                }
            };
            record_duration("duration_ms", started.elapsed());

            match outcome {
                Ok(colors) => {
                    tracing::debug!(strategy = strategy.name(), count = colors.len(), "Favicon decoded");
                    return colors;
                }
                Err(e) => {
                    tracing::warn!(strategy = strategy.name(), error = %e, "Favicon decode strategy failed")
                }
            }
        }

        tracing::warn!(url, "All favicon decode strategies failed");
        Vec::new()
    }

    /// Similarity filter, then normalize, then dedupe.
    pub fn colors(&self, url: &str, bytes: &[u8]) -> Vec<String> {
        let raw = self.raw_colors(url, bytes);
        if raw.is_empty() {
            return raw;
        }
        dedupe(filter_similar(&raw).iter().map(|c| normalize(c)))
    }

    /// [`FaviconExtractor::colors`] on the blocking pool.
    pub async fn extract(&self, url: String, bytes: Vec<u8>) -> Vec<String> {
        let extractor = *self;
        match tokio::task::spawn_blocking(move || extractor.colors(&url, &bytes)).await {
            Ok(colors) => colors,
            Err(e) => {
                tracing::error!(error = %e, "Favicon extraction task failed");
                Vec::new()
            }
        }
    }
}
