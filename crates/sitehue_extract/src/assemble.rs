use std::time::Instant;

use sitehue_core::{css, WebsiteColorData, WebsiteData};

use crate::config::ExtractConfig;
use crate::error::{ExtractError, FetchError, Result};
use crate::favicon::{mime, FaviconExtractor};
use crate::fetch::ContentFetcher;
use crate::html::PageMetadata;

/// Turns a URL into a fully assembled [`WebsiteData`].
pub struct WebsiteDataAssembler {
    fetcher: ContentFetcher,
    favicons: FaviconExtractor,
}

impl WebsiteDataAssembler {
    pub fn new(fetcher: ContentFetcher, favicons: FaviconExtractor) -> Self {
        Self { fetcher, favicons }
    }

    pub fn from_config(config: &ExtractConfig) -> std::result::Result<Self, FetchError> {
        Ok(Self::new(
            ContentFetcher::from_config(config)?,
            FaviconExtractor::new(config.ico_size),
        ))
    }

    pub async fn extract(&self, url: &str) -> Result<WebsiteData> {
        if url.trim().is_empty() {
            return Err(ExtractError::MissingUrl);
        }
        let started = Instant::now();

        let fetched = self.fetcher.fetch(url).await?;

        let meta = PageMetadata::parse(&fetched.html);
        let style_text = meta.style_text();
        let css_palette = css::extract_palette(&style_text);
        let css_colors = css::color_list(&style_text);

        let (favicon_colors, favicon_base64) = match fetched.favicon {
            Some(bytes) => {
                let data_url = mime::favicon_data_url(&fetched.favicon_url, &bytes);
                let colors = self.favicons.extract(fetched.favicon_url.clone(), bytes).await;
                (colors, Some(data_url))
            }
            None => (Vec::new(), None),
        };

        let from_css = !css_palette.is_empty();
        let palette = css_palette.or_favicon(&favicon_colors);

        tracing::info!(
            url,
            css_colors = css_colors.len(),
            favicon_colors = favicon_colors.len(),
            palette_source = if from_css { "css" } else if palette.is_empty() { "none" } else { "favicon" },
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Extracted website colors"
        );

        Ok(WebsiteData {
            title: meta.title,
            description: meta.description,
            url: url.to_string(),
            favicon: fetched.favicon_url,
            favicon_base64,
            colors: WebsiteColorData {
                palette,
                css: css_colors,
                favicon: favicon_colors,
            },
        })
    }
}
