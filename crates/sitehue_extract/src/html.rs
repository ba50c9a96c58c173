//! HTML inspection: metadata, style text and favicon discovery.

use lazy_static::lazy_static;
use scraper::{Html, Selector};
use url::Url;

/// `rel` values tried in order when looking for a favicon link.
pub const FAVICON_RELS: [&str; 5] = [
    "icon",
    "shortcut icon",
    "apple-touch-icon",
    "apple-touch-icon-precomposed",
    "mask-icon",
];

lazy_static! {
    static ref TITLE: Selector = Selector::parse("title").unwrap();
    static ref META_DESCRIPTION: Selector =
        Selector::parse(r#"meta[name="description"]"#).unwrap();
    static ref META_OG_DESCRIPTION: Selector =
        Selector::parse(r#"meta[property="og:description"]"#).unwrap();
    static ref STYLE: Selector = Selector::parse("style").unwrap();
    static ref STYLESHEET_LINK: Selector = Selector::parse(r#"link[rel="stylesheet"]"#).unwrap();
    static ref FAVICON_LINKS: Vec<Selector> = FAVICON_RELS
        .iter()
        .map(|rel| Selector::parse(&format!(r#"link[rel="{rel}"]"#)).unwrap())
        .collect();
}

/// What the assembler needs from a page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageMetadata {
    pub title: String,
    pub description: String,
    /// Inline `<style>` bodies followed by linked stylesheet hrefs
    pub styles: Vec<String>,
}

impl PageMetadata {
    pub fn parse(html: &str) -> Self {
        let document = Html::parse_document(html);

        let title = document
            .select(&TITLE)
            .next()
            .map(|el| el.text().collect::<String>().trim().to_string())
            .unwrap_or_default();

        let description = [&*META_DESCRIPTION, &*META_OG_DESCRIPTION]
            .into_iter()
            .find_map(|selector| {
                document
                    .select(selector)
                    .next()
                    .and_then(|el| el.value().attr("content"))
                    .filter(|content| !content.is_empty())
            })
            .unwrap_or_default()
            .to_string();

        let mut styles: Vec<String> = document
            .select(&STYLE)
            .map(|el| el.text().collect::<String>())
            .collect();
        styles.extend(
            document
                .select(&STYLESHEET_LINK)
                .filter_map(|el| el.value().attr("href"))
                .filter(|href| !href.is_empty())
                .map(str::to_string),
        );

        Self {
            title,
            description,
            styles,
        }
    }

    /// Style text handed to the CSS extractor. Linked stylesheets are not fetched.
    pub fn style_text(&self) -> String {
        self.styles.join("\n")
    }
}

/// Locate the favicon for a page, falling back to `{origin}/favicon.ico`.
///
/// The first link whose href resolves against `page_url` wins. Returns an
/// empty string only when `page_url` itself cannot anchor a fallback.
pub fn find_favicon(html: &str, page_url: &Url) -> String {
    let document = Html::parse_document(html);

    for (rel, selector) in FAVICON_RELS.iter().zip(FAVICON_LINKS.iter()) {
        let Some(href) = document
            .select(selector)
            .next()
            .and_then(|el| el.value().attr("href"))
            .filter(|href| !href.trim().is_empty())
        else {
            continue;
        };
        match page_url.join(href.trim()) {
            Ok(resolved) => {
                tracing::debug!(rel, favicon = %resolved, "Found favicon link");
                return resolved.to_string();
            }
            Err(e) => tracing::warn!(rel, href, error = %e, "Invalid favicon URL"),
        }
    }

    default_favicon(page_url)
}

/// `{origin}/favicon.ico`, or empty when the URL has no usable origin.
pub fn default_favicon(page_url: &Url) -> String {
    match page_url.join("/favicon.ico") {
        Ok(url) if page_url.has_host() => url.to_string(),
        _ => {
            tracing::warn!(url = %page_url, "Cannot derive default favicon location");
            String::new()
        }
    }
}
