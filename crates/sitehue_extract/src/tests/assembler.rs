use std::sync::Arc;
use std::time::Duration;

use super::support::{two_tone_png, FakeBrowser};
use crate::assemble::WebsiteDataAssembler;
use crate::config::ExtractConfig;
use crate::error::ExtractError;
use crate::favicon::FaviconExtractor;
use crate::fetch::{BrowserPageStrategy, ContentFetcher, PageStrategy};

fn assembler() -> WebsiteDataAssembler {
    WebsiteDataAssembler::from_config(&ExtractConfig::default().with_favicon_timeout(Duration::from_secs(2)))
        .unwrap()
}

#[tokio::test]
async fn test_favicon_only_palette() {
    let mut server = mockito::Server::new_async().await;
    let _page = server
        .mock("GET", "/")
        .with_status(200)
        .with_body(
            r#"<html><head><title> Brand </title>
            <meta name="description" content="A brand site">
            <link rel="icon" href="/icon.png"></head><body></body></html>"#,
        )
        .create_async()
        .await;
    let _icon = server
        .mock("GET", "/icon.png")
        .with_status(200)
        .with_body(two_tone_png([16, 32, 64], [240, 200, 0]))
        .create_async()
        .await;

    let url = format!("{}/", server.url());
    let data = assembler().extract(&url).await.unwrap();

    assert_eq!(data.title, "Brand");
    assert_eq!(data.description, "A brand site");
    assert_eq!(data.url, url);
    assert_eq!(data.favicon, format!("{}/icon.png", server.url()));
    assert!(data.colors.css.is_empty());
    assert_eq!(data.colors.favicon, vec!["#102040", "#f0c800"]);

    let palette = &data.colors.palette;
    assert_eq!(palette.primary, "#102040");
    assert_eq!(palette.secondary, "#f0c800");
    assert_eq!(palette.accent, "#102040");
    assert_eq!(palette.text, "#ffffff");

    assert!(data
        .favicon_base64
        .as_deref()
        .unwrap()
        .starts_with("data:image/png;base64,"));
}

#[tokio::test]
async fn test_css_palette_wins_over_favicon() {
    let mut server = mockito::Server::new_async().await;
    let _page = server
        .mock("GET", "/")
        .with_status(200)
        .with_body(
            r#"<html><head>
            <style>body { color: #FFF; background: rgb(0, 0, 255); } a { color: #fff } h1 { color: #00ff00 }</style>
            <link rel="stylesheet" href="/theme.css">
            </head></html>"#,
        )
        .create_async()
        .await;
    let _icon = server
        .mock("GET", "/favicon.ico")
        .with_status(200)
        .with_body(two_tone_png([200, 0, 0], [0, 0, 0]))
        .create_async()
        .await;

    let data = assembler().extract(&server.url()).await.unwrap();

    let palette = &data.colors.palette;
    assert_eq!(palette.primary, "#ffffff");
    assert_eq!(palette.secondary, "#0000ff");
    assert_eq!(palette.accent, "#ffffff");
    assert_eq!(palette.text, "#00ff00");
    assert_eq!(data.colors.css, vec!["#0000ff", "#00ff00", "#ffffff"]);
    assert_eq!(data.colors.favicon, vec!["#c80000", "#000000"]);
}

#[tokio::test]
async fn test_no_favicon_bytes() {
    let mut server = mockito::Server::new_async().await;
    let _page = server
        .mock("GET", "/")
        .with_status(200)
        .with_body("<html><title>Plain</title></html>")
        .create_async()
        .await;

    let data = assembler().extract(&server.url()).await.unwrap();
    assert_eq!(data.title, "Plain");
    assert!(data.favicon_base64.is_none());
    assert!(data.colors.favicon.is_empty());
    assert!(data.colors.palette.is_empty());

    let json = serde_json::to_value(&data).unwrap();
    assert!(json.get("faviconBase64").is_none());
    assert_eq!(json["colors"]["palette"]["primary"], "");
}

#[tokio::test]
async fn test_forbidden_page() {
    let mut server = mockito::Server::new_async().await;
    let _page = server
        .mock("GET", "/")
        .with_status(403)
        .create_async()
        .await;

    let err = assembler().extract(&server.url()).await.unwrap_err();
    assert_eq!(err.status_code(), 403);
    assert_eq!(
        err.user_message(),
        "Website access forbidden. The site may be blocking automated requests."
    );
}

#[tokio::test]
async fn test_unreachable_host() {
    // Port 1 is reserved and closed on test machines.
    let err = assembler().extract("http://127.0.0.1:1/").await.unwrap_err();
    assert!(matches!(err, ExtractError::Fetch(_)));
    assert_eq!(err.status_code(), 400);
    assert!(err.to_string().starts_with("failed to extract colors"));
}

#[tokio::test]
async fn test_missing_and_invalid_url() {
    let err = assembler().extract("   ").await.unwrap_err();
    assert!(matches!(err, ExtractError::MissingUrl));
    assert_eq!(err.user_message(), "URL is required");

    let err = assembler().extract("example.com").await.unwrap_err();
    assert_eq!(err.status_code(), 400);
}

#[tokio::test]
async fn test_browser_fallback_end_to_end() {
    let browser = Arc::new(FakeBrowser {
        html: "<title>Rendered</title><style>p{color:#abc}</style>".to_string(),
        favicon_href: Some("https://example.com/icon.png".to_string()),
        favicon: Some(two_tone_png([10, 10, 10], [250, 250, 250])),
        ..Default::default()
    });
    let strategies: Vec<Arc<dyn PageStrategy>> = vec![
        Arc::new(super::support::FailingPage(500)),
        Arc::new(BrowserPageStrategy::new(
            browser.clone(),
            "ua",
            Duration::from_secs(1),
            Duration::from_secs(1),
        )),
    ];
    let assembler = WebsiteDataAssembler::new(ContentFetcher::new(strategies), FaviconExtractor::default());

    let data = assembler.extract("https://example.com").await.unwrap();
    assert_eq!(data.title, "Rendered");
    assert_eq!(data.colors.palette.primary, "#aabbcc");
    assert_eq!(data.colors.palette.secondary, "");
    assert_eq!(data.colors.favicon, vec!["#0a0a0a", "#fafafa"]);
    assert_eq!(browser.closed(), 1);
}
