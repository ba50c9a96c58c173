use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use url::Url;

use crate::error::{BrowserError, FetchError};
use crate::fetch::{Browser, BrowserPage, FaviconStrategy, FetchResult, PageOptions, PageStrategy};

/// 16×16 PNG, left part `a`, right part `b`.
pub fn two_tone_png(a: [u8; 3], b: [u8; 3]) -> Vec<u8> {
    let img = RgbaImage::from_fn(16, 16, |x, _| {
        let [r, g, bl] = if x < 10 { a } else { b };
        Rgba([r, g, bl, 255])
    });
    let mut out = Cursor::new(Vec::new());
    DynamicImage::ImageRgba8(img)
        .write_to(&mut out, ImageFormat::Png)
        .unwrap();
    out.into_inner()
}

/// Scripted browser that records how its pages are used.
#[derive(Default)]
pub struct FakeBrowser {
    pub navigate_error: Option<String>,
    pub navigate_delay: Duration,
    pub html: String,
    pub favicon_href: Option<String>,
    pub favicon: Option<Vec<u8>>,
    pub opened: AtomicUsize,
    pub closed: Arc<AtomicUsize>,
    pub referrers: Arc<Mutex<Vec<Option<String>>>>,
}

impl FakeBrowser {
    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }

    /// Wait for pages closed in the background to be counted.
    pub async fn settle(&self) {
        for _ in 0..50 {
            if self.closed() >= self.opened() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }
}

#[async_trait]
impl Browser for FakeBrowser {
    async fn open(&self, _options: &PageOptions) -> Result<Box<dyn BrowserPage>, BrowserError> {
        self.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakePage {
            navigate_error: self.navigate_error.clone(),
            navigate_delay: self.navigate_delay,
            html: self.html.clone(),
            favicon_href: self.favicon_href.clone(),
            favicon: self.favicon.clone(),
            closed: self.closed.clone(),
            referrers: self.referrers.clone(),
        }))
    }
}

struct FakePage {
    navigate_error: Option<String>,
    navigate_delay: Duration,
    html: String,
    favicon_href: Option<String>,
    favicon: Option<Vec<u8>>,
    closed: Arc<AtomicUsize>,
    referrers: Arc<Mutex<Vec<Option<String>>>>,
}

#[async_trait]
impl BrowserPage for FakePage {
    async fn navigate(
        &mut self,
        _url: &str,
        referrer: Option<&str>,
        _timeout: Duration,
    ) -> Result<(), BrowserError> {
        self.referrers
            .lock()
            .unwrap()
            .push(referrer.map(str::to_string));
        if !self.navigate_delay.is_zero() {
            tokio::time::sleep(self.navigate_delay).await;
        }
        match &self.navigate_error {
            Some(message) => Err(BrowserError::Navigation(message.clone())),
            None => Ok(()),
        }
    }

    async fn content(&mut self) -> Result<String, BrowserError> {
        Ok(self.html.clone())
    }

    async fn favicon_href(&mut self) -> Result<Option<String>, BrowserError> {
        Ok(self.favicon_href.clone())
    }

    async fn fetch_bytes(&mut self, url: &str, _timeout: Duration) -> Result<Vec<u8>, BrowserError> {
        self.favicon.clone().ok_or_else(|| BrowserError::Command {
            command: "fetch".to_string(),
            message: format!("no favicon at {url}"),
        })
    }

    async fn close(self: Box<Self>) -> Result<(), BrowserError> {
        self.closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Page strategy that always fails with a fixed status.
pub struct FailingPage(pub u16);

#[async_trait]
impl PageStrategy for FailingPage {
    fn name(&self) -> &'static str {
        "failing"
    }

    async fn fetch(&self, _url: &Url) -> Result<FetchResult, FetchError> {
        Err(FetchError::Status(self.0))
    }
}

/// Favicon strategy that never answers.
pub struct StalledFavicon;

#[async_trait]
impl FaviconStrategy for StalledFavicon {
    fn name(&self) -> &'static str {
        "stalled"
    }

    async fn fetch(&self, _favicon_url: &Url) -> Result<Vec<u8>, FetchError> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok(Vec::new())
    }
}

/// Favicon strategy that serves fixed bytes and counts calls.
#[derive(Default)]
pub struct StaticFavicon {
    pub bytes: Vec<u8>,
    pub calls: AtomicUsize,
}

#[async_trait]
impl FaviconStrategy for StaticFavicon {
    fn name(&self) -> &'static str {
        "static"
    }

    async fn fetch(&self, _favicon_url: &Url) -> Result<Vec<u8>, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.bytes.clone())
    }
}
