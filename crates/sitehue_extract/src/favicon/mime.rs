//! Content sniffing, extension resolution and the favicon data URL.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};

pub const OCTET_STREAM: &str = "application/octet-stream";
pub const SVG_MIME: &str = "image/svg+xml";
const ICON_MIME: &str = "image/x-icon";
const DEFAULT_EXTENSION: &str = ".png";

pub const VALID_EXTENSIONS: [&str; 7] = [".ico", ".png", ".jpg", ".jpeg", ".gif", ".svg", ".webp"];

/// Detect a MIME type from the leading bytes.
pub fn sniff_mime(bytes: &[u8]) -> &'static str {
    if let Ok(format) = image::guess_format(bytes) {
        return format.to_mime_type();
    }
    if looks_like_svg(bytes) {
        return SVG_MIME;
    }
    OCTET_STREAM
}

fn looks_like_svg(bytes: &[u8]) -> bool {
    let head = &bytes[..bytes.len().min(1024)];
    let text = String::from_utf8_lossy(head).to_ascii_lowercase();
    let text = text.trim_start_matches('\u{feff}').trim_start();
    text.starts_with('<') && text.contains("<svg")
}

fn extension_for_mime(mime: &str) -> Option<&'static str> {
    match mime {
        "image/png" => Some(".png"),
        "image/jpeg" => Some(".jpg"),
        "image/gif" => Some(".gif"),
        "image/svg+xml" => Some(".svg"),
        "image/x-icon" | "image/vnd.microsoft.icon" => Some(".ico"),
        "image/webp" => Some(".webp"),
        _ => None,
    }
}

fn mime_for_extension(ext: &str) -> Option<&'static str> {
    match ext {
        ".ico" => Some(ICON_MIME),
        ".png" => Some("image/png"),
        ".jpg" | ".jpeg" => Some("image/jpeg"),
        ".gif" => Some("image/gif"),
        ".svg" => Some(SVG_MIME),
        ".webp" => Some("image/webp"),
        _ => None,
    }
}

/// Lowercased extension of the last path segment after the final `.`,
/// with any query string dropped. Empty when there is none.
pub fn url_extension(url: &str) -> String {
    match url.rsplit_once('.') {
        Some((_, tail)) => {
            let tail = tail.split(['?', '#']).next().unwrap_or_default();
            format!(".{}", tail.to_ascii_lowercase())
        }
        None => String::new(),
    }
}

/// Extension used to route a favicon: content type first, then a known
/// URL extension, then `.png`.
pub fn resolve_extension(url: &str, content_type: &str) -> String {
    if let Some(ext) = extension_for_mime(content_type) {
        return ext.to_string();
    }
    let ext = url_extension(url);
    if VALID_EXTENSIONS.contains(&ext.as_str()) {
        ext
    } else {
        DEFAULT_EXTENSION.to_string()
    }
}

pub fn is_ico(content_type: &str, ext: &str) -> bool {
    content_type.contains("icon") || ext.eq_ignore_ascii_case(".ico")
}

/// MIME for the data URL: sniffed bytes, then URL extension, then `image/x-icon`.
pub fn data_url_mime(url: &str, bytes: &[u8]) -> &'static str {
    match sniff_mime(bytes) {
        OCTET_STREAM => mime_for_extension(&url_extension(url)).unwrap_or(ICON_MIME),
        mime => mime,
    }
}

pub fn favicon_data_url(url: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", data_url_mime(url, bytes), BASE64.encode(bytes))
}
