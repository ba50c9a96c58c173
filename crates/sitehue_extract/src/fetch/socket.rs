//! Bare HTTP/1.1 GET over a TCP (or TLS) socket.
//!
//! Last favicon strategy: some hosts reject the HTTP client but serve a
//! plain request that carries `Referer` and `Origin` matching the icon's
//! own origin.

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use url::{Position, Url};

use super::{browser_headers, origin_of, FaviconStrategy};
use crate::error::FetchError;

pub struct SocketFaviconStrategy {
    user_agent: String,
}

impl SocketFaviconStrategy {
    pub fn new(user_agent: &str) -> Self {
        Self {
            user_agent: user_agent.to_string(),
        }
    }

    fn request(&self, url: &Url) -> Result<String, FetchError> {
        let host = url
            .host_str()
            .ok_or_else(|| FetchError::InvalidUrl(url.to_string()))?;
        let host_header = match url.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        };
        let path = &url[Position::BeforePath..Position::AfterQuery];
        let origin = origin_of(url);

        let mut request = format!("GET {path} HTTP/1.1\r\nHost: {host_header}\r\n");
        for (name, value) in browser_headers(&self.user_agent) {
            request.push_str(&format!("{name}: {value}\r\n"));
        }
        request.push_str(&format!("Referer: {origin}\r\nOrigin: {origin}\r\nConnection: close\r\n\r\n"));
        Ok(request)
    }
}

async fn exchange<S>(stream: &mut S, request: &str) -> Result<Vec<u8>, FetchError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    stream
        .write_all(request.as_bytes())
        .await
        .map_err(|e| FetchError::Request(e.to_string()))?;
    let mut response = Vec::new();
    stream
        .read_to_end(&mut response)
        .await
        .map_err(|e| FetchError::Request(e.to_string()))?;
    Ok(response)
}

#[async_trait]
impl FaviconStrategy for SocketFaviconStrategy {
    fn name(&self) -> &'static str {
        "socket"
    }

    async fn fetch(&self, favicon_url: &Url) -> Result<Vec<u8>, FetchError> {
        let request = self.request(favicon_url)?;
        let host = favicon_url
            .host_str()
            .ok_or_else(|| FetchError::InvalidUrl(favicon_url.to_string()))?;
        let port = favicon_url
            .port_or_known_default()
            .ok_or_else(|| FetchError::InvalidUrl(favicon_url.to_string()))?;

        let mut stream = TcpStream::connect((host, port))
            .await
            .map_err(|e| FetchError::Connect(e.to_string()))?;

        let raw = match favicon_url.scheme() {
            "http" => exchange(&mut stream, &request).await?,
            "https" => {
                let connector = native_tls::TlsConnector::new()
                    .map_err(|e| FetchError::Connect(e.to_string()))?;
                let connector = tokio_native_tls::TlsConnector::from(connector);
                let mut tls = connector
                    .connect(host, stream)
                    .await
                    .map_err(|e| FetchError::Connect(e.to_string()))?;
                exchange(&mut tls, &request).await?
            }
            other => return Err(FetchError::InvalidUrl(format!("unsupported scheme {other}"))),
        };

        parse_response(&raw)
    }
}

/// Body of a `200` response. Handles `Content-Length` and chunked bodies.
pub fn parse_response(raw: &[u8]) -> Result<Vec<u8>, FetchError> {
    let head_end = raw
        .windows(4)
        .position(|w| w == b"\r\n\r\n")
        .ok_or_else(|| FetchError::Request("malformed HTTP response".to_string()))?;
    let head = String::from_utf8_lossy(&raw[..head_end]);
    let body = &raw[head_end + 4..];

    let mut lines = head.split("\r\n");
    let status = lines
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .and_then(|code| code.parse::<u16>().ok())
        .ok_or_else(|| FetchError::Request("missing HTTP status line".to_string()))?;
    if status != 200 {
        return Err(FetchError::Status(status));
    }

    let mut chunked = false;
    let mut content_length = None;
    for line in lines {
        let Some((name, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.trim();
        if name.eq_ignore_ascii_case("transfer-encoding") {
            chunked = value.to_ascii_lowercase().contains("chunked");
        } else if name.eq_ignore_ascii_case("content-length") {
            content_length = value.parse::<usize>().ok();
        }
    }

    if chunked {
        return dechunk(body);
    }
    Ok(match content_length {
        Some(len) => body[..len.min(body.len())].to_vec(),
        None => body.to_vec(),
    })
}

fn dechunk(mut body: &[u8]) -> Result<Vec<u8>, FetchError> {
    let malformed = || FetchError::Request("malformed chunked body".to_string());
    let mut out = Vec::new();
    loop {
        let line_end = body.windows(2).position(|w| w == b"\r\n").ok_or_else(malformed)?;
        let size_line = String::from_utf8_lossy(&body[..line_end]);
        let size_hex = size_line.split(';').next().unwrap_or_default().trim();
        let size = usize::from_str_radix(size_hex, 16).map_err(|_| malformed())?;
        body = &body[line_end + 2..];
        if size == 0 {
            return Ok(out);
        }
        let chunk = body.get(..size).ok_or_else(malformed)?;
        out.extend_from_slice(chunk);
        body = body.get(size + 2..).unwrap_or_default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_headers() {
        let strategy = SocketFaviconStrategy::new("agent/1.0");
        let url = Url::parse("https://cdn.example.com:8443/img/favicon.ico?v=3").unwrap();
        let request = strategy.request(&url).unwrap();
        assert!(request.starts_with("GET /img/favicon.ico?v=3 HTTP/1.1\r\nHost: cdn.example.com:8443\r\n"));
        assert!(request.contains("User-Agent: agent/1.0\r\n"));
        assert!(request.contains("Referer: https://cdn.example.com:8443\r\n"));
        assert!(request.contains("Origin: https://cdn.example.com:8443\r\n"));
        assert!(request.ends_with("\r\n\r\n"));
    }

    #[test]
    fn test_parse_content_length() {
        let raw = b"HTTP/1.1 200 OK\r\nContent-Length: 3\r\n\r\nabcdef";
        assert_eq!(parse_response(raw).unwrap(), b"abc");
    }

    #[test]
    fn test_parse_chunked() {
        let raw = b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n3\r\nabc\r\n2;ext=1\r\nde\r\n0\r\n\r\n";
        assert_eq!(parse_response(raw).unwrap(), b"abcde");
    }

    #[test]
    fn test_parse_non_200() {
        let raw = b"HTTP/1.1 403 Forbidden\r\n\r\n";
        assert!(matches!(parse_response(raw), Err(FetchError::Status(403))));
    }

    #[test]
    fn test_parse_malformed() {
        assert!(parse_response(b"garbage").is_err());
        let raw = b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\nzz\r\n";
        assert!(parse_response(raw).is_err());
    }
}
