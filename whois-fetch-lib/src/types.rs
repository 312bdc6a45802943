//! Core data types for whois lookups.
//!
//! A [`Request`] is produced by resolution and shaped by exactly one service
//! resolver; a [`Response`] is what the fetch path hands back to the caller.

use crate::content::detect_content_type;
use std::time::Duration;

/// Maximum lifetime of a whois request, connect and read included.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Maximum number of bytes read from a connection or HTTP body.
pub const READ_LIMIT: u64 = 1 << 20;

/// Default port of the raw whois protocol.
pub const WHOIS_PORT: u16 = 43;

/// A lookup request, ready to be fetched.
///
/// Routed over HTTP when `url` is non-empty, otherwise over the raw whois
/// protocol to `host`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Request {
    /// The query as given (e.g., "example.com")
    pub query: String,

    /// Hostname of the responsible lookup service, empty if unresolved
    pub host: String,

    /// Payload written to the raw socket, or POSTed over HTTP
    pub body: Vec<u8>,

    /// Web form URL for services without a port 43 endpoint
    pub url: String,
}

impl Request {
    /// Create an unresolved request for `query`.
    pub fn new<Q: Into<String>>(query: Q) -> Self {
        Self {
            query: query.into(),
            ..Default::default()
        }
    }

    /// Whether this request goes over HTTP rather than port 43.
    pub fn is_http(&self) -> bool {
        !self.url.is_empty()
    }

    /// Fetch this request with the shared default client.
    pub async fn fetch(&self) -> crate::Result<Response> {
        crate::client::default_client().fetch(self).await
    }
}

/// The answer from a lookup service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// The query that was sent
    pub query: String,

    /// The service that answered
    pub host: String,

    /// Raw response bytes, at most [`READ_LIMIT`] long
    pub body: Vec<u8>,

    /// Detected content type (header when present, sniffed otherwise)
    pub content_type: String,
}

impl Response {
    /// Build a response and detect its content type.
    ///
    /// `header` is the transport's Content-Type, if any. An empty header is
    /// treated as absent.
    pub fn new(query: &str, host: &str, body: Vec<u8>, header: Option<&str>) -> Self {
        let content_type = match header.map(str::trim) {
            Some(value) if !value.is_empty() => value.to_string(),
            _ => detect_content_type(&body).to_string(),
        };
        Self {
            query: query.to_string(),
            host: host.to_string(),
            body,
            content_type,
        }
    }

    /// Body decoded as UTF-8, with invalid sequences replaced.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Whether the content type is a `text/*` type.
    pub fn is_text(&self) -> bool {
        self.media_type().starts_with("text/")
    }

    /// The media type without parameters, lowercased.
    pub fn media_type(&self) -> String {
        self.content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_lowercase()
    }

    /// The `charset` parameter of the content type, if any.
    pub fn charset(&self) -> Option<String> {
        self.content_type.split(';').skip(1).find_map(|param| {
            let (key, value) = param.split_once('=')?;
            if key.trim().eq_ignore_ascii_case("charset") {
                Some(value.trim().trim_matches('"').to_lowercase())
            } else {
                None
            }
        })
    }
}

/// Client settings shared by both transports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Total time budget for a fetch, connect included
    /// Default: 30 seconds
    pub timeout: Duration,

    /// SOCKS proxy as `[socks5://]host:port`; no scheme means SOCKS4
    /// Default: none
    pub proxy: Option<String>,

    /// Port used for raw whois connections
    /// Default: 43
    pub whois_port: u16,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            proxy: None,
            whois_port: WHOIS_PORT,
        }
    }
}

impl ClientConfig {
    /// Set the total timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Route connections through a SOCKS proxy. An empty string clears it.
    pub fn with_proxy<P: Into<String>>(mut self, proxy: P) -> Self {
        let proxy = proxy.into();
        self.proxy = if proxy.trim().is_empty() {
            None
        } else {
            Some(proxy)
        };
        self
    }

    /// Override the raw whois port.
    pub fn with_whois_port(mut self, port: u16) -> Self {
        self.whois_port = port;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_routing() {
        let mut req = Request::new("example.com");
        assert!(!req.is_http());
        assert!(req.host.is_empty());

        req.url = "http://example.net/whois".to_string();
        assert!(req.is_http());
    }

    #[test]
    fn test_response_trusts_header() {
        let res = Response::new(
            "example.com",
            "whois.example",
            b"Domain Name: EXAMPLE.COM".to_vec(),
            Some("text/html; charset=ISO-8859-1"),
        );
        assert_eq!(res.content_type, "text/html; charset=ISO-8859-1");
        assert_eq!(res.media_type(), "text/html");
        assert_eq!(res.charset(), Some("iso-8859-1".to_string()));
    }

    #[test]
    fn test_response_sniffs_without_header() {
        let res = Response::new("example.com", "whois.example", b"Domain Name".to_vec(), None);
        assert_eq!(res.content_type, "text/plain; charset=utf-8");
        assert!(res.is_text());

        let res = Response::new("example.com", "whois.example", b"plain".to_vec(), Some(" "));
        assert_eq!(res.media_type(), "text/plain");
    }

    #[test]
    fn test_client_config_builders() {
        let config = ClientConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.whois_port, 43);
        assert!(config.proxy.is_none());

        let config = config
            .with_timeout(Duration::from_secs(5))
            .with_proxy("socks5://127.0.0.1:1080")
            .with_whois_port(4343);
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.proxy.as_deref(), Some("socks5://127.0.0.1:1080"));
        assert_eq!(config.whois_port, 4343);

        assert!(config.with_proxy("").proxy.is_none());
    }
}
