//! HTTP transport for lookup services that only offer a web form.
//!
//! The HTTP client uses reqwest's own connector, configured from the
//! dialer's settings: the same timeout bounds connect (TLS handshake
//! included), each read and the whole exchange, and the same SOCKS proxy
//! carries the connection. The [`Dialer`] itself never opens these sockets.

use crate::dial::Dialer;
use crate::error::WhoisError;
use crate::types::{Request, Response, READ_LIMIT};
use reqwest::header::{CONTENT_TYPE, REFERER};

/// Web form transport.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    /// HTTP client configured from the dialer
    http_client: reqwest::Client,
}

impl HttpTransport {
    /// Build the HTTP client for `dialer`.
    pub fn new(dialer: &Dialer) -> Result<Self, WhoisError> {
        let timeout = dialer.timeout();
        let mut builder = reqwest::Client::builder()
            .connect_timeout(timeout)
            .read_timeout(timeout)
            .timeout(timeout);

        builder = match dialer.proxy() {
            Some(proxy) => {
                let proxy_url = proxy.http_proxy_url();
                let http_proxy = reqwest::Proxy::all(&proxy_url)
                    .map_err(|e| WhoisError::proxy_config(&proxy_url, e.to_string()))?;
                builder.proxy(http_proxy)
            }
            // Ignore HTTP_PROXY and friends; only the configured proxy applies
            None => builder.no_proxy(),
        };

        let http_client = builder
            .build()
            .map_err(|e| WhoisError::http("", format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { http_client })
    }

    /// Submit the form: POST `req.body` if there is one, GET otherwise.
    ///
    /// A `Referer` equal to the target URL is always sent; some services
    /// reject requests without one. The status code is not checked, the
    /// page is returned as served.
    pub async fn fetch(&self, req: &Request) -> Result<Response, WhoisError> {
        let builder = if req.body.is_empty() {
            self.http_client.get(&req.url)
        } else {
            self.http_client.post(&req.url).body(req.body.clone())
        };

        tracing::debug!(
            url = %req.url,
            method = if req.body.is_empty() { "GET" } else { "POST" },
            "sending form request"
        );
        let mut response = builder
            .header(REFERER, req.url.as_str())
            .send()
            .await
            .map_err(|e| request_error(&req.url, e))?;

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);

        let limit = READ_LIMIT as usize;
        let mut body = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| request_error(&req.url, e))?
        {
            let room = limit - body.len();
            if chunk.len() >= room {
                body.extend_from_slice(&chunk[..room]);
                break;
            }
            body.extend_from_slice(&chunk);
        }

        tracing::debug!(
            url = %req.url,
            status = %response.status(),
            bytes = body.len(),
            "form response received"
        );
        Ok(Response::new(
            &req.query,
            &req.host,
            body,
            content_type.as_deref(),
        ))
    }
}

/// Body read errors carry no URL of their own, so attach the request's.
fn request_error(url: &str, err: reqwest::Error) -> WhoisError {
    WhoisError::Http {
        url: url.to_string(),
        message: err.to_string(),
        timeout: err.is_timeout(),
    }
}
