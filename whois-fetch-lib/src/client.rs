//! Fetch dispatcher.
//!
//! [`WhoisClient`] sends a resolved [`Request`] over whichever transport it
//! needs: HTTP when the request carries a URL, the raw whois protocol
//! otherwise. Both transports share one [`Dialer`] policy.
//!
//! # Example
//!
//! ```rust,no_run
//! use whois_fetch_lib::{builtin_registry, WhoisClient};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = WhoisClient::new(Duration::from_secs(10));
//!     let request = builtin_registry().resolve("example.com")?;
//!     let response = client.fetch(&request).await?;
//!     println!("{}", response.text());
//!     Ok(())
//! }
//! ```

use crate::dial::Dialer;
use crate::error::WhoisError;
use crate::protocols::{HttpTransport, WhoisTransport};
use crate::registry::Registry;
use crate::types::{ClientConfig, Request, Response};
use std::time::Duration;

lazy_static::lazy_static! {
    static ref DEFAULT_CLIENT: WhoisClient = WhoisClient::default();
}

/// Shared client with the default timeout and no proxy.
pub fn default_client() -> &'static WhoisClient {
    &DEFAULT_CLIENT
}

/// A whois client. Cheap to clone; clones share the HTTP connection pool.
#[derive(Debug, Clone)]
pub struct WhoisClient {
    config: ClientConfig,
    dialer: Dialer,
    whois: WhoisTransport,
    /// Kept as a result so a proxy the HTTP stack rejects only affects HTTP
    http: Result<HttpTransport, WhoisError>,
}

impl WhoisClient {
    /// Client with the given timeout and no proxy.
    pub fn new(timeout: Duration) -> Self {
        Self::with_config(ClientConfig::default().with_timeout(timeout))
    }

    /// Client that dials through a SOCKS proxy.
    ///
    /// `proxy` is `[socks5://]host:port`; no scheme means SOCKS4. A proxy
    /// that fails to parse is logged and the client dials directly.
    pub fn with_proxy(timeout: Duration, proxy: &str) -> Self {
        Self::with_config(
            ClientConfig::default()
                .with_timeout(timeout)
                .with_proxy(proxy),
        )
    }

    /// Client from a full configuration.
    pub fn with_config(config: ClientConfig) -> Self {
        let dialer = Dialer::new(config.timeout, config.proxy.as_deref());
        let whois = WhoisTransport::with_port(dialer.clone(), config.whois_port);
        let http = HttpTransport::new(&dialer);
        if let Err(err) = &http {
            tracing::warn!(error = %err, "HTTP transport unavailable, form lookups will fail");
        }

        Self {
            config,
            dialer,
            whois,
            http,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn dialer(&self) -> &Dialer {
        &self.dialer
    }

    /// Fetch a resolved request.
    ///
    /// One attempt, no retries. The choice of transport depends only on
    /// whether `req.url` is set.
    pub async fn fetch(&self, req: &Request) -> Result<Response, WhoisError> {
        if req.is_http() {
            match &self.http {
                Ok(http) => http.fetch(req).await,
                Err(err) => Err(err.clone()),
            }
        } else {
            self.whois.fetch(req).await
        }
    }

    /// Resolve `query` against `registry`, then fetch it.
    pub async fn lookup(&self, registry: &Registry, query: &str) -> Result<Response, WhoisError> {
        let req = registry.resolve(query)?;
        self.fetch(&req).await
    }
}

impl Default for WhoisClient {
    fn default() -> Self {
        Self::with_config(ClientConfig::default())
    }
}
