//! Connection establishment under a single deadline.
//!
//! Every connection handed out by a [`Dialer`] carries an absolute deadline of
//! dial start plus the configured timeout. Reads and writes past that instant
//! fail with [`std::io::ErrorKind::TimedOut`], so a peer that accepts and then
//! stalls cannot hold a lookup longer than the timeout. Proxied dials run the
//! SOCKS handshake inside the same budget.

mod deadline;
mod socks;

pub use deadline::Connection;

use crate::error::WhoisError;
use std::fmt;
use std::io;
use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::{timeout_at, Instant};
use url::{Host, Url};

/// SOCKS protocol version spoken to the proxy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProxyProtocol {
    Socks4,
    Socks5,
}

impl fmt::Display for ProxyProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProxyProtocol::Socks4 => write!(f, "SOCKS4"),
            ProxyProtocol::Socks5 => write!(f, "SOCKS5"),
        }
    }
}

/// A parsed SOCKS proxy endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxySettings {
    pub protocol: ProxyProtocol,
    pub host: String,
    pub port: u16,
}

impl ProxySettings {
    /// Parse `[scheme://]host:port`.
    ///
    /// `socks5://` selects SOCKS5; any other scheme, or none, selects SOCKS4.
    pub fn parse(proxy: &str) -> Result<Self, WhoisError> {
        let trimmed = proxy.trim();
        if trimmed.is_empty() {
            return Err(WhoisError::proxy_config(proxy, "empty proxy address"));
        }

        let with_scheme = if trimmed.contains("://") {
            trimmed.to_string()
        } else {
            format!("socks4://{}", trimmed)
        };
        let url = Url::parse(&with_scheme)
            .map_err(|e| WhoisError::proxy_config(proxy, e.to_string()))?;

        let host = match url.host() {
            Some(Host::Domain(domain)) if !domain.is_empty() => domain.to_string(),
            Some(Host::Ipv4(addr)) => addr.to_string(),
            Some(Host::Ipv6(addr)) => addr.to_string(),
            _ => return Err(WhoisError::proxy_config(proxy, "missing proxy host")),
        };
        let port = url
            .port()
            .ok_or_else(|| WhoisError::proxy_config(proxy, "missing proxy port"))?;

        let protocol = if url.scheme().eq_ignore_ascii_case("socks5") {
            ProxyProtocol::Socks5
        } else {
            ProxyProtocol::Socks4
        };

        Ok(Self {
            protocol,
            host,
            port,
        })
    }

    /// `host:port`, with brackets around IPv6 literals.
    pub fn authority(&self) -> String {
        authority(&self.host, self.port)
    }

    /// Proxy URL in the form the HTTP client understands.
    ///
    /// SOCKS5 lets the proxy resolve names, as the raw socket path does.
    pub fn http_proxy_url(&self) -> String {
        match self.protocol {
            ProxyProtocol::Socks4 => format!("socks4://{}", self.authority()),
            ProxyProtocol::Socks5 => format!("socks5h://{}", self.authority()),
        }
    }
}

pub(crate) fn authority(host: &str, port: u16) -> String {
    if host.contains(':') {
        format!("[{}]:{}", host, port)
    } else {
        format!("{}:{}", host, port)
    }
}

/// Connection factory shared by both transports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dialer {
    timeout: Duration,
    proxy: Option<ProxySettings>,
}

impl Dialer {
    /// Direct connections bounded by `timeout`.
    pub fn direct(timeout: Duration) -> Self {
        Self {
            timeout,
            proxy: None,
        }
    }

    /// Connections tunneled through `proxy`.
    pub fn socks(timeout: Duration, proxy: ProxySettings) -> Self {
        Self {
            timeout,
            proxy: Some(proxy),
        }
    }

    /// Build a dialer from an optional proxy string.
    ///
    /// A proxy that fails to parse is logged and ignored; the dialer then
    /// connects directly.
    pub fn new(timeout: Duration, proxy: Option<&str>) -> Self {
        match proxy.filter(|p| !p.trim().is_empty()) {
            None => {
                tracing::debug!("no proxy configured, dialing directly");
                Self::direct(timeout)
            }
            Some(raw) => match ProxySettings::parse(raw) {
                Ok(settings) => {
                    tracing::debug!(
                        proxy = %settings.authority(),
                        protocol = %settings.protocol,
                        "dialing through proxy"
                    );
                    Self::socks(timeout, settings)
                }
                Err(err) => {
                    tracing::warn!(error = %err, "ignoring proxy, dialing directly");
                    Self::direct(timeout)
                }
            },
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn proxy(&self) -> Option<&ProxySettings> {
        self.proxy.as_ref()
    }

    /// Open a TCP connection to `host:port`.
    ///
    /// The returned connection expires `timeout` after this call started,
    /// regardless of how long the connect phase took.
    pub async fn dial(&self, host: &str, port: u16) -> Result<Connection, WhoisError> {
        let deadline = Instant::now() + self.timeout;
        let address = authority(host, port);

        match &self.proxy {
            None => {
                tracing::debug!(%address, timeout = ?self.timeout, "dialing");
                let stream = connect_before(deadline, (host, port))
                    .await
                    .map_err(|e| WhoisError::dial(&address, &e))?;
                Ok(Connection::new(stream, deadline))
            }
            Some(proxy) => {
                tracing::debug!(%address, proxy = %proxy.authority(), "dialing via {}", proxy.protocol);
                let stream = connect_before(deadline, (proxy.host.as_str(), proxy.port))
                    .await
                    .map_err(|e| WhoisError::dial(proxy.authority(), &e))?;
                let mut conn = Connection::new(stream, deadline);

                let handshake = match proxy.protocol {
                    ProxyProtocol::Socks5 => socks::connect_v5(&mut conn, host, port).await,
                    ProxyProtocol::Socks4 => match resolve_ipv4(deadline, host, port).await {
                        Ok(ip) => socks::connect_v4(&mut conn, ip, port).await,
                        Err(e) => Err(e),
                    },
                };
                handshake.map_err(|e| WhoisError::dial(&address, &e))?;
                Ok(conn)
            }
        }
    }
}

async fn connect_before(deadline: Instant, addr: (&str, u16)) -> io::Result<TcpStream> {
    match timeout_at(deadline, TcpStream::connect(addr)).await {
        Ok(result) => result,
        Err(_) => Err(io::Error::new(io::ErrorKind::TimedOut, "connect timed out")),
    }
}

/// SOCKS4 carries only IPv4 addresses, so names are resolved locally.
async fn resolve_ipv4(deadline: Instant, host: &str, port: u16) -> io::Result<Ipv4Addr> {
    if let Ok(ip) = host.parse::<IpAddr>() {
        return match ip {
            IpAddr::V4(v4) => Ok(v4),
            IpAddr::V6(_) => Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "SOCKS4 cannot reach IPv6 addresses",
            )),
        };
    }

    let addrs = match timeout_at(deadline, tokio::net::lookup_host((host, port))).await {
        Ok(result) => result?,
        Err(_) => return Err(io::Error::new(io::ErrorKind::TimedOut, "lookup timed out")),
    };
    addrs
        .filter_map(|addr| match addr.ip() {
            IpAddr::V4(v4) => Some(v4),
            IpAddr::V6(_) => None,
        })
        .next()
        .ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("no IPv4 address for {}", host),
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_socks5_scheme() {
        let proxy = ProxySettings::parse("socks5://127.0.0.1:1080").unwrap();
        assert_eq!(proxy.protocol, ProxyProtocol::Socks5);
        assert_eq!(proxy.host, "127.0.0.1");
        assert_eq!(proxy.port, 1080);
        assert_eq!(proxy.http_proxy_url(), "socks5h://127.0.0.1:1080");
    }

    #[test]
    fn test_parse_without_scheme_is_socks4() {
        let proxy = ProxySettings::parse("proxy.example:9050").unwrap();
        assert_eq!(proxy.protocol, ProxyProtocol::Socks4);
        assert_eq!(proxy.authority(), "proxy.example:9050");
        assert_eq!(proxy.http_proxy_url(), "socks4://proxy.example:9050");
    }

    #[test]
    fn test_parse_other_scheme_is_socks4() {
        let proxy = ProxySettings::parse("http://10.0.0.1:3128").unwrap();
        assert_eq!(proxy.protocol, ProxyProtocol::Socks4);
    }

    #[test]
    fn test_parse_ipv6_proxy() {
        let proxy = ProxySettings::parse("socks5://[::1]:1080").unwrap();
        assert_eq!(proxy.host, "::1");
        assert_eq!(proxy.authority(), "[::1]:1080");
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(matches!(
            ProxySettings::parse("socks5://"),
            Err(WhoisError::ProxyConfig { .. })
        ));
        assert!(ProxySettings::parse("socks5://host-without-port").is_err());
        assert!(ProxySettings::parse("").is_err());
        assert!(ProxySettings::parse("socks5://bad host:1080").is_err());
    }

    #[test]
    fn test_malformed_proxy_falls_back_to_direct() {
        let dialer = Dialer::new(Duration::from_secs(1), Some("socks5://:nope"));
        assert!(dialer.proxy().is_none());

        let dialer = Dialer::new(Duration::from_secs(1), Some("socks5://127.0.0.1:1080"));
        assert_eq!(dialer.proxy().unwrap().protocol, ProxyProtocol::Socks5);

        let dialer = Dialer::new(Duration::from_secs(1), Some("  "));
        assert!(dialer.proxy().is_none());
    }

    #[tokio::test]
    async fn test_dial_refused_is_dial_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let dialer = Dialer::direct(Duration::from_secs(2));
        let err = dialer.dial("127.0.0.1", port).await.unwrap_err();
        assert!(matches!(err, WhoisError::Dial { timeout: false, .. }));
    }

    #[tokio::test]
    async fn test_socks4_rejects_ipv6_target() {
        let deadline = Instant::now() + Duration::from_secs(1);
        let err = resolve_ipv4(deadline, "::1", 43).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }
}
