//! Raw whois protocol (RFC 3912) transport.
//!
//! Write the request line, read until the server closes the connection or
//! the read cap is reached. The connection deadline bounds the whole exchange.

use crate::dial::Dialer;
use crate::error::{NetErrorKind, WhoisError};
use crate::types::{Request, Response, READ_LIMIT, WHOIS_PORT};
use std::io;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

/// Port 43 transport.
#[derive(Debug, Clone)]
pub struct WhoisTransport {
    dialer: Dialer,
    port: u16,
}

impl WhoisTransport {
    pub fn new(dialer: Dialer) -> Self {
        Self::with_port(dialer, WHOIS_PORT)
    }

    /// Transport that connects to `port` instead of 43.
    pub fn with_port(dialer: Dialer, port: u16) -> Self {
        Self { dialer, port }
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Send `req.body` to `req.host` and collect the answer.
    ///
    /// # Errors
    ///
    /// - [`WhoisError::NoServer`] if the request has no host
    /// - [`WhoisError::Dial`] if the connection (or proxy handshake) fails
    /// - [`WhoisError::Transport`] on write or read failure, including the
    ///   deadline expiring; a partial body is discarded
    pub async fn fetch(&self, req: &Request) -> Result<Response, WhoisError> {
        if req.host.is_empty() {
            return Err(WhoisError::no_server(&req.query));
        }

        let mut conn = self.dialer.dial(&req.host, self.port).await?;

        if let Err(err) = conn.write_all(&req.body).await {
            log_network_error(&req.host, &err);
            return Err(WhoisError::transport(&req.host, &err));
        }

        let mut body = Vec::new();
        if let Err(err) = (&mut conn).take(READ_LIMIT).read_to_end(&mut body).await {
            log_network_error(&req.host, &err);
            return Err(WhoisError::transport(&req.host, &err));
        }

        tracing::debug!(
            host = %req.host,
            bytes = body.len(),
            remaining = ?conn.remaining(),
            "whois response received"
        );
        Ok(Response::new(&req.query, &req.host, body, None))
    }
}

fn log_network_error(host: &str, err: &io::Error) {
    let kind = NetErrorKind::classify(err);
    tracing::warn!(
        host,
        timeout = kind == NetErrorKind::Timeout,
        temporary = kind == NetErrorKind::Temporary,
        error = %err,
        "whois connection failed"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_transport_ports() {
        let dialer = Dialer::direct(Duration::from_secs(5));
        assert_eq!(WhoisTransport::new(dialer.clone()).port(), 43);
        assert_eq!(WhoisTransport::with_port(dialer, 4343).port(), 4343);
    }

    #[tokio::test]
    async fn test_unresolved_request_is_rejected() {
        let transport = WhoisTransport::new(Dialer::direct(Duration::from_secs(1)));
        let err = transport
            .fetch(&Request::new("x.nonexistent"))
            .await
            .unwrap_err();
        assert!(matches!(err, WhoisError::NoServer { .. }));
    }
}
