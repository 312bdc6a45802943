//! Error handling for whois resolution and fetching.
//!
//! This module defines a single error type that covers every way a lookup can
//! fail, from an unknown zone to a stalled connection.

use crate::types::Request;
use std::fmt;
use std::io;

/// Classification of a network failure.
///
/// Derived from the underlying I/O error so callers can tell a peer that ran
/// out the deadline apart from one that reset the connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetErrorKind {
    /// The connection deadline expired
    Timeout,
    /// The operation may succeed if tried again
    Temporary,
    /// Anything else
    Permanent,
}

impl NetErrorKind {
    /// Classify an I/O error.
    pub fn classify(err: &io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::TimedOut => Self::Timeout,
            io::ErrorKind::Interrupted
            | io::ErrorKind::WouldBlock
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted => Self::Temporary,
            _ => Self::Permanent,
        }
    }
}

impl fmt::Display for NetErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout => write!(f, "timeout"),
            Self::Temporary => write!(f, "temporary"),
            Self::Permanent => write!(f, "permanent"),
        }
    }
}

/// Main error type for whois operations.
#[derive(Debug, Clone)]
pub enum WhoisError {
    /// The query was empty or otherwise unusable
    InvalidQuery { query: String, reason: String },

    /// No zone in the table covers the query
    NoServer { query: String },

    /// Connect-phase failure, directly or through a proxy
    Dial {
        address: String,
        message: String,
        timeout: bool,
    },

    /// Write or read failure on an established connection
    Transport {
        host: String,
        message: String,
        kind: NetErrorKind,
    },

    /// Malformed proxy URL. Never returned by the client, only logged.
    ProxyConfig { proxy: String, message: String },

    /// HTTP request construction or execution failure
    Http {
        url: String,
        message: String,
        timeout: bool,
    },

    /// Configuration errors (invalid settings, etc.)
    ConfigError { message: String },

    /// File I/O errors when reading configuration
    FileError { path: String, message: String },
}

impl WhoisError {
    /// Create a new invalid query error.
    pub fn invalid_query<Q: Into<String>, R: Into<String>>(query: Q, reason: R) -> Self {
        Self::InvalidQuery {
            query: query.into(),
            reason: reason.into(),
        }
    }

    /// Create a new resolution failure.
    pub fn no_server<Q: Into<String>>(query: Q) -> Self {
        Self::NoServer {
            query: query.into(),
        }
    }

    /// Create a dial error from the I/O error that caused it.
    pub fn dial<A: Into<String>>(address: A, err: &io::Error) -> Self {
        Self::Dial {
            address: address.into(),
            message: err.to_string(),
            timeout: err.kind() == io::ErrorKind::TimedOut,
        }
    }

    /// Create a transport error, classifying the I/O error.
    pub fn transport<H: Into<String>>(host: H, err: &io::Error) -> Self {
        Self::Transport {
            host: host.into(),
            message: err.to_string(),
            kind: NetErrorKind::classify(err),
        }
    }

    /// Create a new proxy configuration error.
    pub fn proxy_config<P: Into<String>, M: Into<String>>(proxy: P, message: M) -> Self {
        Self::ProxyConfig {
            proxy: proxy.into(),
            message: message.into(),
        }
    }

    /// Create a new HTTP error.
    pub fn http<U: Into<String>, M: Into<String>>(url: U, message: M) -> Self {
        Self::Http {
            url: url.into(),
            message: message.into(),
            timeout: false,
        }
    }

    /// Create a new configuration error.
    pub fn config<M: Into<String>>(message: M) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    /// Create a new file error.
    pub fn file_error<P: Into<String>, M: Into<String>>(path: P, message: M) -> Self {
        Self::FileError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Whether the failure was caused by the connection deadline.
    pub fn is_timeout(&self) -> bool {
        match self {
            Self::Dial { timeout, .. } | Self::Http { timeout, .. } => *timeout,
            Self::Transport { kind, .. } => *kind == NetErrorKind::Timeout,
            _ => false,
        }
    }

    /// Network classification, for errors that came off the wire.
    pub fn net_kind(&self) -> Option<NetErrorKind> {
        match self {
            Self::Transport { kind, .. } => Some(*kind),
            Self::Dial { timeout: true, .. } | Self::Http { timeout: true, .. } => {
                Some(NetErrorKind::Timeout)
            }
            Self::Dial { .. } | Self::Http { .. } => Some(NetErrorKind::Permanent),
            _ => None,
        }
    }
}

impl fmt::Display for WhoisError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidQuery { query, reason } => {
                write!(f, "Invalid query '{}': {}", query, reason)
            }
            Self::NoServer { query } => write!(f, "No whois server found for {}", query),
            Self::Dial {
                address,
                message,
                timeout,
            } => {
                if *timeout {
                    write!(f, "Dial {} timed out: {}", address, message)
                } else {
                    write!(f, "Dial {} failed: {}", address, message)
                }
            }
            Self::Transport {
                host,
                message,
                kind,
            } => write!(f, "Network error ({}) talking to {}: {}", kind, host, message),
            Self::ProxyConfig { proxy, message } => {
                write!(f, "Invalid proxy '{}': {}", proxy, message)
            }
            Self::Http {
                url,
                message,
                timeout,
            } => {
                if *timeout {
                    write!(f, "HTTP request to {} timed out: {}", url, message)
                } else {
                    write!(f, "HTTP request to {} failed: {}", url, message)
                }
            }
            Self::ConfigError { message } => write!(f, "Configuration error: {}", message),
            Self::FileError { path, message } => {
                write!(f, "File error at '{}': {}", path, message)
            }
        }
    }
}

impl std::error::Error for WhoisError {}

impl From<reqwest::Error> for WhoisError {
    fn from(err: reqwest::Error) -> Self {
        Self::Http {
            url: err.url().map(|u| u.to_string()).unwrap_or_default(),
            message: err.to_string(),
            timeout: err.is_timeout(),
        }
    }
}

impl From<toml::de::Error> for WhoisError {
    fn from(err: toml::de::Error) -> Self {
        Self::config(format!("Failed to parse TOML configuration: {}", err))
    }
}

/// Resolution failure that keeps the partially built request.
///
/// The request has an empty host; callers may still inspect the query.
#[derive(Debug, Clone)]
pub struct ResolveFailure {
    pub request: Request,
    pub error: WhoisError,
}

impl fmt::Display for ResolveFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.error.fmt(f)
    }
}

impl std::error::Error for ResolveFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

impl From<ResolveFailure> for WhoisError {
    fn from(failure: ResolveFailure) -> Self {
        failure.error
    }
}
