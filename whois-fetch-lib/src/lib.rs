//! # Whois Fetch Library
//!
//! Resolve a domain or network query to the lookup service responsible for
//! it and fetch the answer, over the raw whois protocol or a web form.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let text = whois_fetch_lib::whois("example.com").await?;
//!     println!("{}", text);
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Zone Table**: Most-specific suffix wins (`com.nr` before `nr`)
//! - **Service Quirks**: Per-service request shaping, web forms included
//! - **Absolute Deadlines**: One timeout bounds connect, write and read
//! - **SOCKS Proxies**: SOCKS4 and SOCKS5, for both transports
//! - **Configurable**: TOML files and `WF_*` environment variables

// Re-export main public API types and functions
pub use client::{default_client, WhoisClient};
pub use config::{
    load_env_config, parse_timeout_string, ConfigManager, DefaultsConfig, EnvConfig, FileConfig,
};
pub use content::detect_content_type;
pub use dial::{Connection, Dialer, ProxyProtocol, ProxySettings};
pub use error::{NetErrorKind, ResolveFailure, WhoisError};
pub use protocols::{HttpTransport, Resolver, ServiceRegistry, WhoisTransport, ZoneTable};
pub use registry::{builtin_registry, resolve, Registry};
pub use types::{ClientConfig, Request, Response, DEFAULT_TIMEOUT, READ_LIMIT, WHOIS_PORT};

// Internal modules
mod client;
mod config;
mod content;
mod dial;
mod error;
mod protocols;
mod registry;
mod types;

// Type alias for convenience
pub type Result<T> = std::result::Result<T, WhoisError>;

// Library version and metadata
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const AUTHOR: &str = env!("CARGO_PKG_AUTHORS");

/// Look up `query` with the built-in registry and default client.
///
/// Returns the response decoded as text.
pub async fn whois(query: &str) -> Result<String> {
    lookup(query).await.map(|response| response.text())
}

/// Look up `query` with the built-in registry and default client.
pub async fn lookup(query: &str) -> Result<Response> {
    let req = builtin_registry().resolve(query)?;
    req.fetch().await
}

/// Get library information for debugging or display purposes.
pub fn info() -> LibraryInfo {
    LibraryInfo {
        version: VERSION,
        author: AUTHOR,
        zones: builtin_registry().zones().len(),
        resolvers: Resolver::ALL.iter().map(Resolver::name).collect(),
    }
}

/// Information about the library build and built-in data
#[derive(Debug, Clone)]
pub struct LibraryInfo {
    pub version: &'static str,
    pub author: &'static str,
    pub zones: usize,
    pub resolvers: Vec<&'static str>,
}
