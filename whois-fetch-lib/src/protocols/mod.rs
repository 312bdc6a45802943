//! Lookup service knowledge and the two transports.
//!
//! Zones and service quirks decide what to send and where; the transports
//! decide how it travels.

/// Suffix to lookup-service table
pub mod zones;

/// Per-service request shaping
pub mod services;

/// Raw port 43 transport
pub mod whois;

/// Web form transport
pub mod http;

// Re-export commonly used types
pub use http::HttpTransport;
pub use services::{Resolver, ServiceRegistry};
pub use whois::WhoisTransport;
pub use zones::ZoneTable;
