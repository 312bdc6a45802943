//! Query resolution: zone table, then service quirks.
//!
//! A [`Registry`] is built once at start-up and shared by reference. The
//! two-level lookup (suffix to hostname, hostname to resolver) lets one
//! service back many zones while the rare odd service still controls how its
//! requests look.

use crate::error::{ResolveFailure, WhoisError};
use crate::protocols::services::{Resolver, ServiceRegistry};
use crate::protocols::zones::ZoneTable;
use crate::types::Request;

lazy_static::lazy_static! {
    static ref BUILTIN: Registry = Registry::builtin();
}

/// The built-in registry, shared process-wide and never mutated.
pub fn builtin_registry() -> &'static Registry {
    &BUILTIN
}

/// Zone table plus service registry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Registry {
    zones: ZoneTable,
    services: ServiceRegistry,
}

impl Registry {
    pub fn new(zones: ZoneTable, services: ServiceRegistry) -> Self {
        Self { zones, services }
    }

    /// Built-in zones and service quirks.
    pub fn builtin() -> Self {
        Self::new(ZoneTable::builtin(), ServiceRegistry::builtin())
    }

    pub fn zones(&self) -> &ZoneTable {
        &self.zones
    }

    pub fn services(&self) -> &ServiceRegistry {
        &self.services
    }

    /// Mutable access for setup, before the registry is shared.
    pub fn zones_mut(&mut self) -> &mut ZoneTable {
        &mut self.zones
    }

    /// Mutable access for setup, before the registry is shared.
    pub fn services_mut(&mut self) -> &mut ServiceRegistry {
        &mut self.services
    }

    /// Find the lookup service for `query` and prepare a request for it.
    ///
    /// # Errors
    ///
    /// Fails with [`WhoisError::InvalidQuery`] for an empty or blank query and
    /// with [`WhoisError::NoServer`] when no suffix matches. The failure
    /// carries the partially built request, whose host is empty.
    pub fn resolve(&self, query: &str) -> Result<Request, ResolveFailure> {
        let mut req = Request::new(query);

        if query.trim().is_empty() {
            return Err(ResolveFailure {
                request: req,
                error: WhoisError::invalid_query(query, "query is empty"),
            });
        }

        let Some((suffix, host)) = self.zones.lookup(query) else {
            tracing::debug!(query, "no zone matches query");
            return Err(ResolveFailure {
                request: req,
                error: WhoisError::no_server(query),
            });
        };
        req.host = host.to_string();

        let resolver = self.services.get(&req.host);
        tracing::debug!(query, zone = %suffix, host = %req.host, %resolver, "resolved query");
        resolver.resolve(&mut req);
        Ok(req)
    }

    /// Prepare a request for a known host, skipping the zone table.
    pub fn resolve_with_host(&self, query: &str, host: &str) -> Request {
        let mut req = Request::new(query);
        req.host = host.to_string();
        self.resolver_for(host).resolve(&mut req);
        req
    }

    /// Resolver that applies to `host`.
    pub fn resolver_for(&self, host: &str) -> Resolver {
        self.services.get(host)
    }
}

/// Resolve `query` against the built-in registry.
pub fn resolve(query: &str) -> Result<Request, ResolveFailure> {
    builtin_registry().resolve(query)
}
