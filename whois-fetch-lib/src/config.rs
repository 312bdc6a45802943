//! Configuration file parsing and management.
//!
//! This module handles loading configuration from TOML files and environment
//! variables, merging them with proper precedence rules, and turning the
//! result into a [`Registry`] and [`ClientConfig`].

use crate::error::WhoisError;
use crate::protocols::services::Resolver;
use crate::registry::Registry;
use crate::types::ClientConfig;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Configuration loaded from TOML files.
///
/// ```toml
/// [defaults]
/// timeout = "10s"
/// proxy = "socks5://127.0.0.1:1080"
/// concurrency = 8
/// catch_all = "whois.iana.org"
///
/// [zones]
/// "example" = "whois.nic.example"
///
/// [services]
/// "whois.nic.example" = "jprs"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct FileConfig {
    /// Default values for client and CLI options
    #[serde(skip_serializing_if = "Option::is_none")]
    pub defaults: Option<DefaultsConfig>,

    /// Extra or overriding suffix to service mappings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zones: Option<HashMap<String, String>>,

    /// Service hostname to resolver name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub services: Option<HashMap<String, Resolver>>,
}

/// Default configuration values that map to CLI options.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct DefaultsConfig {
    /// Timeout (as string, e.g., "5s", "30s", "500ms")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<String>,

    /// SOCKS proxy, `[socks5://]host:port`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proxy: Option<String>,

    /// Concurrent lookups when several queries are given
    #[serde(skip_serializing_if = "Option::is_none")]
    pub concurrency: Option<usize>,

    /// Raw whois port
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,

    /// Service used when no zone matches
    #[serde(skip_serializing_if = "Option::is_none")]
    pub catch_all: Option<String>,
}

impl FileConfig {
    /// Built-in registry with this file's zones, services and catch-all
    /// applied on top.
    pub fn build_registry(&self) -> Registry {
        let mut registry = Registry::builtin();

        if let Some(zones) = &self.zones {
            for (suffix, host) in zones {
                registry.zones_mut().insert(suffix, host.clone());
            }
        }
        if let Some(services) = &self.services {
            for (host, resolver) in services {
                registry.services_mut().register(*resolver, &[host]);
            }
        }
        if let Some(catch_all) = self.defaults.as_ref().and_then(|d| d.catch_all.clone()) {
            registry.zones_mut().set_catch_all(Some(catch_all));
        }

        registry
    }

    /// Apply the file's defaults onto a client configuration.
    pub fn apply_to_client_config(&self, mut config: ClientConfig) -> ClientConfig {
        if let Some(defaults) = &self.defaults {
            if let Some(timeout) = defaults.timeout.as_deref().and_then(parse_timeout_string) {
                config.timeout = timeout;
            }
            if let Some(proxy) = &defaults.proxy {
                config = config.with_proxy(proxy.clone());
            }
            if let Some(port) = defaults.port {
                config.whois_port = port;
            }
        }
        config
    }
}

/// Configuration discovery and loading functionality.
#[derive(Debug, Default)]
pub struct ConfigManager;

impl ConfigManager {
    /// Create a new configuration manager.
    pub fn new() -> Self {
        Self
    }

    /// Load configuration from a specific file.
    pub fn load_file<P: AsRef<Path>>(&self, path: P) -> Result<FileConfig, WhoisError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(WhoisError::file_error(
                path.to_string_lossy(),
                "Configuration file not found",
            ));
        }

        let content = fs::read_to_string(path).map_err(|e| {
            WhoisError::file_error(
                path.to_string_lossy(),
                format!("Failed to read configuration file: {}", e),
            )
        })?;

        let config: FileConfig = toml::from_str(&content)?;

        // Validate the loaded configuration
        self.validate_config(&config)?;

        Ok(config)
    }

    /// Discover and load configuration files in precedence order.
    ///
    /// Files that fail to load are skipped with a warning.
    pub fn discover_and_load(&self) -> FileConfig {
        let mut merged_config = FileConfig::default();
        let candidates = [
            self.get_xdg_config_path(),
            self.get_global_config_path(),
            self.get_local_config_path(),
        ];

        // Lowest precedence first
        for path in candidates.into_iter().flatten() {
            match self.load_file(&path) {
                Ok(config) => {
                    tracing::info!(path = %path.display(), "loaded configuration file");
                    merged_config = self.merge_configs(merged_config, config);
                }
                Err(err) => {
                    tracing::warn!(path = %path.display(), error = %err, "skipping configuration file");
                }
            }
        }

        merged_config
    }

    /// Get the local configuration file path.
    fn get_local_config_path(&self) -> Option<PathBuf> {
        let candidates = ["./whois-fetch.toml", "./.whois-fetch.toml"];

        candidates
            .iter()
            .map(Path::new)
            .find(|path| path.exists())
            .map(Path::to_path_buf)
    }

    /// Get the global configuration file path in the user's home directory.
    fn get_global_config_path(&self) -> Option<PathBuf> {
        let home = env::var_os("HOME")?;
        [".whois-fetch.toml", "whois-fetch.toml"]
            .iter()
            .map(|candidate| Path::new(&home).join(candidate))
            .find(|path| path.exists())
    }

    /// Get the XDG configuration file path.
    fn get_xdg_config_path(&self) -> Option<PathBuf> {
        let config_dir = env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| env::var_os("HOME").map(|home| Path::new(&home).join(".config")))?;

        let path = config_dir.join("whois-fetch").join("config.toml");
        if path.exists() {
            Some(path)
        } else {
            None
        }
    }

    /// Merge two configurations with proper precedence.
    ///
    /// Values from `higher` take precedence over values from `lower`.
    pub fn merge_configs(&self, lower: FileConfig, higher: FileConfig) -> FileConfig {
        FileConfig {
            defaults: match (lower.defaults, higher.defaults) {
                (Some(lower_defaults), Some(higher_defaults)) => Some(DefaultsConfig {
                    timeout: higher_defaults.timeout.or(lower_defaults.timeout),
                    proxy: higher_defaults.proxy.or(lower_defaults.proxy),
                    concurrency: higher_defaults.concurrency.or(lower_defaults.concurrency),
                    port: higher_defaults.port.or(lower_defaults.port),
                    catch_all: higher_defaults.catch_all.or(lower_defaults.catch_all),
                }),
                (lower_defaults, higher_defaults) => higher_defaults.or(lower_defaults),
            },
            zones: merge_maps(lower.zones, higher.zones),
            services: merge_maps(lower.services, higher.services),
        }
    }

    /// Validate a configuration for common issues.
    fn validate_config(&self, config: &FileConfig) -> Result<(), WhoisError> {
        if let Some(defaults) = &config.defaults {
            if let Some(concurrency) = defaults.concurrency {
                if concurrency == 0 || concurrency > 100 {
                    return Err(WhoisError::config("Concurrency must be between 1 and 100"));
                }
            }

            if let Some(timeout_str) = &defaults.timeout {
                if parse_timeout_string(timeout_str).is_none() {
                    return Err(WhoisError::config(format!(
                        "Invalid timeout format '{}'. Use format like '5s', '30s', '2m'",
                        timeout_str
                    )));
                }
            }

            if let Some(catch_all) = &defaults.catch_all {
                if catch_all.trim().is_empty() {
                    return Err(WhoisError::config("catch_all host cannot be empty"));
                }
            }
        }

        if let Some(zones) = &config.zones {
            for (suffix, host) in zones {
                if suffix.trim_matches('.').is_empty() || suffix.contains(' ') {
                    return Err(WhoisError::config(format!(
                        "Invalid zone suffix '{}'",
                        suffix
                    )));
                }
                if host.trim().is_empty() {
                    return Err(WhoisError::config(format!(
                        "Zone '{}' has an empty service host",
                        suffix
                    )));
                }
            }
        }

        if let Some(services) = &config.services {
            if services.keys().any(|host| host.trim().is_empty()) {
                return Err(WhoisError::config("Service hostnames cannot be empty"));
            }
        }

        Ok(())
    }
}

fn merge_maps<V>(
    lower: Option<HashMap<String, V>>,
    higher: Option<HashMap<String, V>>,
) -> Option<HashMap<String, V>> {
    match (lower, higher) {
        (Some(mut lower_map), Some(higher_map)) => {
            lower_map.extend(higher_map);
            Some(lower_map)
        }
        (lower_map, higher_map) => higher_map.or(lower_map),
    }
}

/// Environment variable configuration that mirrors CLI options.
///
/// Read from WF_* environment variables.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvConfig {
    pub timeout: Option<Duration>,
    pub proxy: Option<String>,
    pub concurrency: Option<usize>,
    pub config: Option<String>,
}

/// Load configuration from environment variables.
///
/// Invalid values are logged as warnings and ignored.
pub fn load_env_config() -> EnvConfig {
    env_config_from(|key| env::var(key).ok())
}

fn env_config_from<F>(lookup: F) -> EnvConfig
where
    F: Fn(&str) -> Option<String>,
{
    let mut env_config = EnvConfig::default();

    // WF_TIMEOUT - total lookup timeout
    if let Some(val) = lookup("WF_TIMEOUT") {
        match parse_timeout_string(&val) {
            Some(timeout) => {
                tracing::debug!(value = %val, "using WF_TIMEOUT");
                env_config.timeout = Some(timeout);
            }
            None => tracing::warn!(
                value = %val,
                "invalid WF_TIMEOUT, use format like '5s', '30s', '2m'"
            ),
        }
    }

    // WF_PROXY - SOCKS proxy
    if let Some(proxy) = lookup("WF_PROXY") {
        if !proxy.trim().is_empty() {
            tracing::debug!(value = %proxy, "using WF_PROXY");
            env_config.proxy = Some(proxy);
        }
    }

    // WF_CONCURRENCY - concurrent lookups
    if let Some(val) = lookup("WF_CONCURRENCY") {
        match val.trim().parse::<usize>() {
            Ok(concurrency) if (1..=100).contains(&concurrency) => {
                tracing::debug!(concurrency, "using WF_CONCURRENCY");
                env_config.concurrency = Some(concurrency);
            }
            _ => tracing::warn!(value = %val, "invalid WF_CONCURRENCY, must be 1-100"),
        }
    }

    // WF_CONFIG - config file path
    if let Some(path) = lookup("WF_CONFIG") {
        if !path.trim().is_empty() {
            tracing::debug!(value = %path, "using WF_CONFIG");
            env_config.config = Some(path);
        }
    }

    env_config
}

/// Parse a timeout string like "500ms", "5s", "2m" into a duration.
///
/// A bare number is taken as seconds. Zero is rejected.
pub fn parse_timeout_string(timeout_str: &str) -> Option<Duration> {
    let timeout_str = timeout_str.trim().to_lowercase();

    let duration = if let Some(ms) = timeout_str.strip_suffix("ms") {
        Duration::from_millis(ms.trim().parse::<u64>().ok()?)
    } else if let Some(secs) = timeout_str.strip_suffix('s') {
        Duration::from_secs(secs.trim().parse::<u64>().ok()?)
    } else if let Some(mins) = timeout_str.strip_suffix('m') {
        Duration::from_secs(mins.trim().parse::<u64>().ok()?.checked_mul(60)?)
    } else {
        Duration::from_secs(timeout_str.parse::<u64>().ok()?)
    };

    if duration.is_zero() {
        None
    } else {
        Some(duration)
    }
}
