//! Whois Fetch CLI Application
//!
//! A command-line interface that finds the lookup service responsible for a
//! domain and prints its whois record. Thin wrapper over whois-fetch-lib.

mod ui;

use clap::builder::styling::{AnsiColor, Effects, Styles};
use clap::Parser;
use futures::StreamExt;
use serde::Serialize;
use std::process;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;
use whois_fetch_lib::{
    load_env_config, parse_timeout_string, ClientConfig, ConfigManager, FileConfig, Registry,
    Request, Response, WhoisClient, WhoisError,
};

const STYLES: Styles = Styles::styled()
    .header(AnsiColor::Yellow.on_default().effects(Effects::BOLD))
    .usage(AnsiColor::Yellow.on_default().effects(Effects::BOLD))
    .literal(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .placeholder(AnsiColor::Cyan.on_default());

const DEFAULT_CONCURRENCY: usize = 10;

/// CLI arguments for whois-fetch
#[derive(Parser, Debug)]
#[command(name = "whois-fetch")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(author = "Sai Dutt G.V <gvs46@protonmail.com>")]
#[command(about = "Fetch whois records from the service responsible for each domain")]
#[command(
    long_about = "Fetch whois records from the service responsible for each domain.\n\nQueries are matched against a table of domain suffixes, shaped for the service's quirks, and sent over port 43 or the service's web form."
)]
#[command(styles = STYLES)]
pub struct Args {
    /// Domains or other whois queries
    #[arg(value_name = "QUERIES", help_heading = "Queries")]
    pub queries: Vec<String>,

    /// Query this service instead of resolving one from the zone table
    #[arg(long = "host", value_name = "HOST", help_heading = "Queries")]
    pub host: Option<String>,

    /// Print the resolved request without contacting any service
    #[arg(short = 'r', long = "resolve", help_heading = "Queries")]
    pub resolve: bool,

    /// List the effective zone table and exit
    #[arg(long = "list-zones", help_heading = "Queries")]
    pub list_zones: bool,

    /// Output results in JSON format
    #[arg(short = 'j', long = "json", help_heading = "Output Format")]
    pub json: bool,

    /// Total time per lookup, e.g. "5s", "500ms", "2m" (default: 30s)
    #[arg(
        short = 't',
        long = "timeout",
        value_name = "DURATION",
        help_heading = "Network"
    )]
    pub timeout: Option<String>,

    /// SOCKS proxy, [socks5://]host:port (no scheme means SOCKS4)
    #[arg(long = "proxy", value_name = "PROXY", help_heading = "Network")]
    pub proxy: Option<String>,

    /// Max concurrent lookups (default: 10, max: 100)
    #[arg(short = 'c', long = "concurrency", help_heading = "Network")]
    pub concurrency: Option<usize>,

    /// Use specific config file instead of automatic discovery
    #[arg(long = "config", value_name = "FILE", help_heading = "Configuration")]
    pub config: Option<String>,

    /// Show detailed debug information
    #[arg(short = 'd', long = "debug", help_heading = "Configuration")]
    pub debug: bool,

    /// Verbose logging
    #[arg(short = 'v', long = "verbose", help_heading = "Configuration")]
    pub verbose: bool,
}

/// Everything a run needs after merging files, environment and flags.
#[derive(Debug)]
struct Settings {
    client_config: ClientConfig,
    concurrency: usize,
    registry: Registry,
}

/// Error statistics for aggregated reporting
#[derive(Debug, Default)]
pub(crate) struct ErrorStats {
    pub(crate) timeouts: Vec<String>,
    pub(crate) network_errors: Vec<String>,
    pub(crate) unknown_zones: Vec<String>,
    pub(crate) other_errors: Vec<String>,
}

impl ErrorStats {
    fn add_error(&mut self, query: &str, error: &WhoisError) {
        if error.is_timeout() {
            self.timeouts.push(query.to_string());
            return;
        }
        match error {
            WhoisError::NoServer { .. } => self.unknown_zones.push(query.to_string()),
            WhoisError::Dial { .. } | WhoisError::Transport { .. } | WhoisError::Http { .. } => {
                self.network_errors.push(query.to_string())
            }
            _ => self.other_errors.push(query.to_string()),
        }
    }

    fn has_errors(&self) -> bool {
        !self.timeouts.is_empty()
            || !self.network_errors.is_empty()
            || !self.unknown_zones.is_empty()
            || !self.other_errors.is_empty()
    }

    fn total(&self) -> usize {
        self.timeouts.len()
            + self.network_errors.len()
            + self.unknown_zones.len()
            + self.other_errors.len()
    }
}

/// JSON view of a resolved request.
#[derive(Debug, Serialize)]
struct ResolvedRecord {
    query: String,
    host: String,
    resolver: String,
    transport: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    url: Option<String>,
    body: String,
}

impl ResolvedRecord {
    fn new(req: &Request, registry: &Registry) -> Self {
        Self {
            query: req.query.clone(),
            host: req.host.clone(),
            resolver: registry.resolver_for(&req.host).to_string(),
            transport: if req.is_http() { "http" } else { "whois" },
            url: req.is_http().then(|| req.url.clone()),
            body: String::from_utf8_lossy(&req.body).into_owned(),
        }
    }
}

/// JSON view of a lookup outcome.
#[derive(Debug, Serialize)]
struct LookupRecord {
    query: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    host: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    content_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    body: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl LookupRecord {
    fn new(query: &str, outcome: &Result<Response, WhoisError>) -> Self {
        match outcome {
            Ok(response) => Self {
                query: query.to_string(),
                host: Some(response.host.clone()),
                content_type: Some(response.content_type.clone()),
                body: Some(response.text()),
                error: None,
            },
            Err(err) => Self {
                query: query.to_string(),
                host: None,
                content_type: None,
                body: None,
                error: Some(err.to_string()),
            },
        }
    }
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    init_logging(&args);

    // Validate arguments
    if let Err(e) = validate_args(&args) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }

    match run(args).await {
        Ok(true) => {}
        Ok(false) => process::exit(1),
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}

/// Install the stderr log subscriber. `RUST_LOG` wins over the flags.
fn init_logging(args: &Args) {
    let level = if args.debug {
        "debug"
    } else if args.verbose {
        "info"
    } else {
        "warn"
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(args.debug)
        .init();
}

/// Validate command line arguments
fn validate_args(args: &Args) -> Result<(), String> {
    if args.list_zones {
        return Ok(());
    }

    if args.queries.is_empty() {
        return Err("You must specify at least one query.".to_string());
    }

    if let Some(query) = args.queries.iter().find(|q| q.trim().is_empty()) {
        return Err(format!("Invalid query '{}': query is empty", query));
    }

    if let Some(concurrency) = args.concurrency {
        if concurrency == 0 || concurrency > 100 {
            return Err("Concurrency must be between 1 and 100".to_string());
        }
    }

    if let Some(host) = &args.host {
        if host.trim().is_empty() {
            return Err("--host cannot be empty".to_string());
        }
    }

    Ok(())
}

/// Run the requested action. Returns whether every query succeeded.
async fn run(args: Args) -> Result<bool, Box<dyn std::error::Error>> {
    let settings = build_settings(&args)?;

    if args.list_zones {
        ui::print_zones(&settings.registry);
        return Ok(true);
    }

    if args.resolve {
        return run_resolve(&args, &settings);
    }

    run_lookups(&args, &settings).await
}

/// Print resolved requests without any network I/O.
fn run_resolve(args: &Args, settings: &Settings) -> Result<bool, Box<dyn std::error::Error>> {
    let mut resolved = Vec::new();
    let mut error_stats = ErrorStats::default();

    for query in &args.queries {
        match resolve_query(&settings.registry, args.host.as_deref(), query) {
            Ok(req) => resolved.push(req),
            Err(err) => {
                ui::print_failure(query, &err);
                error_stats.add_error(query, &err);
            }
        }
    }

    if args.json {
        let records: Vec<ResolvedRecord> = resolved
            .iter()
            .map(|req| ResolvedRecord::new(req, &settings.registry))
            .collect();
        println!("{}", serde_json::to_string_pretty(&records)?);
    } else {
        for req in &resolved {
            ui::print_resolved(req, settings.registry.resolver_for(&req.host));
        }
    }

    Ok(!error_stats.has_errors())
}

/// Fetch every query, at most `concurrency` at a time, printing in input
/// order.
async fn run_lookups(args: &Args, settings: &Settings) -> Result<bool, Box<dyn std::error::Error>> {
    let client = WhoisClient::with_config(settings.client_config.clone());
    let registry = &settings.registry;
    let host = args.host.as_deref();
    let start_time = Instant::now();

    tracing::info!(
        queries = args.queries.len(),
        concurrency = settings.concurrency,
        timeout = ?settings.client_config.timeout,
        proxy = settings.client_config.proxy.as_deref().unwrap_or("none"),
        "starting lookups"
    );

    let outcomes: Vec<(String, Result<Response, WhoisError>)> =
        futures::stream::iter(args.queries.iter().cloned())
            .map(|query| {
                let client = &client;
                async move {
                    let outcome = match resolve_query(registry, host, &query) {
                        Ok(req) => client.fetch(&req).await,
                        Err(err) => Err(err),
                    };
                    (query, outcome)
                }
            })
            .buffered(settings.concurrency)
            .collect()
            .await;

    let mut error_stats = ErrorStats::default();
    for (query, outcome) in &outcomes {
        if let Err(err) = outcome {
            error_stats.add_error(query, err);
        }
    }

    if args.json {
        let records: Vec<LookupRecord> = outcomes
            .iter()
            .map(|(query, outcome)| LookupRecord::new(query, outcome))
            .collect();
        println!("{}", serde_json::to_string_pretty(&records)?);
    } else {
        let show_header = outcomes.len() > 1;
        for (query, outcome) in &outcomes {
            match outcome {
                Ok(response) => ui::print_response(response, show_header),
                Err(err) => ui::print_failure(query, err),
            }
        }
    }

    if outcomes.len() > 1 {
        ui::print_error_summary(&error_stats);
        if args.verbose || args.debug {
            ui::print_summary(outcomes.len(), error_stats.total(), start_time.elapsed());
        }
    }

    Ok(!error_stats.has_errors())
}

/// Resolve through the zone table, or straight to `host` when given.
fn resolve_query(registry: &Registry, host: Option<&str>, query: &str) -> Result<Request, WhoisError> {
    match host {
        Some(host) => Ok(registry.resolve_with_host(query, host)),
        None => Ok(registry.resolve(query)?),
    }
}

/// Build settings with precedence CLI > environment > config file > defaults.
fn build_settings(args: &Args) -> Result<Settings, Box<dyn std::error::Error>> {
    let env_config = load_env_config();
    let config_manager = ConfigManager::new();

    // Step 1: config file, explicit path or discovery
    let file_config = match args.config.as_ref().or(env_config.config.as_ref()) {
        Some(path) => {
            tracing::info!(%path, "using explicit config file");
            config_manager
                .load_file(path)
                .map_err(|e| format!("Failed to load config file '{}': {}", path, e))?
        }
        None => config_manager.discover_and_load(),
    };

    let mut settings = settings_from_file(&file_config);

    // Step 2: environment variables (WF_*)
    if let Some(timeout) = env_config.timeout {
        settings.client_config.timeout = timeout;
    }
    if let Some(proxy) = env_config.proxy {
        settings.client_config = settings.client_config.with_proxy(proxy);
    }
    if let Some(concurrency) = env_config.concurrency {
        settings.concurrency = concurrency;
    }

    // Step 3: CLI arguments (highest precedence)
    apply_cli_args(settings, args)
}

/// Settings from a (possibly empty) config file over built-in defaults.
fn settings_from_file(file_config: &FileConfig) -> Settings {
    Settings {
        client_config: file_config.apply_to_client_config(ClientConfig::default()),
        concurrency: file_config
            .defaults
            .as_ref()
            .and_then(|d| d.concurrency)
            .unwrap_or(DEFAULT_CONCURRENCY),
        registry: file_config.build_registry(),
    }
}

/// Apply CLI arguments to settings.
fn apply_cli_args(mut settings: Settings, args: &Args) -> Result<Settings, Box<dyn std::error::Error>> {
    if let Some(timeout_str) = &args.timeout {
        let timeout: Duration = parse_timeout_string(timeout_str).ok_or_else(|| {
            format!(
                "Invalid timeout '{}'. Use format like '5s', '500ms', '2m'",
                timeout_str
            )
        })?;
        settings.client_config.timeout = timeout;
    }

    if let Some(proxy) = &args.proxy {
        settings.client_config = settings.client_config.with_proxy(proxy.clone());
    }

    if let Some(concurrency) = args.concurrency {
        settings.concurrency = concurrency;
    }

    Ok(settings)
}

// whois-fetch/src/main.rs tests module
