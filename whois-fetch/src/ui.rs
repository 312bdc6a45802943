//! Display logic for the whois-fetch CLI.
//!
//! Response bodies go to stdout untouched; headers, failures and summaries
//! are styled with the `console` crate and mostly go to stderr so piping
//! stdout keeps only the records.

use console::{pad_str, style, Alignment};
use std::time::Duration;
use whois_fetch_lib::{Registry, Request, Resolver, Response, WhoisError};

use crate::ErrorStats;

// ── Records ──────────────────────────────────────────────────────────────────

/// Print one response. With `show_header`, a rule naming the query and the
/// answering service comes first.
pub fn print_response(response: &Response, show_header: bool) {
    if show_header {
        println!(
            "{} {} {}",
            style(format!("── {}", response.query)).bold(),
            style(format!("({})", response.host)).dim(),
            style("──").bold(),
        );
    }

    let text = response.text();
    print!("{}", text);
    if !text.ends_with('\n') {
        println!();
    }
    if show_header {
        println!();
    }
}

/// Print a resolved request without sending it.
pub fn print_resolved(req: &Request, resolver: Resolver) {
    println!(
        "{} {} {} {}",
        style(&req.query).bold(),
        style("→").dim(),
        style(&req.host).green(),
        style(format!("[{}]", resolver)).cyan(),
    );

    if req.is_http() {
        println!("  {} {}", style("url: ").dim(), req.url);
        if !req.body.is_empty() {
            println!("  {} {}", style("form:").dim(), String::from_utf8_lossy(&req.body));
        }
    } else {
        println!(
            "  {} {:?}",
            style("send:").dim(),
            String::from_utf8_lossy(&req.body)
        );
    }
}

/// Print the effective zone table in suffix order.
pub fn print_zones(registry: &Registry) {
    let zones = registry.zones();
    let width = zones.suffixes().iter().map(|s| s.len()).max().unwrap_or(0);

    println!(
        "{} {}",
        style("Zones").yellow().bold(),
        style(format!("({})", zones.len())).dim()
    );
    for suffix in zones.suffixes() {
        let host = zones.get(suffix).unwrap_or_default();
        let resolver = registry.resolver_for(host);
        let marker = if resolver == Resolver::Default {
            String::new()
        } else {
            format!(" [{}]", resolver)
        };
        println!(
            "  {}  {}{}",
            style(pad_str(suffix, width, Alignment::Left, None)).green(),
            host,
            style(marker).cyan(),
        );
    }

    match zones.catch_all() {
        Some(host) => println!("  {}  {}", style("(catch-all)").dim(), host),
        None => println!("  {}", style("(no catch-all)").dim()),
    }
}

// ── Failures ─────────────────────────────────────────────────────────────────

/// Print one failed query to stderr.
pub fn print_failure(query: &str, error: &WhoisError) {
    eprintln!(
        "{} {}: {}",
        style("✗").red().bold(),
        style(query).bold(),
        style(error).red()
    );
}

/// Print grouped failure counts to stderr.
pub fn print_error_summary(error_stats: &ErrorStats) {
    if !error_stats.has_errors() {
        return;
    }

    eprintln!("{}", style("Some queries could not be answered:").yellow());

    let format_list = |queries: &[String], max_show: usize| -> String {
        if queries.len() <= max_show {
            queries.join(", ")
        } else {
            let shown = &queries[..max_show];
            let remaining = queries.len() - max_show;
            format!("{}, ... and {} more", shown.join(", "), remaining)
        }
    };

    let groups = [
        ("timeout", &error_stats.timeouts),
        ("network error", &error_stats.network_errors),
        ("unknown zone", &error_stats.unknown_zones),
        ("other error", &error_stats.other_errors),
    ];
    for (label, queries) in groups {
        if queries.is_empty() {
            continue;
        }
        eprintln!(
            "  {} {} {}{}: {}",
            style("•").dim(),
            queries.len(),
            label,
            if queries.len() == 1 { "" } else { "s" },
            format_list(queries.as_slice(), 5),
        );
    }
}

/// Print a one-line run summary to stderr.
pub fn print_summary(total: usize, failed: usize, duration: Duration) {
    eprintln!(
        "{} quer{} in {:.1}s  {}  {}  {}  {}",
        style(total).bold(),
        if total == 1 { "y" } else { "ies" },
        duration.as_secs_f64(),
        style("|").dim(),
        style(format!("{} answered", total - failed)).green(),
        style("|").dim(),
        style(format!("{} failed", failed)).red(),
    );
}
