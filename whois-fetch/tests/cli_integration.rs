// whois-fetch/tests/cli_integration.rs

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::io::{BufRead, BufReader, Write};
use std::net::TcpListener;
use std::thread;
use tempfile::TempDir;

/// Command isolated from the caller's environment and config files.
fn whois_fetch(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("whois-fetch").unwrap();
    cmd.current_dir(home.path())
        .env("HOME", home.path())
        .env("XDG_CONFIG_HOME", home.path().join(".config"))
        .env_remove("WF_TIMEOUT")
        .env_remove("WF_PROXY")
        .env_remove("WF_CONCURRENCY")
        .env_remove("WF_CONFIG")
        .env_remove("RUST_LOG");
    cmd
}

/// Helper to create a config file in `dir`
fn write_config(dir: &TempDir, name: &str, content: &str) -> String {
    let path = dir.path().join(name);
    fs::write(&path, content).expect("Failed to write config file");
    path.to_string_lossy().into_owned()
}

/// Local whois server answering `count` connections with `prefix` followed
/// by the request line it received.
fn spawn_whois_server(count: usize, prefix: &'static str) -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    thread::spawn(move || {
        for stream in listener.incoming().take(count) {
            let mut stream = stream.unwrap();
            let mut line = String::new();
            BufReader::new(&stream).read_line(&mut line).unwrap();
            let _ = write!(stream, "{}{}", prefix, line);
        }
    });
    port
}

#[test]
fn test_help_lists_flags() {
    let home = TempDir::new().unwrap();
    let mut cmd = whois_fetch(&home);
    cmd.arg("--help");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("--resolve"))
        .stdout(predicate::str::contains("--proxy"))
        .stdout(predicate::str::contains("--timeout"))
        .stdout(predicate::str::contains("--host"))
        .stdout(predicate::str::contains("--list-zones"));
}

#[test]
fn test_no_queries_is_an_error() {
    let home = TempDir::new().unwrap();
    let mut cmd = whois_fetch(&home);

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("at least one query"));
}

#[test]
fn test_resolve_com() {
    let home = TempDir::new().unwrap();
    let mut cmd = whois_fetch(&home);
    cmd.args(["--resolve", "example.com"]);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("whois.verisign-grs.com"))
        .stdout(predicate::str::contains("[default]"));
}

#[test]
fn test_resolve_unknown_zone_fails() {
    let home = TempDir::new().unwrap();
    let mut cmd = whois_fetch(&home);
    cmd.args(["--resolve", "x.nonexistent"]);

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("No whois server found for x.nonexistent"));
}

#[test]
fn test_resolve_form_service_json() {
    let home = TempDir::new().unwrap();
    let mut cmd = whois_fetch(&home);
    cmd.args(["--resolve", "--json", "foo.net.nr"]);

    let output = cmd.assert().success().get_output().stdout.clone();
    let records: serde_json::Value = serde_json::from_slice(&output).unwrap();

    let record = &records[0];
    assert_eq!(record["query"], "foo.net.nr");
    assert_eq!(record["host"], "cenpac.net.nr");
    assert_eq!(record["resolver"], "cenpac");
    assert_eq!(record["transport"], "http");
    let url = record["url"].as_str().unwrap();
    assert!(url.contains("subdomain=foo"));
    assert!(url.contains("tld=nr"));
}

#[test]
fn test_resolve_with_host_override() {
    let home = TempDir::new().unwrap();
    let mut cmd = whois_fetch(&home);
    cmd.args(["--resolve", "--host", "whois.jprs.jp", "x.nonexistent"]);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("whois.jprs.jp"))
        .stdout(predicate::str::contains("x.nonexistent/e"));
}

#[test]
fn test_config_file_adds_zone_and_catch_all() {
    let home = TempDir::new().unwrap();
    let config = write_config(
        &home,
        "custom.toml",
        r#"
[defaults]
catch_all = "whois.iana.org"

[zones]
"example" = "whois.nic.example"
"#,
    );

    let mut cmd = whois_fetch(&home);
    cmd.args(["--config", &config, "--resolve", "foo.example", "x.nonexistent"]);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("whois.nic.example"))
        .stdout(predicate::str::contains("whois.iana.org"));
}

#[test]
fn test_local_config_file_is_discovered() {
    let home = TempDir::new().unwrap();
    write_config(
        &home,
        "whois-fetch.toml",
        "[zones]\n\"local\" = \"whois.nic.local\"\n",
    );

    let mut cmd = whois_fetch(&home);
    cmd.args(["--resolve", "host.local"]);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("whois.nic.local"));
}

#[test]
fn test_invalid_config_file_is_reported() {
    let home = TempDir::new().unwrap();
    let config = write_config(&home, "bad.toml", "[defaults]\nconcurrency = 0\n");

    let mut cmd = whois_fetch(&home);
    cmd.args(["--config", &config, "--resolve", "example.com"]);

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load config file"));
}

#[test]
fn test_invalid_timeout_flag() {
    let home = TempDir::new().unwrap();
    let mut cmd = whois_fetch(&home);
    cmd.args(["--timeout", "soon", "example.com"]);

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Invalid timeout"));
}

#[test]
fn test_list_zones() {
    let home = TempDir::new().unwrap();
    let mut cmd = whois_fetch(&home);
    cmd.arg("--list-zones");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("whois.verisign-grs.com"))
        .stdout(predicate::str::contains("cenpac.net.nr"))
        .stdout(predicate::str::contains("(no catch-all)"));
}

#[test]
fn test_lookup_against_local_server() {
    let home = TempDir::new().unwrap();
    let port = spawn_whois_server(1, "Domain Name: ");
    let config = write_config(
        &home,
        "local.toml",
        &format!("[defaults]\nport = {}\ntimeout = \"5s\"\n", port),
    );

    let mut cmd = whois_fetch(&home);
    cmd.args(["--config", &config, "--host", "127.0.0.1", "example.com"]);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Domain Name: example.com"));
}

#[test]
fn test_mixed_lookups_json_and_exit_status() {
    let home = TempDir::new().unwrap();
    let port = spawn_whois_server(1, "ok ");
    let config = write_config(
        &home,
        "local.toml",
        &format!(
            "[defaults]\nport = {}\ntimeout = \"5s\"\n\n[zones]\n\"test\" = \"127.0.0.1\"\n",
            port
        ),
    );

    let mut cmd = whois_fetch(&home);
    cmd.args(["--config", &config, "--json", "a.test", "x.nonexistent"]);

    let output = cmd.assert().failure().get_output().stdout.clone();
    let records: serde_json::Value = serde_json::from_slice(&output).unwrap();

    assert_eq!(records[0]["query"], "a.test");
    assert_eq!(records[0]["body"], "ok a.test\r\n");
    assert_eq!(records[1]["query"], "x.nonexistent");
    assert!(records[1]["error"]
        .as_str()
        .unwrap()
        .contains("No whois server found"));
}
