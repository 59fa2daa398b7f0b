//! Integration tests for the CLI against a mocked Ollama server.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::json;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;
use wiremock::matchers::{any, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const REVIEW: &str = "## Overview\n\nThe package declares platforms and a test target.\n\n**SwiftPM Health Score:** 42/100\n";

fn fixture() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/Package.swift")
}

/// Command with an isolated HOME so no user config leaks in.
fn consultant(home: &TempDir) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("swiftpm-consultant"));
    cmd.env("HOME", home.path())
        .env_remove("OLLAMA_HOST")
        .env_remove("RUST_LOG");
    cmd
}

async fn mount_tags(server: &MockServer, models: &[&str]) {
    let models: Vec<_> = models.iter().map(|m| json!({"name": m, "model": m})).collect();
    Mock::given(method("GET"))
        .and(path("/api/tags"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "models": models })))
        .mount(server)
        .await;
}

fn chat_reply(content: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "model": "llama3:latest",
        "message": {"role": "assistant", "content": content},
        "done": true
    }))
}

async fn ollama_with_reply(content: &str) -> MockServer {
    let server = MockServer::start().await;
    mount_tags(&server, &["llama3:latest"]).await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(chat_reply(content))
        .mount(&server)
        .await;
    server
}

/// A server that fails the test if it receives any request at all.
async fn untouchable_ollama() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;
    server
}

#[test]
fn test_cli_help() {
    let home = TempDir::new().unwrap();
    consultant(&home)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("review swift package"))
        .stdout(predicate::str::contains("--package"))
        .stdout(predicate::str::contains("--quiet-mode"))
        .stdout(predicate::str::contains("--score-only"));
}

#[test]
fn test_missing_package_flag() {
    let home = TempDir::new().unwrap();
    consultant(&home)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("You must specify a package file"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_nonexistent_package_writes_nothing() {
    let server = untouchable_ollama().await;
    let home = TempDir::new().unwrap();
    let out = home.path().join("report.txt");

    consultant(&home)
        .args(["-p", "does/not/exist/Package.swift", "--host", &server.uri()])
        .arg("-o")
        .arg(&out)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("does not exist"));

    assert!(!out.exists());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_wrong_extension_fails_before_model_call() {
    let server = untouchable_ollama().await;
    let home = TempDir::new().unwrap();
    let manifest = home.path().join("Package.resolved");
    fs::write(&manifest, "{}").unwrap();

    consultant(&home)
        .arg("-p")
        .arg(&manifest)
        .args(["--host", &server.uri()])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Expected a `.swift` file"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_review_is_printed_in_panel() {
    let server = ollama_with_reply(REVIEW).await;
    let home = TempDir::new().unwrap();

    consultant(&home)
        .arg("-p")
        .arg(fixture())
        .args(["--host", &server.uri()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Review Made for"))
        .stdout(predicate::str::contains("SwiftPM Health Score"))
        .stdout(predicate::str::contains("LLM Powered Improvements by \"llama3\""))
        .stdout(predicate::str::contains("Please double-check"))
        .stdout(predicate::str::contains("Output saved to").not());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_output_gets_txt_suffix_and_raw_reply() {
    let server = ollama_with_reply(REVIEW).await;
    let home = TempDir::new().unwrap();
    let requested = home.path().join("report");
    let expected = home.path().join("report.txt");

    consultant(&home)
        .arg("-p")
        .arg(fixture())
        .arg("-o")
        .arg(&requested)
        .args(["--host", &server.uri()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Output saved to:"));

    assert!(!requested.exists());
    assert_eq!(fs::read_to_string(&expected).unwrap(), REVIEW);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_output_file_is_overwritten() {
    let server = ollama_with_reply(REVIEW).await;
    let home = TempDir::new().unwrap();
    let out = home.path().join("output.txt");
    fs::write(&out, "stale report from an earlier run, much longer than the new one ".repeat(20)).unwrap();

    consultant(&home)
        .arg("-p")
        .arg(fixture())
        .arg("-o")
        .arg(&out)
        .args(["--host", &server.uri(), "--quiet-mode"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty());

    assert_eq!(fs::read_to_string(&out).unwrap(), REVIEW);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_score_only_prints_bare_score() {
    let server = ollama_with_reply(REVIEW).await;
    let home = TempDir::new().unwrap();

    consultant(&home)
        .arg("-p")
        .arg(fixture())
        .args(["--host", &server.uri(), "-s"])
        .assert()
        .success()
        .stdout("SwiftPM Health Score: 42/100\n");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_score_only_without_score_warns() {
    let server = ollama_with_reply("Looks tidy, nothing to add.").await;
    let home = TempDir::new().unwrap();
    let out = home.path().join("scoreless.txt");

    consultant(&home)
        .arg("-p")
        .arg(fixture())
        .arg("-o")
        .arg(&out)
        .args(["--host", &server.uri(), "--score-only"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("Looks tidy, nothing to add.\n"))
        .stdout(predicate::str::contains("Could not find health score in output."));

    assert_eq!(fs::read_to_string(&out).unwrap(), "Looks tidy, nothing to add.");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_empty_replies_are_retried() {
    let server = MockServer::start().await;
    mount_tags(&server, &["llama3:latest"]).await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(chat_reply(""))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(chat_reply(REVIEW))
        .expect(1)
        .mount(&server)
        .await;
    let home = TempDir::new().unwrap();

    consultant(&home)
        .arg("-p")
        .arg(fixture())
        .args(["--host", &server.uri(), "-s"])
        .assert()
        .success()
        .stdout("SwiftPM Health Score: 42/100\n");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_always_empty_reply_fails() {
    let server = MockServer::start().await;
    mount_tags(&server, &["llama3:latest"]).await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(chat_reply(""))
        .expect(3)
        .mount(&server)
        .await;
    let home = TempDir::new().unwrap();

    consultant(&home)
        .arg("-p")
        .arg(fixture())
        .args(["--host", &server.uri()])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("empty response after 3 attempt(s)"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_missing_model_prints_hint() {
    let server = MockServer::start().await;
    mount_tags(&server, &["mistral:7b"]).await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(chat_reply(REVIEW))
        .expect(0)
        .mount(&server)
        .await;
    let home = TempDir::new().unwrap();

    consultant(&home)
        .arg("-p")
        .arg(fixture())
        .args(["--host", &server.uri(), "-m", "llama3"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Model \"llama3\" not found in Ollama."))
        .stderr(predicate::str::contains("ollama run llama3"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_model_flag_and_env_host() {
    let server = MockServer::start().await;
    mount_tags(&server, &["qwen2:7b"]).await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .and(wiremock::matchers::body_partial_json(json!({"model": "qwen2"})))
        .respond_with(chat_reply(REVIEW))
        .expect(1)
        .mount(&server)
        .await;
    let home = TempDir::new().unwrap();
    let host = server.uri().trim_start_matches("http://").to_string();

    consultant(&home)
        .env("OLLAMA_HOST", host)
        .arg("-p")
        .arg(fixture())
        .args(["--model", "qwen2", "-s"])
        .assert()
        .success()
        .stdout("SwiftPM Health Score: 42/100\n");
}

#[test]
fn test_unreachable_backend() {
    let port = std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port();
    let home = TempDir::new().unwrap();

    consultant(&home)
        .arg("-p")
        .arg(fixture())
        .args(["--host", &format!("http://127.0.0.1:{port}")])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Could not connect to Ollama"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_config_file_selects_model() {
    let server = MockServer::start().await;
    mount_tags(&server, &["phi3:mini"]).await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .and(wiremock::matchers::body_partial_json(json!({"model": "phi3"})))
        .respond_with(chat_reply(REVIEW))
        .expect(1)
        .mount(&server)
        .await;
    let home = TempDir::new().unwrap();
    let config = home.path().join("consultant.toml");
    fs::write(
        &config,
        format!("[llm]\nbase_url = \"{}\"\nmodel = \"phi3\"\n", server.uri()),
    )
    .unwrap();

    consultant(&home)
        .arg("-p")
        .arg(fixture())
        .arg("--config")
        .arg(&config)
        .arg("-s")
        .assert()
        .success()
        .stdout("SwiftPM Health Score: 42/100\n");
}

#[test]
fn test_config_subcommand_writes_template() {
    let home = TempDir::new().unwrap();
    let target = home.path().join("generated.toml");

    consultant(&home)
        .args(["config", "-o"])
        .arg(&target)
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration file created"));

    let written = fs::read_to_string(&target).unwrap();
    assert!(written.contains("[llm]"));
    assert!(written.contains("model = \"llama3\""));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_rust_log_controls_stderr_logging() {
    let server = ollama_with_reply(REVIEW).await;
    let home = TempDir::new().unwrap();
    fs::write(
        home.path().join(".swiftpm-consultant.toml"),
        format!("[llm]\nbase_url = \"{}\"\n", server.uri()),
    )
    .unwrap();

    consultant(&home)
        .env("RUST_LOG", "info")
        .arg("-p")
        .arg(fixture())
        .arg("-s")
        .assert()
        .success()
        .stdout("SwiftPM Health Score: 42/100\n")
        .stderr(predicate::str::contains("Loading configuration from:"))
        .stderr(predicate::str::contains("Reviewing"));

    // Without RUST_LOG only warnings and errors reach stderr.
    consultant(&home)
        .arg("-p")
        .arg(fixture())
        .arg("-s")
        .assert()
        .success()
        .stderr(predicate::str::contains("Loading configuration from:").not());
}
