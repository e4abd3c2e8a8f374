use anyhow::Result;
use clap::Parser;
use httpmock::prelude::*;
use std::path::PathBuf;
use tempfile::TempDir;
use typefully_cli::app::run;
use typefully_cli::config::cli::Cli;
use typefully_cli::config::{FileConfig, Overrides, Settings};
use typefully_cli::TypefullyError;

/// Parses `argv` and resolves settings against `base_url` with a settings file in `dir`.
fn setup(dir: &TempDir, base_url: &str, argv: &[&str]) -> Result<(Cli, Settings)> {
    let mut full = vec!["typefully", "--base-url", base_url];
    full.extend_from_slice(argv);
    let cli = Cli::try_parse_from(full)?;

    let path: PathBuf = dir.path().join("config.toml");
    let file = FileConfig::load_or_default(&path)?;
    let settings = Settings::resolve(path, &file, cli.overrides(), None)?;
    Ok((cli, settings))
}

fn fast_retry_config(dir: &TempDir) -> Result<()> {
    std::fs::write(
        dir.path().join("config.toml"),
        r#"
[api]
key = "file-key"

[retry]
max_retries = 1
base_delay_ms = 1
max_delay_ms = 2
jitter = 0.0
"#,
    )?;
    Ok(())
}

#[tokio::test]
async fn test_create_thread_end_to_end() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let server = MockServer::start();

    let api_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/drafts/")
            .header("X-API-KEY", "Bearer flag-key")
            .json_body(serde_json::json!({
                "content": "Intro tweet\n\n\n\nFollow-up tweet",
                "threadify": false,
                "share": true,
                "schedule-date": "next-free-slot",
                "auto_retweet_enabled": false,
                "auto_plug_enabled": false
            }));
        then.status(200).json_body(serde_json::json!({
            "id": 9001,
            "text": "Intro tweet\n\n\n\nFollow-up tweet",
            "num_tweets": 2,
            "share_url": "https://typefully.com/t/9001"
        }));
    });

    let (cli, settings) = setup(
        &temp_dir,
        &server.base_url(),
        &[
            "--api-key",
            "flag-key",
            "create",
            "Intro tweet",
            "Follow-up tweet",
            "--share",
            "--schedule",
            "next-free-slot",
        ],
    )?;

    let output = run(cli.command, &settings).await?;

    api_mock.assert();
    assert_eq!(
        output,
        "Created draft 9001\nShare URL: https://typefully.com/t/9001"
    );
    Ok(())
}

#[tokio::test]
async fn test_create_from_file_with_file_key() -> Result<()> {
    let temp_dir = TempDir::new()?;
    fast_retry_config(&temp_dir)?;
    let draft_path = temp_dir.path().join("post.txt");
    std::fs::write(&draft_path, "A long form post\n")?;

    let server = MockServer::start();
    let api_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/drafts/")
            .header("X-API-KEY", "Bearer file-key")
            .json_body_partial(r#"{"content": "A long form post", "threadify": true}"#);
        then.status(201).json_body(serde_json::json!({"id": "d-1"}));
    });

    let (cli, settings) = setup(
        &temp_dir,
        &server.base_url(),
        &[
            "--format",
            "json",
            "create",
            "--file",
            draft_path.to_str().unwrap(),
            "--threadify",
        ],
    )?;

    let output = run(cli.command, &settings).await?;

    api_mock.assert();
    let parsed: serde_json::Value = serde_json::from_str(&output)?;
    assert_eq!(parsed["id"], "d-1");
    Ok(())
}

#[tokio::test]
async fn test_dry_run_makes_no_request() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let server = MockServer::start();
    let api_mock = server.mock(|when, then| {
        when.any_request();
        then.status(500);
    });

    let (cli, settings) = setup(
        &temp_dir,
        &server.base_url(),
        &["--api-key", "k", "create", "hello", "--dry-run"],
    )?;

    let output = run(cli.command, &settings).await?;

    api_mock.assert_hits(0);
    assert!(output.starts_with("Dry run: nothing was sent."));
    assert!(output.contains("\"content\": \"hello\""));
    Ok(())
}

#[tokio::test]
async fn test_scheduled_listing_as_csv() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let server = MockServer::start();
    let api_mock = server.mock(|when, then| {
        when.method(GET)
            .path("/drafts/recently-scheduled/")
            .query_param("content_filter", "tweets");
        then.status(200).json_body(serde_json::json!([
            {"id": 1, "text": "one", "status": "scheduled", "scheduled_date": "2026-10-20T10:00:00Z"},
            {"id": 2, "text": "two", "status": "scheduled", "scheduled_date": "2026-10-21T10:00:00Z"}
        ]));
    });

    let (cli, settings) = setup(
        &temp_dir,
        &server.base_url(),
        &[
            "--api-key",
            "k",
            "--format",
            "csv",
            "scheduled",
            "--filter",
            "tweets",
            "-n",
            "1",
        ],
    )?;

    let output = run(cli.command, &settings).await?;

    api_mock.assert();
    assert_eq!(
        output,
        "id,status,date,num_tweets,share_url,text\n1,scheduled,2026-10-20T10:00:00Z,,,one\n"
    );
    Ok(())
}

#[tokio::test]
async fn test_notifications_wrapped_response() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let server = MockServer::start();
    let api_mock = server.mock(|when, then| {
        when.method(GET)
            .path("/notifications/")
            .query_param("kind", "activity");
        then.status(200).json_body(serde_json::json!({
            "notifications": [
                {"id": 3, "kind": "activity", "created_at": "2026-10-17T08:00:00Z", "payload": {"message": "Thread published"}}
            ]
        }));
    });

    let (cli, settings) = setup(
        &temp_dir,
        &server.base_url(),
        &["--api-key", "k", "notifications", "--kind", "activity"],
    )?;

    let output = run(cli.command, &settings).await?;

    api_mock.assert();
    assert!(output.contains("activity"));
    assert!(output.contains("Thread published"));
    Ok(())
}

#[tokio::test]
async fn test_missing_key_fails_before_any_request() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let server = MockServer::start();
    let api_mock = server.mock(|when, then| {
        when.any_request();
        then.status(200);
    });

    let (cli, settings) = setup(&temp_dir, &server.base_url(), &["published"])?;
    let err = run(cli.command, &settings).await.unwrap_err();

    api_mock.assert_hits(0);
    assert!(matches!(err, TypefullyError::MissingConfigError { .. }));
    assert_eq!(err.severity().exit_code(), 1);
    Ok(())
}

#[tokio::test]
async fn test_rejected_key_maps_to_auth_error() -> Result<()> {
    let temp_dir = TempDir::new()?;
    fast_retry_config(&temp_dir)?;
    let server = MockServer::start();
    let api_mock = server.mock(|when, then| {
        when.method(GET).path("/notifications/");
        then.status(403)
            .json_body(serde_json::json!({"detail": "Invalid API key"}));
    });

    let (cli, settings) = setup(&temp_dir, &server.base_url(), &["auth", "status", "--verify"])?;
    let err = run(cli.command, &settings).await.unwrap_err();

    api_mock.assert_hits(1);
    assert!(matches!(err, TypefullyError::AuthenticationError { .. }));
    Ok(())
}

#[tokio::test]
async fn test_server_errors_exhaust_retries() -> Result<()> {
    let temp_dir = TempDir::new()?;
    fast_retry_config(&temp_dir)?;
    let server = MockServer::start();
    let api_mock = server.mock(|when, then| {
        when.method(POST).path("/notifications/mark-all-read/");
        then.status(502).body("upstream down");
    });

    let (cli, settings) = setup(&temp_dir, &server.base_url(), &["mark-read"])?;
    let err = run(cli.command, &settings).await.unwrap_err();

    api_mock.assert_hits(2);
    assert_eq!(err.severity().exit_code(), 2);
    Ok(())
}

#[tokio::test]
async fn test_auth_login_then_status() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let base_url = "https://api.typefully.com/v1";

    let (cli, settings) = setup(&temp_dir, base_url, &["auth", "login", "--key", "abcd1234"])?;
    let output = run(cli.command, &settings).await?;
    assert!(output.starts_with("Saved API key to"));

    let (cli, settings) = setup(&temp_dir, base_url, &["auth", "status"])?;
    let output = run(cli.command, &settings).await?;
    assert_eq!(output, "API key: abcd**** (from settings file)");
    Ok(())
}

#[tokio::test]
async fn test_config_init_show_and_path() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let base_url = "https://api.typefully.com/v1";

    let (cli, settings) = setup(&temp_dir, base_url, &["config", "init"])?;
    let output = run(cli.command, &settings).await?;
    assert!(output.starts_with("Wrote settings template to"));
    assert!(temp_dir.path().join("config.toml").exists());

    let (cli, settings) = setup(&temp_dir, base_url, &["config", "init"])?;
    assert!(run(cli.command, &settings).await.is_err());

    let (cli, settings) = setup(&temp_dir, base_url, &["--format", "json", "config", "show"])?;
    let output = run(cli.command, &settings).await?;
    let parsed: serde_json::Value = serde_json::from_str(&output)?;
    assert_eq!(parsed["base_url"], base_url);
    assert_eq!(parsed["retry"]["max_retries"], 3);

    let (cli, settings) = setup(&temp_dir, base_url, &["config", "path"])?;
    let output = run(cli.command, &settings).await?;
    assert!(output.ends_with("config.toml"));
    Ok(())
}

#[test]
fn test_overrides_default_is_empty() {
    let overrides = Overrides::default();
    assert!(overrides.api_key.is_none());
    assert!(overrides.base_url.is_none());
    assert!(overrides.format.is_none());
}
