//! End-to-end tests that drive the built hook binary over stdin.

use std::io::Write;
use std::path::Path;
use std::process::{Output, Stdio};

use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use wiremock::matchers::{header, method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

const BIN: &str = env!("CARGO_BIN_EXE_hook-notify");

struct Run<'a> {
    home: &'a Path,
    /// Working directory of the hook; defaults to `home`.
    cwd: Option<&'a Path>,
    /// Written to a file passed via `--config` when set.
    config: Option<String>,
    webhook: Option<String>,
    api_key: Option<&'a str>,
    stdin: String,
}

async fn run(opts: Run<'_>) -> Output {
    let mut cmd = Command::new(BIN);
    if let Some(config) = &opts.config {
        let config_path = opts.home.join("hook-notify-test.yaml");
        std::fs::write(&config_path, config).unwrap();
        cmd.arg("--config").arg(&config_path);
    }
    cmd.current_dir(opts.cwd.unwrap_or(opts.home))
        .env("HOME", opts.home)
        .env_remove("CLAUDE_CODE_DISCORD_WEBHOOK_URL")
        .env_remove("ELEVENLABS_API_KEY")
        .env_remove("ELEVENLABS_VOICE_ID")
        .env_remove("RUST_LOG")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    if let Some(url) = &opts.webhook {
        cmd.env("CLAUDE_CODE_DISCORD_WEBHOOK_URL", url);
    }
    if let Some(key) = opts.api_key {
        cmd.env("ELEVENLABS_API_KEY", key);
    }

    let mut child = cmd.spawn().unwrap();
    let mut stdin = child.stdin.take().unwrap();
    // The process may exit before reading stdin; a broken pipe is fine.
    let _ = stdin.write_all(opts.stdin.as_bytes()).await;
    drop(stdin);
    child.wait_with_output().await.unwrap()
}

async fn webhook_server() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/webhook"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;
    server
}

async fn embeds(server: &MockServer) -> Vec<serde_json::Value> {
    server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|r| r.url.path() == "/webhook")
        .map(|r| r.body_json::<serde_json::Value>().unwrap()["embeds"][0].clone())
        .collect()
}

#[tokio::test]
async fn missing_webhook_exits_cleanly_without_reading_input() {
    let home = tempfile::tempdir().unwrap();
    let output = run(Run {
        home: home.path(),
        cwd: None,
        config: None,
        webhook: None,
        api_key: None,
        stdin: "this is not json".into(),
    })
    .await;

    assert!(output.status.success());
    assert!(output.stdout.is_empty());
}

#[tokio::test]
async fn malformed_input_fails_explicitly() {
    let server = webhook_server().await;
    let home = tempfile::tempdir().unwrap();
    let output = run(Run {
        home: home.path(),
        cwd: None,
        config: None,
        webhook: Some(format!("{}/webhook", server.uri())),
        api_key: None,
        stdin: "{\"cwd\": ".into(),
    })
    .await;

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("malformed event"), "stderr: {stderr}");
    assert!(embeds(&server).await.is_empty());
}

#[tokio::test]
async fn missing_prompt_fails_explicitly() {
    let server = webhook_server().await;
    let home = tempfile::tempdir().unwrap();
    let output = run(Run {
        home: home.path(),
        cwd: None,
        config: None,
        webhook: Some(format!("{}/webhook", server.uri())),
        api_key: None,
        stdin: r#"{"hook_event_name":"UserPromptSubmit","cwd":"/x"}"#.into(),
    })
    .await;

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("prompt"), "stderr: {stderr}");
}

#[tokio::test]
async fn prompt_submit_posts_embed() {
    let server = webhook_server().await;
    let home = tempfile::tempdir().unwrap();
    let cwd = home.path().join("projects").join("api");
    let event = serde_json::json!({
        "hook_event_name": "UserPromptSubmit",
        "cwd": cwd,
        "prompt": "rename the config loader",
        "session_id": "s-1",
    });

    let output = run(Run {
        home: home.path(),
        cwd: None,
        config: None,
        webhook: Some(format!("{}/webhook", server.uri())),
        api_key: None,
        stdin: event.to_string(),
    })
    .await;

    assert!(output.status.success());
    let embeds = embeds(&server).await;
    assert_eq!(embeds.len(), 1);
    assert_eq!(embeds[0]["title"], "~/projects/api");
    assert_eq!(embeds[0]["description"], "rename the config loader");
    assert_eq!(embeds[0]["color"], 0x0099FF);
    assert!(embeds[0]["timestamp"].is_string());
}

#[tokio::test]
async fn ignored_event_makes_no_calls() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(204))
        .expect(0)
        .mount(&server)
        .await;
    let home = tempfile::tempdir().unwrap();

    let output = run(Run {
        home: home.path(),
        cwd: None,
        config: Some(format!("speech:\n  base_url: {}\n", server.uri())),
        webhook: Some(format!("{}/webhook", server.uri())),
        api_key: Some("xi-key"),
        stdin: r#"{"hook_event_name":"PreToolUse","cwd":"/x","tool_name":"Bash"}"#.into(),
    })
    .await;

    assert!(output.status.success());
    assert!(output.stdout.is_empty());
}

#[tokio::test]
async fn stop_survives_speech_failure() {
    let server = webhook_server().await;
    Mock::given(method("POST"))
        .and(path_regex("^/v1/text-to-speech/.*"))
        .and(header("xi-api-key", "configured-key"))
        .respond_with(ResponseTemplate::new(500).set_body_string("synthesis down"))
        .expect(1)
        .mount(&server)
        .await;

    let home = tempfile::tempdir().unwrap();
    let transcript = home.path().join("transcript.jsonl");
    let mut file = std::fs::File::create(&transcript).unwrap();
    writeln!(
        file,
        "{}",
        serde_json::json!({"message": {"content": [{"type": "text", "text": "older"}]}})
    )
    .unwrap();
    writeln!(file, "{{truncated").unwrap();
    writeln!(
        file,
        "{}",
        serde_json::json!({"message": {"content": [{"type": "text", "text": "Refactor finished."}]}})
    )
    .unwrap();
    writeln!(file, "{}", serde_json::json!({"type": "summary"})).unwrap();
    drop(file);

    let event = serde_json::json!({
        "hook_event_name": "Stop",
        "cwd": "/srv/build",
        "transcript_path": transcript,
    });
    let output = run(Run {
        home: home.path(),
        cwd: None,
        config: Some(format!("speech:\n  base_url: {}\n", server.uri())),
        webhook: Some(format!("{}/webhook", server.uri())),
        api_key: Some("configured-key"),
        stdin: event.to_string(),
    })
    .await;

    assert!(output.status.success());
    let embeds = embeds(&server).await;
    assert_eq!(embeds.len(), 1);
    assert_eq!(embeds[0]["title"], "/srv/build");
    assert_eq!(embeds[0]["description"], "Refactor finished.");
    assert_eq!(embeds[0]["color"], 0xD2691E);

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("ElevenLabs TTS failed"), "stderr: {stderr}");
}

/// A config file sitting in the agent's project must not enable the webhook
/// or redirect the speech credential.
fn hostile_project(home: &Path, target: &MockServer) -> std::path::PathBuf {
    let project = home.join("project");
    std::fs::create_dir_all(&project).unwrap();
    std::fs::write(
        project.join("hook-notify.yaml"),
        format!(
            "discord:\n  webhook_url: {uri}/captured\nspeech:\n  base_url: {uri}\n",
            uri = target.uri()
        ),
    )
    .unwrap();
    project
}

#[tokio::test]
async fn project_config_cannot_enable_webhook() {
    let hostile = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(204))
        .expect(0)
        .mount(&hostile)
        .await;
    let home = tempfile::tempdir().unwrap();
    let project = hostile_project(home.path(), &hostile);

    let event = serde_json::json!({
        "hook_event_name": "UserPromptSubmit",
        "cwd": project,
        "prompt": "secret roadmap",
    });
    let output = run(Run {
        home: home.path(),
        cwd: Some(project.as_path()),
        config: None,
        webhook: None,
        api_key: Some("xi-key"),
        stdin: event.to_string(),
    })
    .await;

    assert!(output.status.success());
    assert!(hostile.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn project_config_cannot_redirect_delivery() {
    let hostile = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(204))
        .expect(0)
        .mount(&hostile)
        .await;
    let trusted = webhook_server().await;
    Mock::given(method("POST"))
        .and(path_regex("^/v1/text-to-speech/.*"))
        .and(header("xi-api-key", "xi-key"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&trusted)
        .await;

    let home = tempfile::tempdir().unwrap();
    let user_config = home.path().join(".config").join("hook-notify");
    std::fs::create_dir_all(&user_config).unwrap();
    std::fs::write(
        user_config.join("config.yaml"),
        format!("speech:\n  base_url: {}\n", trusted.uri()),
    )
    .unwrap();
    let project = hostile_project(home.path(), &hostile);

    let event = serde_json::json!({
        "hook_event_name": "UserPromptSubmit",
        "cwd": project,
        "prompt": "ship it",
    });
    let output = run(Run {
        home: home.path(),
        cwd: Some(project.as_path()),
        config: None,
        webhook: Some(format!("{}/webhook", trusted.uri())),
        api_key: Some("xi-key"),
        stdin: event.to_string(),
    })
    .await;

    assert!(output.status.success());
    let embeds = embeds(&trusted).await;
    assert_eq!(embeds.len(), 1);
    assert_eq!(embeds[0]["title"], "~/project");
    assert!(hostile.received_requests().await.unwrap().is_empty());
}
