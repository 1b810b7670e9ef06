use std::fs;
use std::io::Write as _;
use std::path::Path;
use std::process::{Command, Output, Stdio};

use tempfile::tempdir;

fn bin() -> &'static str {
    env!("CARGO_BIN_EXE_channel-filter")
}

fn write_file(path: &Path, content: &str) {
    fs::write(path, content).expect("failed to write test file");
}

fn run(args: &[&str]) -> Output {
    Command::new(bin())
        .args(["--color", "never"])
        .args(args)
        .env_remove("RUST_LOG")
        .env_remove("CHANNEL_FILTER_CONFIG")
        .output()
        .expect("command should run")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

/// Config pointing at a port nothing listens on
fn offline_config(dir: &Path) -> String {
    let path = dir.join("offline.toml");
    write_file(
        &path,
        "[api]\nendpoint = \"http://127.0.0.1:1/api/v1\"\ntimeout_secs = 1\n",
    );
    path.to_str().expect("utf8 path").to_string()
}

#[test]
fn test_validate_valid_expression_exits_zero() {
    let output = run(&["validate", r#"channel_name contains "sport""#]);
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(stdout(&output).contains("VALID"));
}

#[test]
fn test_validate_invalid_expression_exits_one_with_suggestion() {
    let output = run(&["validate", r#"channel_name contans "sport""#]);
    assert_eq!(output.status.code(), Some(1));
    let text = stdout(&output);
    assert!(text.contains("INVALID"));
    assert!(text.contains("suggestion: contains"), "output:\n{text}");
}

#[test]
fn test_validate_json_output() {
    let output = run(&[
        "--format",
        "json",
        "--fields",
        "channel_name",
        "validate",
        r#"group_title equals "News""#,
    ]);
    assert_eq!(output.status.code(), Some(1));
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json output");
    assert_eq!(value["valid"], false);
    assert_eq!(value["fields"]["valid"], false);
    assert_eq!(value["highlights"][0]["start"], 0);
    assert_eq!(value["highlights"][0]["end"], 11);
}

#[test]
fn test_validate_with_unreachable_server_keeps_local_result() {
    let dir = tempdir().expect("temp dir");
    let config = offline_config(dir.path());
    let output = run(&[
        "--config",
        &config,
        "--format",
        "json",
        "validate",
        "--server",
        r#"channel_name contains "sport""#,
    ]);
    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json output");
    assert_eq!(value["valid"], true);
    assert_eq!(value["serverValidation"]["status"], "unavailable");
}

#[test]
fn test_tokenize_json() {
    let output = run(&["--format", "json", "tokenize", r#"a contains "x""#]);
    assert!(output.status.success());
    let tokens: Vec<serde_json::Value> =
        serde_json::from_slice(&output.stdout).expect("json output");
    let kinds: Vec<_> = tokens.iter().map(|t| t["kind"].as_str().unwrap()).collect();
    assert_eq!(
        kinds,
        vec!["error", "whitespace", "operator", "whitespace", "value"]
    );
}

#[test]
fn test_to_tree_and_back() {
    let dir = tempdir().expect("temp dir");
    let tree_path = dir.path().join("tree.json");

    let output = run(&[
        "to-tree",
        "--envelope",
        r#"channel_name contains "BBC" OR channel_name contains "CNN""#,
    ]);
    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json output");
    assert_eq!(value["root"]["type"], "group");
    assert_eq!(value["root"]["operator"], "OR");

    write_file(&tree_path, &stdout(&output));
    let output = run(&["to-text", tree_path.to_str().expect("utf8 path")]);
    assert!(output.status.success());
    assert_eq!(
        stdout(&output).trim(),
        r#"(channel_name contains "BBC" OR channel_name contains "CNN")"#
    );
}

#[test]
fn test_to_text_reads_legacy_record_from_stdin() {
    let mut child = Command::new(bin())
        .args(["to-text", "-"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .spawn()
        .expect("command should run");
    child
        .stdin
        .take()
        .expect("stdin")
        .write_all(
            br#"{"id":"f1","conditions":[
                {"field_name":"group_title","operator":"not_equals","value":"Adult"},
                {"field_name":"channel_name","operator":"contains","value":"HD"}
            ]}"#,
        )
        .expect("write stdin");
    let output = child.wait_with_output().expect("wait");
    assert!(output.status.success());
    assert_eq!(
        stdout(&output).trim(),
        r#"(group_title not equals "Adult" AND channel_name contains "HD")"#
    );
}

#[test]
fn test_to_tree_reports_parse_error() {
    let output = run(&["to-tree", r#"channel_name contains "x" AND"#]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Failed to parse filter expression"), "{stderr}");
    assert!(stderr.contains("offset"), "{stderr}");
}

#[test]
fn test_to_tree_rejects_deep_nesting() {
    let expression = format!(
        "{}channel_name contains \"x\"{}",
        "(".repeat(5_000),
        ")".repeat(5_000)
    );
    let output = run(&["to-tree", &expression]);
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("nested too deeply"), "{stderr}");
}

#[test]
fn test_normalize_shows_diff() {
    let output = run(&["normalize", "((channel_name   contains 'sport'))"]);
    assert!(output.status.success());
    let text = stdout(&output);
    assert!(text.starts_with(r#"channel_name contains "sport""#));
    assert!(text.contains("- ((channel_name   contains 'sport'))"));
}

#[test]
fn test_fields_override_skips_network() {
    let output = run(&["--fields", "alpha,beta", "fields"]);
    assert!(output.status.success());
    let text = stdout(&output);
    assert!(text.contains("alpha"));
    assert!(text.contains("Beta"));
    assert!(!text.contains("channel_name"));
}

#[test]
fn test_edit_session_over_stdin() {
    let dir = tempdir().expect("temp dir");
    let config = offline_config(dir.path());

    let mut child = Command::new(bin())
        .args([
            "--color",
            "never",
            "--config",
            &config,
            "--fields",
            "channel_name",
            "edit",
        ])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .spawn()
        .expect("command should run");
    child
        .stdin
        .take()
        .expect("stdin")
        .write_all(b"channel_name cont\nchannel_name contains \"x\"\n")
        .expect("write stdin");
    let output = child.wait_with_output().expect("wait");
    assert!(output.status.success());

    let lines: Vec<String> = stdout(&output).lines().map(str::to_string).collect();
    assert!(lines[0].starts_with("[#1 local] invalid"), "{lines:?}");
    assert!(lines[1].starts_with("[#2 local] valid"), "{lines:?}");
    let server = lines.last().expect("final line");
    assert!(server.starts_with("[#2 server] valid"), "{lines:?}");
    assert!(server.contains("server unavailable"), "{lines:?}");
}
