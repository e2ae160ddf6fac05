use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use serde_json::Value;
use tempfile::TempDir;

fn bin_path() -> PathBuf {
    std::env::var("CARGO_BIN_EXE_dsync")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            Path::new(env!("CARGO_MANIFEST_DIR"))
                .join("target")
                .join("debug")
                .join(if cfg!(windows) { "dsync.exe" } else { "dsync" })
        })
}

fn run_cmd(dir: &TempDir, args: &[&str]) -> Output {
    Command::new(bin_path())
        .args(args)
        .env("XDG_CONFIG_HOME", dir.path().join("config-home"))
        .env_remove("FIGMA_TOKEN")
        .env_remove("FIGMA_OAUTH_TOKEN")
        .env_remove("FIGMA_FILE_KEY")
        .output()
        .expect("run dsync command")
}

fn document() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("test_assets")
        .join("design_kit.json")
}

#[test]
fn config_file_sets_output_and_snapshot() {
    let dir = TempDir::new().expect("tempdir");
    let cfg_path = dir.path().join("dsync.toml");
    let out = dir.path().join("generated");
    let snapshot = dir.path().join("snap.json");
    fs::write(
        &cfg_path,
        format!(
            "document_path = {:?}\noutput_dir = {:?}\nsnapshot_path = {:?}\n",
            document().to_string_lossy(),
            out.to_string_lossy(),
            snapshot.to_string_lossy()
        ),
    )
    .unwrap();

    let output = run_cmd(&dir, &["sync", "--config", cfg_path.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(0), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert!(out.join("PrimaryButton.swift").is_file());
    assert!(snapshot.is_file());
}

#[test]
fn central_config_is_picked_up() {
    let dir = TempDir::new().expect("tempdir");
    let central = dir.path().join("config-home/dsync");
    fs::create_dir_all(&central).unwrap();
    let out = dir.path().join("central-out");
    fs::write(
        central.join("config.toml"),
        format!(
            "document_path = {:?}\noutput_dir = {:?}\nsnapshot_path = {:?}\n",
            document().to_string_lossy(),
            out.to_string_lossy(),
            dir.path().join("snap.json").to_string_lossy()
        ),
    )
    .unwrap();

    let output = run_cmd(&dir, &["sync"]);
    assert_eq!(output.status.code(), Some(0));
    assert!(out.join("tokens/Colors.swift").is_file());
}

#[test]
fn invalid_config_exits_with_config_error() {
    let dir = TempDir::new().expect("tempdir");
    let cfg_path = dir.path().join("dsync.toml");
    fs::write(&cfg_path, "poll_interval = \"0s\"\n").unwrap();

    let output = run_cmd(&dir, &["sync", "--config", cfg_path.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(2));
    let json: Value = serde_json::from_slice(&output.stdout).expect("error JSON");
    assert_eq!(json["mode"], "error");
    assert_eq!(json["error"]["category"], "config");
    assert!(json["error"]["message"]
        .as_str()
        .unwrap_or_default()
        .contains("poll_interval"));
}

#[test]
fn missing_config_file_exits_with_error() {
    let dir = TempDir::new().expect("tempdir");
    let missing = dir.path().join("absent.toml");
    let output = run_cmd(&dir, &["sync", "--config", missing.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn watch_stops_after_max_runs() {
    let dir = TempDir::new().expect("tempdir");
    let out = dir.path().join("out");
    let snapshot = dir.path().join("snap.json");
    let document = document();
    let output = run_cmd(
        &dir,
        &[
            "watch",
            "--document",
            document.to_str().unwrap(),
            "--output-dir",
            out.to_str().unwrap(),
            "--snapshot",
            snapshot.to_str().unwrap(),
            "--interval",
            "50ms",
            "--max-runs",
            "2",
        ],
    );

    assert_eq!(output.status.code(), Some(0), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let json: Value = serde_json::from_slice(&output.stdout).expect("watch JSON");
    assert_eq!(json["mode"], "watch");
    assert_eq!(json["runs"], 2);
    assert_eq!(json["written"], 1);
    assert_eq!(json["last"]["outcome"], "stopped");
}

#[test]
fn pretty_format_to_file_keeps_json_shape() {
    let dir = TempDir::new().expect("tempdir");
    let report = dir.path().join("report.json");
    let document = document();
    let out = dir.path().join("out");
    let snapshot = dir.path().join("snap.json");
    let output = run_cmd(
        &dir,
        &[
            "--format",
            "pretty",
            "sync",
            "--document",
            document.to_str().unwrap(),
            "--output-dir",
            out.to_str().unwrap(),
            "--snapshot",
            snapshot.to_str().unwrap(),
            "--output",
            report.to_str().unwrap(),
        ],
    );

    assert_eq!(output.status.code(), Some(0));
    let json: Value =
        serde_json::from_str(&fs::read_to_string(&report).unwrap()).expect("report JSON");
    assert_eq!(json["mode"], "sync");
}
