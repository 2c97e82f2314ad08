//! CLI surface tests: argument parsing, exit codes, configuration
//! isolation via `CUTTER_CONFIG_PATH`.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn cutter() -> Command {
    let mut cmd = Command::cargo_bin("silence-cutter").unwrap();
    cmd.env_remove("OPENAI_API_KEY");
    cmd
}

#[test]
fn test_help_lists_subcommands() {
    cutter()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("cut"))
        .stdout(predicate::str::contains("config"))
        .stdout(predicate::str::contains("generate-completion"));
}

#[test]
fn test_version() {
    cutter()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_missing_input_exits_one() {
    let dir = TempDir::new().unwrap();
    cutter()
        .env("CUTTER_CONFIG_PATH", dir.path().join("config.toml"))
        .env("OPENAI_API_KEY", "test-key")
        .args(["cut", "/no/such/recording.mp4"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Source unreadable"));
}

#[test]
fn test_missing_credential_exits_four() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("talk.mp4");
    std::fs::write(&input, b"stub").unwrap();
    cutter()
        .env("CUTTER_CONFIG_PATH", dir.path().join("config.toml"))
        .arg("cut")
        .arg(&input)
        .assert()
        .code(4)
        .stderr(predicate::str::contains("API key"));
}

#[test]
fn test_config_set_get_roundtrip() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("config.toml");

    cutter()
        .env("CUTTER_CONFIG_PATH", &config_path)
        .args(["config", "set", "export.fps", "50"])
        .assert()
        .success();

    cutter()
        .env("CUTTER_CONFIG_PATH", &config_path)
        .args(["config", "get", "export.fps"])
        .assert()
        .success()
        .stdout(predicate::str::contains("50"));
}

#[test]
fn test_config_rejects_invalid_value() {
    let dir = TempDir::new().unwrap();
    cutter()
        .env("CUTTER_CONFIG_PATH", dir.path().join("config.toml"))
        .args(["config", "set", "export.fps", "23"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("export.fps"));
}

#[test]
fn test_config_list_masks_credentials() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("config.toml");

    cutter()
        .env("CUTTER_CONFIG_PATH", &config_path)
        .args(["config", "set", "scoring.api_key", "sk-very-secret"])
        .assert()
        .success();

    cutter()
        .env("CUTTER_CONFIG_PATH", &config_path)
        .args(["config", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("scoring.api_key"))
        .stdout(predicate::str::contains("sk-very-secret").not());
}

#[test]
fn test_generate_completion() {
    cutter()
        .args(["generate-completion", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("silence-cutter"));
}
