//! Integration tests for the `anova` binary.
//!
//! Everything here runs without a gateway: argument parsing, help,
//! completions, config handling, and the failures that happen before
//! any connection is opened.
#![allow(clippy::unwrap_used)]

use std::path::Path;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;

// ── Helpers ─────────────────────────────────────────────────────────

/// `anova` with its config pointed at `home`, no `ANOVA_*` overrides,
/// and a non-terminal stdin so nothing prompts.
fn anova_cmd_in(home: &Path) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("anova");
    cmd.env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join(".config"))
        .env_remove("ANOVA_PROFILE")
        .env_remove("ANOVA_TOKEN")
        .env_remove("ANOVA_ENDPOINT")
        .env_remove("ANOVA_OUTPUT")
        .env_remove("RUST_LOG")
        .write_stdin("");
    cmd
}

fn anova_cmd() -> assert_cmd::Command {
    anova_cmd_in(Path::new("/tmp/anova-cli-test-nonexistent"))
}

/// Write `contents` where the binary looks for its config on Linux.
#[cfg(target_os = "linux")]
fn write_config(home: &Path, contents: &str) {
    let dir = home.join(".config").join("anova");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("config.toml"), contents).unwrap();
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_help_lists_commands() {
    anova_cmd().arg("--help").assert().success().stdout(
        predicate::str::contains("interactive")
            .and(predicate::str::contains("devices"))
            .and(predicate::str::contains("export"))
            .and(predicate::str::contains("config"))
            .and(predicate::str::contains("--token")),
    );
}

#[test]
fn test_version_flag() {
    anova_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("anova"));
}

#[test]
fn test_invalid_subcommand() {
    anova_cmd().arg("preheat").assert().code(2);
}

#[test]
fn test_invalid_output_format() {
    anova_cmd()
        .args(["--output", "xml", "devices"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("xml"));
}

// ── Shell completions ───────────────────────────────────────────────

#[test]
fn test_completions_bash() {
    anova_cmd()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("anova"));
}

#[test]
fn test_completions_zsh() {
    anova_cmd()
        .args(["completions", "zsh"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

// ── Failures before any connection ──────────────────────────────────

#[test]
fn test_malformed_token_is_an_auth_error() {
    anova_cmd()
        .args(["devices", "--token", "not-a-token"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("anova-"));
}

#[test]
fn test_non_websocket_endpoint_is_rejected() {
    anova_cmd()
        .args([
            "devices",
            "--token",
            "anova-abc123",
            "--endpoint",
            "https://devices.anovaculinary.io",
        ])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("endpoint"));
}

#[test]
fn test_unknown_profile_is_not_found() {
    anova_cmd()
        .args(["--profile", "nosuch", "devices", "--token", "anova-abc123"])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("nosuch"));
}

#[test]
fn test_export_requires_dates() {
    anova_cmd()
        .args(["export", "--start", "2026-01-01"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("--end"));
}

#[test]
fn test_export_rejects_malformed_dates() {
    anova_cmd()
        .args([
            "export",
            "--start",
            "yesterday",
            "--end",
            "2026-01-02",
            "--token",
            "anova-abc123",
        ])
        .assert()
        .code(2);
}

#[test]
fn test_export_rejects_reversed_range() {
    anova_cmd()
        .args([
            "export",
            "--start",
            "2020-01-05",
            "--end",
            "2020-01-01",
            "--token",
            "anova-abc123",
        ])
        .assert()
        .code(2);
}

// ── Config ──────────────────────────────────────────────────────────

#[test]
fn test_config_show_without_file() {
    anova_cmd()
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("[defaults]").and(predicate::str::contains("unit = \"C\"")),
        );
}

#[test]
fn test_config_show_json() {
    let output = anova_cmd()
        .args(["config", "show", "--output", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["defaults"]["output"], "table");
}

#[test]
fn test_config_use_unknown_profile() {
    let home = tempfile::tempdir().unwrap();
    anova_cmd_in(home.path())
        .args(["config", "use", "kitchen"])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("kitchen"));
}

#[cfg(target_os = "linux")]
#[test]
fn test_config_use_switches_default_profile() {
    let home = tempfile::tempdir().unwrap();
    write_config(
        home.path(),
        "default_profile = \"home\"\n\n[profiles.home]\n\n[profiles.kitchen]\ndevice = \"Oven\"\n",
    );

    anova_cmd_in(home.path())
        .args(["config", "use", "kitchen"])
        .assert()
        .success();

    let output = anova_cmd_in(home.path())
        .args(["config", "show", "-o", "json"])
        .output()
        .unwrap();
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["default_profile"], "kitchen");
    assert_eq!(json["profiles"]["kitchen"]["device"], "Oven");
}

#[cfg(target_os = "linux")]
#[test]
fn test_config_show_masks_tokens() {
    let home = tempfile::tempdir().unwrap();
    write_config(
        home.path(),
        "[profiles.default]\ntoken = \"anova-very-secret\"\n",
    );

    anova_cmd_in(home.path())
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("****").and(predicate::str::contains("very-secret").not()),
        );
}

#[cfg(target_os = "linux")]
#[test]
fn test_profile_without_token_reports_missing_credentials() {
    let home = tempfile::tempdir().unwrap();
    write_config(home.path(), "[profiles.cli-test-missing-token]\n");

    anova_cmd_in(home.path())
        .args(["--profile", "cli-test-missing-token", "devices"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("cli-test-missing-token"));
}
