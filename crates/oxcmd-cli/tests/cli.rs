use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;

fn oxcmd() -> Command {
    let mut cmd = Command::cargo_bin("oxcmd").unwrap();
    cmd.env_remove("OXCMD_PLATFORM").env_remove("OXCMD_REPOSITORY");
    cmd
}

#[test]
fn test_help_exits_zero() {
    oxcmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("oxcmd"));
}

#[test]
fn test_resolve_web_id() {
    oxcmd()
        .args(["resolve", "id=submit"])
        .assert()
        .success()
        .stdout(predicate::str::contains("strategy: id"))
        .stdout(predicate::str::contains("using:    css selector"))
        .stdout(predicate::str::contains("value:    #submit"));
}

#[test]
fn test_resolve_native_android_json() {
    let assert = oxcmd()
        .args(["--format", "json", "resolve", "text=Sign in", "--platform", "android", "--native"])
        .assert()
        .success();

    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    let json: serde_json::Value = serde_json::from_str(stdout.trim()).unwrap();
    assert_eq!(json["strategy"], "text");
    assert_eq!(json["using"], "-android uiautomator");
    assert_eq!(json["selector"], "new UiSelector().text(\"Sign in\")");
}

#[test]
fn test_resolve_text_prefix_on_web_is_raw_css() {
    let assert = oxcmd()
        .args(["--format", "json", "resolve", "text=Sign in"])
        .assert()
        .success();

    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    let json: serde_json::Value = serde_json::from_str(stdout.trim()).unwrap();
    assert_eq!(json["strategy"], "raw");
}

#[test]
fn test_resolve_native_requires_mobile_platform() {
    oxcmd()
        .args(["resolve", "id=x", "--native"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("--native requires"));
}

#[test]
fn test_resolve_with_repository() {
    let dir = tempfile::tempdir().unwrap();
    let repo = dir.path().join("objects.json");
    fs::write(&repo, r#"{ "login": { "submit": "//button[@type='submit']" } }"#).unwrap();

    oxcmd()
        .args(["resolve", "@login.submit", "--repo"])
        .arg(&repo)
        .assert()
        .success()
        .stdout(predicate::str::contains("using:    xpath"))
        .stdout(predicate::str::contains("//button[@type='submit']"));

    oxcmd()
        .args(["resolve", "@login.cancel", "--repo"])
        .arg(&repo)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Locator undefined: login.cancel"));
}

#[test]
fn test_resolve_page_object_without_repository() {
    let home = tempfile::tempdir().unwrap();

    oxcmd()
        .env("HOME", home.path())
        .args(["resolve", "@login.submit"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Locator undefined: login.submit"));
}

#[test]
fn test_resolve_uses_repository_from_config() {
    let home = tempfile::tempdir().unwrap();
    let repo = home.path().join("objects.json");
    fs::write(&repo, r#"{ "login.submit": "id=submit" }"#).unwrap();
    let config_dir = home.path().join(".oxcmd");
    fs::create_dir(&config_dir).unwrap();
    let config = serde_json::json!({ "object_repository": repo });
    fs::write(config_dir.join("config.json"), config.to_string()).unwrap();

    oxcmd()
        .env("HOME", home.path())
        .args(["resolve", "@login.submit"])
        .assert()
        .success()
        .stdout(predicate::str::contains("value:    #submit"));
}

#[test]
fn test_resolve_with_broken_repository() {
    let dir = tempfile::tempdir().unwrap();
    let repo = dir.path().join("objects.json");
    fs::write(&repo, r#"{ "login": 42 }"#).unwrap();

    oxcmd()
        .args(["resolve", "@login", "--repo"])
        .arg(&repo)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Configuration error"));
}

#[test]
fn test_commands_lists_registry() {
    oxcmd()
        .arg("commands")
        .assert()
        .success()
        .stdout(predicate::str::contains("click (action)"))
        .stdout(predicate::str::contains("getXMLPageSourceAsJSON"))
        .stdout(predicate::str::contains("waitForNotValue"));
}

#[test]
fn test_commands_json() {
    let assert = oxcmd().args(["-f", "json", "commands"]).assert().success();

    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    let commands: Vec<serde_json::Value> = serde_json::from_str(&stdout).unwrap();
    assert_eq!(commands.len(), 57);
    let click = commands.iter().find(|c| c["name"] == "click").unwrap();
    assert_eq!(click["isAction"], true);
    let get_text = commands.iter().find(|c| c["name"] == "getText").unwrap();
    assert_eq!(get_text["isAction"], false);
}

#[test]
fn test_config_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("config.json");
    fs::write(
        &file,
        r#"{ "screenshots": "always", "fetch_stats": true, "platform": "ios" }"#,
    )
    .unwrap();

    oxcmd()
        .args(["config", "--file"])
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("screenshots:       always"))
        .stdout(predicate::str::contains("fetch_stats:       true"))
        .stdout(predicate::str::contains("platform:          ios"));
}

#[test]
fn test_config_defaults_without_file() {
    let home = tempfile::tempdir().unwrap();

    let assert = oxcmd()
        .env("HOME", home.path())
        .args(["--format", "json", "config"])
        .assert()
        .success();

    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    let json: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(json["screenshots"], "onError");
    assert_eq!(json["wait_timeout_ms"], 60_000);
    assert_eq!(json["platform"], "web");
}

#[test]
fn test_config_invalid_file() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("config.json");
    fs::write(&file, "{ not json").unwrap();

    oxcmd()
        .args(["config", "--file"])
        .arg(&file)
        .assert()
        .code(2);
}
