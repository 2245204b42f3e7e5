use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use tempfile::TempDir;

fn sitesync_probing(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("sitesync").unwrap();
    cmd.env("SITESYNC_HOME", home.path())
        .env("SITESYNC_USER_ID", "user-1")
        .env("SITESYNC_ORGANIZATION_ID", "org-1")
        .env_remove("SITESYNC_BACKEND_URL")
        .env_remove("SITESYNC_API_KEY")
        .env_remove("SITESYNC_OFFLINE")
        .env_remove("RUST_LOG")
        .env("NO_COLOR", "1");
    cmd
}

fn sitesync(home: &TempDir) -> Command {
    let mut cmd = sitesync_probing(home);
    cmd.arg("--offline");
    cmd
}

fn json_output(cmd: &mut Command) -> Value {
    let output = cmd.output().unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    serde_json::from_slice(&output.stdout).unwrap()
}

#[test]
fn test_offline_add_is_queued_and_survives_restart() {
    let home = TempDir::new().unwrap();

    sitesync(&home)
        .args(["add", "ticket", "create", "--payload", r#"{"title":"Leak"}"#])
        .assert()
        .success()
        .stdout(predicate::str::contains("Queued CREATE ticket"));

    let status = json_output(sitesync(&home).args(["status", "-o", "json"]));
    assert_eq!(status["pending"], 1);
    assert_eq!(status["online"], false);

    let list = json_output(sitesync(&home).args(["list", "-o", "json"]));
    assert_eq!(list["items"][0]["payload"]["title"], "Leak");
    assert_eq!(list["items"][0]["user_id"], "user-1");

    assert!(home.path().join("sitesync.db").exists());
}

#[test]
fn test_add_without_user_fails() {
    let home = TempDir::new().unwrap();

    sitesync(&home)
        .env_remove("SITESYNC_USER_ID")
        .args(["add", "message", "create", "--payload", r#"{"body":"hi"}"#])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no signed-in user"));

    let status = json_output(sitesync(&home).args(["status", "-o", "json"]));
    assert_eq!(status["pending"], 0);
}

#[test]
fn test_add_rejects_invalid_payload() {
    let home = TempDir::new().unwrap();

    sitesync(&home)
        .args(["add", "ticket", "update", "--payload", r#"{"title":"x"}"#])
        .assert()
        .failure()
        .stderr(predicate::str::contains("missing id"));

    sitesync(&home)
        .args(["add", "invoice", "create"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown entity type: invoice"));
}

#[test]
fn test_sync_while_offline_is_skipped() {
    let home = TempDir::new().unwrap();

    sitesync(&home)
        .args(["add", "diary-entry", "create", "--payload", r#"{"project_id":"p-1","entry_date":"2024-05-02"}"#])
        .assert()
        .success();

    let outcome = json_output(sitesync(&home).args(["sync", "-o", "json"]));
    assert_eq!(outcome["outcome"], "skipped");
    assert_eq!(outcome["reason"], "offline");

    let status = json_output(sitesync(&home).args(["status", "-o", "json"]));
    assert_eq!(status["pending"], 1);
}

#[test]
fn test_clear_requires_force() {
    let home = TempDir::new().unwrap();

    sitesync(&home)
        .args(["add", "ticket", "create", "--payload", r#"{"title":"Leak"}"#])
        .assert()
        .success();

    sitesync(&home)
        .arg("clear")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--force"));

    sitesync(&home)
        .args(["clear", "--force"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Dropped 1 queued actions"));

    let status = json_output(sitesync(&home).args(["status", "-o", "json"]));
    assert_eq!(status["pending"], 0);
}

#[test]
fn test_completions() {
    let home = TempDir::new().unwrap();

    sitesync(&home)
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("sitesync"));
}

#[test]
fn test_offline_env_skips_probe() {
    let home = TempDir::new().unwrap();
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());

    let probed = json_output(
        sitesync_probing(&home)
            .env("SITESYNC_BACKEND_URL", &url)
            .args(["status", "-o", "json"]),
    );
    assert_eq!(probed["online"], true);

    let forced = json_output(
        sitesync_probing(&home)
            .env("SITESYNC_BACKEND_URL", &url)
            .env("SITESYNC_OFFLINE", "1")
            .args(["status", "-o", "json"]),
    );
    assert_eq!(forced["online"], false);
}
