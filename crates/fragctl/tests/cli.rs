//! End-to-end tests for the fragctl binary against a file-backed store.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use tempfile::TempDir;

fn fragctl(store: &TempDir, owner: &str) -> Command {
    let mut cmd = Command::cargo_bin("fragctl").unwrap();
    cmd.env("FRAGMENTS_PATH", store.path())
        .env("FRAGMENTS_BACKEND", "file")
        .env("FRAGMENTS_OWNER", owner)
        .env("API_URL", "http://localhost:8080")
        .env("RUST_LOG", "warn");
    cmd
}

/// Create a fragment from stdin and return its id.
fn create(store: &TempDir, owner: &str, content_type: &str, body: &str) -> String {
    let output = fragctl(store, owner)
        .args(["create", "--type", content_type])
        .write_stdin(body)
        .output()
        .unwrap();
    assert!(output.status.success(), "create failed: {:?}", output);

    let json: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["status"], "ok");
    json["fragment"]["id"].as_str().unwrap().to_string()
}

#[test]
fn create_reports_metadata_and_location() {
    let store = TempDir::new().unwrap();
    let output = fragctl(&store, "user1")
        .args(["create", "-t", "text/plain"])
        .write_stdin("hello")
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: Value = serde_json::from_slice(&output.stdout).unwrap();
    let id = json["fragment"]["id"].as_str().unwrap();
    assert_eq!(json["fragment"]["ownerId"], "user1");
    assert_eq!(json["fragment"]["type"], "text/plain");
    assert_eq!(json["fragment"]["size"], 5);
    assert_eq!(
        json["location"],
        format!("http://localhost:8080/v1/fragments/{}", id)
    );
}

#[test]
fn get_converts_markdown_to_html() {
    let store = TempDir::new().unwrap();
    let id = create(&store, "user1", "text/markdown", "# Title");

    fragctl(&store, "user1")
        .args(["get", &format!("{}.html", id)])
        .assert()
        .success()
        .stdout("<h1>Title</h1>\n")
        .stderr(predicate::str::contains("Content-Type: text/html"));

    fragctl(&store, "user1")
        .args(["get", &id])
        .assert()
        .success()
        .stdout("# Title");
}

#[test]
fn get_from_file_writes_output() {
    let store = TempDir::new().unwrap();
    let input = store.path().join("in.json");
    std::fs::write(&input, "{ \"a\" : [1, 2] }").unwrap();

    let output = fragctl(&store, "user1")
        .args(["create", "--type", "application/json", "--file"])
        .arg(&input)
        .output()
        .unwrap();
    assert!(output.status.success());
    let json: Value = serde_json::from_slice(&output.stdout).unwrap();
    let id = json["fragment"]["id"].as_str().unwrap().to_string();

    let out = store.path().join("out.txt");
    fragctl(&store, "user1")
        .args(["get", &format!("{}.txt", id), "--out"])
        .arg(&out)
        .assert()
        .success();
    assert_eq!(std::fs::read_to_string(&out).unwrap(), "{\"a\":[1,2]}");
}

#[test]
fn unsupported_type_is_rejected() {
    let store = TempDir::new().unwrap();
    fragctl(&store, "user1")
        .args(["create", "--type", "application/msword"])
        .write_stdin("doc")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error 415"));
}

#[test]
fn missing_owner_is_unauthorized() {
    let store = TempDir::new().unwrap();
    let mut cmd = Command::cargo_bin("fragctl").unwrap();
    cmd.env("FRAGMENTS_PATH", store.path())
        .env_remove("FRAGMENTS_OWNER")
        .arg("list")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error 401"));
}

#[test]
fn update_with_other_type_is_rejected() {
    let store = TempDir::new().unwrap();
    let id = create(&store, "user1", "text/plain", "original");

    fragctl(&store, "user1")
        .args(["update", &id, "--type", "text/markdown"])
        .write_stdin("# changed")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error 400"));

    fragctl(&store, "user1")
        .args(["get", &id])
        .assert()
        .success()
        .stdout("original");
}

#[test]
fn update_same_type_replaces_data() {
    let store = TempDir::new().unwrap();
    let id = create(&store, "user1", "text/plain", "original");

    let output = fragctl(&store, "user1")
        .args(["update", &id, "--type", "text/plain"])
        .write_stdin("replaced data")
        .output()
        .unwrap();
    assert!(output.status.success());
    let json: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["fragment"]["size"], 13);

    fragctl(&store, "user1")
        .args(["get", &id])
        .assert()
        .success()
        .stdout("replaced data");
}

#[test]
fn other_owner_cannot_read() {
    let store = TempDir::new().unwrap();
    let id = create(&store, "alice", "text/plain", "private");

    fragctl(&store, "bob")
        .args(["get", &id])
        .assert()
        .failure()
        .stderr(predicate::str::contains("error 404"));
}

#[test]
fn info_lists_formats() {
    let store = TempDir::new().unwrap();
    let id = create(&store, "user1", "text/markdown", "*hi*");

    let output = fragctl(&store, "user1").args(["info", &id]).output().unwrap();
    assert!(output.status.success());
    let json: Value = serde_json::from_slice(&output.stdout).unwrap();
    let formats: Vec<&str> = json["formats"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|f| f.as_str())
        .collect();
    assert!(formats.contains(&"text/html"));
    assert!(formats.contains(&"text/plain"));
}

#[test]
fn list_and_delete() {
    let store = TempDir::new().unwrap();
    let first = create(&store, "user1", "text/plain", "one");
    let second = create(&store, "user1", "text/html", "<p>two</p>");

    let output = fragctl(&store, "user1").arg("list").output().unwrap();
    let json: Value = serde_json::from_slice(&output.stdout).unwrap();
    let ids = json["fragments"].as_array().unwrap();
    assert_eq!(ids.len(), 2);
    assert!(ids.contains(&Value::from(first.clone())));
    assert!(ids.contains(&Value::from(second.clone())));

    fragctl(&store, "user1")
        .args(["delete", &first])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"ok\""));

    fragctl(&store, "user1")
        .args(["get", &first])
        .assert()
        .failure()
        .stderr(predicate::str::contains("error 404"));

    let output = fragctl(&store, "user1").args(["list", "--expand"]).output().unwrap();
    let json: Value = serde_json::from_slice(&output.stdout).unwrap();
    let fragments = json["fragments"].as_array().unwrap();
    assert_eq!(fragments.len(), 1);
    assert_eq!(fragments[0]["id"], second.as_str());
    assert_eq!(fragments[0]["type"], "text/html");
}

#[test]
fn list_for_new_owner_is_empty() {
    let store = TempDir::new().unwrap();
    let output = fragctl(&store, "nobody").arg("list").output().unwrap();
    assert!(output.status.success());
    let json: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["fragments"], serde_json::json!([]));
}

#[test]
fn storage_failure_is_reported_as_retryable() {
    let store = TempDir::new().unwrap();
    // A regular file where the store directory should be.
    let blocked = store.path().join("blocked");
    std::fs::write(&blocked, "not a directory").unwrap();

    let mut cmd = Command::cargo_bin("fragctl").unwrap();
    cmd.env("FRAGMENTS_PATH", &blocked)
        .env("FRAGMENTS_BACKEND", "file")
        .env("FRAGMENTS_OWNER", "user1")
        .args(["create", "--type", "text/plain"])
        .write_stdin("hello")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error 500"))
        .stderr(predicate::str::contains("may be retried"));
}

#[test]
fn long_id_is_not_found() {
    let store = TempDir::new().unwrap();
    fragctl(&store, "user1")
        .args(["get", &"a".repeat(200)])
        .assert()
        .failure()
        .stderr(predicate::str::contains("error 404"));
}
