use std::path::PathBuf;
use std::process::Command;
use std::time::{SystemTime, UNIX_EPOCH};

fn temp_path(file_name: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir().join(format!("earnit-{nanos}-{file_name}"))
}

fn earnit(args: &[&str], store_path: &PathBuf) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_earnit"))
        .args(args)
        .env("EARNIT_STORE_PATH", store_path)
        .env("EARNIT_CONFIG_PATH", temp_path("no-config.json"))
        .env("EARNIT_DISABLE_NOTIFICATIONS", "1")
        .output()
        .expect("failed to run earnit")
}

fn read_store(path: &PathBuf) -> serde_json::Value {
    serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
}

#[test]
fn init_creates_account_file() {
    let store_path = temp_path("init.json");
    let output = earnit(&["init", "--name", "Sam", "--currency", "€"], &store_path);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Welcome, Sam!"));

    let stored = read_store(&store_path);
    std::fs::remove_file(&store_path).ok();

    assert_eq!(stored["schema_version"], 1);
    assert_eq!(stored["user"]["name"], "Sam");
    assert_eq!(stored["user"]["currency_symbol"], "€");
    assert_eq!(stored["user"]["total_earned"], 0.0);
    assert!(stored["user"]["tasks"].as_array().unwrap().is_empty());
    assert!(stored["alert"]["interval_seconds"].is_null());
}

#[test]
fn init_uses_alert_override_for_new_accounts() {
    let store_path = temp_path("init-alert.json");
    let output = earnit(
        &["init", "--name", "Sam", "--config-override", "alert_minutes=20"],
        &store_path,
    );

    assert!(output.status.success());
    let stored = read_store(&store_path);
    std::fs::remove_file(&store_path).ok();

    assert_eq!(stored["user"]["currency_symbol"], "$");
    assert_eq!(stored["alert"]["interval_seconds"], 1200);
}

#[test]
fn init_refuses_to_overwrite() {
    let store_path = temp_path("init-twice.json");
    assert!(earnit(&["init", "--name", "Sam"], &store_path).status.success());

    let output = earnit(&["init", "--name", "Alex"], &store_path);
    let stored = read_store(&store_path);
    std::fs::remove_file(&store_path).ok();

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("ERROR: invalid_input"));
    assert_eq!(stored["user"]["name"], "Sam");
}

#[test]
fn init_rejects_blank_name() {
    let store_path = temp_path("init-blank.json");
    let output = earnit(&["init", "--name", "  "], &store_path);

    assert!(!output.status.success());
    assert!(!store_path.exists());
}

#[test]
fn corrupt_account_is_reported_and_can_be_replaced() {
    let store_path = temp_path("init-corrupt.json");
    std::fs::write(&store_path, "{ definitely not json").unwrap();

    let output = earnit(&["status"], &store_path);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("ERROR: storage_corrupt"));
    assert!(stderr.contains("--force"));

    let output = earnit(&["init", "--name", "Sam", "--force"], &store_path);
    assert!(output.status.success());

    let mut backup = store_path.clone().into_os_string();
    backup.push(".bak");
    let backup = PathBuf::from(backup);
    let kept = std::fs::read_to_string(&backup).unwrap();
    let stored = read_store(&store_path);
    std::fs::remove_file(&store_path).ok();
    std::fs::remove_file(&backup).ok();

    assert_eq!(kept, "{ definitely not json");
    assert_eq!(stored["user"]["name"], "Sam");
}

#[test]
fn oversized_stored_interval_is_reported_as_corrupt() {
    let store_path = temp_path("init-huge-interval.json");
    assert!(earnit(&["init", "--name", "Sam"], &store_path).status.success());

    let mut stored = read_store(&store_path);
    stored["alert"]["interval_seconds"] = serde_json::json!(i64::MAX);
    stored["alert"]["last_alert_at"] = serde_json::json!("2030-01-01T00:00:00Z");
    std::fs::write(&store_path, stored.to_string()).unwrap();

    let output = earnit(&["status"], &store_path);
    std::fs::remove_file(&store_path).ok();

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("ERROR: storage_corrupt"));
}
