use std::fs;
use std::path::PathBuf;
use std::process::Command;
use std::time::{SystemTime, UNIX_EPOCH};

fn bin() -> &'static str {
    env!("CARGO_BIN_EXE_smithy")
}

fn manifest_path(relative: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join(relative)
}

fn unique_temp_path(name: &str) -> PathBuf {
    let stamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock should be after unix epoch")
        .as_nanos();
    std::env::temp_dir().join(format!("smithy-{name}-{stamp}"))
}

#[test]
fn search_command_emits_a_json_report() {
    let output = Command::new(bin())
        .args(["search", manifest_path("data/requests/example_search.json").to_string_lossy().as_ref()])
        .args(["--data-dir", manifest_path("data").to_string_lossy().as_ref()])
        .output()
        .expect("search should run");

    assert_eq!(output.status.code(), Some(0), "{}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8_lossy(&output.stdout);
    let payload: serde_json::Value = serde_json::from_str(&stdout).expect("search should emit json");
    assert!(payload["efr"].as_f64().is_some_and(|efr| efr > 0.0));
    assert_eq!(payload["weapon"]["class"], "GREATSWORD");
    assert_eq!(payload["armour"].as_array().map(Vec::len), Some(5));
    assert!(payload["stats"]["armour_sets"].as_u64().is_some_and(|sets| sets > 0));
    assert!(payload["damage"]["actual_total_damage"].is_number());
}

#[test]
fn search_command_accepts_yaml_and_parallel_flags() {
    let output = Command::new(bin())
        .args(["search", manifest_path("data/requests/example_search.yaml").to_string_lossy().as_ref()])
        .args(["--data-dir", manifest_path("data").to_string_lossy().as_ref()])
        .args(["--parallel", "--workers", "2", "--batches", "4"])
        .output()
        .expect("search should run");

    assert_eq!(output.status.code(), Some(0), "{}", String::from_utf8_lossy(&output.stderr));
    let payload: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("search should emit json");
    assert_eq!(payload["weapon"]["id"], "JAWBLADE");
}

#[test]
fn evaluate_command_reports_a_build() {
    let output = Command::new(bin())
        .args(["evaluate", manifest_path("data/builds/safi_brachy.json").to_string_lossy().as_ref()])
        .args(["--data-dir", manifest_path("data").to_string_lossy().as_ref()])
        .output()
        .expect("evaluate should run");

    assert_eq!(output.status.code(), Some(0), "{}", String::from_utf8_lossy(&output.stderr));
    let payload: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("evaluate should emit json");
    assert_eq!(payload["charm"], "Challenger Charm");
    assert_eq!(payload["decorations"].as_array().map(Vec::len), Some(7));
    assert!(payload.get("stats").is_none());
    assert!(payload["damage"].is_object());
}

#[test]
fn missing_request_is_a_runtime_failure() {
    let path = unique_temp_path("missing.json");
    let output = Command::new(bin())
        .args(["search", path.to_string_lossy().as_ref()])
        .args(["--data-dir", manifest_path("data").to_string_lossy().as_ref()])
        .output()
        .expect("search should run");

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("invalid search request"));
}

#[test]
fn search_errors_are_reported_by_the_search_stage() {
    let mut doc: serde_json::Value = serde_json::from_str(
        &fs::read_to_string(manifest_path("data/requests/example_search.json"))
            .expect("example request should be readable"),
    )
    .expect("example request should be json");
    doc["allow_low_rank"] = serde_json::json!(true);
    doc["allow_high_rank"] = serde_json::json!(false);
    doc["allow_master_rank"] = serde_json::json!(false);
    let path = unique_temp_path("low-rank.json");
    fs::write(&path, doc.to_string()).expect("fixture should be written");

    let output = Command::new(bin())
        .args(["search", path.to_string_lossy().as_ref()])
        .args(["--data-dir", manifest_path("data").to_string_lossy().as_ref()])
        .output()
        .expect("search should run");

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("search failed"), "{stderr}");
    assert!(!stderr.contains("invalid search request"));

    let _ = fs::remove_file(path);
}

#[test]
fn unknown_command_returns_usage() {
    let output = Command::new(bin())
        .arg("simulate")
        .output()
        .expect("smithy should run");

    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("usage: smithy"));
}

#[test]
fn validate_command_passes_on_the_shipped_catalogue() {
    let output = Command::new(bin())
        .args(["validate", manifest_path("data").to_string_lossy().as_ref()])
        .output()
        .expect("validate should run");

    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("validation passed"));
}

#[test]
fn validate_command_returns_non_zero_on_invalid_data() {
    let dir = unique_temp_path("catalogue");
    fs::create_dir_all(&dir).expect("fixture dir should be created");
    for file in ["decorations.json", "armour.json", "charms.json", "weapons.json", "misc_buffs.json"] {
        fs::copy(manifest_path("data").join(file), dir.join(file)).expect("fixture should be copied");
    }
    fs::write(
        dir.join("skills.json"),
        r#"{"skills": {"AGITATOR": {"name": "Agitator", "limit": 0}}}"#,
    )
    .expect("fixture should be written");

    let output = Command::new(bin())
        .args(["validate", dir.to_string_lossy().as_ref()])
        .output()
        .expect("validate should run");

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("validation failed"));

    let _ = fs::remove_dir_all(dir);
}
