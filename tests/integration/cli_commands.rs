#![allow(missing_docs)]

use std::fs;

use assert_cmd::cargo::cargo_bin_cmd;
use serde_json::Value;
use tempfile::TempDir;

fn empty_config(dir: &TempDir) -> String {
    let path = dir.path().join("config.toml");
    fs::write(&path, "").expect("write config");
    path.to_string_lossy().into_owned()
}

#[test]
fn bench_json_reports_each_tree_and_size() {
    let dir = TempDir::new().expect("tempdir");
    let config = empty_config(&dir);
    let output = cargo_bin_cmd!("ordtrees")
        .args([
            "--format",
            "json",
            "--config",
            &config,
            "bench",
            "--trees",
            "splay,red-black,btree:3",
            "--sizes",
            "50,100",
            "--seed",
            "42",
        ])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let reports: Value = serde_json::from_slice(&output).expect("json output");
    let reports = reports.as_array().expect("array of runs");
    assert_eq!(reports.len(), 6);
    assert_eq!(reports[0]["tree"], "splay");
    assert_eq!(reports[0]["experiment"], "insert");
    assert_eq!(reports[0]["elements"], 100);
    assert_eq!(reports[3]["elements"], 200);
    assert_eq!(reports[5]["tree"], "btree:3");
    assert_eq!(reports[5]["final_len"], 200);
}

#[test]
fn bench_reads_config_file_and_flags_override_it() {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("config.toml");
    fs::write(
        &path,
        r#"
[bench]
sizes = [20]
trees = ["2-3-4"]
experiment = "insert-delete-insert"
"#,
    )
    .expect("write config");

    let output = cargo_bin_cmd!("ordtrees")
        .args(["--format", "json", "--config"])
        .arg(&path)
        .args(["bench", "--sizes", "30"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let reports: Value = serde_json::from_slice(&output).expect("json output");
    let reports = reports.as_array().expect("array of runs");
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0]["tree"], "2-3-4");
    assert_eq!(reports[0]["experiment"], "insert-delete-insert");
    assert_eq!(reports[0]["elements"], 60);
    assert_eq!(reports[0]["final_len"], 30);
}

#[test]
fn stress_text_reports_success() {
    let dir = TempDir::new().expect("tempdir");
    let config = empty_config(&dir);
    let output = cargo_bin_cmd!("ordtrees")
        .args([
            "--config", &config, "stress", "--size", "100", "--rounds", "2",
        ])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let text = String::from_utf8(output).expect("utf8");
    assert_eq!(text.lines().count(), 10);
    assert!(text.lines().all(|line| line.contains(" ok ")), "{text}");
    assert!(!text.contains("FAILED"));
}

#[test]
fn stress_json_includes_counts() {
    let dir = TempDir::new().expect("tempdir");
    let config = empty_config(&dir);
    let output = cargo_bin_cmd!("ordtrees")
        .args([
            "--format",
            "json",
            "--config",
            &config,
            "stress",
            "--trees",
            "red-black",
            "--size",
            "64",
            "--rounds",
            "1",
        ])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let reports: Value = serde_json::from_slice(&output).expect("json output");
    let report = &reports[0];
    assert_eq!(report["tree"], "red-black");
    assert_eq!(report["success"], true);
    assert_eq!(report["counts"]["inserts"], 128);
    assert_eq!(report["counts"]["deletes"], 64);
}

#[test]
fn unknown_tree_is_rejected() {
    cargo_bin_cmd!("ordtrees")
        .args(["bench", "--trees", "avl", "--sizes", "10"])
        .assert()
        .failure();
}

#[test]
fn invalid_delete_fraction_exits_with_error() {
    let dir = TempDir::new().expect("tempdir");
    let config = empty_config(&dir);
    let output = cargo_bin_cmd!("ordtrees")
        .args([
            "--config",
            &config,
            "bench",
            "--sizes",
            "10",
            "--delete-fraction",
            "2.0",
        ])
        .assert()
        .code(1)
        .get_output()
        .stderr
        .clone();
    let stderr = String::from_utf8(output).expect("utf8");
    assert!(stderr.contains("delete fraction"), "{stderr}");
}

#[test]
fn malformed_config_exits_with_error() {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("config.toml");
    fs::write(&path, "[bench\nsizes = 3").expect("write config");
    cargo_bin_cmd!("ordtrees")
        .arg("--config")
        .arg(&path)
        .args(["bench", "--sizes", "10"])
        .assert()
        .code(1);
}
