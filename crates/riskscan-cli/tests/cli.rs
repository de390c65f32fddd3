use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::tempdir;

fn riskscan() -> Command {
    Command::cargo_bin("riskscan").unwrap()
}

#[test]
fn test_template_to_stdout() {
    riskscan()
        .arg("template")
        .assert()
        .success()
        .stdout(predicate::str::starts_with(
            "total_sales_count,total_sales_volume,cnp_txn_count",
        ));
}

#[test]
fn test_process_csv_json() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("march.csv");
    fs::write(&input, "Chargeback Count,Visa Count,Period\n0,40,2024-03\n0,2,\n").unwrap();

    riskscan()
        .arg("process")
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"detectedFormat\""))
        .stdout(predicate::str::contains("\"tc15Count\": {\n      \"status\": \"zero\""))
        .stdout(predicate::str::contains("\"requiresManualEntry\": false"));
}

#[test]
fn test_process_text_output_to_file() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("stmt.csv");
    let output = dir.path().join("stmt.txt");
    fs::write(&input, "total_sales_count,tc40_count\n500,2\n").unwrap();

    riskscan()
        .args(["process", "-f", "text", "-o"])
        .arg(&output)
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("Output written to"));

    let text = fs::read_to_string(&output).unwrap();
    assert!(text.contains("Format: csv"));
    assert!(text.contains("Fraud reports (TC40): 2"));
    assert!(text.contains("proxy"));
}

#[test]
fn test_process_missing_file_fails() {
    riskscan()
        .args(["process", "does-not-exist.pdf"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Input file not found"));
}

#[test]
fn test_process_unsupported_type_fails() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("notes.txt");
    fs::write(&input, "hello").unwrap();

    riskscan()
        .arg("process")
        .arg(&input)
        .assert()
        .failure()
        .stderr(predicate::str::contains("unsupported input type"));
}

#[test]
fn test_batch_isolates_failures_and_writes_summary() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("feb.csv"), "tc15_count,statement_period\n3,2024-02\n").unwrap();
    fs::write(dir.path().join("bad.pdf"), "%PDF-1.4 truncated").unwrap();
    fs::write(dir.path().join("jan.csv"), "tc15_count,statement_period\n1,2024-01\n").unwrap();
    let out = dir.path().join("out");
    let pattern = format!("{}/*", dir.path().display());

    riskscan()
        .args(["batch", &pattern, "--summary", "-j", "2", "-o"])
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("Found 3 files to process"))
        .stdout(predicate::str::contains("Failed files:"))
        .stdout(predicate::str::contains("bad.pdf"));

    assert!(out.join("jan.json").exists());
    assert!(out.join("feb.json").exists());
    assert!(!out.join("bad.json").exists());

    let summary = fs::read_to_string(out.join("summary.csv")).unwrap();
    let rows: Vec<&str> = summary.lines().collect();
    assert_eq!(rows.len(), 4);
    assert!(rows[0].starts_with("filename,status,detected_format"));
    assert!(rows[1].starts_with("jan.csv,success,csv"));
    assert!(rows[2].starts_with("feb.csv,success,csv"));
    assert!(rows[3].starts_with("bad.pdf,error"));
}

#[test]
fn test_batch_without_matches_fails() {
    let dir = tempdir().unwrap();
    let pattern = format!("{}/*.pdf", dir.path().display());

    riskscan()
        .args(["batch", &pattern])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No matching files found"));
}

#[test]
fn test_config_init_get_set() {
    let dir = tempdir().unwrap();
    let config = dir.path().join("config.json");
    let config_arg = config.to_str().unwrap();

    riskscan()
        .args(["--config", config_arg, "config", "init"])
        .assert()
        .success();
    assert!(config.exists());

    riskscan()
        .args(["--config", config_arg, "config", "get", "pdf.header_window"])
        .assert()
        .success()
        .stdout("40\n");

    riskscan()
        .args(["--config", config_arg, "config", "set", "batch.jobs", "8"])
        .assert()
        .success();

    riskscan()
        .args(["--config", config_arg, "config", "get", "batch.jobs"])
        .assert()
        .success()
        .stdout("8\n");

    riskscan()
        .args(["--config", config_arg, "config", "set", "batch.jobs", "many"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid value for batch.jobs"));

    riskscan()
        .args(["--config", config_arg, "config", "init"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}
