//! Command-line integration tests.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;

const RECEIPT: &str = "AVENUE SUPERMARTS LTD - DMART\nBill dt 15/03/2024\nTotal Amount: Rs. 1,234.50\n";

fn rcpt() -> Command {
    Command::cargo_bin("rcpt").unwrap()
}

#[test]
fn process_text_receipt_as_json() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("receipt.txt");
    fs::write(&input, RECEIPT).unwrap();
    let config = dir.path().join("config.json");
    fs::write(&config, "{}").unwrap();

    rcpt()
        .arg("--config")
        .arg(&config)
        .arg("process")
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""vendor": "Dmart""#))
        .stdout(predicate::str::contains(r#""date": "2024-03-15""#))
        .stdout(predicate::str::contains(r#""amount": "1234.50""#))
        .stdout(predicate::str::contains(r#""category": "Groceries""#))
        .stdout(predicate::str::contains(r#""currency": "INR""#));
}

#[test]
fn process_writes_csv_output_file() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("receipt.txt");
    fs::write(&input, "Corner Cafe\nCoffee 3.50 Muffin 4.25\n").unwrap();
    let output = dir.path().join("out.csv");
    let config = dir.path().join("config.json");
    fs::write(&config, r#"{"extraction": {"default_currency": "GBP"}}"#).unwrap();

    rcpt()
        .arg("--config")
        .arg(&config)
        .args(["process", "--format", "csv", "--output"])
        .arg(&output)
        .arg(&input)
        .assert()
        .success();

    let csv = fs::read_to_string(&output).unwrap();
    assert_eq!(
        csv,
        "vendor,date,amount,category,currency\nUnknown,,4.25,Others,GBP\n"
    );
}

#[test]
fn process_validate_reports_zero_amount() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("empty.txt");
    fs::write(&input, "").unwrap();
    let config = dir.path().join("config.json");
    fs::write(&config, "{}").unwrap();

    rcpt()
        .arg("--config")
        .arg(&config)
        .args(["process", "--validate"])
        .arg(&input)
        .assert()
        .success()
        .stderr(predicate::str::contains("Amount must be positive"))
        .stdout(predicate::str::contains(r#""vendor": "Unknown""#));
}

#[test]
fn process_rejects_unsupported_format() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("receipt.docx");
    fs::write(&input, RECEIPT).unwrap();
    let config = dir.path().join("config.json");
    fs::write(&config, "{}").unwrap();

    rcpt()
        .arg("--config")
        .arg(&config)
        .arg("process")
        .arg(&input)
        .assert()
        .failure()
        .stderr(predicate::str::contains("unsupported file format"));
}

#[test]
fn batch_writes_outputs_and_summary() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), RECEIPT).unwrap();
    fs::write(dir.path().join("b.txt"), "Flipkart order\nTotal $ 20\n").unwrap();
    fs::write(dir.path().join("notes.md"), "ignored").unwrap();
    let out = dir.path().join("out");
    let config = dir.path().join("config.json");
    fs::write(&config, "{}").unwrap();

    rcpt()
        .arg("--config")
        .arg(&config)
        .arg("batch")
        .arg(format!("{}/*", dir.path().display()))
        .arg("--output-dir")
        .arg(&out)
        .args(["--summary", "-j", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Found 2 files"));

    assert!(out.join("a.json").exists());
    let b = fs::read_to_string(out.join("b.json")).unwrap();
    assert!(b.contains(r#""currency": "USD""#));

    let summary = fs::read_to_string(out.join("summary.csv")).unwrap();
    let lines: Vec<&str> = summary.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[1].starts_with("a.txt,success,Dmart,2024-03-15,1234.50,Groceries,INR,text,1,"));
    assert!(lines[2].starts_with("b.txt,success,Flipkart,,20,Others,USD,text,1,"));
}

#[test]
fn batch_keeps_outputs_of_same_named_files() {
    let dir = tempfile::tempdir().unwrap();
    for sub in ["x", "y"] {
        fs::create_dir(dir.path().join(sub)).unwrap();
    }
    fs::write(dir.path().join("x").join("receipt.txt"), RECEIPT).unwrap();
    fs::write(dir.path().join("y").join("receipt.txt"), "Flipkart order\nTotal $ 20\n").unwrap();
    let out = dir.path().join("out");
    let config = dir.path().join("config.json");
    fs::write(&config, "{}").unwrap();

    rcpt()
        .arg("--config")
        .arg(&config)
        .arg("batch")
        .arg(format!("{}/*/receipt.txt", dir.path().display()))
        .arg("--output-dir")
        .arg(&out)
        .assert()
        .success();

    let first = fs::read_to_string(out.join("receipt.txt.json")).unwrap();
    let second = fs::read_to_string(out.join("receipt.txt-2.json")).unwrap();
    assert!(first.contains(r#""vendor": "Dmart""#));
    assert!(second.contains(r#""vendor": "Flipkart""#));
}

#[test]
fn config_set_and_get_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("nested").join("config.json");

    rcpt()
        .arg("--config")
        .arg(&config)
        .args(["config", "set", "ocr.timeout_secs", "30"])
        .assert()
        .success();

    rcpt()
        .arg("--config")
        .arg(&config)
        .args(["config", "get", "ocr.timeout_secs"])
        .assert()
        .success()
        .stdout(predicate::str::diff("30\n"));

    rcpt()
        .arg("--config")
        .arg(&config)
        .args(["config", "set", "ocr.no_such_key", "1"])
        .assert()
        .failure();
}

#[test]
fn config_path_reports_status() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.json");

    rcpt()
        .arg("--config")
        .arg(&config)
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("not created"));
}
