//! Command-line integration tests.

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const BUY_CSV: &str = "datetime;price;shares;tax;fee;type;isin\n\
                       2021-01-05T10:00:00.000Z;5.00;10;0;0;Buy;US0378331005\n";

const UNKNOWN_CSV: &str = "name;value\nfoo;42\n";

fn actimp() -> Command {
    Command::cargo_bin("actimp").unwrap()
}

fn write(dir: &Path, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn test_handlers_lists_builtin_handlers() {
    actimp()
        .arg("handlers")
        .assert()
        .success()
        .stdout(predicate::str::contains("sbroker"))
        .stdout(predicate::str::contains("quirion"))
        .stdout(predicate::str::contains("generic_csv"))
        .stdout(predicate::str::contains("Accepted extensions: pdf, csv"));
}

#[test]
fn test_parse_csv_as_json() {
    let dir = TempDir::new().unwrap();
    let input = write(dir.path(), "buy.csv", BUY_CSV);

    actimp()
        .arg("parse")
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"file\":\"buy.csv\""))
        .stdout(predicate::str::contains("\"status\":0"))
        .stdout(predicate::str::contains("\"successful\":true"))
        .stdout(predicate::str::contains("\"amount\":50.0"));
}

#[test]
fn test_parse_csv_as_csv_to_file() {
    let dir = TempDir::new().unwrap();
    let input = write(dir.path(), "buy.csv", BUY_CSV);
    let output = dir.path().join("out.csv");

    actimp()
        .args(["parse", "-f", "csv", "-o"])
        .arg(&output)
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("Output written to"));

    let written = fs::read_to_string(&output).unwrap();
    assert!(written.starts_with("broker,type,date,datetime"));
    assert!(written.contains("generic_csv,Buy,2021-01-05"));
}

#[test]
fn test_parse_text_format() {
    let dir = TempDir::new().unwrap();
    let input = write(dir.path(), "buy.csv", BUY_CSV);

    actimp()
        .args(["parse", "--format", "text"])
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("Status: 0 (success)"))
        .stdout(predicate::str::contains("US0378331005"));
}

#[test]
fn test_parse_unknown_document_fails_with_status() {
    let dir = TempDir::new().unwrap();
    let input = write(dir.path(), "export.csv", UNKNOWN_CSV);

    actimp()
        .arg("parse")
        .arg(&input)
        .assert()
        .failure()
        .stdout(predicate::str::contains("\"status\":1"))
        .stderr(predicate::str::contains("unknown implementation"));
}

#[test]
fn test_parse_unsupported_extension() {
    let dir = TempDir::new().unwrap();
    let input = write(dir.path(), "scan.png", "not an image");

    actimp()
        .arg("parse")
        .arg(&input)
        .assert()
        .failure()
        .stdout(predicate::str::contains("\"status\":4"));
}

#[test]
fn test_parse_missing_file() {
    actimp()
        .args(["parse", "does-not-exist.pdf"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Input file not found"));
}

#[test]
fn test_parse_with_config_file() {
    let dir = TempDir::new().unwrap();
    let input = write(dir.path(), "buy.csv", &BUY_CSV.replace(';', ","));
    let config = write(
        dir.path(),
        "config.json",
        r#"{"document": {"delimiter": ","}, "output": {"format": "text"}}"#,
    );

    actimp()
        .arg("--config")
        .arg(&config)
        .arg("parse")
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("Status: 0 (success)"))
        .stdout(predicate::str::contains("10 @ 5.00 = 50.00 EUR"));
}

#[test]
fn test_parse_extension_not_accepted_by_config() {
    let dir = TempDir::new().unwrap();
    let input = write(dir.path(), "buy.csv", BUY_CSV);
    let config = write(
        dir.path(),
        "config.json",
        r#"{"document": {"accepted_extensions": ["pdf"]}}"#,
    );

    actimp()
        .arg("--config")
        .arg(&config)
        .arg("parse")
        .arg(&input)
        .assert()
        .failure()
        .stdout(predicate::str::contains("\"status\":4"))
        .stderr(predicate::str::contains("unsupported file type"));
}

#[test]
fn test_batch_with_summary() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "a.csv", BUY_CSV);
    write(dir.path(), "b.csv", UNKNOWN_CSV);
    write(dir.path(), "notes.md", "ignored");
    let out = dir.path().join("out");

    actimp()
        .arg("batch")
        .arg(format!("{}/*", dir.path().display()))
        .arg("-o")
        .arg(&out)
        .args(["--summary", "--continue-on-error"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Found 2 files to import"))
        .stdout(predicate::str::contains("1 successful, 1 failed"));

    assert!(out.join("a.json").exists());
    assert!(out.join("b.json").exists());

    let summary = fs::read_to_string(out.join("summary.csv")).unwrap();
    assert!(summary.contains("a.csv,0,true,1,"));
    assert!(summary.contains("b.csv,1,false,0,"));
}

#[test]
fn test_batch_stops_on_error() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "bad.csv", UNKNOWN_CSV);

    actimp()
        .arg("batch")
        .arg(format!("{}/*.csv", dir.path().display()))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Import failed"));
}

#[test]
fn test_batch_without_matches() {
    let dir = TempDir::new().unwrap();

    actimp()
        .arg("batch")
        .arg(format!("{}/*.pdf", dir.path().display()))
        .assert()
        .failure()
        .stderr(predicate::str::contains("No matching files found"));
}

#[test]
fn test_config_init_and_show() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("config.json");

    actimp()
        .args(["config", "init", "--output"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Created configuration file"))
        .stdout(predicate::str::contains("extensions: pdf, csv"));
    assert!(path.exists());

    actimp()
        .args(["config", "init", "--output"])
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));

    actimp()
        .arg("--config")
        .arg(&path)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Accepted extensions: pdf, csv"))
        .stdout(predicate::str::contains("Delimiter: ';'"))
        .stdout(predicate::str::contains("Report format: json"));
}

#[test]
fn test_config_init_with_import_settings() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.json");

    actimp()
        .args(["config", "init", "-e", ".CSV", "-e", "txt", "-d", ",", "-f", "csv", "--output"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("extensions: csv, txt"));

    actimp()
        .arg("--config")
        .arg(&path)
        .args(["config", "show", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"delimiter\": \",\""))
        .stdout(predicate::str::contains("\"format\": \"csv\""));

    // The written settings drive the import: comma rows, csv report.
    let input = write(dir.path(), "buy.csv", &BUY_CSV.replace(';', ","));
    actimp()
        .arg("--config")
        .arg(&path)
        .arg("parse")
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::starts_with("broker,type,date"))
        .stdout(predicate::str::contains("US0378331005"));

    let pdf = write(dir.path(), "statement.pdf", "not a pdf");
    actimp()
        .arg("--config")
        .arg(&path)
        .arg("parse")
        .arg(&pdf)
        .assert()
        .failure()
        .stderr(predicate::str::contains("unsupported file type (status 4)"));
}

#[test]
fn test_config_init_rejects_non_ascii_delimiter() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.json");

    actimp()
        .args(["config", "init", "-d", "§", "--output"])
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("not an ASCII character"));
    assert!(!path.exists());
}

#[test]
fn test_config_path() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.json");

    actimp()
        .arg("--config")
        .arg(&path)
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::diff(format!("{}\n", path.display())));
}
