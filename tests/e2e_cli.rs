
use assert_cmd::prelude::*;
use cli_helpers::{base_cmd, data_folder, run_cmd, stdout_of, write_config};
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

#[test]
fn doc_number_set_then_show() {
    let home = TempDir::new().expect("failed to create temp home");
    let config = write_config(&home, "");

    run_cmd(&home, &config, &["doc-number", "set", "20250400"]).unwrap();
    assert_eq!(
        fs::read_to_string(data_folder(&home).join("cash_receipt_num.txt")).unwrap(),
        "20250400"
    );

    let output = run_cmd(&home, &config, &["doc-number", "show"]).unwrap();
    assert_eq!(stdout_of(&output).trim(), "20250400");
}

#[test]
fn doc_number_show_seeds_from_date_without_writing() {
    let home = TempDir::new().expect("failed to create temp home");
    let config = write_config(&home, "");

    let output = run_cmd(&home, &config, &["doc-number", "show"]).unwrap();
    let shown = stdout_of(&output).trim().to_string();
    assert_eq!(shown.len(), 8, "expected a YYYYMMDD seed, got {}", shown);
    assert!(shown.chars().all(|c| c.is_ascii_digit()));
    assert!(!data_folder(&home).join("cash_receipt_num.txt").exists());
}

#[test]
fn resolve_prints_supplier_and_source_without_color() {
    let home = TempDir::new().expect("failed to create temp home");
    let config = write_config(
        &home,
        "[[prefix_rules]]\nprefix = \"200\"\nsupplier = \"Vietinis ūkis\"\n",
    );
    fs::write(
        data_folder(&home).join("mapping.csv"),
        "product_code,supplier_name\n4770001000012,Pieno žvaigždės\n",
    )
    .unwrap();

    let mut cmd = base_cmd(&home, &config);
    cmd.args(["resolve", "4770001000012", "2000123", "SVER-01"]);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Pieno žvaigždės"))
        .stdout(predicate::str::contains("mapping"))
        .stdout(predicate::str::contains("Vietinis ūkis"))
        .stdout(predicate::str::contains("prefix"))
        .stdout(predicate::str::contains("Nežinomas"))
        .stdout(predicate::str::contains("\u{001b}[").not());
}

#[test]
fn missing_config_fails() {
    let home = TempDir::new().expect("failed to create temp home");
    let config = home.path().join("nope.toml");

    let mut cmd = base_cmd(&home, &config);
    cmd.args(["doc-number", "show"]);

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read config file"));
}

#[test]
fn week_out_of_range_is_rejected() {
    let home = TempDir::new().expect("failed to create temp home");
    let config = write_config(&home, "");

    let mut cmd = base_cmd(&home, &config);
    cmd.args(["weekly", "--week", "54"]);

    cmd.assert().failure();
}
