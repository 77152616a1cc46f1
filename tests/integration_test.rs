//! Integration tests for the order ledger CLI.
//!
//! These tests run the actual binary and verify output against expected CSV files.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::io::Write;
use tempfile::NamedTempFile;

/// Get path to test data file
fn test_data_path(filename: &str) -> String {
    format!("tests/data/{}", filename)
}

/// Run the binary with the given arguments and return stdout
fn run_ledger(args: &[&str]) -> String {
    let mut cmd = Command::cargo_bin("order-ledger").unwrap();
    let assert = cmd.args(args).assert().success();
    String::from_utf8(assert.get_output().stdout.clone()).unwrap()
}

/// Normalize CSV for comparison (trim whitespace, drop blank lines)
fn normalize_csv(csv: &str) -> Vec<String> {
    csv.lines()
        .map(|l| l.trim().to_string())
        .filter(|l| !l.is_empty())
        .collect()
}

fn assert_matches_expected(input: &str, expected: &str) {
    let output = run_ledger(&[&test_data_path(input)]);
    let expected = fs::read_to_string(test_data_path(expected)).unwrap();

    assert_eq!(normalize_csv(&output), normalize_csv(&expected));
}

#[test]
fn test_sample_a_orders_with_abonos() {
    assert_matches_expected("sample_a.csv", "expected_a.csv");
}

#[test]
fn test_sample_b_rejected_payments() {
    assert_matches_expected("sample_b_rejections.csv", "expected_b.csv");
}

#[test]
fn test_sample_c_whitespace_handling() {
    assert_matches_expected("sample_c_whitespace.csv", "expected_c.csv");
}

#[test]
fn test_stats_this_month() {
    let output = run_ledger(&[
        &test_data_path("sample_a.csv"),
        "--stats",
        "--as-of",
        "2026-03-15",
    ]);
    let lines = normalize_csv(&output);

    assert_eq!(lines[0], "metric,value");
    for expected in [
        "period,this-month",
        "period_orders,2",
        "period_revenue,$205.000",
        "period_collected,$125.000",
        "total_orders,3",
        "complete_orders,2",
        "incomplete_orders,1",
        "revenue,$206.234",
        "collected,$126.234",
        "collection_rate,61.2%",
        "outstanding_orders,1",
        "outstanding_balance,$80.000",
        "status_recibido,1 (33.3%)",
        "status_en_proceso,1 (33.3%)",
        "status_listo,0 (0.0%)",
        "status_entregado,1 (33.3%)",
    ] {
        assert!(
            lines.iter().any(|l| l == expected),
            "missing '{}' in:\n{}",
            expected,
            output
        );
    }
}

#[test]
fn test_stats_previous_month() {
    let output = run_ledger(&[
        &test_data_path("sample_a.csv"),
        "--stats",
        "--period",
        "previous-month",
        "--as-of",
        "2026-03-15",
    ]);

    assert!(output.contains("period_orders,1\n"));
    assert!(output.contains("period_revenue,$1.234\n"));
}

#[test]
fn test_ad_hoc_input_file() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "type,order,client,ref,amount,quantity,date,note").unwrap();
    writeln!(file, "item,9,,1,2.000,1,,Teclado").unwrap();
    writeln!(file, "item,9,,2,\"1.500,50\",2,,Mouse").unwrap();
    writeln!(file, "settle,9,,1,,,,").unwrap();
    file.flush().unwrap();

    let output = run_ledger(&[file.path().to_str().unwrap()]);
    assert!(output.contains("9,,recibido,2,$5.000,$5.000,$0,true"));
}

#[test]
fn test_missing_file_error() {
    let mut cmd = Command::cargo_bin("order-ledger").unwrap();
    cmd.arg("nonexistent.csv")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn test_missing_argument_error() {
    let mut cmd = Command::cargo_bin("order-ledger").unwrap();
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Missing input file"));
}

#[test]
fn test_unknown_flag_error() {
    let mut cmd = Command::cargo_bin("order-ledger").unwrap();
    cmd.args([test_data_path("sample_a.csv").as_str(), "--period", "decade"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid argument --period"));
}

#[test]
fn test_output_has_correct_header() {
    let output = run_ledger(&[&test_data_path("sample_a.csv")]);
    assert!(output.starts_with("order,client,status,items,total,paid,balance,complete"));
}
