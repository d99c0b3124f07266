//! Integration tests for headless mode.

use super::common::Sandbox;

#[test]
fn test_headless_exec_prints_table() {
    let sandbox = Sandbox::new();
    let (code, stdout, stderr) =
        sandbox.run(&["--headless", "--exec", "SELECT 1 AS one, 'a' AS letter"]);

    assert_eq!(code, 0, "stderr: {stderr}");
    assert!(stdout.contains("│ one  │ letter │"));
    assert!(stdout.contains("│ 1    │ a      │"));
    assert!(stdout.trim_end().ends_with("1 row"));
}

#[test]
fn test_headless_engine_error_exits_non_zero() {
    let sandbox = Sandbox::new();
    let (code, stdout, stderr) = sandbox.run(&["--headless", "--exec", "SELECT * FROM nope"]);

    assert_eq!(code, 1);
    assert!(stdout.is_empty());
    assert!(stderr.contains("no such table: nope"));
}

#[test]
fn test_headless_threshold_and_show_all() {
    let sandbox = Sandbox::new();
    let sql = "WITH RECURSIVE s(n) AS (SELECT 1 UNION ALL SELECT n + 1 FROM s WHERE n < 30) SELECT n FROM s";

    let (code, stdout, _) = sandbox.run(&["--headless", "--threshold", "10", "--exec", sql]);
    assert_eq!(code, 0);
    assert!(stdout.contains("showing 10 of 30 rows"));

    let (code, stdout, _) = sandbox.run(&[
        "--headless",
        "--threshold",
        "10",
        "--show-all",
        "--exec",
        sql,
    ]);
    assert_eq!(code, 0);
    assert!(stdout.contains("30 rows"));
    assert!(!stdout.contains("showing"));
}

#[test]
fn test_headless_save_then_load() {
    let sandbox = Sandbox::new();
    let saved = sandbox.path("planets.db");
    let saved_arg = saved.to_string_lossy().to_string();

    let (code, _, stderr) = sandbox.run(&[
        "--headless",
        "--exec",
        "CREATE TABLE planets (name TEXT); INSERT INTO planets VALUES ('Mercury')",
        "--save",
        &saved_arg,
    ]);
    assert_eq!(code, 0, "stderr: {stderr}");
    assert!(saved.exists());
    assert!(stderr.contains("Saved "));

    // Loading runs the default schema query.
    let (code, stdout, _) = sandbox.run(&[&saved_arg, "--headless"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("planets"));
    assert!(stdout.contains("CREATE TABLE planets"));
}

#[test]
fn test_headless_json_output() {
    let sandbox = Sandbox::new();
    let (code, stdout, _) = sandbox.run(&[
        "--headless",
        "--output",
        "json",
        "--exec",
        "SELECT NULL AS nothing",
    ]);

    assert_eq!(code, 0);
    let value: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(value["tables"][0]["header"][0], "nothing");
    assert_eq!(value["tables"][0]["body"][0][0]["null"], true);
}

#[test]
fn test_invalid_flags_are_rejected() {
    let sandbox = Sandbox::new();

    let (code, _, stderr) = sandbox.run(&["--exec", "SELECT 1"]);
    assert_eq!(code, 2);
    assert!(stderr.contains("--exec requires --headless"));

    let (code, _, stderr) = sandbox.run(&["--headless", "--output", "xml"]);
    assert_eq!(code, 2);
    assert!(stderr.contains("Invalid output format"));
}

#[test]
fn test_missing_database_file() {
    let sandbox = Sandbox::new();
    let missing = sandbox.path("missing.db");
    let (code, _, stderr) = sandbox.run(&[&missing.to_string_lossy(), "--headless"]);

    assert_eq!(code, 1);
    assert!(stderr.contains("missing.db"));
}
