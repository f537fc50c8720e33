use std::fs;
use std::process::Command;

#[test]
fn test_import_logs_stay_off_stdout() {
    let dir = tempfile::tempdir().unwrap();
    let csv_path = dir.path().join("import.csv");
    let db_path = dir.path().join("ledger.db");
    fs::write(
        &csv_path,
        "Date,Amount,Description,Merchant\n2023-04-01,15.75,Lunch,Deli\n",
    )
    .unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_ledger-pages"))
        .arg("--db")
        .arg(&db_path)
        .arg("import")
        .arg(&csv_path)
        .env("RUST_LOG", "info")
        .env_remove("LEDGER_LOG_JSON")
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(stdout.contains("Inserted: 1 transactions"));
    assert!(!stdout.contains("import finished"));
    assert!(stderr.contains("import finished"));
}
