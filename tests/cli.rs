use std::io::Write;

use assert_cmd::Command;
use predicates::prelude::*;

/// Build a command with settings isolated to a temp config dir.
fn penny(config_dir: &std::path::Path) -> Command {
    let mut cmd = Command::cargo_bin("penny").unwrap();
    cmd.env("PENNY_CONFIG_DIR", config_dir);
    cmd
}

#[test]
fn test_help_lists_subcommands() {
    Command::cargo_bin("penny")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("identify-all"))
        .stdout(predicate::str::contains("generate"))
        .stdout(predicate::str::contains("patterns"));
}

#[test]
fn test_unknown_account_fails_nonzero() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config");
    let data = dir.path().join("data");

    penny(&config)
        .args(["init", "--data-dir", data.to_str().unwrap()])
        .assert()
        .success();

    penny(&config)
        .args(["identify", "--account", "Nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown account"));
}

#[test]
fn test_import_identify_generate_flow() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config");
    let data = dir.path().join("data");

    penny(&config)
        .args(["init", "--data-dir", data.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Penny is ready"));

    penny(&config)
        .args(["accounts", "add", "Checking", "--type", "checking"])
        .assert()
        .success();

    // Six months of a monthly charge, recent enough to fall in the
    // default 12-month lookback.
    let today = chrono::Local::now().date_naive();
    let csv_path = dir.path().join("statement.csv");
    let mut csv = std::fs::File::create(&csv_path).unwrap();
    writeln!(csv, "Date,Description,Amount").unwrap();
    for months_ago in (1..=6).rev() {
        let date = today
            .checked_sub_months(chrono::Months::new(months_ago))
            .unwrap();
        writeln!(csv, "{},NETFLIX.COM 12345,-10.99", date.format("%Y-%m-%d")).unwrap();
    }
    drop(csv);

    penny(&config)
        .args(["import", csv_path.to_str().unwrap(), "--account", "Checking"])
        .assert()
        .success()
        .stdout(predicate::str::contains("6 imported"));

    penny(&config)
        .args(["identify-all"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 new"));

    penny(&config)
        .args(["generate", "--days", "45"])
        .assert()
        .success();

    penny(&config)
        .args(["patterns", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("NETFLIX.COM"))
        .stdout(predicate::str::contains("monthly"));

    penny(&config)
        .args(["status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Active patterns:      1"));

    // The weekly job writes its dedicated log file.
    assert!(data.join("logs").join("identify.log").exists());
    assert!(data.join("logs").join("generate.log").exists());
}

#[test]
fn test_duplicate_import_reported() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config");
    let data = dir.path().join("data");

    penny(&config)
        .args(["init", "--data-dir", data.to_str().unwrap()])
        .assert()
        .success();
    penny(&config)
        .args(["accounts", "add", "Checking", "--type", "checking"])
        .assert()
        .success();

    let csv_path = dir.path().join("statement.csv");
    std::fs::write(&csv_path, "Date,Description,Amount\n2026-01-05,NETFLIX.COM,-10.99\n").unwrap();

    penny(&config)
        .args(["import", csv_path.to_str().unwrap(), "--account", "Checking"])
        .assert()
        .success();
    penny(&config)
        .args(["import", csv_path.to_str().unwrap(), "--account", "Checking"])
        .assert()
        .success()
        .stdout(predicate::str::contains("already been imported"));
}
