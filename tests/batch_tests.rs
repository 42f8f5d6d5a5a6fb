//! Integration tests for batch management

mod common;

use common::{create_test_batch, difftrack_in, login_as, setup_bare_project, setup_test_project};
use predicates::prelude::*;

#[test]
fn test_batch_requires_login() {
    let tmp = setup_bare_project();
    difftrack_in(tmp.path())
        .args(["batch", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Not logged in"));
}

#[test]
fn test_batch_new_and_list() {
    let tmp = setup_test_project();
    difftrack_in(tmp.path())
        .args([
            "batch", "new", "--id", "3", "--cell", "H9", "--start", "2024-03-01",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created batch 3 starting 2024-03-01 (ends 2024-03-22)"));

    difftrack_in(tmp.path())
        .args(["batch", "list", "--date", "2024-03-05"])
        .assert()
        .success()
        .stdout(predicate::str::contains("ID\tCELL\tSTART"))
        .stdout(predicate::str::contains("3\tH9\t2024-03-01\t2024-03-22\t4\t"))
        .stdout(predicate::str::contains("ongoing"));
}

#[test]
fn test_batch_new_suggests_next_id() {
    let tmp = setup_test_project();
    create_test_batch(&tmp, 7, "H9", "2024-03-01");
    difftrack_in(tmp.path())
        .args(["batch", "new", "--cell", "KOLF2", "--start", "2024-03-04"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created batch 8"));
}

#[test]
fn test_batch_new_duplicate_id_fails() {
    let tmp = setup_test_project();
    create_test_batch(&tmp, 1, "H9", "2024-03-01");
    difftrack_in(tmp.path())
        .args(["batch", "new", "--id", "1", "--start", "2024-03-02"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Batch 1 already exists"));
}

#[test]
fn test_batch_new_end_before_start_fails() {
    let tmp = setup_test_project();
    difftrack_in(tmp.path())
        .args([
            "batch", "new", "--id", "1", "--start", "2024-03-10", "--end", "2024-03-01",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("before start date"));
}

#[test]
fn test_batch_new_rejects_bad_date() {
    let tmp = setup_test_project();
    difftrack_in(tmp.path())
        .args(["batch", "new", "--start", "03/01/2024"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid date"));
}

#[test]
fn test_batch_list_filters() {
    let tmp = setup_test_project();
    create_test_batch(&tmp, 1, "old", "2024-01-01");
    create_test_batch(&tmp, 2, "now", "2024-03-01");
    create_test_batch(&tmp, 3, "later", "2024-04-01");

    difftrack_in(tmp.path())
        .args(["batch", "list", "--date", "2024-03-05", "--filter", "ongoing", "--count"])
        .assert()
        .success()
        .stdout("1\n");

    difftrack_in(tmp.path())
        .args(["batch", "list", "--date", "2024-03-05", "--filter", "finished"])
        .assert()
        .success()
        .stdout(predicate::str::contains("old"))
        .stdout(predicate::str::contains("later").not());

    difftrack_in(tmp.path())
        .args(["batch", "list", "--date", "2024-03-05", "--filter", "upcoming"])
        .assert()
        .success()
        .stdout(predicate::str::contains("later"))
        .stdout(predicate::str::contains("now").not());
}

#[test]
fn test_batch_list_empty() {
    let tmp = setup_test_project();
    difftrack_in(tmp.path())
        .args(["batch", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No batches found."));
}

#[test]
fn test_batches_are_per_user() {
    let tmp = setup_test_project();
    create_test_batch(&tmp, 1, "alice-cells", "2024-03-01");

    login_as(&tmp, "bob", "pw");
    difftrack_in(tmp.path())
        .args(["batch", "list", "--count"])
        .assert()
        .success()
        .stdout("0\n");

    // Bob may reuse an ID Alice already holds
    create_test_batch(&tmp, 1, "bob-cells", "2024-03-02");

    login_as(&tmp, "alice", "pw");
    difftrack_in(tmp.path())
        .args(["batch", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("alice-cells"))
        .stdout(predicate::str::contains("bob-cells").not());
}

#[test]
fn test_batch_show() {
    let tmp = setup_test_project();
    difftrack_in(tmp.path())
        .args([
            "batch", "new", "--id", "4", "--cell", "H9", "--start", "2024-03-01", "--note",
            "coated twice",
        ])
        .assert()
        .success();

    difftrack_in(tmp.path())
        .args(["batch", "show", "4", "--date", "2024-03-02"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Batch: 4"))
        .stdout(predicate::str::contains("End:      2024-03-22 (default)"))
        .stdout(predicate::str::contains("Day:      1"))
        .stdout(predicate::str::contains("coated twice"));
}

#[test]
fn test_batch_show_json() {
    let tmp = setup_test_project();
    create_test_batch(&tmp, 2, "H9", "2024-03-01");
    difftrack_in(tmp.path())
        .args(["batch", "show", "2", "-o", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"batch_id\": 2"))
        .stdout(predicate::str::contains("\"username\": \"alice\""));
}

#[test]
fn test_batch_show_missing() {
    let tmp = setup_test_project();
    difftrack_in(tmp.path())
        .args(["batch", "show", "99"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Batch 99 not found"));
}

#[test]
fn test_batch_edit() {
    let tmp = setup_test_project();
    create_test_batch(&tmp, 5, "H9", "2024-03-01");

    difftrack_in(tmp.path())
        .args([
            "batch", "edit", "5", "--cell", "KOLF2", "--end", "2024-03-30", "--plates", "3",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Updated batch 5"));

    difftrack_in(tmp.path())
        .args(["batch", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("5\tKOLF2\t2024-03-01\t2024-03-30"))
        .stdout(predicate::str::contains("3/0"));

    difftrack_in(tmp.path())
        .args(["batch", "edit", "5", "--clear-end"])
        .assert()
        .success();

    difftrack_in(tmp.path())
        .args(["batch", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("2024-03-22"));
}

#[test]
fn test_batch_counts() {
    let tmp = setup_test_project();
    create_test_batch(&tmp, 1, "H9", "2024-03-01");

    difftrack_in(tmp.path())
        .args(["batch", "counts", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No cell counts recorded."));

    difftrack_in(tmp.path())
        .args(["batch", "counts", "1", "--set", "Day 15:A=1.2e6", "--set", "Day 15:B=9e5"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Saved 2 cell count(s)"));

    difftrack_in(tmp.path())
        .args(["batch", "counts", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("PHASE\tA\tB"))
        .stdout(predicate::str::contains("1.2e6\t9e5"));
}

#[test]
fn test_batch_counts_for_missing_batch() {
    let tmp = setup_test_project();
    difftrack_in(tmp.path())
        .args(["batch", "counts", "8", "--set", "Day 15:A=1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Batch 8 not found"));
}

#[test]
fn test_batch_roundtrip_with_sqlite_store() {
    let tmp = setup_bare_project();
    let run = |args: &[&str]| {
        let mut cmd = difftrack_in(tmp.path());
        cmd.env("DIFFTRACK_STORE", "sqlite").args(args);
        cmd
    };

    run(&["account", "new", "carol", "-p", "pw"]).assert().success();
    run(&["account", "login", "carol", "-p", "pw"]).assert().success();
    run(&["batch", "new", "--id", "2", "--cell", "H1", "--start", "2024-05-01"])
        .assert()
        .success();
    run(&["batch", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("2\tH1\t2024-05-01"));

    assert!(tmp.path().join("data/workbook.sqlite").is_file());
}
