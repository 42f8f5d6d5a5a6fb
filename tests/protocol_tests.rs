//! Integration tests for protocol inspection and image grouping

mod common;

use common::{difftrack, difftrack_in, setup_bare_project};
use predicates::prelude::*;
use tempfile::TempDir;

// ============================================================================
// Protocol
// ============================================================================

#[test]
fn test_protocol_show_day() {
    let tmp = setup_bare_project();
    difftrack_in(tmp.path())
        .args(["protocol", "show", "--day", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Media Change (FP induction)"))
        .stdout(predicate::str::contains("DMEM/F12"));
}

#[test]
fn test_protocol_show_backfills_percentages() {
    let tmp = setup_bare_project();
    // Laminin-511: 5 ug/ml from 500 ug/ml is 1%
    difftrack_in(tmp.path())
        .args(["protocol", "show", "--day", "0", "-o", "tsv"])
        .assert()
        .success()
        .stdout(predicate::str::contains("0\tPlate coating\tLaminin-511\t1"));
}

#[test]
fn test_protocol_show_day_without_tasks() {
    let tmp = setup_bare_project();
    difftrack_in(tmp.path())
        .args(["protocol", "show", "--day", "5"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Day 5: No task"));
}

#[test]
fn test_protocol_rows_without_day_are_skipped() {
    let tmp = setup_bare_project();
    std::fs::write(tmp.path().join("protocol.csv"), "day,task\nsoon,Coating\n").unwrap();
    difftrack_in(tmp.path())
        .args(["protocol", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Protocol is empty."))
        .stderr(predicate::str::contains("skipped protocol rows"));
}

#[test]
fn test_protocol_yaml_syntax_error() {
    let tmp = setup_bare_project();
    let path = tmp.path().join("protocol.yaml");
    std::fs::write(&path, "- day: 1\n  task: [unclosed\n").unwrap();
    difftrack_in(tmp.path())
        .env("DIFFTRACK_PROTOCOL", &path)
        .args(["protocol", "show"])
        .assert()
        .failure();
}

#[test]
fn test_protocol_from_yaml() {
    let tmp = setup_bare_project();
    let path = tmp.path().join("protocol.yaml");
    std::fs::write(
        &path,
        "- day: 2\n  task: Media Change\n  component: Neurobasal\n  percentage: 96\n- day: 3\n  task: Feed\n  component: Ignored\n",
    )
    .unwrap();
    difftrack_in(tmp.path())
        .env("DIFFTRACK_PROTOCOL", &path)
        .args(["protocol", "show", "-o", "tsv"])
        .assert()
        .success()
        .stdout(predicate::str::contains("2\tMedia Change\tNeurobasal\t96"))
        .stdout(predicate::str::contains("3\tFeed\t\t"))
        .stdout(predicate::str::contains("Ignored").not());
}

#[test]
fn test_protocol_conc() {
    difftrack()
        .args(["protocol", "conc", "10 uM", "5 ug/mL", "2X", "banana"])
        .assert()
        .success()
        .stdout(predicate::str::contains("10 uM\t10\tuM"))
        .stdout(predicate::str::contains("5 ug/mL\t5\tug/mL"))
        .stdout(predicate::str::contains("2X\t2\tX"))
        .stdout(predicate::str::contains("banana\t\t"));
}

#[test]
fn test_protocol_stage_outside_project() {
    let tmp = TempDir::new().unwrap();
    difftrack_in(tmp.path())
        .args(["protocol", "stage", "15"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Day 15:"))
        .stdout(predicate::str::contains("Task:").not());
}

#[test]
fn test_protocol_stage_with_task() {
    let tmp = setup_bare_project();
    difftrack_in(tmp.path())
        .args(["protocol", "stage", "15"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Task: Replating and cell count"));
}

// ============================================================================
// Images
// ============================================================================

fn image_dir() -> TempDir {
    let tmp = TempDir::new().unwrap();
    for name in [
        "DIF3_D7_#1_a.jpg",
        "DIF3_D7_#1_b.jpg",
        "DIF3_D7_#2_a.png",
        "DIF4_D07_#1_c.jpg",
        "DIF3_D12_x.jpeg",
        "notes.txt",
        "random.jpg",
    ] {
        std::fs::write(tmp.path().join(name), b"").unwrap();
    }
    tmp
}

#[test]
fn test_images_grouped_by_day_and_dish() {
    let dir = image_dir();
    difftrack()
        .current_dir(dir.path())
        .env("XDG_CONFIG_HOME", dir.path().join(".xdg"))
        .args(["images", ".", "-o", "tsv"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Day 7\tDish 1\tDIF3_D7_#1_a.jpg"))
        .stdout(predicate::str::contains("Day 7\tDish 1\tDIF4_D07_#1_c.jpg"))
        .stdout(predicate::str::contains("Day 7\tDish 2\tDIF3_D7_#2_a.png"))
        .stdout(predicate::str::contains("Day 12\t\tDIF3_D12_x.jpeg"))
        .stdout(predicate::str::contains("Day Unknown\t\trandom.jpg"))
        .stdout(predicate::str::contains("notes.txt").not());
}

#[test]
fn test_images_per_dish_limit() {
    let dir = image_dir();
    difftrack()
        .current_dir(dir.path())
        .env("XDG_CONFIG_HOME", dir.path().join(".xdg"))
        .args(["images", ".", "--per-dish", "1", "-o", "tsv"])
        .assert()
        .success()
        .stdout(predicate::str::contains("DIF3_D7_#1_a.jpg"))
        .stdout(predicate::str::contains("DIF3_D7_#1_b.jpg").not());
}

#[test]
fn test_images_batch_filter() {
    let dir = image_dir();
    difftrack()
        .current_dir(dir.path())
        .env("XDG_CONFIG_HOME", dir.path().join(".xdg"))
        .args(["images", ".", "--batch", "4", "-o", "tsv"])
        .assert()
        .success()
        .stdout(predicate::str::contains("DIF4_D07_#1_c.jpg"))
        .stdout(predicate::str::contains("DIF3_").not());
}

#[test]
fn test_images_missing_dir() {
    let tmp = TempDir::new().unwrap();
    difftrack_in(tmp.path())
        .args(["images", "does-not-exist"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Not a directory"));
}

#[test]
fn test_images_empty_dir() {
    let tmp = TempDir::new().unwrap();
    let empty = tmp.path().join("empty");
    std::fs::create_dir(&empty).unwrap();
    difftrack_in(tmp.path())
        .args(["images", "empty"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No images found"));
}
