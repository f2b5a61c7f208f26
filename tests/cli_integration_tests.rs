//! CLI integration tests: run the binary against a small export fixture.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn write_fixture(dir: &TempDir) -> std::path::PathBuf {
    let export = serde_json::json!([
        {
            "key": "F-1",
            "type": "Feature",
            "summary": "Gradebook exports",
            "status": "Done",
            "labels": ["PI-4_Grading"],
            "customfield_10003": 20.0,
            "customfield_20403": "Platform"
        },
        {
            "key": "S-1",
            "type": "Story",
            "status": "Done",
            "customfield_11702": "F-1",
            "customfield_10003": 15.0,
            "customfield_20403": "Platform",
            "customfield_11701": "Sprint 7",
            "created": "2024-01-01",
            "resolved": "2024-01-04"
        },
        {
            "key": "S-2",
            "type": "Story",
            "status": "In Progress",
            "customfield_11702": "F-1",
            "customfield_10003": 5.0,
            "customfield_20403": "Platform",
            "customfield_11701": "Sprint 8"
        }
    ]);
    let path = dir.path().join("export.json");
    fs::write(&path, serde_json::to_string(&export).unwrap()).unwrap();
    path
}

fn write_config(dir: &TempDir) -> std::path::PathBuf {
    let path = dir.path().join("trainmap.toml");
    fs::write(
        &path,
        indoc::indoc! {r#"
            [pi]
            labels = ["PI-4_Grading"]
        "#},
    )
    .unwrap();
    path
}

fn trainmap() -> Command {
    Command::cargo_bin("trainmap").unwrap()
}

#[test]
fn pi_report_json_output() {
    let dir = TempDir::new().unwrap();
    let export = write_fixture(&dir);

    let output = trainmap()
        .args(["pi", export.to_str().unwrap(), "--pi", "PI-4_Grading", "--format", "json"])
        .current_dir(dir.path())
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let report: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(report["report"], "pi");
    assert_eq!(report["scorecards"][0]["art"], "Grading");
    assert_eq!(report["scorecards"][0]["committed_points"], 20.0);
    assert_eq!(report["scorecards"][0]["delivered_points"], 15.0);
    assert_eq!(report["scorecards"][0]["predictability"], 0.75);
    assert_eq!(report["completion"]["total_stories"], 2);
    assert_eq!(report["completion"]["completed_stories"], 1);
    assert_eq!(report["diagnostics"]["records_seen"], 3);
}

#[test]
fn velocity_report_terminal_output() {
    let dir = TempDir::new().unwrap();
    let export = write_fixture(&dir);

    trainmap()
        .args(["velocity", export.to_str().unwrap()])
        .current_dir(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Platform"))
        .stdout(predicate::str::contains("sprint   7"));
}

#[test]
fn cycle_time_report_shows_three_day_sample() {
    let dir = TempDir::new().unwrap();
    let export = write_fixture(&dir);

    let output = trainmap()
        .args(["cycle-time", export.to_str().unwrap(), "--format", "json"])
        .current_dir(dir.path())
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let report: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(report["stats"][0]["team"], "Platform");
    assert_eq!(report["stats"][0]["samples"][0]["days"], 3.0);
    assert_eq!(report["stats"][0]["in_flight"], 1);
}

#[test]
fn burndown_report_writes_markdown_file() {
    let dir = TempDir::new().unwrap();
    let export = write_fixture(&dir);
    let out = dir.path().join("burndown.md");

    trainmap()
        .args([
            "burndown",
            export.to_str().unwrap(),
            "--team",
            "Platform",
            "--sprint",
            "Sprint 7",
            "--start",
            "2024-01-01",
            "--days",
            "13",
            "--format",
            "markdown",
            "--output",
            out.to_str().unwrap(),
        ])
        .current_dir(dir.path())
        .assert()
        .success();

    let markdown = fs::read_to_string(&out).unwrap();
    assert!(markdown.contains("# Burndown - Platform - Sprint 7"));
    assert!(markdown.contains("| Day | Date | Remaining | Ideal |"));
}

#[test]
fn features_listing_includes_story_rollup() {
    let dir = TempDir::new().unwrap();
    let export = write_fixture(&dir);

    let output = trainmap()
        .args([
            "features",
            export.to_str().unwrap(),
            "--config",
            write_config(&dir).to_str().unwrap(),
            "--format",
            "json",
        ])
        .current_dir(dir.path())
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let report: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(report["features"][0]["key"], "F-1");
    assert_eq!(report["features"][0]["story_count"], 2);
    assert_eq!(report["features"][0]["done_story_count"], 1);
}

#[test]
fn pis_and_teams_discovery() {
    let dir = TempDir::new().unwrap();
    let export = write_fixture(&dir);

    // Without a config, `pis` discovers every parseable PI label.
    trainmap()
        .args(["pis", export.to_str().unwrap()])
        .current_dir(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("PI-4_Grading"));

    trainmap()
        .args(["teams", export.to_str().unwrap()])
        .current_dir(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Platform"));
}

#[test]
fn init_creates_config_and_respects_existing() {
    let dir = TempDir::new().unwrap();

    trainmap()
        .arg("init")
        .current_dir(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Created .trainmap.toml"));

    // The template documents the tie-break the normalizer implements:
    // the record's own label order picks among several accepted labels.
    let template = fs::read_to_string(dir.path().join(".trainmap.toml")).unwrap();
    assert!(template.contains("record's own label order"));

    trainmap()
        .arg("init")
        .current_dir(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));

    trainmap()
        .args(["init", "--force"])
        .current_dir(dir.path())
        .assert()
        .success();
}

#[test]
fn invalid_export_is_a_clean_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bad.json");
    fs::write(&path, "not json at all").unwrap();

    trainmap()
        .args(["pi", path.to_str().unwrap()])
        .current_dir(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to load issue export"));
}

#[test]
fn explicit_config_file_is_honored() {
    let dir = TempDir::new().unwrap();
    let export = write_fixture(&dir);
    let config = dir.path().join("trainmap.toml");
    fs::write(
        &config,
        indoc::indoc! {r#"
            [pi]
            labels = ["PI-4_Grading"]

            [velocity]
            rolling_window = 2
        "#},
    )
    .unwrap();

    let output = trainmap()
        .args([
            "pi",
            export.to_str().unwrap(),
            "--config",
            config.to_str().unwrap(),
            "--format",
            "json",
        ])
        .current_dir(dir.path())
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let report: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(report["summary"]["pi_label"], "PI-4_Grading");
}
