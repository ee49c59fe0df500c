use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn tilemark_cmd(config_home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("tilemark").expect("binary exists");
    cmd.env("XDG_CONFIG_HOME", config_home.path())
        .env("HOME", config_home.path());
    cmd
}

const RECTANGLE: &str = r#"{
    "type": "rectangle",
    "coordinates": [[75.3, 185.15], [125.5, 185.15], [125.5, 216.05], [75.3, 216.05]]
}"#;

#[test]
fn tilemark_help_prints_usage() {
    let temp = TempDir::new().unwrap();
    tilemark_cmd(&temp)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Annotation overlays and interactive draw mode",
        ));
}

#[test]
fn params_reports_levels_for_image() {
    let temp = TempDir::new().unwrap();
    tilemark_cmd(&temp)
        .args(["params", "--width", "4096", "--height", "2048", "--item", "slide-7"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"maxLevel\": 4"))
        .stdout(predicate::str::contains("item/slide-7/tiles/zxy/{z}/{x}/{y}"));
}

#[test]
fn region_rounds_rectangle_from_stdin() {
    let temp = TempDir::new().unwrap();
    let output = tilemark_cmd(&temp)
        .arg("region")
        .write_stdin(RECTANGLE)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let region: Vec<i64> = serde_json::from_slice(&output).unwrap();
    assert_eq!(region, vec![75, 185, 50, 31]);
}

#[test]
fn region_rejects_other_shapes() {
    let temp = TempDir::new().unwrap();
    tilemark_cmd(&temp)
        .arg("region")
        .write_stdin(r#"{"type": "point", "coordinates": [[1, 2]]}"#)
        .assert()
        .failure()
        .stderr(predicate::str::contains("expected a rectangle"));
}

#[test]
fn convert_reads_file_and_reports_degenerate_shapes() {
    let temp = TempDir::new().unwrap();
    let good = temp.path().join("line.json");
    std::fs::write(
        &good,
        r##"{"type": "line", "coordinates": [[0, 0], [10, 5]], "strokeColor": "#ff0000"}"##,
    )
    .unwrap();
    tilemark_cmd(&temp)
        .arg("convert")
        .arg(&good)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"type\": \"polyline\""))
        .stdout(predicate::str::contains("\"lineColor\": \"#ff0000\""));

    let bad = temp.path().join("collapsed.json");
    std::fs::write(&bad, r#"{"type": "line", "coordinates": [[3, 3], [3, 3]]}"#).unwrap();
    tilemark_cmd(&temp).arg("convert").arg(&bad).assert().failure();
}

#[test]
fn geojson_exports_document_features() {
    let temp = TempDir::new().unwrap();
    tilemark_cmd(&temp)
        .arg("geojson")
        .write_stdin(
            r#"{"_id": "doc-1", "name": "cells", "elements": [
                {"type": "point", "center": [5, 5, 0]},
                {"type": "rectangle", "center": [50, 50, 0], "width": 20, "height": 10}
            ]}"#,
        )
        .assert()
        .success()
        .stdout(predicate::str::contains("FeatureCollection"))
        .stdout(predicate::str::contains("Polygon"));
}

#[test]
fn simulate_publishes_element_and_retires_layer() {
    let temp = TempDir::new().unwrap();
    let output = tilemark_cmd(&temp)
        .arg("simulate")
        .write_stdin(r#"{"type": "point", "coordinates": [[12, 34]]}"#)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let report: serde_json::Value = serde_json::from_slice(&output).unwrap();

    let events = report["events"].as_array().unwrap();
    assert_eq!(events[0]["event"], "imageRendered");
    assert_eq!(events[1]["event"], "annotationCreated");
    assert_eq!(events[1]["element"]["center"], serde_json::json!([12.0, 34.0, 0.0]));

    let calls = report["calls"].as_array().unwrap();
    assert!(calls.iter().any(|call| call["call"] == "delete-layer"));
    assert_eq!(calls.last().unwrap()["call"], "teardown");
}

#[test]
fn simulate_region_reports_region_without_publishing() {
    let temp = TempDir::new().unwrap();
    let output = tilemark_cmd(&temp)
        .args(["simulate", "--region"])
        .write_stdin(RECTANGLE)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let report: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(report["region"], serde_json::json!([75, 185, 50, 31]));
    assert_eq!(report["events"].as_array().unwrap().len(), 1);
}

#[test]
fn config_path_uses_config_home() {
    let temp = TempDir::new().unwrap();
    tilemark_cmd(&temp)
        .args(["config", "--path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("tilemark"))
        .stdout(predicate::str::contains("config.toml"));
}

#[test]
fn explicit_config_file_is_applied() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("custom.toml");
    std::fs::write(&path, "[draw]\nretire_on = \"draw-pass\"\n").unwrap();
    tilemark_cmd(&temp)
        .arg("--config")
        .arg(&path)
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("retire_on = \"draw-pass\""));
}

#[test]
fn config_schema_is_json() {
    let temp = TempDir::new().unwrap();
    let output = tilemark_cmd(&temp)
        .args(["config", "--schema"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let schema: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert!(schema["properties"]["viewer"].is_object());
}
