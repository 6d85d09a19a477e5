//! Runs the `house-price` binary against the fixture artifacts.

use std::path::{Path, PathBuf};
use std::process::Command;

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures").join(name)
}

fn house_price() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_house-price"));
    cmd.arg("--model")
        .arg(fixture("house_price_model.json"))
        .arg("--pipeline")
        .arg(fixture("preprocessing_pipeline.json"))
        .env("RUST_LOG", "off");
    cmd
}

#[test]
fn test_example_prediction_exits_zero() {
    let output = house_price().output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert_eq!(stdout.trim(), "Predicted house price: $451,666.67");
}

#[test]
fn test_missing_artifacts_exit_non_zero() {
    let output = Command::new(env!("CARGO_BIN_EXE_house-price"))
        .arg("--model")
        .arg("does/not/exist.json")
        .env("RUST_LOG", "off")
        .output()
        .unwrap();
    assert!(!output.status.success());
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("artifact not found"), "{stderr}");
}

#[test]
fn test_predict_json_array() {
    let output = house_price()
        .args([
            "predict",
            "--json",
            r#"[{"longitude": -122.23, "latitude": 37.88, "housing_median_age": 41,
                 "total_rooms": 880, "total_bedrooms": 129, "population": 322,
                 "households": 126, "median_income": 8.3252, "ocean_proximity": "NEAR BAY"},
                {"longitude": -119.56, "latitude": 36.78, "housing_median_age": 15,
                 "total_rooms": 4500, "total_bedrooms": 800, "population": 1800,
                 "households": 750, "median_income": 3.2, "ocean_proximity": "INLAND"}]"#,
        ])
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines, vec!["$451,666.67", "$143,333.33"]);
}

#[test]
fn test_unknown_category_fails_unless_allowed() {
    let args = [
        "predict",
        "--longitude=-122.23",
        "--latitude=37.88",
        "--housing-median-age=41",
        "--total-rooms=880",
        "--total-bedrooms=129",
        "--population=322",
        "--households=126",
        "--median-income=8.3252",
        "--ocean-proximity=LAKESIDE",
    ];
    let strict = house_price().args(args).output().unwrap();
    assert!(!strict.status.success());

    let lenient = house_price().arg("--allow-unknown-category").args(args).output().unwrap();
    assert!(lenient.status.success());
}

#[test]
fn test_batch_writes_csv() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("preds.csv");
    let status = house_price()
        .args(["batch", "--input"])
        .arg(fixture("housing_sample.csv"))
        .arg("--output")
        .arg(&out)
        .status()
        .unwrap();
    assert!(status.success());
    let text = std::fs::read_to_string(out).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 5);
    assert_eq!(lines[0], "row,predicted_value");
    assert_eq!(lines[1], "0,451666.67");
}

#[test]
fn test_evaluate_prints_metrics() {
    let output = house_price()
        .args(["evaluate", "--input"])
        .arg(fixture("housing_sample.csv"))
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.starts_with("rows: 4"));
    assert!(stdout.contains("rmse: $"));
}

#[test]
fn test_evaluate_blank_target_exits_non_zero() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("blank_target.csv");
    std::fs::write(
        &input,
        "longitude,latitude,housing_median_age,total_rooms,total_bedrooms,population,\
         households,median_income,median_house_value,ocean_proximity\n\
         -122.23,37.88,41.0,880.0,129.0,322.0,126.0,8.3252,,NEAR BAY\n",
    )
    .unwrap();

    let output = house_price().args(["evaluate", "--input"]).arg(&input).output().unwrap();
    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("missing target"), "{stderr}");
}
