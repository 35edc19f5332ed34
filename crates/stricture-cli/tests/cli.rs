//! Schema files on disk, checked through the library and the binary

use pretty_assertions::assert_eq;
use serde_json::json;
use std::process::Command;
use stricture::check::{check_files, render, ReportFormat};
use stricture::{export, load_schema, load_value, ExportOptions, ValidateOptions, Validator};
use stricture_test_fixtures::{
    fleet_report_document, fleet_report_payload, TestFixtures, FLEET_REPORT_YAML,
};

fn bad_fleet_report() -> serde_json::Value {
    let mut payload = fleet_report_payload();
    payload["vehicles"] = json!([payload["vehicles"][0].clone()]);
    payload
}

#[test]
fn test_load_yaml_and_json_schema() -> Result<(), Box<dyn std::error::Error>> {
    let fixtures = TestFixtures::new()?;
    let yaml = fixtures.write("fleet.yaml", FLEET_REPORT_YAML)?;
    let json = fixtures.write("fleet.json", &fleet_report_document()?.to_json_string()?)?;

    let from_yaml = load_schema(&yaml)?;
    let from_json = load_schema(&json)?;
    assert_eq!(from_yaml, from_json);
    assert_eq!(from_yaml.root_node().name.as_deref(), Some("FleetReport"));
    Ok(())
}

#[test]
fn test_load_errors_name_the_file() -> Result<(), Box<dyn std::error::Error>> {
    let fixtures = TestFixtures::new()?;
    let broken = fixtures.write("broken.json", "{ \"kind\": \"strnig\" }")?;

    let err = load_schema(&broken).unwrap_err();
    assert!(format!("{:#}", err).contains("broken.json"));

    let missing = fixtures.path().join("missing.yaml");
    let err = load_schema(&missing).unwrap_err();
    assert!(err.to_string().starts_with("Failed to read schema"));
    Ok(())
}

#[test]
fn test_check_files() -> Result<(), Box<dyn std::error::Error>> {
    let fixtures = TestFixtures::new()?;
    let schema = load_schema(&fixtures.write("fleet.yml", FLEET_REPORT_YAML)?)?;
    let good = fixtures.write_json("good.json", &fleet_report_payload())?;
    let bad = fixtures.write_json("bad.json", &bad_fleet_report())?;
    assert_eq!(load_value(&good)?, fleet_report_payload());

    let validator = Validator::new(schema);
    let reports = check_files(
        &validator,
        &[good, bad.clone()],
        &ValidateOptions::new().with_path("report"),
    )?;
    assert!(reports[0].is_valid());
    assert_eq!(reports[1].failures.len(), 1);
    assert_eq!(reports[1].failures[0].path, "report['vehicles']");

    let text = render(&reports, ReportFormat::Text)?;
    assert!(text.contains(": ok\n"));
    assert!(text.contains(&format!(
        "{}: 1 failure(s)\n  - report['vehicles']: Must contain between 2 and 10 items (found 1) [wrong_length]\n",
        bad.display()
    )));
    Ok(())
}

#[test]
fn test_yaml_input() -> Result<(), Box<dyn std::error::Error>> {
    let fixtures = TestFixtures::new()?;
    let schema = load_schema(&fixtures.write("fleet.yaml", FLEET_REPORT_YAML)?)?;
    let input = fixtures.write("report.yaml", &serde_yaml::to_string(&fleet_report_payload())?)?;

    assert!(Validator::new(schema).validate(&load_value(&input)?).is_empty());
    Ok(())
}

#[test]
fn test_types_from_document() -> Result<(), Box<dyn std::error::Error>> {
    let fixtures = TestFixtures::new()?;
    let schema = load_schema(&fixtures.write("fleet.yaml", FLEET_REPORT_YAML)?)?;

    let rust = export(&schema, &ExportOptions::types("rust"))?;
    assert!(rust.contains("pub struct Vehicle {"));
    assert!(rust.contains("pub struct FleetReport {"));

    let typescript = export(
        &schema,
        &ExportOptions::types("typescript").with_root_name("Report"),
    )?;
    assert!(typescript.starts_with("export type Report = {\n"));
    Ok(())
}

#[test]
fn test_binary_validate_exit_status() -> Result<(), Box<dyn std::error::Error>> {
    let fixtures = TestFixtures::new()?;
    let schema = fixtures.write("fleet.yaml", FLEET_REPORT_YAML)?;
    let good = fixtures.write_json("good.json", &fleet_report_payload())?;
    let bad = fixtures.write_json("bad.json", &bad_fleet_report())?;

    let status = Command::new(env!("CARGO_BIN_EXE_stricture"))
        .arg("validate")
        .arg("--schema")
        .arg(&schema)
        .arg(&good)
        .output()?;
    assert!(status.status.success());

    let output = Command::new(env!("CARGO_BIN_EXE_stricture"))
        .args(["validate", "--format", "json", "--schema"])
        .arg(&schema)
        .arg(&good)
        .arg(&bad)
        .output()?;
    assert!(!output.status.success());
    let reports: serde_json::Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(reports[1]["failures"][0]["kind"], "wrong_length");
    Ok(())
}

#[test]
fn test_binary_types_and_show() -> Result<(), Box<dyn std::error::Error>> {
    let fixtures = TestFixtures::new()?;
    let schema = fixtures.write("fleet.yaml", FLEET_REPORT_YAML)?;
    let target = fixtures.path().join("fleet.rs");

    let status = Command::new(env!("CARGO_BIN_EXE_stricture"))
        .args(["types", "--language", "rust", "--output"])
        .arg(&target)
        .arg("--schema")
        .arg(&schema)
        .status()?;
    assert!(status.success());
    assert!(std::fs::read_to_string(&target)?.contains("pub struct FleetReport {"));

    let unsupported = Command::new(env!("CARGO_BIN_EXE_stricture"))
        .args(["types", "--language", "cobol", "--schema"])
        .arg(&schema)
        .output()?;
    assert!(!unsupported.status.success());
    assert!(String::from_utf8_lossy(&unsupported.stderr).contains("Unsupported target language: cobol"));

    let show = Command::new(env!("CARGO_BIN_EXE_stricture"))
        .args(["show", "--schema"])
        .arg(&schema)
        .output()?;
    assert!(show.status.success());
    let text = String::from_utf8(show.stdout)?;
    assert!(text.starts_with("object({\n  fleetId: regex(\"^[A-Z]{3}-[0-9]{4}$\"),\n"));
    assert!(text.trim_end().ends_with(").named(\"FleetReport\")"));
    Ok(())
}
