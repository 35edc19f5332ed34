//! Type emission over the shared telemetry and fleet fixtures

use pretty_assertions::assert_eq;
use stricture_codegen::{
    export, Codegen, CodegenError, ExportOptions, RegistryMode, RustCodegen, TypeRegistry,
    TypeScriptCodegen,
};
use stricture_core::{FloatRange, SchemaBuilder};
use stricture_test_fixtures::{
    fleet_report_document, gps_odometer_node, gps_odometer_schema, telemetry_schema,
};

const DERIVE: &str = "#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]";

#[test]
fn test_gps_odometer_rust() -> Result<(), Box<dyn std::error::Error>> {
    let output = export(&gps_odometer_schema()?, &ExportOptions::types("rust"))?;
    let expected = r#"#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PositionExtra {
    pub tag: String,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accuracy: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra: Option<PositionExtra>,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct GpsOdometer {
    pub r#type: String,
    #[serde(rename = "tripId")]
    pub trip_id: String,
    pub odometer: u32,
    #[serde(rename = "recordedAt")]
    pub recorded_at: String,
    pub position: Position,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}
"#;
    assert_eq!(output, expected);
    Ok(())
}

#[test]
fn test_gps_odometer_typescript() -> Result<(), Box<dyn std::error::Error>> {
    let output = export(&gps_odometer_schema()?, &ExportOptions::types("typescript"))?;
    let expected = r#"export type GpsOdometer = {
  type: 'gps_odometer_km';
  tripId: string;
  odometer: number;
  recordedAt: string;
  position: {
    latitude: number;
    longitude: number;
    accuracy: number | undefined;
    extra: {
      tag: string;
    } | undefined;
  };
  note: string | undefined | null;
};
"#;
    assert_eq!(output, expected);
    Ok(())
}

#[test]
fn test_gps_odometer_constructor_text() -> Result<(), Box<dyn std::error::Error>> {
    let output = export(&gps_odometer_schema()?, &ExportOptions::new())?;
    let expected = r#"object({
  type: exact("gps_odometer_km"),
  tripId: string({ min_length: 1, max_length: 64 }),
  odometer: integer({ min: 0, max: 4294967295 }),
  recordedAt: datetime(),
  position: object({
    latitude: float({ min: -90, max: 90 }),
    longitude: float({ min: -180, max: 180 }),
    accuracy: optional(float({ min: 0, max: 10000 })),
    extra: optional(object({
      tag: string(),
    })).named("PositionExtra"),
  }).named("Position"),
  note: optional_nullable(string()),
}).named("GpsOdometer")"#;
    assert_eq!(output, expected);
    Ok(())
}

#[test]
fn test_tagged_union_enum() -> Result<(), Box<dyn std::error::Error>> {
    let schema = telemetry_schema()?;
    let mut registry = TypeRegistry::new();
    RustCodegen::new().generate(&schema, &mut registry)?;

    assert_eq!(
        registry.names().collect::<Vec<_>>(),
        vec!["PositionExtra", "Position", "GpsOdometer", "FuelLevel", "Hours", "Telemetry"]
    );
    assert_eq!(
        registry.get("Telemetry"),
        Some(
            r#"#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type")]
pub enum Telemetry {
    #[serde(rename = "gps_odometer_km")]
    GpsOdometerKm(GpsOdometer),
    #[serde(rename = "fuel_level")]
    FuelLevel(FuelLevel),
    #[serde(rename = "engine_hours")]
    Hours(Hours),
}
"#
        )
    );

    // members drop the discriminant, serde carries it as the tag
    let gps = registry.get("GpsOdometer").ok_or("GpsOdometer not registered")?;
    assert!(!gps.contains("r#type"));
    assert_eq!(
        registry.get("Hours"),
        Some(format!("{}\npub struct Hours {{\n    pub hours: u32,\n}}\n", DERIVE).as_str())
    );
    Ok(())
}

#[test]
fn test_tagged_union_emitted_twice_returns_reference() -> Result<(), Box<dyn std::error::Error>> {
    let schema = telemetry_schema()?;
    let mut codegen = RustCodegen::new();
    let mut registry = TypeRegistry::new();

    let first = codegen.emit(&schema, schema.root(), &mut registry)?;
    let declarations = registry.render();
    let count = registry.len();

    let second = codegen.emit(&schema, schema.root(), &mut registry)?;
    assert_eq!(first, "Telemetry");
    assert_eq!(first, second);
    assert_eq!(registry.len(), count);
    assert_eq!(registry.render(), declarations);
    Ok(())
}

#[test]
fn test_emission_is_idempotent_per_registry() -> Result<(), Box<dyn std::error::Error>> {
    let schema = gps_odometer_schema()?;
    for mode in [RegistryMode::FirstWriterWins, RegistryMode::Strict] {
        let mut registry = TypeRegistry::with_mode(mode);
        let first = RustCodegen::new().generate(&schema, &mut registry)?;
        let second = RustCodegen::new().generate(&schema, &mut registry)?;
        assert_eq!(first, second);
        assert_eq!(registry.len(), 3);

        let mut registry = TypeRegistry::with_mode(mode);
        let first = TypeScriptCodegen::new().generate(&schema, &mut registry)?;
        let second = TypeScriptCodegen::new().generate(&schema, &mut registry)?;
        assert_eq!(first, second);
        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["GpsOdometer"]);
    }
    Ok(())
}

#[test]
fn test_optional_reference_to_named_type() -> Result<(), Box<dyn std::error::Error>> {
    let mut b = SchemaBuilder::new();
    let gps = gps_odometer_node(&mut b);
    let fuel_tag = b.exact("fuel_level");
    let percent = b.float_range(FloatRange::new(0.0, 100.0));
    let fuel = b.object([("type", fuel_tag), ("percent", percent)]);
    let telemetry = b.union([gps, fuel]);
    b.named(telemetry, "Telemetry");
    let latest = b.nullable(telemetry);
    let previous = b.optional(telemetry);
    let root = b.object([("latest", latest), ("previous", previous)]);
    b.named(root, "Envelope");

    let mut registry = TypeRegistry::new();
    RustCodegen::new().generate(&b.finish(root)?, &mut registry)?;
    let envelope = registry.get("Envelope").ok_or("Envelope not registered")?;
    assert_eq!(
        envelope,
        format!(
            "{}\npub struct Envelope {{\n    pub latest: Option<Telemetry>,\n    \
             #[serde(skip_serializing_if = \"Option::is_none\")]\n    \
             pub previous: Option<Telemetry>,\n}}\n",
            DERIVE
        )
    );
    assert_eq!(registry.names().filter(|name| *name == "Telemetry").count(), 1);
    Ok(())
}

#[test]
fn test_fleet_report_rust() -> Result<(), Box<dyn std::error::Error>> {
    let schema = fleet_report_document()?.build()?;
    let output = export(&schema, &ExportOptions::types("rs"))?;
    let expected = r#"#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Vehicle {
    pub vin: String,
    pub mileage: u64,
    #[serde(rename = "lastService")]
    pub last_service: Option<String>,
    pub home: (f64, f64),
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FleetReport {
    #[serde(rename = "fleetId")]
    pub fleet_id: String,
    #[serde(rename = "reportDate")]
    pub report_date: String,
    pub vehicles: Vec<Vehicle>,
    pub counters: std::collections::HashMap<String, u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}
"#;
    assert_eq!(output, expected);

    let typescript = export(&schema, &ExportOptions::types("ts"))?;
    assert!(typescript.contains("  vehicles: [{\n"));
    assert!(typescript.contains("    home: [number, number];\n"));
    assert!(typescript.contains("  counters: Record<string, number>;\n"));
    Ok(())
}

#[test]
fn test_strict_registry_detects_conflicting_names() -> Result<(), Box<dyn std::error::Error>> {
    let position = |field: &str| -> Result<_, stricture_core::CoreError> {
        let mut b = SchemaBuilder::new();
        let coordinate = b.float();
        let root = b.object([(field, coordinate)]);
        b.named(root, "Position");
        b.finish(root)
    };
    let latitude = position("latitude")?;
    let longitude = position("longitude")?;

    let mut registry = TypeRegistry::new();
    RustCodegen::new().generate(&latitude, &mut registry)?;
    RustCodegen::new().generate(&longitude, &mut registry)?;
    assert_eq!(registry.len(), 1);
    assert!(registry
        .get("Position")
        .is_some_and(|body| body.contains("latitude")));

    let mut registry = TypeRegistry::with_mode(RegistryMode::Strict);
    RustCodegen::new().generate(&latitude, &mut registry)?;
    let err = RustCodegen::new()
        .generate(&longitude, &mut registry)
        .unwrap_err();
    assert!(matches!(err, CodegenError::ConflictingDefinition { ref name } if name == "Position"));
    Ok(())
}
