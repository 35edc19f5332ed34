//! Test fixtures for stricture
//!
//! Sample schemas (built through the builder API and as YAML/JSON documents)
//! and payloads from a vehicle telemetry domain, plus a temporary directory
//! helper for tests that need files on disk.

use serde_json::{json, Value};
use std::fs;
use std::io;
use std::path::PathBuf;
use stricture_core::{
    CoreError, FloatRange, IntRange, LengthBounds, NodeId, Schema, SchemaBuilder, SchemaDef,
};

/// Add the GPS odometer reading object to `b`.
///
/// ```text
/// GpsOdometer {
///   type: "gps_odometer_km"
///   tripId: string (1..=64 characters)
///   odometer: integer 0..=4294967295
///   recordedAt: RFC 3339 timestamp
///   position: Position { latitude, longitude, accuracy?, extra? { tag } }
///   note?: string | null
/// }
/// ```
pub fn gps_odometer_node(b: &mut SchemaBuilder) -> NodeId {
    let tag = b.exact("gps_odometer_km");
    let trip_id = b.string_len(LengthBounds::new(1, 64));
    let odometer = b.integer_range(IntRange::new(0, 4_294_967_295));
    let recorded_at = b.datetime();

    let latitude = b.float_range(FloatRange::new(-90.0, 90.0));
    let longitude = b.float_range(FloatRange::new(-180.0, 180.0));
    let accuracy = b.float_range(FloatRange::new(0.0, 10_000.0));
    let accuracy = b.optional(accuracy);
    let extra_tag = b.string();
    let extra = b.object([("tag", extra_tag)]);
    let extra = b.optional(extra);
    b.named(extra, "PositionExtra");
    let position = b.object([
        ("latitude", latitude),
        ("longitude", longitude),
        ("accuracy", accuracy),
        ("extra", extra),
    ]);
    b.named(position, "Position");

    let note = b.string();
    let note = b.optional_nullable(note);

    let reading = b.object([
        ("type", tag),
        ("tripId", trip_id),
        ("odometer", odometer),
        ("recordedAt", recorded_at),
        ("position", position),
        ("note", note),
    ]);
    b.named(reading, "GpsOdometer")
}

pub fn gps_odometer_schema() -> Result<Schema, CoreError> {
    let mut b = SchemaBuilder::new();
    let root = gps_odometer_node(&mut b);
    b.finish(root)
}

/// A reading that satisfies [`gps_odometer_schema`]
pub fn gps_odometer_payload() -> Value {
    json!({
        "type": "gps_odometer_km",
        "tripId": "trip-0042",
        "odometer": 120_455,
        "recordedAt": "2024-05-01T08:30:00Z",
        "position": {
            "latitude": 52.52,
            "longitude": 13.405,
            "accuracy": 4.5
        },
        "note": null
    })
}

/// Tagged union `Telemetry` over three reading kinds sharing a `type`
/// discriminant. The engine hours member carries a variant rename.
pub fn telemetry_schema() -> Result<Schema, CoreError> {
    let mut b = SchemaBuilder::new();
    let gps = gps_odometer_node(&mut b);

    let fuel_tag = b.exact("fuel_level");
    let percent = b.float_range(FloatRange::new(0.0, 100.0));
    let fuel = b.object([("type", fuel_tag), ("percent", percent)]);

    let hours_tag = b.exact("engine_hours");
    let hours = b.integer_range(IntRange::new(0, i64::from(u32::MAX)));
    let engine = b.object([("type", hours_tag), ("hours", hours)]);
    b.renamed(engine, "Hours");

    let telemetry = b.union([gps, fuel, engine]);
    b.named(telemetry, "Telemetry");
    b.finish(telemetry)
}

/// Fleet report document in YAML, exercising arrays with bounds, records,
/// tuples, nullable fields and dates.
pub const FLEET_REPORT_YAML: &str = r#"
kind: object
name: FleetReport
fields:
  fleetId:
    kind: regex
    pattern: "^[A-Z]{3}-[0-9]{4}$"
  reportDate:
    kind: date
  vehicles:
    kind: array
    min_items: 2
    max_items: 10
    items:
      kind: object
      name: Vehicle
      fields:
        vin: { kind: string, min_length: 17, max_length: 17 }
        mileage: { kind: integer, minimum: 0 }
        lastService: { kind: date, nullable: true }
        home: { kind: tuple, items: [ { kind: float }, { kind: float } ] }
  counters:
    kind: record
    values: { kind: integer, minimum: 0 }
  notes:
    kind: string
    optional: true
"#;

pub fn fleet_report_document() -> Result<SchemaDef, CoreError> {
    SchemaDef::from_yaml_str(FLEET_REPORT_YAML)
}

pub fn fleet_report_payload() -> Value {
    json!({
        "fleetId": "BER-0001",
        "reportDate": "2024-05-01",
        "vehicles": [
            {
                "vin": "WVWZZZ1JZXW000001",
                "mileage": 81_200,
                "lastService": "2024-03-12",
                "home": [52.52, 13.405]
            },
            {
                "vin": "WVWZZZ1JZXW000002",
                "mileage": 12_000,
                "lastService": null,
                "home": [48.137, 11.575]
            }
        ],
        "counters": { "trips": 12, "alerts": 0 }
    })
}

/// Temporary directory holding fixture files for the lifetime of the value
pub struct TestFixtures {
    temp_dir: tempfile::TempDir,
}

impl TestFixtures {
    pub fn new() -> io::Result<Self> {
        Ok(Self {
            temp_dir: tempfile::tempdir()?,
        })
    }

    pub fn path(&self) -> PathBuf {
        self.temp_dir.path().to_path_buf()
    }

    /// Write `contents` to `name` inside the fixture directory
    pub fn write(&self, name: &str, contents: &str) -> io::Result<PathBuf> {
        let path = self.temp_dir.path().join(name);
        fs::write(&path, contents)?;
        Ok(path)
    }

    pub fn write_json(&self, name: &str, value: &Value) -> io::Result<PathBuf> {
        let contents = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
        self.write(name, &contents)
    }
}
