//! Tests for the table store implementations

use crate::app::models::Row;
use serde_json::json;


/// Build a row from JSON object syntax
pub fn row(value: serde_json::Value) -> Row {
    match value {
        serde_json::Value::Object(map) => map,
        other => panic!("row fixture must be an object, got {}", other),
    }
}

/// Inverter measurement row
pub fn measure(timestamp: &str, device: &str, power: f64) -> Row {
    row(json!({"timestamp": timestamp, "device": device, "active_power": power}))
}
