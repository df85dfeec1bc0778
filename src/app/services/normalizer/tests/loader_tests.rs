//! Tests for loading and normalizing whole files

use super::*;
use crate::Error;
use crate::app::services::normalizer::{load_table, normalize_file};
use serde_json::{Value, json};

#[test]
fn test_normalize_inverter_file() {
    let (_dir, path) = write_csv("inverter_measures.csv", &create_inverter_csv());

    let table = normalize_file(&path).unwrap();

    assert_eq!(
        table.columns,
        vec!["timestamp", "device", "active_power", "temperature"]
    );
    assert_eq!(table.len(), 3);

    let timestamps: Vec<&Value> = table.rows.iter().map(|row| &row["timestamp"]).collect();
    assert_eq!(
        timestamps,
        vec![
            &json!("2025-03-09 10:00:00"),
            &json!("2025-03-09 10:05:00"),
            &json!("2025-03-09 10:10:00"),
        ]
    );

    assert_eq!(table.rows[0]["active_power"], json!(12.5));
    assert_eq!(table.rows[1]["active_power"], Value::Null);
    assert_eq!(table.rows[1]["temperature"], Value::Null);
    assert_eq!(table.rows[2]["temperature"], Value::Null);
    assert_eq!(table.rows[2]["device"], json!("INV-02"));
}

#[test]
fn test_row_keeps_column_order() {
    let (_dir, path) = write_csv("inverter_measures.csv", &create_inverter_csv());

    let table = normalize_file(&path).unwrap();
    let keys: Vec<&String> = table.rows[0].keys().collect();
    assert_eq!(keys, table.columns.iter().collect::<Vec<_>>());
}

#[test]
fn test_normalize_yield_file() {
    let (_dir, path) = write_csv("yield_daily.csv", &create_yield_csv());

    let table = normalize_file(&path).unwrap();

    assert_eq!(table.rows[0]["date"], json!("2025-03-09"));
    assert_eq!(table.rows[1]["date"], json!("2025-03-09"));
    assert_eq!(table.rows[1]["daily_yield"], json!(79.9));
}

#[test]
fn test_empty_file_is_empty_table() {
    let (_dir, path) = write_csv("fault_alarms.csv", "");
    assert!(normalize_file(&path).unwrap().is_empty());

    let (_dir, path) = write_csv("fault_alarms.csv", "\n  \n");
    assert!(normalize_file(&path).unwrap().is_empty());
}

#[test]
fn test_header_only_file_is_empty_table() {
    let (_dir, path) = write_csv("fault_alarms.csv", "timestamp,device,code\n");

    let table = load_table(&path).unwrap();
    assert!(table.is_empty());
    assert_eq!(table.columns, vec!["timestamp", "device", "code"]);
}

#[test]
fn test_unparseable_timestamp_names_row_and_value() {
    let (_dir, path) = write_csv(
        "fault_alarms.csv",
        "timestamp,device,code\n2025-03-09 10:00:00,INV-01,E12\nyesterday,INV-02,E13\n",
    );

    match normalize_file(&path) {
        Err(Error::Normalization { file, message }) => {
            assert!(file.ends_with("fault_alarms.csv"));
            assert!(message.contains("yesterday"));
            assert!(message.contains("'timestamp'"));
            assert!(message.contains("data row 2"));
        }
        other => panic!("Expected Normalization error, got {:?}", other),
    }
}

#[test]
fn test_missing_file_is_normalization_error() {
    let temp_dir = tempfile::TempDir::new().unwrap();
    let result = normalize_file(&temp_dir.path().join("combiner_measures.csv"));

    assert!(matches!(result, Err(Error::Normalization { .. })));
}
