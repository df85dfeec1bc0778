//! Tests for timestamp/date coercion and cell conversion

use crate::app::services::normalizer::field_parsers::*;
use chrono::NaiveDate;
use polars::prelude::AnyValue;
use serde_json::{Value, json};

fn timestamp(text: &str) -> Option<Value> {
    coerce_timestamp(&json!(text))
}

#[test]
fn test_timestamp_layouts() {
    let expected = Some(json!("2025-03-09 10:05:00"));

    assert_eq!(timestamp("2025-03-09 10:05:00"), expected);
    assert_eq!(timestamp("2025-03-09T10:05:00"), expected);
    assert_eq!(timestamp("2025-03-09T10:05:00.250"), expected);
    assert_eq!(timestamp("2025-03-09 10:05"), expected);
    assert_eq!(timestamp("2025/03/09 10:05:00"), expected);
    assert_eq!(timestamp("20250309100500"), expected);
    assert_eq!(timestamp("  2025-03-09 10:05:00 "), expected);
}

#[test]
fn test_offset_timestamps_keep_wall_time() {
    assert_eq!(
        timestamp("2025-03-09T10:05:00+01:00"),
        Some(json!("2025-03-09 10:05:00"))
    );
    assert_eq!(
        timestamp("2025-03-09 10:05:00 +0100"),
        Some(json!("2025-03-09 10:05:00"))
    );
}

#[test]
fn test_bare_date_becomes_midnight() {
    assert_eq!(timestamp("2025-03-09"), Some(json!("2025-03-09 00:00:00")));
    assert_eq!(timestamp("20250309"), Some(json!("2025-03-09 00:00:00")));
}

#[test]
fn test_numeric_timestamp_cell() {
    assert_eq!(
        coerce_timestamp(&json!(20250309100500_i64)),
        Some(json!("2025-03-09 10:05:00"))
    );
}

#[test]
fn test_timestamp_coercion_is_idempotent() {
    let once = timestamp("2025/03/09 10:05").unwrap();
    assert_eq!(coerce_timestamp(&once), Some(once.clone()));
}

#[test]
fn test_unparseable_timestamps() {
    assert_eq!(timestamp("yesterday"), None);
    assert_eq!(timestamp("2025-13-40 10:00:00"), None);
    assert_eq!(coerce_timestamp(&json!(true)), None);
}

#[test]
fn test_null_stays_null() {
    assert_eq!(coerce_timestamp(&Value::Null), Some(Value::Null));
    assert_eq!(coerce_date(&Value::Null), Some(Value::Null));
}

#[test]
fn test_date_layouts() {
    let expected = Some(json!("2025-03-09"));

    assert_eq!(coerce_date(&json!("2025-03-09")), expected);
    assert_eq!(coerce_date(&json!("2025/03/09")), expected);
    assert_eq!(coerce_date(&json!("20250309")), expected);
    assert_eq!(coerce_date(&json!(20250309)), expected);
    assert_eq!(coerce_date(&json!("2025-03-09 23:59:59")), expected);
    assert_eq!(coerce_date(&json!("March 9th")), None);
}

#[test]
fn test_parse_datetime_direct() {
    let parsed = parse_datetime("2024-12-31T23:55:00Z").unwrap();
    assert_eq!(
        parsed,
        NaiveDate::from_ymd_opt(2024, 12, 31)
            .unwrap()
            .and_hms_opt(23, 55, 0)
            .unwrap()
    );
}

#[test]
fn test_any_value_to_json() {
    assert_eq!(any_value_to_json(&AnyValue::Null), Value::Null);
    assert_eq!(any_value_to_json(&AnyValue::Int64(42)), json!(42));
    assert_eq!(any_value_to_json(&AnyValue::Float64(1.5)), json!(1.5));
    assert_eq!(any_value_to_json(&AnyValue::Boolean(true)), json!(true));
    assert_eq!(any_value_to_json(&AnyValue::String("INV-01")), json!("INV-01"));
}

#[test]
fn test_nan_is_null_not_text() {
    assert_eq!(any_value_to_json(&AnyValue::Float64(f64::NAN)), Value::Null);
    assert_eq!(any_value_to_json(&AnyValue::Float32(f32::INFINITY)), Value::Null);
    assert_eq!(any_value_to_json(&AnyValue::String("nan")), Value::Null);
    assert_eq!(any_value_to_json(&AnyValue::String("N/A")), Value::Null);
}
