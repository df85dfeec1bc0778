//! Field coercion utilities for extracted rows
//!
//! Pure functions turning loosely formatted provider values into the
//! canonical text the remote store expects, plus the conversion from
//! polars cell values to JSON.

use crate::constants::{DATE_OUTPUT_FORMAT, NULL_TOKENS, TIMESTAMP_OUTPUT_FORMAT};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use polars::prelude::AnyValue;
use serde_json::{Number, Value};

/// Offset-carrying timestamp layouts; the wall-clock time is kept
const OFFSET_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%z",
    "%Y-%m-%d %H:%M:%S %z",
    "%Y-%m-%d %H:%M:%S%.f%:z",
];

const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%Y%m%d%H%M%S",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%Y%m%d"];

/// Parse any accepted timestamp layout; bare dates become midnight
pub fn parse_datetime(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.naive_local());
    }
    for format in OFFSET_DATETIME_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(text, format) {
            return Some(dt.naive_local());
        }
    }
    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
            return Some(dt);
        }
    }
    parse_date_only(text).and_then(|date| date.and_hms_opt(0, 0, 0))
}

/// Parse an accepted date layout, or the date part of any accepted timestamp
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    parse_date_only(text).or_else(|| parse_datetime(text).map(|dt| dt.date()))
}

fn parse_date_only(text: &str) -> Option<NaiveDate> {
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(text, format).ok())
}

/// Text a cell can be parsed from; `None` for values that never hold a time
fn cell_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Coerce a cell to `YYYY-MM-DD HH:MM:SS`
///
/// Null stays null. Returns `None` when the value cannot be parsed.
pub fn coerce_timestamp(value: &Value) -> Option<Value> {
    if value.is_null() {
        return Some(Value::Null);
    }
    let parsed = parse_datetime(&cell_text(value)?)?;
    Some(Value::String(
        parsed.format(TIMESTAMP_OUTPUT_FORMAT).to_string(),
    ))
}

/// Coerce a cell to `YYYY-MM-DD`
///
/// Null stays null. Returns `None` when the value cannot be parsed.
pub fn coerce_date(value: &Value) -> Option<Value> {
    if value.is_null() {
        return Some(Value::Null);
    }
    let parsed = parse_date(&cell_text(value)?)?;
    Some(Value::String(parsed.format(DATE_OUTPUT_FORMAT).to_string()))
}

/// True for the textual spellings of a missing value
pub fn is_null_token(text: &str) -> bool {
    NULL_TOKENS.contains(&text.trim())
}

fn float_value(value: f64) -> Value {
    Number::from_f64(value)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

fn text_value(text: &str) -> Value {
    if is_null_token(text) {
        Value::Null
    } else {
        Value::String(text.to_string())
    }
}

/// Convert one polars cell to JSON
///
/// NaN and infinite floats become null, never the string `"nan"`.
pub fn any_value_to_json(value: &AnyValue) -> Value {
    match value {
        AnyValue::Null => Value::Null,
        AnyValue::Boolean(b) => Value::Bool(*b),
        AnyValue::String(s) => text_value(s),
        AnyValue::StringOwned(s) => text_value(s.as_str()),
        AnyValue::Int8(v) => Value::from(*v),
        AnyValue::Int16(v) => Value::from(*v),
        AnyValue::Int32(v) => Value::from(*v),
        AnyValue::Int64(v) => Value::from(*v),
        AnyValue::UInt8(v) => Value::from(*v),
        AnyValue::UInt16(v) => Value::from(*v),
        AnyValue::UInt32(v) => Value::from(*v),
        AnyValue::UInt64(v) => Value::from(*v),
        AnyValue::Float32(v) => float_value(f64::from(*v)),
        AnyValue::Float64(v) => float_value(*v),
        other => Value::String(other.to_string()),
    }
}
