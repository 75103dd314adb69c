//! MySQL to JSON value mappings.
//!
//! Type conversion uses a two-phase approach:
//! 1. `TypeCategory` classifies the column type name reported by the driver
//! 2. A category-specific decoder extracts the value
//!
//! Statements run over the text protocol, so every non-NULL value can also be
//! read back as its textual form; decoders fall back to that text when the
//! typed decode is not possible (zero dates, ENUM, SET, YEAR, ...).

use crate::models::Row;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde_json::Value as JsonValue;
use sqlx::mysql::{MySqlRow, MySqlTypeInfo, MySqlValueRef};
use sqlx::{Column, Decode, Row as _, Type, TypeInfo};

// =============================================================================
// Type Classification
// =============================================================================

/// Logical category for MySQL column types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeCategory {
    Integer,
    Float,
    Decimal,
    Binary,
    Json,
    Date,
    Time,
    DateTime,
    Timestamp,
    Text,
}

/// Classify a MySQL type name into a logical category.
pub fn categorize_type(type_name: &str) -> TypeCategory {
    let lower = type_name.to_lowercase();

    if lower.contains("decimal") || lower.contains("numeric") {
        return TypeCategory::Decimal;
    }

    // TINYINT(1) is reported as BOOLEAN; it stays numeric like the stored value
    if lower.contains("int") || lower == "boolean" || lower == "year" {
        return TypeCategory::Integer;
    }

    if lower.contains("float") || lower.contains("double") || lower == "real" {
        return TypeCategory::Float;
    }

    if lower == "json" {
        return TypeCategory::Json;
    }

    match lower.as_str() {
        "date" => return TypeCategory::Date,
        "time" => return TypeCategory::Time,
        "datetime" => return TypeCategory::DateTime,
        "timestamp" => return TypeCategory::Timestamp,
        _ => {}
    }

    if lower.contains("blob") || lower.contains("binary") || lower == "bit" {
        return TypeCategory::Binary;
    }

    // varchar, text, char, enum, set, geometry text, ...
    TypeCategory::Text
}

// =============================================================================
// Decimal Type Support
// =============================================================================

/// Wrapper type for raw DECIMAL values as strings.
/// This preserves the exact database representation.
#[derive(Debug)]
pub struct RawDecimal(pub String);

impl Type<sqlx::MySql> for RawDecimal {
    fn type_info() -> MySqlTypeInfo {
        <String as Type<sqlx::MySql>>::type_info()
    }

    fn compatible(ty: &MySqlTypeInfo) -> bool {
        let name = ty.name().to_lowercase();
        name.contains("decimal") || name.contains("numeric")
    }
}

impl<'r> Decode<'r, sqlx::MySql> for RawDecimal {
    fn decode(value: MySqlValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <&str as Decode<sqlx::MySql>>::decode(value)?;
        Ok(RawDecimal(s.to_string()))
    }
}

// =============================================================================
// Binary Encoding
// =============================================================================

/// Encode binary column data as a base64 JSON string.
pub fn encode_binary(bytes: &[u8]) -> JsonValue {
    use base64::{Engine as _, engine::general_purpose::STANDARD};

    JsonValue::String(STANDARD.encode(bytes))
}

// =============================================================================
// Row to JSON
// =============================================================================

/// Trait for converting database rows to JSON maps.
pub trait RowToJson {
    fn to_json_map(&self) -> Row;
}

impl RowToJson for MySqlRow {
    /// Later columns with a duplicate name replace earlier ones.
    fn to_json_map(&self) -> Row {
        self.columns()
            .iter()
            .enumerate()
            .map(|(idx, col)| {
                let category = categorize_type(col.type_info().name());
                (col.name().to_string(), decode_column(self, idx, category))
            })
            .collect()
    }
}

// =============================================================================
// Column Decoders
// =============================================================================

fn decode_column(row: &MySqlRow, idx: usize, category: TypeCategory) -> JsonValue {
    if is_null(row, idx) {
        return JsonValue::Null;
    }
    match category {
        TypeCategory::Integer => decode_integer(row, idx),
        TypeCategory::Float => decode_float(row, idx),
        TypeCategory::Decimal => decode_decimal(row, idx),
        TypeCategory::Binary => decode_binary_col(row, idx),
        TypeCategory::Json => decode_json(row, idx),
        TypeCategory::Date => decode_date(row, idx),
        TypeCategory::Time => decode_time(row, idx),
        TypeCategory::DateTime => decode_datetime(row, idx),
        TypeCategory::Timestamp => decode_timestamp(row, idx),
        TypeCategory::Text => decode_text(row, idx),
    }
}

fn is_null(row: &MySqlRow, idx: usize) -> bool {
    use sqlx::ValueRef;

    row.try_get_raw(idx).map(|v| v.is_null()).unwrap_or(true)
}

/// Textual form of a value, without the driver's type check.
fn raw_text(row: &MySqlRow, idx: usize) -> Option<String> {
    row.try_get_unchecked::<Option<String>, _>(idx)
        .ok()
        .flatten()
}

fn text_or_null(row: &MySqlRow, idx: usize) -> JsonValue {
    raw_text(row, idx)
        .map(JsonValue::String)
        .unwrap_or(JsonValue::Null)
}

fn decode_integer(row: &MySqlRow, idx: usize) -> JsonValue {
    if let Ok(Some(v)) = row.try_get::<Option<i64>, _>(idx) {
        return JsonValue::Number(v.into());
    }
    if let Ok(Some(v)) = row.try_get::<Option<u64>, _>(idx) {
        return JsonValue::Number(v.into());
    }
    // YEAR and anything else integral that the typed decoders refuse
    match raw_text(row, idx) {
        Some(text) => parse_integer(&text),
        None => JsonValue::Null,
    }
}

fn parse_integer(text: &str) -> JsonValue {
    if let Ok(v) = text.parse::<i64>() {
        return JsonValue::Number(v.into());
    }
    if let Ok(v) = text.parse::<u64>() {
        return JsonValue::Number(v.into());
    }
    JsonValue::String(text.to_string())
}

fn decode_float(row: &MySqlRow, idx: usize) -> JsonValue {
    if let Ok(Some(v)) = row.try_get::<Option<f64>, _>(idx) {
        return float_value(v);
    }
    if let Ok(Some(v)) = row.try_get::<Option<f32>, _>(idx) {
        return float_value(v as f64);
    }
    text_or_null(row, idx)
}

fn float_value(v: f64) -> JsonValue {
    serde_json::Number::from_f64(v)
        .map(JsonValue::Number)
        .unwrap_or_else(|| JsonValue::String(v.to_string()))
}

fn decode_decimal(row: &MySqlRow, idx: usize) -> JsonValue {
    match row.try_get::<Option<RawDecimal>, _>(idx) {
        Ok(Some(v)) => JsonValue::String(v.0),
        Ok(None) => JsonValue::Null,
        Err(e) => {
            tracing::error!("Failed to decode DECIMAL: {:?}", e);
            text_or_null(row, idx)
        }
    }
}

fn decode_binary_col(row: &MySqlRow, idx: usize) -> JsonValue {
    row.try_get_unchecked::<Option<Vec<u8>>, _>(idx)
        .ok()
        .flatten()
        .map(|v| encode_binary(&v))
        .unwrap_or(JsonValue::Null)
}

fn decode_json(row: &MySqlRow, idx: usize) -> JsonValue {
    if let Ok(Some(v)) = row.try_get::<Option<JsonValue>, _>(idx) {
        return v;
    }
    match raw_text(row, idx) {
        Some(text) => serde_json::from_str(&text).unwrap_or(JsonValue::String(text)),
        None => JsonValue::Null,
    }
}

fn decode_date(row: &MySqlRow, idx: usize) -> JsonValue {
    match row.try_get::<Option<NaiveDate>, _>(idx) {
        Ok(Some(v)) => JsonValue::String(v.format("%Y-%m-%d").to_string()),
        // Zero dates ("0000-00-00") are not valid chrono dates
        _ => text_or_null(row, idx),
    }
}

fn decode_time(row: &MySqlRow, idx: usize) -> JsonValue {
    match row.try_get::<Option<NaiveTime>, _>(idx) {
        Ok(Some(v)) => JsonValue::String(v.format("%H:%M:%S%.f").to_string()),
        // TIME can exceed 24h or be negative
        _ => text_or_null(row, idx),
    }
}

fn decode_datetime(row: &MySqlRow, idx: usize) -> JsonValue {
    match row.try_get::<Option<NaiveDateTime>, _>(idx) {
        Ok(Some(v)) => JsonValue::String(v.format("%Y-%m-%dT%H:%M:%S%.f").to_string()),
        _ => text_or_null(row, idx),
    }
}

fn decode_timestamp(row: &MySqlRow, idx: usize) -> JsonValue {
    match row.try_get::<Option<DateTime<Utc>>, _>(idx) {
        Ok(Some(v)) => JsonValue::String(v.to_rfc3339_opts(chrono::SecondsFormat::AutoSi, true)),
        _ => text_or_null(row, idx),
    }
}

fn decode_text(row: &MySqlRow, idx: usize) -> JsonValue {
    if let Ok(Some(v)) = row.try_get::<Option<String>, _>(idx) {
        return JsonValue::String(v);
    }
    text_or_null(row, idx)
}
