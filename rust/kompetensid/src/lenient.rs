//! Deserializers for backend fields that arrive as numbers or numeric strings.

use serde::de::{self, Deserializer};
use serde::Deserialize;
use serde_json::Value;

pub fn number_from_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().replace(',', ".").parse::<f64>().ok(),
        _ => None,
    }
}

pub fn int_from_value(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0)
                .map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

/// `12`, `"12"` → `Some(12)`; `null`, `""` and a missing field become `None`.
pub fn opt_int<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let v = Value::deserialize(deserializer)?;
    match &v {
        Value::Null => Ok(None),
        Value::String(s) if s.trim().is_empty() => Ok(None),
        _ => int_from_value(&v)
            .map(Some)
            .ok_or_else(|| de::Error::custom(format!("expected integer, got {v}"))),
    }
}

/// Nullable score: number, numeric string (`"85,5"` allowed) or null.
pub fn opt_score<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let v = Value::deserialize(deserializer)?;
    match &v {
        Value::Null => Ok(None),
        Value::String(s) if s.trim().is_empty() || s.trim() == "-" => Ok(None),
        _ => number_from_value(&v)
            .filter(|f| f.is_finite())
            .map(Some)
            .ok_or_else(|| de::Error::custom(format!("expected score, got {v}"))),
    }
}

/// Ids can be numeric or opaque strings; both are kept as text.
pub fn id_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let v = Value::deserialize(deserializer)?;
    match v {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(de::Error::custom(format!("expected id, got {other}"))),
    }
}

/// Counts that may be omitted on some responses default to 0.
pub fn count<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let v = Value::deserialize(deserializer)?;
    match &v {
        Value::Null => Ok(0),
        _ => int_from_value(&v)
            .filter(|n| *n >= 0)
            .map(|n| n as u64)
            .ok_or_else(|| de::Error::custom(format!("expected count, got {v}"))),
    }
}

/// Like [`id_string`] but `null`/missing become `None`.
pub fn opt_id_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let v = Value::deserialize(deserializer)?;
    match v {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s)),
        Value::Number(n) => Ok(Some(n.to_string())),
        other => Err(de::Error::custom(format!("expected id, got {other}"))),
    }
}

pub fn flag_from_value(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_i64().map(|i| i != 0),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" => Some(true),
            "0" | "false" | "no" | "" => Some(false),
            _ => None,
        },
        Value::Null => Some(false),
        _ => None,
    }
}

/// Booleans sent as `true`, `1` or `"1"`.
pub fn flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let v = Value::deserialize(deserializer)?;
    flag_from_value(&v).ok_or_else(|| de::Error::custom(format!("expected boolean, got {v}")))
}
