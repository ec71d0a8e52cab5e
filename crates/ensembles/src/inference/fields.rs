//! Field-value coercion for map-based inference input.

use serde_json::Value;

/// Convert a document field value to a feature double.
///
/// Accepts numbers, numeric strings, and booleans; anything else returns
/// `None` and surfaces as a missing (NaN) feature.
pub fn to_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    }
}
