//! Type inference for raw CSV fields.

use crate::types::Value;

/// Convert a raw field into an integer, a float, or keep it as a string.
///
/// Integers are tried first, then floats, using the standard library's literal rules: a leading
/// sign is accepted, surrounding whitespace and trailing garbage are not. Integers beyond the
/// `i64` range become floats. This never fails.
///
/// ```rust
/// use csv_query::ingestion::infer_value;
/// use csv_query::types::Value;
///
/// assert_eq!(infer_value("10"), Value::Int(10));
/// assert!(matches!(infer_value("10.0"), Value::Float(v) if v == 10.0));
/// assert_eq!(infer_value("hi"), Value::Str("hi".to_string()));
/// ```
pub fn infer_value(raw: &str) -> Value {
    if let Ok(v) = raw.parse::<i64>() {
        return Value::Int(v);
    }
    if let Ok(v) = raw.parse::<f64>() {
        return Value::Float(v);
    }
    Value::Str(raw.to_owned())
}
