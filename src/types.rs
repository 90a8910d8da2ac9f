//! Core data model: typed [`Value`]s and header-keyed [`Row`]s.
//!
//! Rows produced from one source share a single reference-counted header, so materializing a
//! row costs one `Vec<Value>` allocation.

use std::fmt;
use std::sync::Arc;

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::error::{QueryError, QueryResult};

/// A single typed field value.
///
/// Equality compares numbers by value regardless of representation, so
/// `Value::Int(1) == Value::Float(1.0)`. A string never equals a number.
#[derive(Debug, Clone, serde::Serialize)]
#[serde(untagged)]
pub enum Value {
    /// 64-bit signed integer.
    Int(i64),
    /// 64-bit float.
    Float(f64),
    /// Text that parsed as neither an integer nor a float.
    Str(String),
}

impl Value {
    /// Short name of the variant's type, as used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "str",
        }
    }

    /// Numeric value as `f64`, or `None` for strings.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(v) => Some(*v as f64),
            Value::Float(v) => Some(*v),
            Value::Str(_) => None,
        }
    }

    /// Borrow the text of a [`Value::Str`].
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }
}

fn int_eq_float(i: i64, f: f64) -> bool {
    // i64::MIN is exactly representable; i64::MAX + 1 is the first float past the range.
    const LOWER: f64 = -9_223_372_036_854_775_808.0;
    const UPPER: f64 = 9_223_372_036_854_775_808.0;
    f.fract() == 0.0 && (LOWER..UPPER).contains(&f) && f as i64 == i
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Int(i), Value::Float(f)) | (Value::Float(f), Value::Int(i)) => {
                int_eq_float(*i, *f)
            }
            (Value::Str(a), Value::Str(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{v}"),
            // Debug keeps the decimal point on whole floats (`1.0`, not `1`).
            Value::Float(v) => write!(f, "{v:?}"),
            Value::Str(s) => f.write_str(s),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(i64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_owned())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

/// A typed row: an ordered mapping from field name to [`Value`].
///
/// Field names are unique. Iteration follows header order; lookup is by name. Two rows are equal
/// when they hold the same names mapped to equal values, independent of order.
#[derive(Debug, Clone)]
pub struct Row {
    fields: Arc<[String]>,
    values: Vec<Value>,
}

impl Row {
    /// Assemble a row from a shared header and values in the same order.
    pub(crate) fn from_parts(fields: Arc<[String]>, values: Vec<Value>) -> Self {
        debug_assert_eq!(fields.len(), values.len());
        Self { fields, values }
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Returns the value for `name`, if present.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields
            .iter()
            .position(|f| f == name)
            .map(|idx| &self.values[idx])
    }

    /// Returns the value for `name`, or [`QueryError::KeyNotFound`].
    pub fn try_get(&self, name: &str) -> QueryResult<&Value> {
        self.get(name).ok_or_else(|| QueryError::KeyNotFound {
            key: name.to_owned(),
        })
    }

    /// Field names in header order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(String::as_str)
    }

    /// Values in header order.
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Iterate `(name, value)` pairs in header order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.field_names().zip(self.values.iter())
    }
}

impl PartialEq for Row {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().all(|(k, v)| other.get(k) == Some(v))
    }
}

/// Builds a row by hand. A repeated name keeps its first position and takes the last value.
impl<K, V> FromIterator<(K, V)> for Row
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut fields: Vec<String> = Vec::new();
        let mut values: Vec<Value> = Vec::new();
        for (k, v) in iter {
            let k = k.into();
            let v = v.into();
            match fields.iter().position(|f| *f == k) {
                Some(idx) => values[idx] = v,
                None => {
                    fields.push(k);
                    values.push(v);
                }
            }
        }
        Self::from_parts(fields.into(), values)
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (k, v) in self.iter() {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}
