//! The backend's response envelope and the wire helpers that ride inside it.
//!
//! Every response body is expected to look like
//! `{ "success": bool, "data": T?, "message": string?, "errors": {field: [string]}? }`.
//! Some fields arrive as a string in one response and a number in the next;
//! `StringOrNumber` and `StringOrInt` absorb that and normalize on demand.

use std::collections::BTreeMap;
use std::fmt;

use serde::de::{Deserializer, IgnoredAny};
use serde::{Deserialize, Serialize};
use serde_json::Number;

/// Field name to the list of validation messages for that field.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// The uniform wrapper around every JSON response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<FieldErrors>,
}

impl<T> Envelope<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            errors: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message.into()),
            errors: None,
        }
    }

    pub fn invalid(errors: FieldErrors) -> Self {
        Self {
            success: false,
            data: None,
            message: None,
            errors: Some(errors),
        }
    }
}

/// Marker for responses whose payload carries no meaning.
///
/// Accepts any JSON value, including `null`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Empty {}

impl<'de> Deserialize<'de> for Empty {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        IgnoredAny::deserialize(deserializer)?;
        Ok(Empty {})
    }
}

/// A decimal value the backend sends either as `"1500.00"` or `1500.00`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StringOrNumber {
    Number(f64),
    String(String),
}

impl StringOrNumber {
    /// The numeric value, parsing the string form. `None` if the string is
    /// not a number.
    pub fn value(&self) -> Option<f64> {
        match self {
            StringOrNumber::Number(n) => Some(*n),
            StringOrNumber::String(s) => s.trim().parse().ok(),
        }
    }
}

impl From<f64> for StringOrNumber {
    fn from(value: f64) -> Self {
        StringOrNumber::Number(value)
    }
}

impl fmt::Display for StringOrNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StringOrNumber::Number(n) => write!(f, "{n}"),
            StringOrNumber::String(s) => f.write_str(s),
        }
    }
}

/// An integer the backend sends either as `"3"` or `3`.
///
/// Any JSON number is accepted on the wire, so `3.0` or an out-of-range
/// integer never fails the surrounding payload; `value()` decides whether it
/// is a usable `i64`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StringOrInt {
    Int(Number),
    String(String),
}

impl StringOrInt {
    /// The integer value. `None` for fractions, values outside `i64`, and
    /// strings that are not integers.
    pub fn value(&self) -> Option<i64> {
        match self {
            StringOrInt::Int(n) => n.as_i64().or_else(|| n.as_f64().and_then(whole_i64)),
            StringOrInt::String(s) => s.trim().parse().ok(),
        }
    }
}

fn whole_i64(n: f64) -> Option<i64> {
    // i64::MAX is not exactly representable; 2^63 must be rejected
    let in_range = n >= i64::MIN as f64 && n < i64::MAX as f64;
    (n.fract() == 0.0 && in_range).then_some(n as i64)
}

impl From<i64> for StringOrInt {
    fn from(value: i64) -> Self {
        StringOrInt::Int(value.into())
    }
}

impl fmt::Display for StringOrInt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StringOrInt::Int(n) => write!(f, "{n}"),
            StringOrInt::String(s) => f.write_str(s),
        }
    }
}
