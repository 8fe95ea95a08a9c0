use crate::errors::{ErrorKind, MapsiftError, MapsiftResult};
use chrono::{DateTime, NaiveDate};
use std::cmp::Ordering;
use std::fmt::{Display, Formatter};
use std::hash::{Hash, Hasher};

/// Date format used on the wire and for lexical ordering.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Compare two floats with proper NaN and total ordering.
#[inline]
fn num_cmp_float(a: f64, b: f64) -> Ordering {
    // Handle NaN: treat NaN as greater than all other values
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
    }
}

/// Canonical bit pattern for hashing floats: -0.0 folds into 0.0 and every
/// NaN folds into one representative, keeping Hash consistent with Eq.
#[inline]
fn canonical_float_bits(f: f64) -> u64 {
    if f.is_nan() {
        f64::NAN.to_bits()
    } else if f == 0.0 {
        0.0f64.to_bits()
    } else {
        f.to_bits()
    }
}

/// A scalar property value carried by a [Feature](crate::feature::Feature).
///
/// # Purpose
/// Provides a unified representation for the value types that feature
/// properties and filter clauses can hold: nothing, booleans, numbers,
/// text, and calendar dates.
///
/// # Characteristics
/// - **Comparable**: implements a total `Ord` used by the ordered dimension
///   indexes. Variants order by type rank (null, bool, number, date/text);
///   integers and floats compare numerically across variants; dates and
///   strings share a rank and compare lexically on the ISO rendering, which
///   for `YYYY-MM-DD` text is also chronological order.
/// - **Hashable**: `Hash` is consistent with the cross-type `Eq`; `I64(1)`
///   and `F64(1.0)` are equal and hash identically, as do `Date` values and
///   their exact ISO string rendering.
/// - **Serializable**: serde derive for persistence in shared state.
///
/// # Usage
/// Create values using the `From` impls:
/// ```text
/// let v1: Value = 42i64.into();
/// let v2 = Value::from("high");
/// let v3 = Value::from(NaiveDate::from_ymd_opt(2020, 1, 1).unwrap());
/// ```
#[derive(Clone, Debug, Default, serde::Deserialize, serde::Serialize)]
pub enum Value {
    /// Represents a null value.
    #[default]
    Null,
    /// Represents a boolean value.
    Bool(bool),
    /// Represents a signed 64-bit integer value.
    I64(i64),
    /// Represents a 64-bit floating point value.
    F64(f64),
    /// Represents a text value.
    String(String),
    /// Represents a calendar date value.
    Date(NaiveDate),
}

impl Value {
    /// Rank used as the primary sort key across variants.
    #[inline]
    fn type_rank(&self) -> u8 {
        match self {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::I64(_) | Value::F64(_) => 2,
            Value::Date(_) | Value::String(_) => 3,
        }
    }

    /// Returns true if the value is [Value::Null].
    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns true if the value can participate in ordered comparisons.
    #[inline]
    pub fn is_comparable(&self) -> bool {
        !self.is_null()
    }

    /// Returns true if the value is an empty string or null. Such values do
    /// not participate in field type inference.
    #[inline]
    pub fn is_blank(&self) -> bool {
        match self {
            Value::Null => true,
            Value::String(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::I64(i) => Some(*i),
            _ => None,
        }
    }

    /// Numeric view of the value; integers widen to `f64`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::I64(i) => Some(*i as f64),
            Value::F64(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Value::Date(d) => Some(*d),
            _ => None,
        }
    }

    /// Name of the variant, used in diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::I64(_) => "i64",
            Value::F64(_) => "f64",
            Value::String(_) => "string",
            Value::Date(_) => "date",
        }
    }

    /// Parses a date from ISO `YYYY-MM-DD` text or a full RFC 3339
    /// timestamp (date part taken).
    pub fn parse_date(text: &str) -> Option<NaiveDate> {
        let trimmed = text.trim();
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, DATE_FORMAT) {
            return Some(date);
        }
        DateTime::parse_from_rfc3339(trimmed)
            .ok()
            .map(|dt| dt.date_naive())
    }

    /// Parses a finite number from text.
    pub fn parse_number(text: &str) -> Option<f64> {
        text.trim().parse::<f64>().ok().filter(|f| f.is_finite())
    }

    /// Converts to the JSON scalar used by the wire format. Dates serialize
    /// as ISO `YYYY-MM-DD` strings; non-finite floats degrade to JSON null.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::I64(i) => serde_json::Value::from(*i),
            Value::F64(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Date(d) => serde_json::Value::String(d.format(DATE_FORMAT).to_string()),
        }
    }

    /// Converts a JSON scalar from the wire format back into a [Value].
    ///
    /// Strings that exactly match the ISO `YYYY-MM-DD` shape become dates,
    /// mirroring how [to_json](Value::to_json) renders them. Arrays and
    /// objects are not valid clause values and are rejected.
    pub fn from_json(json: &serde_json::Value) -> MapsiftResult<Value> {
        match json {
            serde_json::Value::Null => Ok(Value::Null),
            serde_json::Value::Bool(b) => Ok(Value::Bool(*b)),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Ok(Value::I64(i))
                } else if let Some(f) = n.as_f64() {
                    Ok(Value::F64(f))
                } else {
                    log::error!("Unrepresentable number in expression: {}", n);
                    Err(MapsiftError::new(
                        &format!("Unrepresentable number in expression: {}", n),
                        ErrorKind::DecodeError,
                    ))
                }
            }
            serde_json::Value::String(s) => {
                match NaiveDate::parse_from_str(s, DATE_FORMAT) {
                    Ok(date) if s.len() == 10 => Ok(Value::Date(date)),
                    _ => Ok(Value::String(s.clone())),
                }
            }
            other => {
                log::error!("Non-scalar value in expression: {}", other);
                Err(MapsiftError::new(
                    "Non-scalar value in expression",
                    ErrorKind::DecodeError,
                ))
            }
        }
    }

    /// ISO rendering shared by dates and the string rank for ordering.
    fn lexical(&self) -> Option<String> {
        match self {
            Value::Date(d) => Some(d.format(DATE_FORMAT).to_string()),
            Value::String(s) => Some(s.clone()),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::I64(a), Value::I64(b)) => a == b,
            (Value::F64(a), Value::F64(b)) => {
                (a.is_nan() && b.is_nan()) || a == b
            }
            (Value::I64(a), Value::F64(b)) | (Value::F64(b), Value::I64(a)) => *a as f64 == *b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Date(a), Value::Date(b)) => a == b,
            // A date equals its exact ISO rendering so decoded expressions
            // match values indexed from mixed-typed discrete fields.
            (Value::Date(d), Value::String(s)) | (Value::String(s), Value::Date(d)) => {
                s.len() == 10 && *s == d.format(DATE_FORMAT).to_string()
            }
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.type_rank().hash(state);
        match self {
            Value::Null => {}
            Value::Bool(b) => b.hash(state),
            Value::I64(i) => canonical_float_bits(*i as f64).hash(state),
            Value::F64(f) => canonical_float_bits(*f).hash(state),
            Value::String(s) => s.hash(state),
            Value::Date(d) => d.format(DATE_FORMAT).to_string().hash(state),
        }
    }
}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        let rank = self.type_rank().cmp(&other.type_rank());
        if rank != Ordering::Equal {
            return rank;
        }
        match (self, other) {
            (Value::Null, Value::Null) => Ordering::Equal,
            (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
            (Value::I64(a), Value::I64(b)) => a.cmp(b),
            (Value::Date(a), Value::Date(b)) => a.cmp(b),
            (Value::String(a), Value::String(b)) => a.cmp(b),
            _ => {
                if self.type_rank() == 2 {
                    // mixed integer/float comparison
                    let a = self.as_f64().unwrap_or(f64::NAN);
                    let b = other.as_f64().unwrap_or(f64::NAN);
                    num_cmp_float(a, b)
                } else {
                    // mixed date/string comparison on the ISO rendering
                    let a = self.lexical().unwrap_or_default();
                    let b = other.lexical().unwrap_or_default();
                    a.cmp(&b)
                }
            }
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::I64(i) => write!(f, "{}", i),
            Value::F64(v) => write!(f, "{}", v),
            Value::String(s) => write!(f, "{}", s),
            Value::Date(d) => write!(f, "{}", d.format(DATE_FORMAT)),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::I64(i as i64)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::I64(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::F64(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<NaiveDate> for Value {
    fn from(d: NaiveDate) -> Self {
        Value::Date(d)
    }
}
