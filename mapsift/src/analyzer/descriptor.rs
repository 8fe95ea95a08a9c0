use crate::common::Value;
use indexmap::IndexMap;
use std::fmt::{Display, Formatter};

/// Classification of a filterable field.
///
/// A field's type, once classified, is stable for the lifetime of an
/// analysis pass; re-classification only occurs on an explicit full
/// re-analysis (for example after a collection reset).
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
pub enum FieldType {
    /// Enumerable categorical values, filtered by membership.
    Discrete,
    /// Numeric values, filtered by range.
    Number,
    /// Calendar dates, filtered by range.
    Date,
}

impl FieldType {
    /// Converts an observed property value into the canonical form indexed
    /// for this field type.
    ///
    /// Returns `None` when the value is blank or cannot be represented in
    /// this type — for range-typed fields such a value is excluded from the
    /// dimension index entirely; for discrete fields the caller substitutes
    /// the `not_recorded` sentinel.
    pub fn canonicalize(&self, value: &Value) -> Option<Value> {
        if value.is_blank() {
            return None;
        }
        match self {
            FieldType::Date => match value {
                Value::Date(d) => Some(Value::Date(*d)),
                Value::String(s) => Value::parse_date(s).map(Value::Date),
                _ => None,
            },
            FieldType::Number => match value {
                Value::I64(_) | Value::F64(_) => Some(value.clone()),
                Value::String(s) => Value::parse_number(s).map(Value::F64),
                _ => None,
            },
            FieldType::Discrete => Some(value.clone()),
        }
    }
}

impl Display for FieldType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldType::Discrete => write!(f, "discrete"),
            FieldType::Number => write!(f, "number"),
            FieldType::Date => write!(f, "date"),
        }
    }
}

/// The value domain of a field, derived from the whole collection.
///
/// Domains always cover all features currently in the collection, not just
/// the currently visible subset — re-filtering must never shrink the
/// selectable range.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldDomain {
    /// Distinct value to occurrence count. Absent values are counted under
    /// the `not_recorded` sentinel, so every feature contributes exactly one
    /// count.
    Discrete(IndexMap<Value, usize>),
    /// Minimum and maximum observed values of a number or date field.
    Range { min: Value, max: Value },
}

/// Everything the filter UI needs to know about one filterable field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
    name: String,
    field_type: FieldType,
    domain: FieldDomain,
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>, field_type: FieldType, domain: FieldDomain) -> Self {
        FieldDescriptor {
            name: name.into(),
            field_type,
            domain,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn field_type(&self) -> FieldType {
        self.field_type
    }

    pub fn domain(&self) -> &FieldDomain {
        &self.domain
    }

    /// Distinct values with occurrence counts; `None` for range-typed fields.
    pub fn discrete_values(&self) -> Option<&IndexMap<Value, usize>> {
        match &self.domain {
            FieldDomain::Discrete(counts) => Some(counts),
            FieldDomain::Range { .. } => None,
        }
    }

    /// Observed `(min, max)` bounds; `None` for discrete fields.
    pub fn range_bounds(&self) -> Option<(&Value, &Value)> {
        match &self.domain {
            FieldDomain::Range { min, max } => Some((min, max)),
            FieldDomain::Discrete(_) => None,
        }
    }
}
