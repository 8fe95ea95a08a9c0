use crate::analyzer::{FieldDescriptor, FieldDomain, FieldType};
use crate::common::{is_internal_key, not_recorded_value, Value};
use crate::feature::Feature;
use indexmap::IndexMap;
use itertools::Itertools;

/// Scans a feature collection and classifies each property key as a
/// filterable field with a value domain.
///
/// Fields are discovered as the union of non-internal property keys across
/// all features, in first-appearance order. Type inference per field tries
/// dates first, then numbers, and falls back to discrete; a field whose
/// values are inconsistently typed is discrete rather than an error —
/// inference never fails the whole analysis.
///
/// The scan is read-only and deterministic: the same feature sequence always
/// produces the same descriptors, and re-running on an unchanged collection
/// is idempotent.
///
/// # Example
///
/// ```rust,ignore
/// use mapsift::analyzer::analyze;
///
/// let descriptors = analyze(&collection.to_vec());
/// for descriptor in descriptors.values() {
///     println!("{}: {}", descriptor.name(), descriptor.field_type());
/// }
/// ```
pub fn analyze<'a, I>(features: I) -> IndexMap<String, FieldDescriptor>
where
    I: IntoIterator<Item = &'a Feature>,
{
    let features: Vec<&Feature> = features.into_iter().collect();

    // Union of filterable keys, first-appearance order.
    let mut field_names: Vec<String> = Vec::new();
    for feature in &features {
        for name in feature.property_names() {
            if !field_names.iter().any(|n| n == name) {
                field_names.push(name.to_string());
            }
        }
    }

    let mut descriptors = IndexMap::with_capacity(field_names.len());
    for name in field_names {
        let field_type = infer_type(&name, &features);
        let domain = build_domain(&name, field_type, &features);
        descriptors.insert(
            name.clone(),
            FieldDescriptor::new(name, field_type, domain),
        );
    }
    descriptors
}

/// Type inference over all non-blank observed values of one field.
fn infer_type(name: &str, features: &[&Feature]) -> FieldType {
    let mut seen_any = false;
    let mut all_dates = true;
    let mut all_numbers = true;

    for feature in features {
        let Some(value) = feature.property(name) else {
            continue;
        };
        if value.is_blank() {
            continue;
        }
        seen_any = true;
        if all_dates && !parses_as_date(value) {
            all_dates = false;
        }
        if all_numbers && !parses_as_number(value) {
            all_numbers = false;
        }
        if !all_dates && !all_numbers {
            break;
        }
    }

    if !seen_any {
        // key exists but carries no values; only the sentinel is filterable
        return FieldType::Discrete;
    }
    if all_dates {
        FieldType::Date
    } else if all_numbers {
        FieldType::Number
    } else {
        FieldType::Discrete
    }
}

fn parses_as_date(value: &Value) -> bool {
    match value {
        Value::Date(_) => true,
        Value::String(s) => Value::parse_date(s).is_some(),
        _ => false,
    }
}

fn parses_as_number(value: &Value) -> bool {
    match value {
        Value::I64(_) | Value::F64(_) => true,
        Value::String(s) => Value::parse_number(s).is_some(),
        _ => false,
    }
}

fn build_domain(name: &str, field_type: FieldType, features: &[&Feature]) -> FieldDomain {
    match field_type {
        FieldType::Discrete => {
            let mut counts: IndexMap<Value, usize> = IndexMap::new();
            for feature in features {
                let value = feature
                    .property(name)
                    .and_then(|v| field_type.canonicalize(v))
                    .unwrap_or_else(not_recorded_value);
                *counts.entry(value).or_insert(0) += 1;
            }
            FieldDomain::Discrete(counts)
        }
        FieldType::Number | FieldType::Date => {
            let bounds = features
                .iter()
                .filter_map(|f| f.property(name))
                .filter_map(|v| field_type.canonicalize(v))
                .minmax()
                .into_option();
            match bounds {
                Some((min, max)) => FieldDomain::Range { min, max },
                // inference guarantees at least one value for range types
                None => FieldDomain::Range {
                    min: Value::Null,
                    max: Value::Null,
                },
            }
        }
    }
}
