use crate::analyzer::FieldType;
use crate::common::{not_recorded_value, Value};
use crate::feature::{Feature, FeatureId};
use crate::filter::Clause;
use smallvec::SmallVec;
use std::collections::{BTreeMap, HashSet};
use std::ops::Bound;

/// Sorted value-to-feature index for one filterable field.
///
/// The index keys are canonicalized per the field's type, so a range clause
/// resolves to one ordered scan and a membership clause to point lookups.
/// Discrete dimensions index absent or blank values under the
/// `not_recorded` sentinel; range dimensions leave such features out of the
/// index entirely, which makes them fail every range clause.
#[derive(Debug)]
pub(crate) struct Dimension {
    field: String,
    field_type: FieldType,
    index: BTreeMap<Value, SmallVec<[FeatureId; 2]>>,
}

impl Dimension {
    pub(crate) fn new(field: impl Into<String>, field_type: FieldType) -> Self {
        Dimension {
            field: field.into(),
            field_type,
            index: BTreeMap::new(),
        }
    }

    pub(crate) fn field(&self) -> &str {
        &self.field
    }

    pub(crate) fn field_type(&self) -> FieldType {
        self.field_type
    }

    /// The canonical index key for a feature, `None` when the feature is
    /// not indexed in this dimension.
    fn indexed_value(&self, feature: &Feature) -> Option<Value> {
        let canonical = feature
            .property(&self.field)
            .and_then(|v| self.field_type.canonicalize(v));
        match (canonical, self.field_type) {
            (Some(value), _) => Some(value),
            (None, FieldType::Discrete) => Some(not_recorded_value()),
            (None, _) => None,
        }
    }

    pub(crate) fn insert(&mut self, feature: &Feature) {
        if let Some(value) = self.indexed_value(feature) {
            self.index.entry(value).or_default().push(feature.id().clone());
        }
    }

    pub(crate) fn remove(&mut self, feature: &Feature) {
        if let Some(value) = self.indexed_value(feature) {
            if let Some(ids) = self.index.get_mut(&value) {
                ids.retain(|id| id != feature.id());
                if ids.is_empty() {
                    self.index.remove(&value);
                }
            }
        }
    }

    pub(crate) fn clear(&mut self) {
        self.index.clear();
    }

    /// Whether one feature satisfies the clause in this dimension.
    pub(crate) fn matches(&self, clause: &Clause, feature: &Feature) -> bool {
        match self.indexed_value(feature) {
            Some(value) => self.value_matches(clause, &value),
            None => false,
        }
    }

    fn value_matches(&self, clause: &Clause, value: &Value) -> bool {
        match clause {
            Clause::Membership(allowed) => allowed
                .iter()
                .filter_map(|v| self.canonicalize_clause_value(v))
                .any(|v| &v == value),
            Clause::Range { low, high } => {
                match (
                    self.canonicalize_clause_value(low),
                    self.canonicalize_clause_value(high),
                ) {
                    (Some(low), Some(high)) => *value >= low && *value <= high,
                    _ => false,
                }
            }
        }
    }

    /// All feature ids satisfying the clause, resolved against the index.
    pub(crate) fn ids_matching(&self, clause: &Clause) -> HashSet<FeatureId> {
        match clause {
            Clause::Membership(allowed) => allowed
                .iter()
                .filter_map(|v| self.canonicalize_clause_value(v))
                .filter_map(|v| self.index.get(&v))
                .flat_map(|ids| ids.iter().cloned())
                .collect(),
            Clause::Range { low, high } => {
                let (low, high) = match (
                    self.canonicalize_clause_value(low),
                    self.canonicalize_clause_value(high),
                ) {
                    (Some(low), Some(high)) if low <= high => (low, high),
                    _ => return HashSet::new(),
                };
                self.index
                    .range((Bound::Included(low), Bound::Included(high)))
                    .flat_map(|(_, ids)| ids.iter().cloned())
                    .collect()
            }
        }
    }

    // clause values arrive in wire form (dates possibly as strings,
    // numbers possibly as strings); fold them into the index's key space
    // before comparing
    fn canonicalize_clause_value(&self, value: &Value) -> Option<Value> {
        if self.field_type == FieldType::Discrete && value == &not_recorded_value() {
            return Some(not_recorded_value());
        }
        self.field_type.canonicalize(value)
    }

    /// Distinct indexed values in sorted order with their feature ids.
    pub(crate) fn iter(&self) -> impl Iterator<Item = (&Value, &SmallVec<[FeatureId; 2]>)> {
        self.index.iter()
    }

    #[cfg(test)]
    fn ids_for(&self, value: &Value) -> Vec<FeatureId> {
        self.index
            .get(value)
            .map(|ids| ids.to_vec())
            .unwrap_or_default()
    }
}
