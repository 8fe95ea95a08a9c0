use crate::analyzer::FieldDescriptor;
use crate::filter::Clause;
use indexmap::IndexMap;

/// The full set of per-field clauses currently applied.
///
/// `FilterState` is the single source of truth for "what is currently
/// filtered": a mapping from field name to [Clause], with absence meaning no
/// constraint on that field. Updates are pure state changes; recomputing
/// derived visible sets is the engine's job, triggered by the caller.
///
/// Field names present here are normally a subset of the fields discovered
/// by the analyzer, except transiently when state was decoded from an
/// external source (a shared URL) referencing a field not yet analyzed —
/// such clauses are carried opaquely until an analysis pass can validate
/// them, never raising.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterState {
    clauses: IndexMap<String, Clause>,
}

impl FilterState {
    pub fn new() -> Self {
        FilterState {
            clauses: IndexMap::new(),
        }
    }

    /// Sets or removes the clause on one field. `None` removes any
    /// constraint on that field.
    pub fn set_clause(&mut self, field: impl Into<String>, clause: Option<Clause>) {
        let field = field.into();
        match clause {
            Some(clause) => {
                self.clauses.insert(field, clause);
            }
            None => {
                self.clauses.shift_remove(&field);
            }
        }
    }

    pub fn get_clause(&self, field: &str) -> Option<&Clause> {
        self.clauses.get(field)
    }

    /// Constrained field names in insertion order.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.clauses.keys().map(|k| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Clause)> {
        self.clauses.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.clauses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// True iff any field carries a non-trivial clause, judged against the
    /// supplied descriptors. Clauses on fields without a descriptor count as
    /// active — an externally supplied constraint is active until analysis
    /// proves otherwise.
    pub fn is_active(&self, descriptors: &IndexMap<String, FieldDescriptor>) -> bool {
        self.clauses.iter().any(|(field, clause)| {
            descriptors
                .get(field)
                .map(|d| !clause.is_trivial(d))
                .unwrap_or(true)
        })
    }

    /// A copy of this state with every trivial (full-domain) clause dropped.
    ///
    /// Normalization is judged against the descriptors supplied now; clauses
    /// on fields the descriptors do not cover are kept as-is.
    pub fn normalized(&self, descriptors: &IndexMap<String, FieldDescriptor>) -> FilterState {
        let clauses = self
            .clauses
            .iter()
            .filter(|(field, clause)| {
                descriptors
                    .get(*field)
                    .map(|d| !clause.is_trivial(d))
                    .unwrap_or(true)
            })
            .map(|(field, clause)| (field.clone(), clause.clone()))
            .collect();
        FilterState { clauses }
    }

    /// Merges the configured display list with the currently constrained
    /// fields: the result is the union, display-list order first, so that an
    /// externally supplied filter referencing a field outside the default
    /// display list still renders its widget. Constraints are always
    /// visible to the user, never silently applied invisibly.
    pub fn merge_fields(&self, display_fields: &[String]) -> Vec<String> {
        let mut merged: Vec<String> = display_fields.to_vec();
        for field in self.clauses.keys() {
            if !merged.iter().any(|f| f == field) {
                merged.push(field.clone());
            }
        }
        merged
    }
}

impl FromIterator<(String, Clause)> for FilterState {
    fn from_iter<T: IntoIterator<Item = (String, Clause)>>(iter: T) -> Self {
        FilterState {
            clauses: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::{FieldDomain, FieldType};
    use crate::common::Value;

    fn severity_descriptor() -> IndexMap<String, FieldDescriptor> {
        let counts: IndexMap<Value, usize> =
            [(Value::from("high"), 1), (Value::from("low"), 2)]
                .into_iter()
                .collect();
        let mut descriptors = IndexMap::new();
        descriptors.insert(
            "severity".to_string(),
            FieldDescriptor::new(
                "severity",
                FieldType::Discrete,
                FieldDomain::Discrete(counts),
            ),
        );
        descriptors
    }

    #[test]
    fn test_set_and_remove_clause() {
        let mut state = FilterState::new();
        state.set_clause(
            "severity",
            Some(Clause::membership(vec![Value::from("high")]).unwrap()),
        );
        assert!(state.get_clause("severity").is_some());
        state.set_clause("severity", None);
        assert!(state.get_clause("severity").is_none());
        assert!(state.is_empty());
    }

    #[test]
    fn test_is_active_with_trivial_clause() {
        let descriptors = severity_descriptor();
        let mut state = FilterState::new();
        assert!(!state.is_active(&descriptors));

        // full-domain membership is not an active filter
        state.set_clause(
            "severity",
            Some(
                Clause::membership(vec![Value::from("high"), Value::from("low")]).unwrap(),
            ),
        );
        assert!(!state.is_active(&descriptors));

        state.set_clause(
            "severity",
            Some(Clause::membership(vec![Value::from("high")]).unwrap()),
        );
        assert!(state.is_active(&descriptors));
    }

    #[test]
    fn test_unknown_field_counts_as_active() {
        let descriptors = severity_descriptor();
        let mut state = FilterState::new();
        state.set_clause(
            "unknown_field",
            Some(Clause::membership(vec![Value::from("x")]).unwrap()),
        );
        assert!(state.is_active(&descriptors));
        // normalization keeps clauses it cannot validate
        assert_eq!(state.normalized(&descriptors), state);
    }

    #[test]
    fn test_normalized_drops_trivial_clauses() {
        let descriptors = severity_descriptor();
        let mut state = FilterState::new();
        state.set_clause(
            "severity",
            Some(
                Clause::membership(vec![Value::from("low"), Value::from("high")]).unwrap(),
            ),
        );
        let normalized = state.normalized(&descriptors);
        assert!(normalized.is_empty());
        // the original state is untouched
        assert_eq!(state.len(), 1);
    }

    #[test]
    fn test_merge_fields_union() {
        let mut state = FilterState::new();
        state.set_clause(
            "happening",
            Some(Clause::membership(vec![Value::from("mining")]).unwrap()),
        );
        let display = vec!["severity".to_string(), "reported_at".to_string()];
        assert_eq!(
            state.merge_fields(&display),
            vec![
                "severity".to_string(),
                "reported_at".to_string(),
                "happening".to_string()
            ]
        );
    }

    #[test]
    fn test_merge_fields_no_duplicates() {
        let mut state = FilterState::new();
        state.set_clause(
            "severity",
            Some(Clause::membership(vec![Value::from("high")]).unwrap()),
        );
        let display = vec!["severity".to_string()];
        assert_eq!(state.merge_fields(&display), vec!["severity".to_string()]);
    }
}
