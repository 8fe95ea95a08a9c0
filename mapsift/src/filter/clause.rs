use crate::analyzer::{FieldDescriptor, FieldDomain};
use crate::common::{not_recorded_value, Value};
use crate::errors::{ErrorKind, MapsiftError, MapsiftResult};
use indexmap::IndexSet;
use std::fmt::{Display, Formatter};

/// A single field's filter predicate.
///
/// Either a membership test over a set of allowed values (discrete fields)
/// or an inclusive range over a number or date field. Absence of a clause on
/// a field means "no constraint on this field".
///
/// # Invariants
///
/// - Range bounds satisfy `low <= high` (validated at construction).
/// - A membership set is never empty (validated at construction).
/// - A clause covering the field's full observed domain is equivalent to no
///   filter; [Clause::is_trivial] detects this so stores and compilers can
///   normalize such clauses away.
#[derive(Debug, Clone, PartialEq)]
pub enum Clause {
    /// Matches features whose value is one of the allowed values. Membership
    /// equality disregards insertion order.
    Membership(IndexSet<Value>),
    /// Matches features whose value lies in `low..=high`.
    Range { low: Value, high: Value },
}

impl Clause {
    /// Creates a membership clause over the given allowed values.
    ///
    /// # Errors
    ///
    /// Returns [ErrorKind::InvalidClause] when the value set is empty.
    pub fn membership(values: impl IntoIterator<Item = Value>) -> MapsiftResult<Clause> {
        let set: IndexSet<Value> = values.into_iter().collect();
        if set.is_empty() {
            log::error!("Membership clause requires at least one allowed value");
            return Err(MapsiftError::new(
                "Membership clause requires at least one allowed value",
                ErrorKind::InvalidClause,
            ));
        }
        Ok(Clause::Membership(set))
    }

    /// Creates an inclusive range clause.
    ///
    /// # Errors
    ///
    /// Returns [ErrorKind::InvalidClause] when `low > high`.
    pub fn range(low: impl Into<Value>, high: impl Into<Value>) -> MapsiftResult<Clause> {
        let low = low.into();
        let high = high.into();
        if low > high {
            log::error!("Range clause requires low <= high, got {} > {}", low, high);
            return Err(MapsiftError::new(
                &format!("Range clause requires low <= high, got {} > {}", low, high),
                ErrorKind::InvalidClause,
            ));
        }
        Ok(Clause::Range { low, high })
    }

    /// Evaluates the clause against a feature's property value.
    ///
    /// Membership substitutes the `not_recorded` sentinel for absent or null
    /// values, so unrecorded features can still be selected. Range clauses
    /// fail for absent values: a feature without the property never matches
    /// an active range filter.
    pub fn matches(&self, value: Option<&Value>) -> bool {
        match self {
            Clause::Membership(allowed) => {
                let candidate = match value {
                    Some(v) if !v.is_null() => v.clone(),
                    _ => not_recorded_value(),
                };
                allowed.contains(&candidate)
            }
            Clause::Range { low, high } => match value {
                Some(v) if v.is_comparable() => low <= v && v <= high,
                _ => false,
            },
        }
    }

    /// Returns true when this clause covers the field's full observed
    /// domain and is therefore equivalent to "no filter on this field".
    ///
    /// Triviality is judged against the domain supplied at this moment; a
    /// clause kept in a store is never reinterpreted later because new data
    /// widened the observed domain.
    pub fn is_trivial(&self, descriptor: &FieldDescriptor) -> bool {
        match (self, descriptor.domain()) {
            (Clause::Membership(allowed), FieldDomain::Discrete(counts)) => {
                allowed.len() == counts.len() && counts.keys().all(|v| allowed.contains(v))
            }
            (Clause::Range { low, high }, FieldDomain::Range { min, max }) => {
                low == min && high == max
            }
            _ => false,
        }
    }
}

impl Display for Clause {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Clause::Membership(allowed) => {
                write!(f, "in [")?;
                for (i, v) in allowed.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", v)?;
                }
                write!(f, "]")
            }
            Clause::Range { low, high } => write!(f, "{}..={}", low, high),
        }
    }
}
