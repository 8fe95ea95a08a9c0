use crate::common::{Value, ALL_OPERATOR, GTE_OPERATOR, IN_OPERATOR, LTE_OPERATOR};
use crate::errors::{ErrorKind, MapsiftError, MapsiftResult};
use crate::filter::{Clause, FilterState};
use indexmap::IndexMap;
use serde_json::Value as Json;
use std::fmt::{Display, Formatter};

/// The compiled wire form of a [FilterState]: a single boolean
/// AND-combination of per-field clauses as a nested JSON array, compatible
/// with the widely used map-styling filter syntax.
///
/// Shapes produced and consumed:
///
/// - match everything: `["all"]`
/// - discrete membership: `["in", <field>, v1, v2, …]`
/// - range: `[">=", <field>, low]` and `["<=", <field>, high]`
/// - top level: `["all", <sub-expression>…]`
///
/// [compile] is total: every valid filter state has a wire form.
/// [decompile] is best-effort partial: foreign expressions may be rejected
/// or partially understood without corrupting existing state.
#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    json: Json,
}

impl Expression {
    /// The canonical "match everything" expression, `["all"]`.
    pub fn match_all() -> Self {
        Expression {
            json: serde_json::json!([ALL_OPERATOR]),
        }
    }

    /// Wraps a JSON value, validating only the top-level shape: an array
    /// whose first element is the `"all"` operator.
    ///
    /// # Errors
    ///
    /// Returns [ErrorKind::CompileError] when the value is not an `all`
    /// array; such input is completely invalid rather than partially
    /// understood.
    pub fn from_json(json: Json) -> MapsiftResult<Self> {
        match json.as_array().and_then(|a| a.first()) {
            Some(Json::String(op)) if op == ALL_OPERATOR => Ok(Expression { json }),
            _ => {
                log::error!("Filter expression is not an \"all\" combination: {}", json);
                Err(MapsiftError::new(
                    "Filter expression is not an \"all\" combination",
                    ErrorKind::CompileError,
                ))
            }
        }
    }

    pub fn as_json(&self) -> &Json {
        &self.json
    }

    pub fn into_json(self) -> Json {
        self.json
    }

    /// True for the canonical match-all expression (no sub-clauses).
    pub fn is_match_all(&self) -> bool {
        self.json
            .as_array()
            .map(|a| a.len() <= 1)
            .unwrap_or(false)
    }

    fn sub_expressions(&self) -> &[Json] {
        match self.json.as_array() {
            Some(array) if array.len() > 1 => &array[1..],
            _ => &[],
        }
    }
}

impl Display for Expression {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.json)
    }
}

/// Result of [decompile]: the understood filter state plus the fields or
/// sub-expressions that were skipped.
///
/// An `Ok` with non-empty `skipped` means "partially understood" — the
/// caller may keep the parsed subset and surface one warning. A decompile
/// `Err` means "completely invalid" — the caller should reset the filter.
#[derive(Debug, Clone, PartialEq)]
pub struct Decompiled {
    pub state: FilterState,
    pub skipped: Vec<String>,
}

impl Decompiled {
    pub fn is_partial(&self) -> bool {
        !self.skipped.is_empty()
    }
}

/// Compiles a filter state into its wire expression.
///
/// Every field's clause becomes one or two sub-expressions: membership
/// becomes one `in` clause, a range becomes a `>=` and a `<=` clause. An
/// empty state compiles to the canonical match-all expression. Compilation
/// is a total function; it never fails.
pub fn compile(state: &FilterState) -> Expression {
    let mut array: Vec<Json> = vec![Json::String(ALL_OPERATOR.to_string())];
    for (field, clause) in state.iter() {
        match clause {
            Clause::Membership(allowed) => {
                let mut sub = vec![
                    Json::String(IN_OPERATOR.to_string()),
                    Json::String(field.to_string()),
                ];
                sub.extend(allowed.iter().map(|v| v.to_json()));
                array.push(Json::Array(sub));
            }
            Clause::Range { low, high } => {
                array.push(Json::Array(vec![
                    Json::String(GTE_OPERATOR.to_string()),
                    Json::String(field.to_string()),
                    low.to_json(),
                ]));
                array.push(Json::Array(vec![
                    Json::String(LTE_OPERATOR.to_string()),
                    Json::String(field.to_string()),
                    high.to_json(),
                ]));
            }
        }
    }
    Expression {
        json: Json::Array(array),
    }
}

/// Decompiles a wire expression back into a filter state.
///
/// Inverse of [compile] for any expression it produced (the round-trip
/// law). Sub-expressions that do not match the expected shape — unknown
/// operators, nested boolean groups, non-scalar values, inverted or lone
/// range bounds — are skipped with a warning and reported in
/// [Decompiled::skipped] rather than failing the whole decode.
///
/// # Errors
///
/// Returns [ErrorKind::CompileError] only when the top level itself is not
/// an `all` array; everything below that degrades per sub-expression.
pub fn decompile(expression: &Expression) -> MapsiftResult<Decompiled> {
    let mut memberships: IndexMap<String, Clause> = IndexMap::new();
    let mut bounds: IndexMap<String, (Option<Value>, Option<Value>)> = IndexMap::new();
    let mut skipped: Vec<String> = Vec::new();

    for sub in expression.sub_expressions() {
        match parse_sub_expression(sub) {
            Some(SubExpression::Membership { field, values }) => {
                if memberships.contains_key(&field) || bounds.contains_key(&field) {
                    skip(&mut skipped, &field, "duplicate clause for field");
                    continue;
                }
                match Clause::membership(values) {
                    Ok(clause) => {
                        memberships.insert(field, clause);
                    }
                    Err(_) => skip(&mut skipped, &field, "empty membership clause"),
                }
            }
            Some(SubExpression::Bound { field, low, value }) => {
                if memberships.contains_key(&field) {
                    skip(&mut skipped, &field, "field has both membership and range clauses");
                    continue;
                }
                let entry = bounds.entry(field.clone()).or_insert((None, None));
                let slot = if low { &mut entry.0 } else { &mut entry.1 };
                if slot.is_some() {
                    skip(&mut skipped, &field, "duplicate range bound");
                } else {
                    *slot = Some(value);
                }
            }
            None => {
                let rendered = sub.to_string();
                log::warn!("Skipping unrecognized filter sub-expression: {}", rendered);
                skipped.push(rendered);
            }
        }
    }

    let mut state: FilterState = memberships.into_iter().collect();
    for (field, pair) in bounds {
        match pair {
            (Some(low), Some(high)) if low <= high => {
                state.set_clause(field, Some(Clause::Range { low, high }));
            }
            (Some(_), Some(_)) => skip(&mut skipped, &field, "inverted range bounds"),
            _ => skip(&mut skipped, &field, "range clause with a single bound"),
        }
    }

    Ok(Decompiled { state, skipped })
}

fn skip(skipped: &mut Vec<String>, field: &str, reason: &str) {
    log::warn!("Skipping filter clause on {}: {}", field, reason);
    skipped.push(field.to_string());
}

enum SubExpression {
    Membership { field: String, values: Vec<Value> },
    Bound { field: String, low: bool, value: Value },
}

fn parse_sub_expression(sub: &Json) -> Option<SubExpression> {
    let array = sub.as_array()?;
    let op = array.first()?.as_str()?;
    let field = array.get(1)?.as_str()?.to_string();
    match op {
        IN_OPERATOR if array.len() >= 3 => {
            let mut values = Vec::with_capacity(array.len() - 2);
            for json in &array[2..] {
                values.push(Value::from_json(json).ok()?);
            }
            Some(SubExpression::Membership { field, values })
        }
        GTE_OPERATOR | LTE_OPERATOR if array.len() == 3 => {
            let value = Value::from_json(&array[2]).ok()?;
            if !value.is_comparable() {
                return None;
            }
            Some(SubExpression::Bound {
                field,
                low: op == GTE_OPERATOR,
                value,
            })
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;

    fn date(y: i32, m: u32, d: u32) -> Value {
        Value::Date(NaiveDate::from_ymd_opt(y, m, d).unwrap())
    }

    fn membership(values: &[&str]) -> Clause {
        Clause::membership(values.iter().map(|v| Value::from(*v))).unwrap()
    }

    #[test]
    fn test_empty_state_compiles_to_match_all() {
        let expression = compile(&FilterState::new());
        assert_eq!(expression, Expression::match_all());
        assert!(expression.is_match_all());
    }

    #[test]
    fn test_match_all_decompiles_to_empty_state() {
        let decompiled = decompile(&Expression::match_all()).unwrap();
        assert!(decompiled.state.is_empty());
        assert!(!decompiled.is_partial());
    }

    #[test]
    fn test_compile_shapes() {
        let mut state = FilterState::new();
        state.set_clause("severity", Some(membership(&["high", "medium"])));
        state.set_clause(
            "reported_at",
            Some(Clause::range(date(2020, 1, 1), date(2020, 1, 31)).unwrap()),
        );
        let expression = compile(&state);
        assert_eq!(
            expression.as_json(),
            &json!([
                "all",
                ["in", "severity", "high", "medium"],
                [">=", "reported_at", "2020-01-01"],
                ["<=", "reported_at", "2020-01-31"]
            ])
        );
    }

    #[test]
    fn test_round_trip() {
        let mut state = FilterState::new();
        state.set_clause("severity", Some(membership(&["high", "low"])));
        state.set_clause("depth", Some(Clause::range(2.5, 7.0).unwrap()));
        state.set_clause(
            "reported_at",
            Some(Clause::range(date(2021, 3, 1), date(2021, 4, 1)).unwrap()),
        );
        let decompiled = decompile(&compile(&state)).unwrap();
        assert_eq!(decompiled.state, state);
        assert!(decompiled.skipped.is_empty());
    }

    #[test]
    fn test_bounds_merge_in_either_order() {
        let expression = Expression::from_json(json!([
            "all",
            ["<=", "depth", 9],
            [">=", "depth", 3]
        ]))
        .unwrap();
        let decompiled = decompile(&expression).unwrap();
        assert_eq!(
            decompiled.state.get_clause("depth"),
            Some(&Clause::Range {
                low: Value::I64(3),
                high: Value::I64(9)
            })
        );
    }

    #[test]
    fn test_unknown_operator_is_skipped() {
        let expression = Expression::from_json(json!([
            "all",
            ["in", "severity", "high"],
            ["!=", "severity", "low"]
        ]))
        .unwrap();
        let decompiled = decompile(&expression).unwrap();
        assert!(decompiled.is_partial());
        assert_eq!(decompiled.state.len(), 1);
        assert!(decompiled.state.get_clause("severity").is_some());
    }

    #[test]
    fn test_nested_group_is_skipped() {
        let expression = Expression::from_json(json!([
            "all",
            ["any", ["in", "a", 1], ["in", "b", 2]]
        ]))
        .unwrap();
        let decompiled = decompile(&expression).unwrap();
        assert!(decompiled.state.is_empty());
        assert_eq!(decompiled.skipped.len(), 1);
    }

    #[test]
    fn test_lone_bound_is_skipped() {
        let expression =
            Expression::from_json(json!(["all", [">=", "depth", 3]])).unwrap();
        let decompiled = decompile(&expression).unwrap();
        assert!(decompiled.state.is_empty());
        assert_eq!(decompiled.skipped, vec!["depth".to_string()]);
    }

    #[test]
    fn test_inverted_bounds_are_skipped() {
        let expression = Expression::from_json(json!([
            "all",
            [">=", "depth", 9],
            ["<=", "depth", 3]
        ]))
        .unwrap();
        let decompiled = decompile(&expression).unwrap();
        assert!(decompiled.state.is_empty());
        assert_eq!(decompiled.skipped, vec!["depth".to_string()]);
    }

    #[test]
    fn test_invalid_top_level_is_rejected() {
        assert!(Expression::from_json(json!(["any", ["in", "a", 1]])).is_err());
        assert!(Expression::from_json(json!("all")).is_err());
        assert!(Expression::from_json(json!([])).is_err());
        assert!(Expression::from_json(json!({"filter": []})).is_err());
    }

    #[test]
    fn test_duplicate_clause_is_skipped() {
        let expression = Expression::from_json(json!([
            "all",
            ["in", "severity", "high"],
            ["in", "severity", "low"]
        ]))
        .unwrap();
        let decompiled = decompile(&expression).unwrap();
        assert_eq!(
            decompiled.state.get_clause("severity"),
            Some(&membership(&["high"]))
        );
        assert_eq!(decompiled.skipped, vec!["severity".to_string()]);
    }

    #[test]
    fn test_trivial_state_normalizes_to_match_all() {
        // a state whose clauses were all normalized away compiles the same
        // as an empty state
        let state = FilterState::new();
        assert_eq!(compile(&state), Expression::match_all());
    }
}
