use crate::errors::{ErrorKind, MapsiftError, MapsiftResult};
use crate::filter::{decompile, Decompiled, Expression};
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde_json::Value as Json;

// everything except RFC 3986 unreserved characters is escaped, so the
// encoded form survives URL query strings, shells and log lines unchanged
const FILTER_PARAM_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Encodes an expression as a URL-safe string: compact JSON, then
/// percent-escaped down to unreserved ASCII.
pub fn encode(expression: &Expression) -> String {
    let json = expression.as_json().to_string();
    utf8_percent_encode(&json, FILTER_PARAM_SET).to_string()
}

/// Decodes a string produced by [encode] back into an expression.
///
/// Inverse of [encode] for any of its outputs. Validates only the
/// top-level expression shape; clause-level interpretation is left to
/// [decompile].
///
/// # Errors
///
/// Returns [ErrorKind::DecodeError] for broken percent-escapes, non-UTF-8
/// payloads, or malformed JSON, with the underlying parse failure attached
/// as the cause. All of these are recoverable: the input string is foreign
/// data and the caller decides what to fall back to.
pub fn decode(encoded: &str) -> MapsiftResult<Expression> {
    let json_text = percent_decode_str(encoded)
        .decode_utf8()
        .map_err(MapsiftError::from)?;
    let json: Json = serde_json::from_str(&json_text).map_err(|e| {
        MapsiftError::new_with_cause(
            "Failed to parse filter parameter as JSON",
            ErrorKind::DecodeError,
            e.into(),
        )
    })?;
    Expression::from_json(json)
}

/// Outcome of reading the filter query parameter at startup.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterParamOutcome {
    /// No parameter was present; the filter starts out matching everything.
    Absent,
    /// The parameter decoded; the state may still be partial.
    Loaded(Decompiled),
    /// The parameter was unusable. The caller should reset the filter and
    /// drop the parameter from the URL.
    Invalid,
}

/// Reads an optional filter query parameter, tolerating foreign input.
///
/// A missing parameter is [FilterParamOutcome::Absent]. A decode or
/// top-level shape failure is logged and reported as
/// [FilterParamOutcome::Invalid] rather than propagated, so a hand-edited
/// or stale URL never takes the session down.
pub fn load_filter_param(param: Option<&str>) -> FilterParamOutcome {
    let encoded = match param {
        Some(encoded) => encoded,
        None => return FilterParamOutcome::Absent,
    };
    let expression = match decode(encoded) {
        Ok(expression) => expression,
        Err(error) => {
            log::warn!("Ignoring invalid filter parameter: {}", error);
            return FilterParamOutcome::Invalid;
        }
    };
    match decompile(&expression) {
        Ok(decompiled) => FilterParamOutcome::Loaded(decompiled),
        Err(error) => {
            log::warn!("Ignoring invalid filter parameter: {}", error);
            FilterParamOutcome::Invalid
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Value;
    use crate::filter::{compile, Clause, FilterState};

    fn sample_state() -> FilterState {
        let mut state = FilterState::new();
        state.set_clause(
            "severity",
            Some(
                Clause::membership([Value::from("high"), Value::from("médium")])
                    .unwrap(),
            ),
        );
        state.set_clause("depth", Some(Clause::range(1.5, 9.0).unwrap()));
        state
    }

    #[test]
    fn test_encode_is_url_safe() {
        let encoded = encode(&compile(&sample_state()));
        assert!(encoded
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_.~%".contains(c)));
    }

    #[test]
    fn test_encode_decode_round_trip() {
        let expression = compile(&sample_state());
        let decoded = decode(&encode(&expression)).unwrap();
        assert_eq!(decoded, expression);
    }

    #[test]
    fn test_match_all_round_trip() {
        let encoded = encode(&Expression::match_all());
        assert_eq!(encoded, "%5B%22all%22%5D");
        assert_eq!(decode(&encoded).unwrap(), Expression::match_all());
    }

    #[test]
    fn test_decode_rejects_malformed_json() {
        let error = decode("%5B%22all%22").unwrap_err();
        assert_eq!(error.kind(), &ErrorKind::DecodeError);
        assert!(error.cause().is_some());
    }

    #[test]
    fn test_decode_rejects_non_utf8() {
        let error = decode("%FF%FE").unwrap_err();
        assert_eq!(error.kind(), &ErrorKind::DecodeError);
    }

    #[test]
    fn test_decode_rejects_wrong_shape() {
        // valid JSON, but not an "all" expression
        let error = decode("%7B%7D").unwrap_err();
        assert_eq!(error.kind(), &ErrorKind::CompileError);
    }

    #[test]
    fn test_load_filter_param_absent() {
        assert_eq!(load_filter_param(None), FilterParamOutcome::Absent);
    }

    #[test]
    fn test_load_filter_param_loaded() {
        let state = sample_state();
        let encoded = encode(&compile(&state));
        match load_filter_param(Some(&encoded)) {
            FilterParamOutcome::Loaded(decompiled) => {
                assert_eq!(decompiled.state, state);
                assert!(!decompiled.is_partial());
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn test_load_filter_param_invalid() {
        assert_eq!(
            load_filter_param(Some("not-even-json")),
            FilterParamOutcome::Invalid
        );
        assert_eq!(
            load_filter_param(Some("%7B%7D")),
            FilterParamOutcome::Invalid
        );
    }
}
