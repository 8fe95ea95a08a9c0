use crate::common::Value;

/// Sentinel value standing in for an absent or null property.
///
/// Features without a value for a discrete field are grouped under this
/// sentinel so they remain filterable instead of being silently dropped.
pub const NOT_RECORDED: &str = "not_recorded";

/// Reserved property key holding source metadata; never filterable.
pub const META_KEY: &str = "meta";

/// Prefix stripped from `meta.instanceId` values when deriving feature ids.
pub const INSTANCE_ID_PREFIX: &str = "uuid:";

/// Event topic used by the collection event bus.
pub const MAPSIFT_EVENT: &str = "mapsift_event";

/// The operator marking the top level of a compiled expression.
pub const ALL_OPERATOR: &str = "all";

/// Membership operator in the wire format.
pub const IN_OPERATOR: &str = "in";

/// Lower-bound operator in the wire format.
pub const GTE_OPERATOR: &str = ">=";

/// Upper-bound operator in the wire format.
pub const LTE_OPERATOR: &str = "<=";

/// Returns true for property keys that are internal/metadata by naming
/// convention and must be excluded from field analysis.
#[inline]
pub fn is_internal_key(key: &str) -> bool {
    key.starts_with('_') || key == META_KEY
}

/// The [NOT_RECORDED] sentinel as a [Value].
#[inline]
pub fn not_recorded_value() -> Value {
    Value::String(NOT_RECORDED.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_internal_keys() {
        assert!(is_internal_key("_uuid"));
        assert!(is_internal_key("_id"));
        assert!(is_internal_key("meta"));
        assert!(!is_internal_key("severity"));
        assert!(!is_internal_key("meta_data"));
    }

    #[test]
    fn test_not_recorded_value() {
        assert_eq!(
            not_recorded_value(),
            Value::String("not_recorded".to_string())
        );
    }
}
