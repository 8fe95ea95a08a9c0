use crate::common::{is_internal_key, not_recorded_value, Value, INSTANCE_ID_PREFIX};
use indexmap::IndexMap;
use std::fmt::{Display, Formatter};

/// Stable unique identifier of a [Feature].
///
/// Identity is by id, never by reference: two features with the same id are
/// the same feature as far as the engine is concerned. Ids usually come from
/// the source data (`meta.instanceId`); [FeatureId::random] generates one for
/// rows that carry none.
#[derive(
    Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Deserialize, serde::Serialize,
)]
pub struct FeatureId(String);

impl FeatureId {
    pub fn new(id: impl Into<String>) -> Self {
        FeatureId(id.into())
    }

    /// Generates a fresh random id for source rows without one.
    pub fn random() -> Self {
        FeatureId(uuid::Uuid::new_v4().to_string())
    }

    /// Derives an id from a `meta.instanceId` value, stripping the `uuid:`
    /// prefix the source format uses.
    pub fn from_instance_id(instance_id: &str) -> Self {
        FeatureId(
            instance_id
                .strip_prefix(INSTANCE_ID_PREFIX)
                .unwrap_or(instance_id)
                .to_string(),
        )
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for FeatureId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for FeatureId {
    fn from(s: &str) -> Self {
        FeatureId::new(s)
    }
}

impl From<String> for FeatureId {
    fn from(s: String) -> Self {
        FeatureId(s)
    }
}

/// One geocoded data record: a point coordinate pair plus a flat mapping of
/// property name to scalar value.
///
/// Features are immutable from the engine's perspective; the owning
/// collection may add or remove features wholesale or individually, but a
/// feature's properties never change after construction. Build features with
/// [Feature::new] followed by [Feature::with_property] chaining.
///
/// # Example
///
/// ```rust,ignore
/// use mapsift::feature::{Feature, FeatureId};
///
/// let feature = Feature::new(FeatureId::new("f1"), -55.19, 5.84)
///     .with_property("severity", "high")
///     .with_property("reported_at", "2020-01-15");
/// ```
#[derive(Clone, Debug, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Feature {
    id: FeatureId,
    longitude: f64,
    latitude: f64,
    properties: IndexMap<String, Value>,
}

impl Feature {
    /// Creates a feature at the given point coordinate.
    pub fn new(id: FeatureId, longitude: f64, latitude: f64) -> Self {
        Feature {
            id,
            longitude,
            latitude,
            properties: IndexMap::new(),
        }
    }

    /// Adds a property, consuming and returning the feature for chaining.
    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(name.into(), value.into());
        self
    }

    pub fn id(&self) -> &FeatureId {
        &self.id
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    /// Returns the point as a `(lat, lon)` pair.
    pub fn coordinates(&self) -> (f64, f64) {
        (self.latitude, self.longitude)
    }

    /// Raw property access; `None` when the key is absent.
    pub fn property(&self, name: &str) -> Option<&Value> {
        self.properties.get(name)
    }

    /// Property access with the `not_recorded` sentinel substituted for
    /// absent or null values, the way the source data model reads fields.
    pub fn property_or_not_recorded(&self, name: &str) -> Value {
        match self.properties.get(name) {
            Some(v) if !v.is_null() => v.clone(),
            _ => not_recorded_value(),
        }
    }

    /// All properties, including internal/metadata keys.
    pub fn properties(&self) -> &IndexMap<String, Value> {
        &self.properties
    }

    /// Filterable property names: internal keys (leading underscore, the
    /// reserved `meta` key) are omitted.
    pub fn property_names(&self) -> impl Iterator<Item = &str> {
        self.properties
            .keys()
            .map(|k| k.as_str())
            .filter(|k| !is_internal_key(k))
    }
}
