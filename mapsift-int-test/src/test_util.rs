use chrono::NaiveDate;
use mapsift::common::Value;
use mapsift::feature::{Feature, FeatureCollection, FeatureId};

/// Builds one observation record the way the source survey data looks:
/// a categorical happening, a severity level, a numeric depth, and an
/// ISO date, plus internal bookkeeping keys that must stay invisible to
/// the analyzer.
pub fn observation(
    id: &str,
    happening: &str,
    severity: &str,
    depth: f64,
    reported_at: &str,
) -> Feature {
    Feature::new(FeatureId::new(id), -55.19, 5.84)
        .with_property("happening", happening)
        .with_property("severity", severity)
        .with_property("depth", depth)
        .with_property("reported_at", reported_at)
        .with_property("_version", 3i64)
        .with_property("meta", "instance")
}

/// A small survey collection with every field shape the engine handles:
/// discrete, number, date, a feature missing a field, and a blank value.
pub fn survey_collection() -> FeatureCollection {
    FeatureCollection::with_features(
        "survey",
        vec![
            observation("obs-1", "mining", "high", 12.5, "2020-01-05"),
            observation("obs-2", "logging", "low", 3.0, "2020-02-10"),
            observation("obs-3", "mining", "medium", 7.25, "2020-03-15"),
            observation("obs-4", "fishing", "high", 1.0, "2020-04-20"),
            // no severity recorded at all
            Feature::new(FeatureId::new("obs-5"), -55.0, 5.9)
                .with_property("happening", "logging")
                .with_property("depth", 9.5)
                .with_property("reported_at", "2020-05-25"),
            // severity present but blank
            observation("obs-6", "mining", "", 4.75, "2020-06-30"),
        ],
    )
}

pub fn date(y: i32, m: u32, d: u32) -> Value {
    Value::Date(NaiveDate::from_ymd_opt(y, m, d).unwrap())
}

pub fn ids(ids: &[FeatureId]) -> Vec<String> {
    ids.iter().map(|id| id.to_string()).collect()
}
