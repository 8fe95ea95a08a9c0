//! Field analysis: discovering which properties are filterable.
//!
//! The analyzer scans a feature collection once and classifies each
//! non-internal property key as [FieldType::Discrete], [FieldType::Number],
//! or [FieldType::Date], computing the value domain for each — distinct
//! value counts for discrete fields, observed min/max for range fields.
//! The resulting [FieldDescriptor]s seed the filter UI (checklists, range
//! sliders) and the engine's dimension indexes.

mod descriptor;
mod field_analyzer;

pub use descriptor::*;
pub use field_analyzer::*;
