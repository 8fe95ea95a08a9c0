//! Features and feature collections.
//!
//! A [Feature] is one geocoded data record: a point coordinate pair plus a
//! flat mapping of property name to scalar [Value](crate::common::Value),
//! identified by a stable [FeatureId]. A [FeatureCollection] owns a set of
//! features and notifies subscribers about additions, removals, and resets
//! so that derived state (dimensional indexes, visible sets) can maintain
//! itself incrementally.

mod collection;
mod event;
mod feature;

pub use collection::*;
pub use event::*;
pub use feature::*;
