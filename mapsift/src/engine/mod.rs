//! Incremental filter evaluation.
//!
//! The [FilterEngine] keeps one sorted [Dimension] index per filterable
//! field and a per-feature count of failed clauses, so re-filtering after
//! a clause change touches only the dimension that changed.

mod dimension;
mod filter_engine;

pub(crate) use dimension::Dimension;
pub use filter_engine::*;
