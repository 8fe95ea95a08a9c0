//! Filter state and its wire form.
//!
//! A filter is a set of per-field [Clause]s combined with boolean AND,
//! held in a [FilterState]. [compile] and [decompile] translate between
//! the state and its nested-array wire [Expression], and [encode] /
//! [decode] carry that expression through a URL query parameter.

mod clause;
mod codec;
mod expression;
mod store;

pub use clause::*;
pub use codec::*;
pub use expression::*;
pub use store::*;
