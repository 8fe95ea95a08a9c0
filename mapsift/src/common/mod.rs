//! Common types and utilities shared across the crate.

mod constants;
mod event_bus;
mod palette;
mod util;
mod value;

pub use constants::*;
pub use event_bus::*;
pub use palette::*;
pub use util::*;
pub use value::*;
