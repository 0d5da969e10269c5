//! # Units
//!
//! A small runtime unit system: dimensions, parsed units, unit-tagged arrays and the
//! preferred unit system for results.

pub mod dimension;
pub mod quantity;
pub mod system;
pub mod unit;

pub use dimension::Dimension;
pub use quantity::{Quantity, Samples};
pub use system::UnitSystem;
pub use unit::{Unit, UnitError};
