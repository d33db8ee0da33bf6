//! Dimensional analysis.
//!
//! - [`dimension`]: unit token → 7-component exponent vector and SI factor,
//!   combination
//! - [`convert`]: customary/prefixed unit values → SI values

pub mod convert;
pub mod dimension;

pub use convert::{to_si, unit_factor};
pub use dimension::{
    is_known_unit, lookup_unit, parse_dimension, parse_unit, Dimension, DimensionOp,
    DimensionVector, ScaledUnit,
};

/// Standard gravitational acceleration (m/s²).
pub const STANDARD_GRAVITY: f64 = 9.806_65;

/// Speed of light in vacuum (m/s).
pub const SPEED_OF_LIGHT: f64 = 299_792_458.0;

/// Absolute zero expressed in kelvin.
pub const ABSOLUTE_ZERO_K: f64 = 0.0;

/// Room temperature used when a problem states none (K).
pub const ROOM_TEMPERATURE_K: f64 = 293.15;
