//! Dimension vectors over the seven SI base quantities.
//!
//! A unit token such as `kg·m/s^2` is parsed into a [`DimensionVector`] of
//! integer exponents (length, mass, time, current, temperature, amount,
//! luminosity). Multiplying quantities adds exponents; dividing subtracts.
//!
//! Tokens that cannot be resolved against the base and derived unit tables
//! parse to [`Dimension::Unknown`] instead of failing, so IR construction
//! never aborts on a bad unit. The IR validator reports them later.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Div, Mul};

use super::convert::unit_factor;

/// Number of SI base quantities.
pub const BASE_COUNT: usize = 7;

/// Base unit symbols in exponent order.
pub const BASE_SYMBOLS: [&str; BASE_COUNT] = ["m", "kg", "s", "A", "K", "mol", "cd"];

/// Integer exponents over the SI base quantities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct DimensionVector([i32; BASE_COUNT]);

impl DimensionVector {
    /// Dimensionless quantity (all exponents zero).
    pub const DIMENSIONLESS: Self = Self([0; BASE_COUNT]);
    /// Length (m).
    pub const LENGTH: Self = Self::new(1, 0, 0, 0, 0, 0, 0);
    /// Mass (kg).
    pub const MASS: Self = Self::new(0, 1, 0, 0, 0, 0, 0);
    /// Time (s).
    pub const TIME: Self = Self::new(0, 0, 1, 0, 0, 0, 0);
    /// Electric current (A).
    pub const CURRENT: Self = Self::new(0, 0, 0, 1, 0, 0, 0);
    /// Thermodynamic temperature (K).
    pub const TEMPERATURE: Self = Self::new(0, 0, 0, 0, 1, 0, 0);
    /// Amount of substance (mol).
    pub const AMOUNT: Self = Self::new(0, 0, 0, 0, 0, 1, 0);
    /// Luminous intensity (cd).
    pub const LUMINOSITY: Self = Self::new(0, 0, 0, 0, 0, 0, 1);
    /// Velocity (m/s).
    pub const VELOCITY: Self = Self::new(1, 0, -1, 0, 0, 0, 0);
    /// Acceleration (m/s²).
    pub const ACCELERATION: Self = Self::new(1, 0, -2, 0, 0, 0, 0);
    /// Force (N).
    pub const FORCE: Self = Self::new(1, 1, -2, 0, 0, 0, 0);
    /// Energy (J).
    pub const ENERGY: Self = Self::new(2, 1, -2, 0, 0, 0, 0);
    /// Power (W).
    pub const POWER: Self = Self::new(2, 1, -3, 0, 0, 0, 0);
    /// Momentum (kg·m/s).
    pub const MOMENTUM: Self = Self::new(1, 1, -1, 0, 0, 0, 0);
    /// Angular momentum (kg·m²/s).
    pub const ANGULAR_MOMENTUM: Self = Self::new(2, 1, -1, 0, 0, 0, 0);
    /// Pressure (Pa).
    pub const PRESSURE: Self = Self::new(-1, 1, -2, 0, 0, 0, 0);
    /// Frequency (Hz).
    pub const FREQUENCY: Self = Self::new(0, 0, -1, 0, 0, 0, 0);
    /// Spring constant (N/m).
    pub const STIFFNESS: Self = Self::new(0, 1, -2, 0, 0, 0, 0);
    /// Linear damping coefficient (kg/s).
    pub const DAMPING: Self = Self::new(0, 1, -1, 0, 0, 0, 0);
    /// Electric charge (C).
    pub const CHARGE: Self = Self::new(0, 0, 1, 1, 0, 0, 0);
    /// Electric potential (V).
    pub const VOLTAGE: Self = Self::new(2, 1, -3, -1, 0, 0, 0);
    /// Electric field strength (V/m).
    pub const ELECTRIC_FIELD: Self = Self::new(1, 1, -3, -1, 0, 0, 0);
    /// Magnetic flux density (T).
    pub const MAGNETIC_FIELD: Self = Self::new(0, 1, -2, -1, 0, 0, 0);
    /// Density (kg/m³).
    pub const DENSITY: Self = Self::new(-3, 1, 0, 0, 0, 0, 0);
    /// Area (m²).
    pub const AREA: Self = Self::new(2, 0, 0, 0, 0, 0, 0);
    /// Volume (m³).
    pub const VOLUME: Self = Self::new(3, 0, 0, 0, 0, 0, 0);
    /// Wavenumber (1/m).
    pub const WAVENUMBER: Self = Self::new(-1, 0, 0, 0, 0, 0, 0);

    /// Create a vector from its seven exponents.
    #[must_use]
    pub const fn new(
        length: i32,
        mass: i32,
        time: i32,
        current: i32,
        temperature: i32,
        amount: i32,
        luminosity: i32,
    ) -> Self {
        Self([length, mass, time, current, temperature, amount, luminosity])
    }

    /// Create a vector from a raw exponent array.
    #[must_use]
    pub const fn from_exponents(exponents: [i32; BASE_COUNT]) -> Self {
        Self(exponents)
    }

    /// Raw exponents in base order.
    #[must_use]
    pub const fn exponents(&self) -> [i32; BASE_COUNT] {
        self.0
    }

    /// Whether all exponents are zero.
    #[must_use]
    pub fn is_dimensionless(&self) -> bool {
        self.0.iter().all(|&e| e == 0)
    }

    /// Component-wise sum (dimension of a product), `None` on exponent
    /// overflow.
    #[must_use]
    pub fn checked_multiply(&self, other: &Self) -> Option<Self> {
        self.zip_with(other, i32::checked_add)
    }

    /// Component-wise difference (dimension of a quotient), `None` on
    /// exponent overflow.
    #[must_use]
    pub fn checked_divide(&self, other: &Self) -> Option<Self> {
        self.zip_with(other, i32::checked_sub)
    }

    /// Every exponent times `power`, `None` on exponent overflow.
    #[must_use]
    pub fn checked_powi(&self, power: i32) -> Option<Self> {
        let mut out = self.0;
        for o in &mut out {
            *o = o.checked_mul(power)?;
        }
        Some(Self(out))
    }

    fn zip_with(&self, other: &Self, op: fn(i32, i32) -> Option<i32>) -> Option<Self> {
        let mut out = self.0;
        for (o, e) in out.iter_mut().zip(other.0) {
            *o = op(*o, e)?;
        }
        Some(Self(out))
    }

    /// Component-wise sum (dimension of a product). Exponents saturate at
    /// the `i32` bounds.
    #[must_use]
    pub fn multiply(&self, other: &Self) -> Self {
        let mut out = self.0;
        for (o, e) in out.iter_mut().zip(other.0) {
            *o = o.saturating_add(e);
        }
        Self(out)
    }

    /// Component-wise difference (dimension of a quotient). Exponents
    /// saturate at the `i32` bounds.
    #[must_use]
    pub fn divide(&self, other: &Self) -> Self {
        let mut out = self.0;
        for (o, e) in out.iter_mut().zip(other.0) {
            *o = o.saturating_sub(e);
        }
        Self(out)
    }

    /// Raise every exponent to an integer power. Exponents saturate at the
    /// `i32` bounds.
    #[must_use]
    pub fn powi(&self, power: i32) -> Self {
        let mut out = self.0;
        for o in &mut out {
            *o = o.saturating_mul(power);
        }
        Self(out)
    }

    /// Reciprocal dimension.
    #[must_use]
    pub fn inverse(&self) -> Self {
        self.powi(-1)
    }

    /// Common name for well-known dimensions, used in diagnostics.
    #[must_use]
    pub fn name(&self) -> Option<&'static str> {
        NAMED_DIMENSIONS
            .iter()
            .find(|(_, d)| d == self)
            .map(|(name, _)| *name)
    }
}

const NAMED_DIMENSIONS: &[(&str, DimensionVector)] = &[
    ("dimensionless", DimensionVector::DIMENSIONLESS),
    ("length", DimensionVector::LENGTH),
    ("mass", DimensionVector::MASS),
    ("time", DimensionVector::TIME),
    ("current", DimensionVector::CURRENT),
    ("temperature", DimensionVector::TEMPERATURE),
    ("amount", DimensionVector::AMOUNT),
    ("luminosity", DimensionVector::LUMINOSITY),
    ("velocity", DimensionVector::VELOCITY),
    ("acceleration", DimensionVector::ACCELERATION),
    ("force", DimensionVector::FORCE),
    ("energy", DimensionVector::ENERGY),
    ("power", DimensionVector::POWER),
    ("momentum", DimensionVector::MOMENTUM),
    ("angular momentum", DimensionVector::ANGULAR_MOMENTUM),
    ("pressure", DimensionVector::PRESSURE),
    ("frequency", DimensionVector::FREQUENCY),
    ("stiffness", DimensionVector::STIFFNESS),
    ("damping", DimensionVector::DAMPING),
    ("charge", DimensionVector::CHARGE),
    ("voltage", DimensionVector::VOLTAGE),
    ("electric field", DimensionVector::ELECTRIC_FIELD),
    ("magnetic field", DimensionVector::MAGNETIC_FIELD),
    ("density", DimensionVector::DENSITY),
    ("area", DimensionVector::AREA),
    ("volume", DimensionVector::VOLUME),
    ("wavenumber", DimensionVector::WAVENUMBER),
];

impl Mul for DimensionVector {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self::Output {
        self.multiply(&rhs)
    }
}

impl Div for DimensionVector {
    type Output = Self;

    fn div(self, rhs: Self) -> Self::Output {
        self.divide(&rhs)
    }
}

impl fmt::Display for DimensionVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_dimensionless() {
            return write!(f, "1");
        }
        let mut first = true;
        for (symbol, exp) in BASE_SYMBOLS.iter().zip(self.0) {
            if exp == 0 {
                continue;
            }
            if !first {
                write!(f, "·")?;
            }
            first = false;
            if exp == 1 {
                write!(f, "{symbol}")?;
            } else {
                write!(f, "{symbol}^{exp}")?;
            }
        }
        Ok(())
    }
}

/// Operation used by [`Dimension::combine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DimensionOp {
    /// Product of two quantities.
    Multiply,
    /// Quotient of two quantities.
    Divide,
}

/// A parsed dimension, or the sentinel for an unresolvable unit token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    /// Resolved exponent vector.
    Known(DimensionVector),
    /// Unit token could not be resolved.
    Unknown,
}

impl Default for Dimension {
    fn default() -> Self {
        Self::Known(DimensionVector::DIMENSIONLESS)
    }
}

impl Dimension {
    /// Combine two dimensions. `Unknown` is absorbing, and an exponent
    /// overflow yields `Unknown`.
    #[must_use]
    pub fn combine(self, other: Self, op: DimensionOp) -> Self {
        let (Self::Known(a), Self::Known(b)) = (self, other) else {
            return Self::Unknown;
        };
        let combined = match op {
            DimensionOp::Multiply => a.checked_multiply(&b),
            DimensionOp::Divide => a.checked_divide(&b),
        };
        combined.map_or(Self::Unknown, Self::Known)
    }

    /// Resolved vector, if any.
    #[must_use]
    pub const fn known(&self) -> Option<DimensionVector> {
        match self {
            Self::Known(d) => Some(*d),
            Self::Unknown => None,
        }
    }

    /// Whether this is the unknown sentinel.
    #[must_use]
    pub const fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown)
    }
}

impl From<DimensionVector> for Dimension {
    fn from(d: DimensionVector) -> Self {
        Self::Known(d)
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Known(d) => write!(f, "{d}"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

type D = DimensionVector;

/// Base and derived unit symbols, pre-expressed over the SI bases.
///
/// Prefixed and non-SI spellings share the dimension of their SI unit;
/// value conversion lives in [`super::convert`].
const UNIT_TABLE: &[(&str, DimensionVector)] = &[
    // Base units
    ("m", D::LENGTH),
    ("kg", D::MASS),
    ("s", D::TIME),
    ("A", D::CURRENT),
    ("K", D::TEMPERATURE),
    ("mol", D::AMOUNT),
    ("cd", D::LUMINOSITY),
    // Derived units
    ("N", D::FORCE),
    ("J", D::ENERGY),
    ("W", D::POWER),
    ("Pa", D::PRESSURE),
    ("Hz", D::FREQUENCY),
    ("V", D::VOLTAGE),
    ("Ω", D::new(2, 1, -3, -2, 0, 0, 0)),
    ("ohm", D::new(2, 1, -3, -2, 0, 0, 0)),
    ("S", D::new(-2, -1, 3, 2, 0, 0, 0)),
    ("F", D::new(-2, -1, 4, 2, 0, 0, 0)),
    ("H", D::new(2, 1, -2, -2, 0, 0, 0)),
    ("T", D::MAGNETIC_FIELD),
    ("Wb", D::new(2, 1, -2, -1, 0, 0, 0)),
    ("C", D::CHARGE),
    ("rad", D::DIMENSIONLESS),
    ("sr", D::DIMENSIONLESS),
    ("lm", D::LUMINOSITY),
    ("lx", D::new(-2, 0, 0, 0, 0, 0, 1)),
    ("eV", D::ENERGY),
    // Prefixed and customary spellings
    ("km", D::LENGTH),
    ("cm", D::LENGTH),
    ("mm", D::LENGTH),
    ("um", D::LENGTH),
    ("µm", D::LENGTH),
    ("nm", D::LENGTH),
    ("ft", D::LENGTH),
    ("in", D::LENGTH),
    ("mi", D::LENGTH),
    ("g", D::MASS),
    ("mg", D::MASS),
    ("lb", D::MASS),
    ("ms", D::TIME),
    ("us", D::TIME),
    ("µs", D::TIME),
    ("ns", D::TIME),
    ("min", D::TIME),
    ("h", D::TIME),
    ("hr", D::TIME),
    ("day", D::TIME),
    ("kN", D::FORCE),
    ("kJ", D::ENERGY),
    ("cal", D::ENERGY),
    ("kW", D::POWER),
    ("kPa", D::PRESSURE),
    ("MPa", D::PRESSURE),
    ("atm", D::PRESSURE),
    ("bar", D::PRESSURE),
    ("kHz", D::FREQUENCY),
    ("MHz", D::FREQUENCY),
    ("GHz", D::FREQUENCY),
    ("mA", D::CURRENT),
    ("mV", D::VOLTAGE),
    ("kV", D::VOLTAGE),
    ("mT", D::MAGNETIC_FIELD),
    ("µC", D::CHARGE),
    ("uC", D::CHARGE),
    ("nC", D::CHARGE),
    ("L", D::VOLUME),
    ("mL", D::VOLUME),
    ("°C", D::TEMPERATURE),
    ("degC", D::TEMPERATURE),
    ("celsius", D::TEMPERATURE),
    ("°F", D::TEMPERATURE),
    ("degF", D::TEMPERATURE),
    ("kelvin", D::TEMPERATURE),
    ("°", D::DIMENSIONLESS),
    ("deg", D::DIMENSIONLESS),
    ("degree", D::DIMENSIONLESS),
    ("degrees", D::DIMENSIONLESS),
    ("rev", D::DIMENSIONLESS),
    ("rpm", D::FREQUENCY),
    ("mph", D::VELOCITY),
    ("kmh", D::VELOCITY),
    ("1", D::DIMENSIONLESS),
    ("dimensionless", D::DIMENSIONLESS),
    ("unitless", D::DIMENSIONLESS),
    ("none", D::DIMENSIONLESS),
];

/// Look up a single unit symbol (no operators) in the unit table.
#[must_use]
pub fn lookup_unit(symbol: &str) -> Option<DimensionVector> {
    UNIT_TABLE
        .iter()
        .find(|(s, _)| *s == symbol)
        .map(|(_, d)| *d)
}

/// Whether a unit symbol appears in the unit table.
#[must_use]
pub fn is_known_unit(symbol: &str) -> bool {
    lookup_unit(symbol).is_some()
}

/// A unit token resolved to its dimension and the factor that takes a
/// value stated in that unit to SI.
///
/// Inside a compound token the affine temperature scales (°C, °F) count as
/// temperature intervals.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaledUnit {
    /// Dimension of the unit.
    pub dimension: DimensionVector,
    /// Multiplier to the coherent SI unit of that dimension.
    pub factor: f64,
}

impl ScaledUnit {
    /// The dimensionless unit `1`.
    pub const ONE: Self = Self {
        dimension: DimensionVector::DIMENSIONLESS,
        factor: 1.0,
    };

    fn symbol(symbol: &str) -> Option<Self> {
        Some(Self {
            dimension: lookup_unit(symbol)?,
            factor: unit_factor(symbol)?,
        })
    }

    fn checked_multiply(self, other: Self) -> Option<Self> {
        Self::finite(
            self.dimension.checked_multiply(&other.dimension)?,
            self.factor * other.factor,
        )
    }

    fn checked_divide(self, other: Self) -> Option<Self> {
        Self::finite(
            self.dimension.checked_divide(&other.dimension)?,
            self.factor / other.factor,
        )
    }

    fn checked_powi(self, power: i32) -> Option<Self> {
        Self::finite(self.dimension.checked_powi(power)?, self.factor.powi(power))
    }

    fn finite(dimension: DimensionVector, factor: f64) -> Option<Self> {
        (factor.is_finite() && factor != 0.0).then_some(Self { dimension, factor })
    }
}

/// Parse a unit token into its dimension and SI factor.
///
/// Accepts products (`*`, `·`, `⋅`, whitespace), quotients (`/`, left
/// associative), parenthesised groups, integer powers written `^n`, as
/// unicode superscripts (`m²`, `s⁻¹`), or as trailing digits (`m s-2`).
/// The empty token is dimensionless. Returns `None` for unknown symbols,
/// malformed tokens, exponent overflow and factors that leave the `f64`
/// range.
#[must_use]
pub fn parse_unit(token: &str) -> Option<ScaledUnit> {
    let trimmed = token.trim();
    if trimmed.is_empty() {
        return Some(ScaledUnit::ONE);
    }
    if let Some(unit) = ScaledUnit::symbol(trimmed) {
        return Some(unit);
    }
    let chars: Vec<char> = normalize_superscripts(trimmed).chars().collect();
    let mut parser = UnitParser { chars: &chars, pos: 0 };
    let unit = parser.expression()?;
    (parser.pos == chars.len()).then_some(unit)
}

/// Parse a unit token into a dimension; [`Dimension::Unknown`] whenever
/// [`parse_unit`] fails.
#[must_use]
pub fn parse_dimension(token: &str) -> Dimension {
    parse_unit(token).map_or(Dimension::Unknown, |unit| Dimension::Known(unit.dimension))
}

fn normalize_superscripts(token: &str) -> String {
    let mut out = String::with_capacity(token.len() + 4);
    let mut in_sup = false;
    for c in token.chars() {
        let mapped = match c {
            '⁰' => Some('0'),
            '¹' => Some('1'),
            '²' => Some('2'),
            '³' => Some('3'),
            '⁴' => Some('4'),
            '⁵' => Some('5'),
            '⁶' => Some('6'),
            '⁷' => Some('7'),
            '⁸' => Some('8'),
            '⁹' => Some('9'),
            '⁻' => Some('-'),
            _ => None,
        };
        match mapped {
            Some(m) => {
                if !in_sup {
                    out.push('^');
                    in_sup = true;
                }
                out.push(m);
            }
            None => {
                in_sup = false;
                out.push(c);
            }
        }
    }
    out
}

struct UnitParser<'a> {
    chars: &'a [char],
    pos: usize,
}

impl UnitParser<'_> {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn skip_spaces(&mut self) -> bool {
        let start = self.pos;
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.pos += 1;
        }
        self.pos > start
    }

    fn expression(&mut self) -> Option<ScaledUnit> {
        self.skip_spaces();
        let mut acc = self.term()?;
        loop {
            let spaced = self.skip_spaces();
            match self.peek() {
                Some('*' | '·' | '⋅' | '.') => {
                    self.pos += 1;
                    self.skip_spaces();
                    acc = acc.checked_multiply(self.term()?)?;
                }
                Some('/') => {
                    self.pos += 1;
                    self.skip_spaces();
                    acc = acc.checked_divide(self.term()?)?;
                }
                Some(c) if spaced && c != ')' => {
                    acc = acc.checked_multiply(self.term()?)?;
                }
                _ => return Some(acc),
            }
        }
    }

    fn term(&mut self) -> Option<ScaledUnit> {
        let base = match self.peek()? {
            '(' => {
                self.pos += 1;
                let inner = self.expression()?;
                self.skip_spaces();
                if self.peek()? != ')' {
                    return None;
                }
                self.pos += 1;
                inner
            }
            c if c.is_ascii_digit() => {
                let start = self.pos;
                while matches!(self.peek(), Some(d) if d.is_ascii_digit()) {
                    self.pos += 1;
                }
                let literal: String = self.chars[start..self.pos].iter().collect();
                if literal != "1" {
                    return None;
                }
                ScaledUnit::ONE
            }
            _ => {
                let start = self.pos;
                while matches!(self.peek(), Some(c) if c.is_alphabetic() || c == '°' || c == 'Ω' || c == 'µ')
                {
                    self.pos += 1;
                }
                if self.pos == start {
                    return None;
                }
                let symbol: String = self.chars[start..self.pos].iter().collect();
                let base = ScaledUnit::symbol(&symbol)?;
                // Trailing exponent without a caret: `m2`, `s-2`.
                if let Some(exp) = self.bare_exponent() {
                    return base.checked_powi(exp);
                }
                base
            }
        };
        if self.peek() == Some('^') {
            self.pos += 1;
            let exp = self.signed_int()?;
            return base.checked_powi(exp);
        }
        Some(base)
    }

    fn bare_exponent(&mut self) -> Option<i32> {
        match self.peek() {
            Some(c) if c.is_ascii_digit() => self.signed_int(),
            Some('-') if matches!(self.chars.get(self.pos + 1), Some(d) if d.is_ascii_digit()) => {
                self.signed_int()
            }
            _ => None,
        }
    }

    fn signed_int(&mut self) -> Option<i32> {
        let mut negative = false;
        if matches!(self.peek(), Some('-' | '−')) {
            negative = true;
            self.pos += 1;
        } else if self.peek() == Some('+') {
            self.pos += 1;
        }
        let start = self.pos;
        while matches!(self.peek(), Some(d) if d.is_ascii_digit()) {
            self.pos += 1;
        }
        if self.pos == start {
            return None;
        }
        let digits: String = self.chars[start..self.pos].iter().collect();
        let value: i32 = digits.parse().ok()?;
        Some(if negative { -value } else { value })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_base_units() {
        assert_eq!(parse_dimension("m"), Dimension::Known(D::LENGTH));
        assert_eq!(parse_dimension("kg"), Dimension::Known(D::MASS));
        assert_eq!(parse_dimension("s"), Dimension::Known(D::TIME));
        assert_eq!(parse_dimension("mol"), Dimension::Known(D::AMOUNT));
    }

    #[test]
    fn test_parse_derived_units() {
        assert_eq!(parse_dimension("N"), Dimension::Known(D::FORCE));
        assert_eq!(parse_dimension("J"), Dimension::Known(D::ENERGY));
        assert_eq!(parse_dimension("Hz"), Dimension::Known(D::FREQUENCY));
        assert_eq!(parse_dimension("rad"), Dimension::Known(D::DIMENSIONLESS));
    }

    #[test]
    fn test_parse_compound_units() {
        assert_eq!(parse_dimension("m/s"), Dimension::Known(D::VELOCITY));
        assert_eq!(parse_dimension("m/s^2"), Dimension::Known(D::ACCELERATION));
        assert_eq!(parse_dimension("m/s²"), Dimension::Known(D::ACCELERATION));
        assert_eq!(parse_dimension("kg*m/s^2"), Dimension::Known(D::FORCE));
        assert_eq!(parse_dimension("kg·m²/s²"), Dimension::Known(D::ENERGY));
        assert_eq!(parse_dimension("N/m"), Dimension::Known(D::STIFFNESS));
        assert_eq!(parse_dimension("kg/(m*s^2)"), Dimension::Known(D::PRESSURE));
        assert_eq!(parse_dimension("m s-2"), Dimension::Known(D::ACCELERATION));
        assert_eq!(parse_dimension("1/s"), Dimension::Known(D::FREQUENCY));
        assert_eq!(parse_dimension("s⁻¹"), Dimension::Known(D::FREQUENCY));
        assert_eq!(parse_dimension("kg/m³"), Dimension::Known(D::DENSITY));
    }

    #[test]
    fn test_parse_left_associative_division() {
        // m/s/s == m/(s*s)
        assert_eq!(parse_dimension("m/s/s"), Dimension::Known(D::ACCELERATION));
    }

    #[test]
    fn test_parse_unknown_is_sentinel() {
        assert_eq!(parse_dimension("furlong"), Dimension::Unknown);
        assert_eq!(parse_dimension("m/"), Dimension::Unknown);
        assert_eq!(parse_dimension("kg^"), Dimension::Unknown);
        assert_eq!(parse_dimension("(m"), Dimension::Unknown);
    }

    #[test]
    fn test_exponent_overflow_is_sentinel() {
        assert_eq!(parse_dimension("(m^2000000000)^2"), Dimension::Unknown);
        assert_eq!(parse_dimension("m^2000000000*m^2000000000"), Dimension::Unknown);
        assert_eq!(parse_dimension("m^2000000000/m^-2000000000"), Dimension::Unknown);
        assert_eq!(parse_dimension("m2000000000 m2000000000"), Dimension::Unknown);
        assert_eq!(
            parse_dimension("m^2000000000"),
            Dimension::Known(D::new(2_000_000_000, 0, 0, 0, 0, 0, 0))
        );
    }

    #[test]
    fn test_combine_overflow_is_sentinel() {
        let big = Dimension::Known(D::new(i32::MAX, 0, 0, 0, 0, 0, 0));
        assert_eq!(big.combine(big, DimensionOp::Multiply), Dimension::Unknown);
        let small = Dimension::Known(D::new(i32::MIN, 0, 0, 0, 0, 0, 0));
        assert_eq!(small.combine(big, DimensionOp::Divide), Dimension::Unknown);
        assert_eq!(D::new(i32::MAX, 0, 0, 0, 0, 0, 0).checked_powi(2), None);
    }

    #[test]
    fn test_saturating_vector_ops() {
        let big = D::new(i32::MAX, 0, 0, 0, 0, 0, 0);
        assert_eq!(big * big, big);
        assert_eq!(big.powi(-2).exponents()[0], i32::MIN);
    }

    #[test]
    fn test_every_table_symbol_has_factor() {
        for (symbol, dimension) in UNIT_TABLE {
            let unit = parse_unit(symbol).expect(symbol);
            assert_eq!(unit.dimension, *dimension, "{symbol}");
            assert!(unit.factor > 0.0, "{symbol}");
        }
    }

    #[test]
    fn test_parse_unit_factor() {
        let unit = parse_unit("cm/s^2").unwrap();
        assert_eq!(unit.dimension, D::ACCELERATION);
        assert!((unit.factor - 0.01).abs() < 1e-15);
        let unit = parse_unit("g/cm^3").unwrap();
        assert_eq!(unit.dimension, D::DENSITY);
        assert!((unit.factor - 1000.0).abs() < 1e-9);
        assert_eq!(parse_unit(""), Some(ScaledUnit::ONE));
        assert_eq!(parse_unit("nm^-400"), None);
    }

    #[test]
    fn test_parse_empty_is_dimensionless() {
        assert_eq!(parse_dimension(""), Dimension::Known(D::DIMENSIONLESS));
        assert_eq!(parse_dimension("  "), Dimension::Known(D::DIMENSIONLESS));
    }

    #[test]
    fn test_combine_unknown_absorbs() {
        let known = Dimension::Known(D::LENGTH);
        assert_eq!(
            known.combine(Dimension::Unknown, DimensionOp::Multiply),
            Dimension::Unknown
        );
        assert_eq!(
            Dimension::Unknown.combine(known, DimensionOp::Divide),
            Dimension::Unknown
        );
    }

    #[test]
    fn test_combine_known() {
        let f = Dimension::Known(D::MASS).combine(Dimension::Known(D::ACCELERATION), DimensionOp::Multiply);
        assert_eq!(f, Dimension::Known(D::FORCE));
        let v = Dimension::Known(D::LENGTH).combine(Dimension::Known(D::TIME), DimensionOp::Divide);
        assert_eq!(v, Dimension::Known(D::VELOCITY));
    }

    #[test]
    fn test_operators() {
        assert_eq!(D::MASS * D::ACCELERATION, D::FORCE);
        assert_eq!(D::ENERGY / D::TIME, D::POWER);
        assert_eq!(D::FREQUENCY.inverse(), D::TIME);
    }

    #[test]
    fn test_display() {
        assert_eq!(D::DIMENSIONLESS.to_string(), "1");
        assert_eq!(D::FORCE.to_string(), "m·kg·s^-2");
        assert_eq!(Dimension::Unknown.to_string(), "unknown");
    }

    #[test]
    fn test_names() {
        assert_eq!(D::FORCE.name(), Some("force"));
        assert_eq!(D::new(5, 0, 0, 0, 0, 0, 0).name(), None);
    }

    #[test]
    fn test_known_units() {
        assert!(is_known_unit("m"));
        assert!(is_known_unit("°C"));
        assert!(!is_known_unit("m/s"));
        assert!(!is_known_unit("parsec"));
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn vector() -> impl Strategy<Value = DimensionVector> {
        prop::array::uniform7(-4i32..=4).prop_map(DimensionVector::from_exponents)
    }

    proptest! {
        /// Dividing then multiplying by the same dimension is the identity.
        #[test]
        fn prop_divide_then_multiply_roundtrip(d1 in vector(), d2 in vector()) {
            let a = Dimension::Known(d1);
            let b = Dimension::Known(d2);
            let back = a.combine(b, DimensionOp::Divide).combine(b, DimensionOp::Multiply);
            prop_assert_eq!(back, a);
        }

        /// Multiplication is associative.
        #[test]
        fn prop_multiply_associative(d1 in vector(), d2 in vector(), d3 in vector()) {
            prop_assert_eq!((d1 * d2) * d3, d1 * (d2 * d3));
        }

        /// A dimension divided by itself is dimensionless.
        #[test]
        fn prop_self_quotient_dimensionless(d in vector()) {
            prop_assert!((d / d).is_dimensionless());
        }
    }
}
