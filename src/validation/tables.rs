//! Reference tables for the physics and units passes.

use crate::units::DimensionVector as D;

/// Expected dimension of a symbol, keyed by system-type substring.
///
/// An empty key applies to every system type. More specific keys come
/// first so they win over the generic row for the same symbol.
const EXPECTED: &[(&str, &str, D)] = &[
    ("k", "wave", D::WAVENUMBER),
    ("k", "spring", D::STIFFNESS),
    ("k", "oscillat", D::STIFFNESS),
    ("T", "thermal", D::TEMPERATURE),
    ("T", "heat", D::TEMPERATURE),
    ("T", "spring", D::TIME),
    ("T", "pendulum", D::TIME),
    ("T", "oscillat", D::TIME),
    ("E", "electr", D::ELECTRIC_FIELD),
    ("m", "", D::MASS),
    ("M", "", D::MASS),
    ("g", "", D::ACCELERATION),
    ("v0", "", D::VELOCITY),
    ("v", "", D::VELOCITY),
    ("a", "", D::ACCELERATION),
    ("t", "", D::TIME),
    ("x0", "", D::LENGTH),
    ("y0", "", D::LENGTH),
    ("h", "", D::LENGTH),
    ("F", "", D::FORCE),
    ("q", "", D::CHARGE),
    ("B", "", D::MAGNETIC_FIELD),
    ("E_field", "", D::ELECTRIC_FIELD),
    ("rho", "", D::DENSITY),
    ("b", "", D::DAMPING),
    ("mu", "", D::DIMENSIONLESS),
    ("theta", "", D::DIMENSIONLESS),
];

/// Expected dimension for `symbol` in a system of `system_type`.
#[must_use]
pub fn expected_dimension(symbol: &str, system_type: &str) -> Option<D> {
    let system = system_type.to_lowercase();
    EXPECTED
        .iter()
        .find(|(s, key, _)| *s == symbol && (key.is_empty() || system.contains(key)))
        .map(|(_, _, d)| *d)
}

/// Unit symbols accepted without a warning. Compound units are accepted
/// when every atom is on the list.
const KNOWN_UNITS: &[&str] = &[
    "m", "kg", "s", "A", "K", "mol", "cd", "N", "J", "W", "Pa", "Hz", "V", "Ω", "ohm", "F", "H",
    "T", "C", "rad", "sr", "eV", "km", "cm", "mm", "nm", "g", "ms", "min", "h", "kN", "kJ",
    "kPa", "atm", "kHz", "MHz", "mA", "mV", "kV", "µC", "uC", "nC", "L", "mL", "°C", "°F",
    "°", "deg", "rpm", "1", "dimensionless",
];

/// Whether a unit token is on the allow-list.
#[must_use]
pub fn is_allowed_unit(unit: &str) -> bool {
    let unit = unit.trim();
    if KNOWN_UNITS.contains(&unit) {
        return true;
    }
    let mut atoms = unit
        .split(|c: char| {
            matches!(c, '*' | '/' | '(' | ')' | '^' | '·' | '⋅' | '-' | '²' | '³' | '⁻' | '¹')
                || c.is_whitespace()
                || c.is_ascii_digit()
        })
        .filter(|a| !a.is_empty())
        .peekable();
    atoms.peek().is_some() && atoms.all(|a| KNOWN_UNITS.contains(&a))
}

/// Symbols that name a duration and must be stated in seconds.
pub const TIME_SYMBOLS: &[&str] = &["t", "dt", "duration", "time_step", "t_total"];

/// Accepted spellings of metres per second squared.
pub const ACCELERATION_UNITS: &[&str] = &["m/s^2", "m/s²", "m*s^-2", "m s^-2", "m·s⁻²"];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expected_dimension_specific_first() {
        assert_eq!(expected_dimension("k", "spring_mass"), Some(D::STIFFNESS));
        assert_eq!(expected_dimension("k", "standing wave"), Some(D::WAVENUMBER));
        assert_eq!(expected_dimension("k", "projectile"), None);
        assert_eq!(expected_dimension("m", "anything"), Some(D::MASS));
        assert_eq!(expected_dimension("T", "Thermal"), Some(D::TEMPERATURE));
        assert_eq!(expected_dimension("zeta", ""), None);
    }

    #[test]
    fn test_allowed_units() {
        assert!(is_allowed_unit("m/s^2"));
        assert!(is_allowed_unit("kg*m/s"));
        assert!(is_allowed_unit("J/(kg*K)"));
        assert!(is_allowed_unit("m s-2"));
        assert!(is_allowed_unit("rad"));
        assert!(!is_allowed_unit("furlong/fortnight"));
        assert!(!is_allowed_unit(""));
    }
}
