//! Symbol-name heuristics.
//!
//! Used by the builder to give auto-created parameters a dimension and a
//! default value, and by the equations pass to suggest a dimension for an
//! unresolved token. Both callers must agree, so they share this table.

use super::Domain;
use crate::units::DimensionVector as D;

/// Strip initial-value and component decorations: `v0`, `x_0`, `vx`,
/// `v_y`, `h1` all reduce to their base symbol.
fn base_symbol(symbol: &str) -> &str {
    let s = symbol.trim();
    let s = s.trim_end_matches(|c: char| c.is_ascii_digit());
    let s = s.strip_suffix('_').unwrap_or(s);
    if s.len() > 1 {
        for suffix in ["_x", "_y", "_z"] {
            if let Some(stripped) = s.strip_suffix(suffix) {
                return stripped;
            }
        }
    }
    // `vx`, `ax`, `Fy`: one-letter base plus component letter.
    if s.len() == 2 && s.is_ascii() && matches!(&s[1..], "x" | "y" | "z") && s != "xy" {
        let head = &s[..1];
        if matches!(head, "v" | "a" | "F" | "p" | "E" | "B") {
            return head;
        }
    }
    s
}

/// Infer a dimension from a symbol name, optionally disambiguated by the
/// domain the symbol appears in.
#[must_use]
pub fn infer_dimension(symbol: &str, domain: Option<Domain>) -> Option<D> {
    let raw = symbol.trim();
    // Field components keep their own meaning before stripping.
    if matches!(raw, "E_field" | "E_x" | "E_y" | "E_z") {
        return Some(D::ELECTRIC_FIELD);
    }
    let base = base_symbol(raw);
    let lower = base.to_lowercase();

    let d = match base {
        "x" | "y" | "z" | "r" | "h" | "d" | "s" | "L" | "l" | "R" | "A" | "lambda" | "λ"
        | "wavelength" | "height" | "distance" | "position" | "range" => D::LENGTH,
        "v" | "u" | "c" | "speed" | "velocity" => D::VELOCITY,
        "a" | "g" | "acceleration" => D::ACCELERATION,
        "t" | "time" | "tau" | "τ" => D::TIME,
        "T" if domain == Some(Domain::Thermal) => D::TEMPERATURE,
        "T" | "T_period" | "period" => D::TIME,
        "F" | "N" | "W_f" | "force" | "weight" => D::FORCE,
        "m" | "M" | "mass" => D::MASS,
        "E" if domain == Some(Domain::Electromagnetic) => D::ELECTRIC_FIELD,
        "E" | "KE" | "PE" | "U" | "W" | "K_E" | "energy" | "work" => D::ENERGY,
        "P" if domain == Some(Domain::Fluid) => D::PRESSURE,
        "P" | "power" => D::POWER,
        "p" | "momentum" => D::MOMENTUM,
        "L_ang" | "angular_momentum" => D::ANGULAR_MOMENTUM,
        "k_wave" | "wavenumber" => D::WAVENUMBER,
        "k" if domain == Some(Domain::Wave) => D::WAVENUMBER,
        "k" | "stiffness" | "spring_constant" => D::STIFFNESS,
        "b" | "gamma" | "damping" => D::DAMPING,
        "omega" | "ω" | "f" | "nu" | "ν" | "frequency" => D::FREQUENCY,
        "q" | "Q" | "charge" => D::CHARGE,
        "B" => D::MAGNETIC_FIELD,
        "V" | "voltage" => D::VOLTAGE,
        "I" | "current" => D::CURRENT,
        "rho" | "ρ" | "density" => D::DENSITY,
        "pressure" => D::PRESSURE,
        "theta" | "θ" | "phi" | "φ" | "alpha" | "mu" | "μ" | "e" | "n" | "angle" | "ratio" => {
            D::DIMENSIONLESS
        }
        _ => match lower.as_str() {
            "temperature" | "temp" => D::TEMPERATURE,
            _ => return None,
        },
    };
    Some(d)
}

/// Domain-appropriate default value for an auto-created parameter.
#[must_use]
pub fn default_value(symbol: &str, domain: Option<Domain>) -> f64 {
    match (base_symbol(symbol), domain) {
        ("g", _) => 9.81,
        ("k", Some(Domain::Wave)) => 1.0,
        ("k", _) => 10.0,
        ("m" | "M", _) => 1.0,
        ("A", _) => 0.1,
        ("T", Some(Domain::Thermal)) => crate::units::ROOM_TEMPERATURE_K,
        ("rho" | "ρ", Some(Domain::Fluid)) => 1000.0,
        ("e", _) => 0.8,
        ("c", _) => crate::units::SPEED_OF_LIGHT,
        _ => 0.0,
    }
}

/// SI unit token for a dimension; the exponent rendering when no named
/// unit fits.
#[must_use]
pub fn unit_for(dimension: D) -> String {
    let named = [
        (D::DIMENSIONLESS, "1"),
        (D::LENGTH, "m"),
        (D::MASS, "kg"),
        (D::TIME, "s"),
        (D::CURRENT, "A"),
        (D::TEMPERATURE, "K"),
        (D::VELOCITY, "m/s"),
        (D::ACCELERATION, "m/s^2"),
        (D::FORCE, "N"),
        (D::ENERGY, "J"),
        (D::POWER, "W"),
        (D::MOMENTUM, "kg*m/s"),
        (D::PRESSURE, "Pa"),
        (D::FREQUENCY, "Hz"),
        (D::STIFFNESS, "N/m"),
        (D::DAMPING, "kg/s"),
        (D::CHARGE, "C"),
        (D::VOLTAGE, "V"),
        (D::ELECTRIC_FIELD, "V/m"),
        (D::MAGNETIC_FIELD, "T"),
        (D::DENSITY, "kg/m^3"),
        (D::WAVENUMBER, "1/m"),
    ];
    named
        .iter()
        .find(|(d, _)| *d == dimension)
        .map_or_else(|| dimension.to_string(), |(_, u)| (*u).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::{parse_dimension, Dimension};

    #[test]
    fn test_position_like_symbols() {
        for s in ["x", "x0", "y_0", "h", "r", "d"] {
            assert_eq!(infer_dimension(s, None), Some(D::LENGTH), "{s}");
        }
    }

    #[test]
    fn test_velocity_and_acceleration() {
        assert_eq!(infer_dimension("v0", None), Some(D::VELOCITY));
        assert_eq!(infer_dimension("vx", None), Some(D::VELOCITY));
        assert_eq!(infer_dimension("v_y", None), Some(D::VELOCITY));
        assert_eq!(infer_dimension("a", None), Some(D::ACCELERATION));
        assert_eq!(infer_dimension("g", None), Some(D::ACCELERATION));
    }

    #[test]
    fn test_force_like_symbols() {
        assert_eq!(infer_dimension("F", None), Some(D::FORCE));
        assert_eq!(infer_dimension("F_net", None), None);
        assert_eq!(infer_dimension("Fx", None), Some(D::FORCE));
    }

    #[test]
    fn test_domain_disambiguation() {
        assert_eq!(infer_dimension("T", None), Some(D::TIME));
        assert_eq!(infer_dimension("T", Some(Domain::Thermal)), Some(D::TEMPERATURE));
        assert_eq!(infer_dimension("k", None), Some(D::STIFFNESS));
        assert_eq!(infer_dimension("k", Some(Domain::Wave)), Some(D::WAVENUMBER));
        assert_eq!(
            infer_dimension("E", Some(Domain::Electromagnetic)),
            Some(D::ELECTRIC_FIELD)
        );
        assert_eq!(infer_dimension("E", None), Some(D::ENERGY));
    }

    #[test]
    fn test_unknown_symbol() {
        assert_eq!(infer_dimension("zeta_prime", None), None);
    }

    #[test]
    fn test_default_values() {
        assert!((default_value("g", None) - 9.81).abs() < f64::EPSILON);
        assert!((default_value("k", Some(Domain::Oscillation)) - 10.0).abs() < f64::EPSILON);
        assert!((default_value("rho", Some(Domain::Fluid)) - 1000.0).abs() < f64::EPSILON);
        assert!(default_value("x", None).abs() < f64::EPSILON);
    }

    #[test]
    fn test_unit_for_parses_back() {
        for d in [D::LENGTH, D::VELOCITY, D::FORCE, D::STIFFNESS, D::DAMPING, D::DENSITY] {
            assert_eq!(parse_dimension(&unit_for(d)), Dimension::Known(d));
        }
        assert_eq!(unit_for(D::DIMENSIONLESS), "1");
    }
}
