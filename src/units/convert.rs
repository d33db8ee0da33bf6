//! Conversion of customary and prefixed units to SI values.
//!
//! The IR keeps the unit token the problem was stated in; the engine works
//! in SI. Conversions go through `uom` quantities so each factor comes from
//! the same unit definitions the rest of the stack uses.

use uom::si::f64::{
    Angle, Energy, Force, Frequency, Length, Mass, Power, Pressure,
    ThermodynamicTemperature, Time, Velocity, Volume,
};
use uom::si::{
    angle, energy, force, frequency, length, mass, power, pressure,
    thermodynamic_temperature, time, velocity, volume,
};

use super::dimension::parse_unit;

/// Convert `value` expressed in `unit` to its SI value.
///
/// Single symbols convert directly (affine temperature scales included).
/// Compound tokens such as `cm/s^2` or `g/cm^3` multiply the factor of
/// every part, worked out alongside the dimension by [`parse_unit`].
/// Returns `None` when the token cannot be resolved.
#[must_use]
pub fn to_si(value: f64, unit: &str) -> Option<f64> {
    let unit = unit.trim();
    convert_symbol(value, unit).or_else(|| parse_unit(unit).map(|u| value * u.factor))
}

/// Multiplier taking one `symbol` to SI. Affine temperature scales give
/// their interval factor.
#[must_use]
pub fn unit_factor(symbol: &str) -> Option<f64> {
    match symbol {
        "°C" | "degC" | "celsius" => Some(1.0),
        "°F" | "degF" => Some(5.0 / 9.0),
        _ => convert_symbol(1.0, symbol),
    }
}

fn convert_symbol(value: f64, symbol: &str) -> Option<f64> {
    let converted = match symbol {
        // Coherent SI
        "m" | "kg" | "s" | "A" | "K" | "mol" | "cd" | "N" | "J" | "W" | "Pa" | "Hz" | "V" | "Ω"
        | "ohm" | "S" | "F" | "H" | "T" | "Wb" | "C" | "rad" | "sr" | "lm" | "lx" | "1"
        | "dimensionless" | "unitless" | "none" | "kelvin" => value,
        // Length
        "km" => Length::new::<length::kilometer>(value).get::<length::meter>(),
        "cm" => Length::new::<length::centimeter>(value).get::<length::meter>(),
        "mm" => Length::new::<length::millimeter>(value).get::<length::meter>(),
        "um" | "µm" => Length::new::<length::micrometer>(value).get::<length::meter>(),
        "nm" => Length::new::<length::nanometer>(value).get::<length::meter>(),
        "ft" => Length::new::<length::foot>(value).get::<length::meter>(),
        "in" => Length::new::<length::inch>(value).get::<length::meter>(),
        "mi" => Length::new::<length::mile>(value).get::<length::meter>(),
        // Mass
        "g" => Mass::new::<mass::gram>(value).get::<mass::kilogram>(),
        "mg" => Mass::new::<mass::milligram>(value).get::<mass::kilogram>(),
        "lb" => Mass::new::<mass::pound>(value).get::<mass::kilogram>(),
        // Time
        "ms" => Time::new::<time::millisecond>(value).get::<time::second>(),
        "us" | "µs" => Time::new::<time::microsecond>(value).get::<time::second>(),
        "ns" => Time::new::<time::nanosecond>(value).get::<time::second>(),
        "min" => Time::new::<time::minute>(value).get::<time::second>(),
        "h" | "hr" => Time::new::<time::hour>(value).get::<time::second>(),
        "day" => Time::new::<time::day>(value).get::<time::second>(),
        // Velocity
        "km/h" | "kmh" => {
            Velocity::new::<velocity::kilometer_per_hour>(value).get::<velocity::meter_per_second>()
        }
        "mph" => Velocity::new::<velocity::mile_per_hour>(value).get::<velocity::meter_per_second>(),
        // Temperature
        "°C" | "degC" | "celsius" => ThermodynamicTemperature::new::<
            thermodynamic_temperature::degree_celsius,
        >(value)
        .get::<thermodynamic_temperature::kelvin>(),
        "°F" | "degF" => ThermodynamicTemperature::new::<
            thermodynamic_temperature::degree_fahrenheit,
        >(value)
        .get::<thermodynamic_temperature::kelvin>(),
        // Angle
        "°" | "deg" | "degree" | "degrees" => {
            Angle::new::<angle::degree>(value).get::<angle::radian>()
        }
        "rev" => Angle::new::<angle::revolution>(value).get::<angle::radian>(),
        // Energy, force, power, pressure, frequency
        "kJ" => Energy::new::<energy::kilojoule>(value).get::<energy::joule>(),
        "eV" => Energy::new::<energy::electronvolt>(value).get::<energy::joule>(),
        "cal" => Energy::new::<energy::calorie>(value).get::<energy::joule>(),
        "kN" => Force::new::<force::kilonewton>(value).get::<force::newton>(),
        "kW" => Power::new::<power::kilowatt>(value).get::<power::watt>(),
        "kPa" => Pressure::new::<pressure::kilopascal>(value).get::<pressure::pascal>(),
        "MPa" => Pressure::new::<pressure::megapascal>(value).get::<pressure::pascal>(),
        "atm" => Pressure::new::<pressure::atmosphere>(value).get::<pressure::pascal>(),
        "bar" => Pressure::new::<pressure::bar>(value).get::<pressure::pascal>(),
        "kHz" => Frequency::new::<frequency::kilohertz>(value).get::<frequency::hertz>(),
        "MHz" => Frequency::new::<frequency::megahertz>(value).get::<frequency::hertz>(),
        "GHz" => Frequency::new::<frequency::gigahertz>(value).get::<frequency::hertz>(),
        "rpm" => value / 60.0,
        // Volume
        "L" => Volume::new::<volume::liter>(value).get::<volume::cubic_meter>(),
        "mL" => Volume::new::<volume::milliliter>(value).get::<volume::cubic_meter>(),
        // Prefixed electrical units
        "mA" | "mV" | "mT" => value * 1e-3,
        "kV" => value * 1e3,
        "µC" | "uC" => value * 1e-6,
        "nC" => value * 1e-9,
        _ => return None,
    };
    Some(converted)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn test_si_passthrough() {
        assert_eq!(to_si(9.8, "m/s^2"), Some(9.8));
        assert_eq!(to_si(2.0, "kg"), Some(2.0));
        assert_eq!(to_si(100.0, "N/m"), Some(100.0));
        assert_eq!(to_si(0.3, ""), Some(0.3));
    }

    #[test]
    fn test_length_conversion() {
        let v = to_si(150.0, "cm").unwrap_or(f64::NAN);
        assert!((v - 1.5).abs() < EPS);
        let v = to_si(2.0, "km").unwrap_or(f64::NAN);
        assert!((v - 2000.0).abs() < EPS);
    }

    #[test]
    fn test_temperature_conversion() {
        let v = to_si(25.0, "°C").unwrap_or(f64::NAN);
        assert!((v - 298.15).abs() < 1e-6);
        let v = to_si(32.0, "°F").unwrap_or(f64::NAN);
        assert!((v - 273.15).abs() < 1e-6);
    }

    #[test]
    fn test_angle_conversion() {
        let v = to_si(180.0, "deg").unwrap_or(f64::NAN);
        assert!((v - std::f64::consts::PI).abs() < EPS);
    }

    #[test]
    fn test_speed_conversion() {
        let v = to_si(36.0, "km/h").unwrap_or(f64::NAN);
        assert!((v - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_unknown_unit() {
        assert_eq!(to_si(1.0, "furlong"), None);
    }

    #[test]
    fn test_compound_units_multiply_part_factors() {
        let cases = [
            (50.0, "cm/s", 0.5),
            (980.0, "cm/s^2", 9.8),
            (1.0, "g/cm^3", 1000.0),
            (1.0, "g/cm³", 1000.0),
            (72.0, "km h^-1", 20.0),
            (2.0, "kN*mm", 2.0),
            (3.0, "kg*cm^2", 3e-4),
            (1.0, "L/min", 1e-3 / 60.0),
        ];
        for (value, unit, expected) in cases {
            let v = to_si(value, unit).unwrap_or(f64::NAN);
            assert!((v - expected).abs() <= 1e-9 * expected.abs(), "{value} {unit} -> {v}");
        }
    }

    #[test]
    fn test_temperature_interval_in_compound() {
        let v = to_si(4186.0, "J/(kg*°C)").unwrap_or(f64::NAN);
        assert!((v - 4186.0).abs() < EPS);
        let v = to_si(9.0, "J/°F").unwrap_or(f64::NAN);
        assert!((v - 16.2).abs() < 1e-9);
    }

    #[test]
    fn test_unresolvable_compound() {
        assert_eq!(to_si(1.0, "furlong/s"), None);
        assert_eq!(to_si(1.0, "cm/"), None);
        assert_eq!(to_si(1.0, "m^2000000000*m^2000000000"), None);
    }

    #[test]
    fn test_unit_factor_single_symbols() {
        assert_eq!(unit_factor("m"), Some(1.0));
        assert!((unit_factor("cm").unwrap_or(f64::NAN) - 0.01).abs() < 1e-15);
        assert!((unit_factor("rev").unwrap_or(f64::NAN) - std::f64::consts::TAU).abs() < 1e-12);
        assert_eq!(unit_factor("°C"), Some(1.0));
        assert_eq!(unit_factor("cubit"), None);
    }
}
