//! Catalog of physics-domain knowledge blocks.
//!
//! A [`ModuleLibrary`] is an explicit registry value: build it once with
//! [`ModuleLibrary::standard`] (or register custom entries) and pass it by
//! reference to the matcher and the builder.

use serde::{Deserialize, Serialize};

use crate::ir::{ComplexityTier, ConservationKind, Domain, EquationKind, ParameterRole};

/// A canonical parameter declared by a catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogParameter {
    /// Symbol.
    pub symbol: String,
    /// Default value.
    pub value: f64,
    /// Unit token.
    pub unit: String,
    /// Default role.
    pub role: ParameterRole,
    /// Description.
    pub description: String,
    /// Formula for derived parameters.
    pub formula: Option<String>,
}

/// A governing equation declared by a catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEquation {
    /// Local id; the IR id is `<module>_<id>`.
    pub id: String,
    /// Classification.
    pub kind: EquationKind,
    /// Expression text.
    pub expression: String,
    /// Physical meaning.
    pub meaning: String,
    /// Whether the relation is linear.
    pub linear: bool,
}

/// One catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Module id.
    pub id: String,
    /// Display name; its words are name keywords for matching.
    pub name: String,
    /// Domain tag.
    pub domain: Domain,
    /// Domain descriptor; its words are description keywords for matching.
    pub description: String,
    /// Canonical parameters.
    pub parameters: Vec<CatalogParameter>,
    /// Governing equations.
    pub equations: Vec<CatalogEquation>,
    /// Output symbols.
    pub outputs: Vec<String>,
    /// Ids of entries this one depends on.
    pub dependencies: Vec<String>,
    /// Conserved quantities the module implies.
    pub conservation: Vec<ConservationKind>,
    /// Modelling assumptions.
    pub assumptions: Vec<String>,
    /// Known limitations.
    pub limitations: Vec<String>,
    /// Complexity tier.
    pub complexity: ComplexityTier,
}

impl CatalogEntry {
    /// Start an entry.
    #[must_use]
    pub fn new(id: &str, name: &str, domain: Domain, description: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            domain,
            description: description.to_string(),
            parameters: Vec::new(),
            equations: Vec::new(),
            outputs: Vec::new(),
            dependencies: Vec::new(),
            conservation: Vec::new(),
            assumptions: Vec::new(),
            limitations: Vec::new(),
            complexity: ComplexityTier::Basic,
        }
    }

    /// Declare a parameter.
    #[must_use]
    pub fn param(
        mut self,
        symbol: &str,
        value: f64,
        unit: &str,
        role: ParameterRole,
        description: &str,
    ) -> Self {
        self.parameters.push(CatalogParameter {
            symbol: symbol.to_string(),
            value,
            unit: unit.to_string(),
            role,
            description: description.to_string(),
            formula: None,
        });
        self
    }

    /// Declare a derived parameter with its formula.
    #[must_use]
    pub fn derived(mut self, symbol: &str, unit: &str, formula: &str, description: &str) -> Self {
        self.parameters.push(CatalogParameter {
            symbol: symbol.to_string(),
            value: 0.0,
            unit: unit.to_string(),
            role: ParameterRole::Derived,
            description: description.to_string(),
            formula: Some(formula.to_string()),
        });
        self
    }

    /// Declare an equation.
    #[must_use]
    pub fn equation(mut self, id: &str, kind: EquationKind, expression: &str, meaning: &str) -> Self {
        let linear = !expression.contains('^')
            && !["sin(", "cos(", "sqrt(", "exp("]
                .iter()
                .any(|f| expression.contains(f));
        self.equations.push(CatalogEquation {
            id: id.to_string(),
            kind,
            expression: expression.to_string(),
            meaning: meaning.to_string(),
            linear,
        });
        self
    }

    /// Declare output symbols.
    #[must_use]
    pub fn outputs(mut self, outputs: &[&str]) -> Self {
        self.outputs = outputs.iter().map(|s| (*s).to_string()).collect();
        self
    }

    /// Declare dependencies.
    #[must_use]
    pub fn depends_on(mut self, ids: &[&str]) -> Self {
        self.dependencies = ids.iter().map(|s| (*s).to_string()).collect();
        self
    }

    /// Declare conserved quantities.
    #[must_use]
    pub fn conserves(mut self, kinds: &[ConservationKind]) -> Self {
        self.conservation = kinds.to_vec();
        self
    }

    /// Declare assumptions.
    #[must_use]
    pub fn assumes(mut self, items: &[&str]) -> Self {
        self.assumptions = items.iter().map(|s| (*s).to_string()).collect();
        self
    }

    /// Declare limitations.
    #[must_use]
    pub fn limited_by(mut self, items: &[&str]) -> Self {
        self.limitations = items.iter().map(|s| (*s).to_string()).collect();
        self
    }

    /// Set the complexity tier.
    #[must_use]
    pub const fn tier(mut self, tier: ComplexityTier) -> Self {
        self.complexity = tier;
        self
    }

    /// Whether the entry declares `symbol`.
    #[must_use]
    pub fn declares(&self, symbol: &str) -> bool {
        self.parameters.iter().any(|p| p.symbol == symbol)
    }
}

/// Registry of catalog entries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModuleLibrary {
    entries: Vec<CatalogEntry>,
}

impl ModuleLibrary {
    /// Empty library.
    #[must_use]
    pub const fn new() -> Self {
        Self { entries: Vec::new() }
    }

    /// Register an entry, replacing any entry with the same id.
    pub fn register(&mut self, entry: CatalogEntry) {
        if let Some(existing) = self.entries.iter_mut().find(|e| e.id == entry.id) {
            *existing = entry;
        } else {
            self.entries.push(entry);
        }
    }

    /// Entry by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&CatalogEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    /// All entries in registration order.
    #[must_use]
    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the library is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The standard catalog.
    #[must_use]
    pub fn standard() -> Self {
        use ConservationKind as C;
        use EquationKind as K;
        use ParameterRole::{Constant, Given, Unknown};

        let mut lib = Self::new();

        lib.register(
            CatalogEntry::new(
                "kinematics",
                "Kinematics",
                Domain::Kinematics,
                "Motion described by position, velocity and acceleration: projectile, free fall and trajectory problems",
            )
            .param("x0", 0.0, "m", Given, "initial position")
            .param("v0", 0.0, "m/s", Given, "initial velocity")
            .param("a", 0.0, "m/s^2", Given, "acceleration")
            .param("t", 0.0, "s", Given, "elapsed time")
            .param("x", 0.0, "m", Unknown, "position")
            .param("v", 0.0, "m/s", Unknown, "velocity")
            .param("g", 9.81, "m/s^2", Constant, "gravitational acceleration")
            .equation("velocity", K::Algebraic, "v = v0 + a*t", "velocity under constant acceleration")
            .equation("position", K::Algebraic, "x = x0 + v0*t + 0.5*a*t^2", "position under constant acceleration")
            .equation("rate_x", K::Differential, "diff(x, t) = v", "velocity is the rate of change of position")
            .equation("rate_v", K::Differential, "diff(v, t) = a", "acceleration is the rate of change of velocity")
            .outputs(&["x", "v"])
            .conserves(&[C::Energy])
            .assumes(&["point mass", "constant acceleration"])
            .limited_by(&["no air resistance"]),
        );

        lib.register(
            CatalogEntry::new(
                "dynamics",
                "Dynamics",
                Domain::Dynamics,
                "Forces acting on bodies through Newton's laws, friction, normal force and inclines",
            )
            .param("m", 1.0, "kg", Given, "mass")
            .param("F", 0.0, "N", Unknown, "net force")
            .param("g", 9.81, "m/s^2", Constant, "gravitational acceleration")
            .param("mu", 0.0, "1", Given, "friction coefficient")
            .derived("N", "N", "m * g", "normal force")
            .derived("F_f", "N", "mu * N", "friction force")
            .equation("newton2", K::Algebraic, "F = m * a", "Newton's second law")
            .equation("motion", K::Differential, "diff(v, t) = F / m", "equation of motion")
            .equation("friction", K::Definition, "F_f = mu * N", "kinetic friction")
            .outputs(&["F", "a"])
            .depends_on(&["kinematics"])
            .conserves(&[C::Energy, C::Mass])
            .assumes(&["rigid bodies", "inertial frame"])
            .tier(ComplexityTier::Intermediate),
        );

        lib.register(
            CatalogEntry::new(
                "oscillation",
                "Harmonic Oscillator",
                Domain::Oscillation,
                "Spring and pendulum systems with periodic harmonic motion and damping",
            )
            .param("k", 10.0, "N/m", Given, "spring constant")
            .param("m", 1.0, "kg", Given, "mass")
            .param("b", 0.0, "kg/s", Given, "damping coefficient")
            .param("A", 0.1, "m", Given, "amplitude")
            .derived("omega", "rad/s", "sqrt(k / m)", "angular frequency")
            .derived("T_period", "s", "2 * pi / omega", "period")
            .equation("motion", K::Differential, "diff(v, t) = -(k / m) * x - (b / m) * v", "damped harmonic motion")
            .equation("frequency", K::Definition, "omega = sqrt(k / m)", "natural angular frequency")
            .equation("period", K::Definition, "T_period = 2 * pi / omega", "oscillation period")
            .equation("energy", K::Conservation, "E = 0.5*m*v^2 + 0.5*k*x^2", "mechanical energy")
            .outputs(&["x", "v", "T_period"])
            .conserves(&[C::Energy])
            .assumes(&["linear restoring force", "small amplitude"])
            .tier(ComplexityTier::Intermediate),
        );

        lib.register(
            CatalogEntry::new(
                "wave",
                "Wave Motion",
                Domain::Wave,
                "Mechanical waves with wavelength, frequency, interference and sound propagation",
            )
            .param("A", 0.1, "m", Given, "amplitude")
            .param("lambda", 1.0, "m", Given, "wavelength")
            .param("f", 1.0, "Hz", Given, "frequency")
            .derived("k_wave", "1/m", "2 * pi / lambda", "wavenumber")
            .derived("omega", "rad/s", "2 * pi * f", "angular frequency")
            .derived("v", "m/s", "f * lambda", "wave speed")
            .equation("displacement", K::Algebraic, "y = A * sin(k_wave*x - omega*t)", "travelling wave")
            .equation("speed", K::Definition, "v = f * lambda", "wave speed")
            .outputs(&["y", "v"])
            .conserves(&[C::Energy])
            .assumes(&["linear medium"])
            .tier(ComplexityTier::Intermediate),
        );

        lib.register(
            CatalogEntry::new(
                "electromagnetic",
                "Electromagnetism",
                Domain::Electromagnetic,
                "Charged particles moving in electric and magnetic fields under the Lorentz force",
            )
            .param("q", 1e-6, "C", Given, "charge")
            .param("m", 1.0, "kg", Given, "mass")
            .param("E_field", 0.0, "V/m", Given, "electric field strength")
            .param("B", 0.0, "T", Given, "magnetic flux density")
            .equation("lorentz", K::Algebraic, "F = q * (E_field + v * B)", "Lorentz force")
            .equation("motion", K::Differential, "diff(v, t) = q / m * (E_field + v * B)", "charged particle motion")
            .outputs(&["F", "v"])
            .conserves(&[C::Charge, C::Energy])
            .assumes(&["uniform fields", "non-radiating charge"])
            .tier(ComplexityTier::Advanced),
        );

        lib.register(
            CatalogEntry::new(
                "thermal",
                "Heat Transfer",
                Domain::Thermal,
                "Thermal systems with heat flow, temperature change and Newton cooling",
            )
            .param("T", 293.15, "K", Given, "body temperature")
            .param("T_env", 293.15, "K", Given, "ambient temperature")
            .param("k_cool", 0.1, "1/s", Given, "cooling rate")
            .param("c_p", 4186.0, "J/(kg*K)", Constant, "specific heat")
            .derived("Q", "J", "m * c_p * (T - T_env)", "heat released")
            .equation("cooling", K::Differential, "diff(T, t) = -k_cool * (T - T_env)", "Newton's law of cooling")
            .equation("heat", K::Definition, "Q = m * c_p * (T - T_env)", "sensible heat")
            .outputs(&["T", "Q"])
            .assumes(&["lumped capacitance"])
            .tier(ComplexityTier::Intermediate),
        );

        lib.register(
            CatalogEntry::new(
                "optics",
                "Geometric Optics",
                Domain::Optical,
                "Light rays through lenses and mirrors with refraction and reflection",
            )
            .param("n1", 1.0, "1", Given, "refractive index of the first medium")
            .param("n2", 1.5, "1", Given, "refractive index of the second medium")
            .param("theta1", 0.0, "rad", Given, "angle of incidence")
            .param("f_lens", 0.1, "m", Given, "focal length")
            .param("d_o", 0.3, "m", Given, "object distance")
            .param("d_i", 0.0, "m", Unknown, "image distance")
            .equation("snell", K::Algebraic, "n1 * sin(theta1) = n2 * sin(theta2)", "Snell's law")
            .equation("thin_lens", K::Algebraic, "1 / f_lens = 1 / d_o + 1 / d_i", "thin lens equation")
            .outputs(&["theta2", "d_i"])
            .assumes(&["paraxial rays"]),
        );

        lib.register(
            CatalogEntry::new(
                "fluid",
                "Fluid Statics and Drag",
                Domain::Fluid,
                "Bodies immersed in a fluid with buoyancy and viscous drag",
            )
            .param("rho", 1000.0, "kg/m^3", Given, "fluid density")
            .param("V_obj", 0.001, "m^3", Given, "displaced volume")
            .param("b_drag", 0.5, "kg/s", Given, "linear drag coefficient")
            .param("m", 1.0, "kg", Given, "mass")
            .param("g", 9.81, "m/s^2", Constant, "gravitational acceleration")
            .derived("F_b", "N", "rho * V_obj * g", "buoyant force")
            .equation("buoyancy", K::Definition, "F_b = rho * V_obj * g", "Archimedes' principle")
            .equation("motion", K::Differential, "diff(v, t) = g * (rho * V_obj / m - 1) - b_drag / m * v", "buoyant motion with drag")
            .outputs(&["v", "F_b"])
            .conserves(&[C::Mass])
            .assumes(&["incompressible fluid", "laminar drag"])
            .tier(ComplexityTier::Intermediate),
        );

        lib.register(
            CatalogEntry::new(
                "quantum",
                "Quantum Particle",
                Domain::Quantum,
                "Phenomenological quantum particle with de Broglie wavelength and photon energy",
            )
            .param("hbar", 1.054_571_817e-34, "J*s", Constant, "reduced Planck constant")
            .param("m", 9.109_383_7e-31, "kg", Given, "particle mass")
            .param("p", 0.0, "kg*m/s", Given, "momentum")
            .derived("lambda", "m", "2 * pi * hbar / p", "de Broglie wavelength")
            .equation("kinetic", K::Algebraic, "E = p^2 / (2 * m)", "free-particle energy")
            .equation("de_broglie", K::Definition, "lambda = 2 * pi * hbar / p", "de Broglie relation")
            .outputs(&["E", "lambda"])
            .conserves(&[C::Energy, C::Momentum])
            .assumes(&["free particle"])
            .limited_by(&["classical trajectory only"])
            .tier(ComplexityTier::Advanced),
        );

        lib.register(
            CatalogEntry::new(
                "relativistic",
                "Special Relativity",
                Domain::Relativistic,
                "High-speed motion near the speed of light with Lorentz factor and time dilation",
            )
            .param("c", crate::units::SPEED_OF_LIGHT, "m/s", Constant, "speed of light")
            .param("m", 1.0, "kg", Given, "rest mass")
            .param("v", 0.0, "m/s", Given, "speed")
            .param("F", 0.0, "N", Given, "applied force")
            .derived("gamma", "1", "1 / sqrt(1 - v^2 / c^2)", "Lorentz factor")
            .equation("lorentz_factor", K::Definition, "gamma = 1 / sqrt(1 - v^2 / c^2)", "Lorentz factor")
            .equation("momentum", K::Algebraic, "p = gamma * m * v", "relativistic momentum")
            .equation("force", K::Differential, "diff(p, t) = F", "relativistic Newton's law")
            .outputs(&["gamma", "p"])
            .assumes(&["inertial frames"])
            .limited_by(&["no radiation"])
            .tier(ComplexityTier::Advanced),
        );

        lib.register(
            CatalogEntry::new(
                "generic",
                "Generic Mechanics",
                Domain::Generic,
                "General physical system under uniform gravity",
            )
            .conserves(&[C::Mass]),
        );

        lib
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::{parse_dimension, Dimension};

    #[test]
    fn test_standard_library_contents() {
        let lib = ModuleLibrary::standard();
        assert_eq!(lib.len(), 11);
        for domain in Domain::ALL {
            assert!(
                lib.entries().iter().any(|e| e.domain == domain),
                "no entry for {domain}"
            );
        }
    }

    #[test]
    fn test_catalog_units_parse() {
        let lib = ModuleLibrary::standard();
        for entry in lib.entries() {
            for p in &entry.parameters {
                assert!(
                    !parse_dimension(&p.unit).is_unknown(),
                    "{}.{} has unit {}",
                    entry.id,
                    p.symbol,
                    p.unit
                );
            }
        }
    }

    #[test]
    fn test_catalog_dependencies_exist_and_not_self() {
        let lib = ModuleLibrary::standard();
        for entry in lib.entries() {
            for dep in &entry.dependencies {
                assert_ne!(dep, &entry.id);
                assert!(lib.get(dep).is_some(), "{} depends on missing {dep}", entry.id);
            }
        }
    }

    #[test]
    fn test_shared_symbols_agree_on_dimension() {
        let lib = ModuleLibrary::standard();
        let mut seen: std::collections::HashMap<&str, (&str, Dimension)> =
            std::collections::HashMap::new();
        for entry in lib.entries() {
            for p in &entry.parameters {
                let dim = parse_dimension(&p.unit);
                if let Some((owner, first)) = seen.get(p.symbol.as_str()) {
                    assert_eq!(
                        *first, dim,
                        "'{}' differs between {owner} and {}",
                        p.symbol, entry.id
                    );
                } else {
                    seen.insert(p.symbol.as_str(), (entry.id.as_str(), dim));
                }
            }
        }
        assert!(seen.contains_key("T_period"));
        assert!(seen.contains_key("k_wave"));
    }

    #[test]
    fn test_register_replaces_by_id() {
        let mut lib = ModuleLibrary::standard();
        let before = lib.len();
        lib.register(CatalogEntry::new("wave", "Waves", Domain::Wave, "replacement"));
        assert_eq!(lib.len(), before);
        assert_eq!(lib.get("wave").map(|e| e.name.as_str()), Some("Waves"));
    }

    #[test]
    fn test_equation_linearity() {
        let entry = CatalogEntry::new("t", "T", Domain::Generic, "")
            .equation("a", EquationKind::Algebraic, "F = m * a", "")
            .equation("b", EquationKind::Algebraic, "E = 0.5*m*v^2", "");
        assert!(entry.equations[0].linear);
        assert!(!entry.equations[1].linear);
    }
}
