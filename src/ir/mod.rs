//! Canonical Intermediate Representation (IR).
//!
//! The IR bridges a structured problem description and the simulation
//! engine. It is produced by [`builder::IrBuilder`], checked by
//! [`crate::validation::IrValidator`], and consumed by
//! [`crate::engine::SimEngine`].
//!
//! Required sections (`metadata`, `system`, `simulation`, `output`) are
//! `Option`s so an IR deserialized from elsewhere can be structurally
//! incomplete; the builder always fills them. Accessors return defaults
//! for missing sections so callers never unwrap.

pub mod builder;
pub mod heuristics;
pub mod scan;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::{OutputConfig, SimulationConfig};
use crate::engine::state::Vec3;
use crate::error::SimResult;
use crate::units::{parse_dimension, to_si, Dimension, DimensionOp, ROOM_TEMPERATURE_K};

pub use builder::IrBuilder;

/// A value with its unit token and dimension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhysicalQuantity {
    /// Numeric value in the stated unit.
    pub value: f64,
    /// Unit token as stated.
    pub unit: String,
    /// Dimension derived from the unit token.
    pub dimension: Dimension,
    /// Absolute uncertainty.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uncertainty: Option<f64>,
    /// Significant digits.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precision: Option<u32>,
    /// Admissible range (inclusive).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<(f64, f64)>,
}

impl PhysicalQuantity {
    /// Create a quantity, deriving the dimension from the unit token.
    #[must_use]
    pub fn new(value: f64, unit: impl Into<String>) -> Self {
        let unit = unit.into();
        let dimension = parse_dimension(&unit);
        Self {
            value,
            unit,
            dimension,
            uncertainty: None,
            precision: None,
            range: None,
        }
    }

    /// Value converted to SI. The raw value is returned only when the unit
    /// does not resolve, which is exactly when [`Self::dimension`] is
    /// [`Dimension::Unknown`] and the units pass warns.
    #[must_use]
    pub fn si_value(&self) -> f64 {
        to_si(self.value, &self.unit).unwrap_or(self.value)
    }

    /// Product of two quantities.
    #[must_use]
    pub fn multiply(&self, other: &Self) -> Self {
        Self {
            value: self.value * other.value,
            unit: join_units(&self.unit, &other.unit, '*'),
            dimension: self.dimension.combine(other.dimension, DimensionOp::Multiply),
            uncertainty: None,
            precision: None,
            range: None,
        }
    }

    /// Quotient of two quantities.
    #[must_use]
    pub fn divide(&self, other: &Self) -> Self {
        Self {
            value: self.value / other.value,
            unit: join_units(&self.unit, &other.unit, '/'),
            dimension: self.dimension.combine(other.dimension, DimensionOp::Divide),
            uncertainty: None,
            precision: None,
            range: None,
        }
    }
}

fn join_units(lhs: &str, rhs: &str, op: char) -> String {
    let wrap = |u: &str| {
        if u.contains(['/', '*', ' ']) {
            format!("({u})")
        } else {
            u.to_string()
        }
    };
    match (lhs.is_empty(), rhs.is_empty(), op) {
        (true, true, _) => String::new(),
        (false, true, _) => lhs.to_string(),
        (true, false, '/') => format!("1/{}", wrap(rhs)),
        (true, false, _) => rhs.to_string(),
        _ => format!("{}{op}{}", wrap(lhs), wrap(rhs)),
    }
}

/// Role of a parameter in the problem.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterRole {
    /// Stated in the problem.
    #[default]
    Given,
    /// To be found.
    Unknown,
    /// Physical or catalog constant.
    Constant,
    /// Computed from other parameters.
    Derived,
}

impl ParameterRole {
    /// Lenient parse of an upstream role label; unrecognised labels map to
    /// `Given`.
    #[must_use]
    pub fn parse(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "unknown" | "target" | "find" | "output" => Self::Unknown,
            "constant" | "const" => Self::Constant,
            "derived" | "computed" | "intermediate" => Self::Derived,
            _ => Self::Given,
        }
    }
}

/// A named quantity in the global or a module-local parameter table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    /// Unique symbol.
    pub symbol: String,
    /// Value, unit and dimension.
    pub quantity: PhysicalQuantity,
    /// Role in the problem.
    pub role: ParameterRole,
    /// Human-readable description.
    #[serde(default)]
    pub description: String,
    /// Symbols this parameter depends on.
    #[serde(default)]
    pub dependencies: Vec<String>,
    /// Free-form constraints (`> 0`, `<= 1`).
    #[serde(default)]
    pub constraints: Vec<String>,
    /// Formula text, when the parameter is derived.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formula: Option<String>,
}

impl Parameter {
    /// Create a parameter with a quantity parsed from `unit`.
    #[must_use]
    pub fn new(symbol: impl Into<String>, value: f64, unit: &str, role: ParameterRole) -> Self {
        Self {
            symbol: symbol.into(),
            quantity: PhysicalQuantity::new(value, unit),
            role,
            description: String::new(),
            dependencies: Vec::new(),
            constraints: Vec::new(),
            formula: None,
        }
    }

    /// Add a description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Add dependencies.
    #[must_use]
    pub fn with_dependencies(mut self, deps: &[&str]) -> Self {
        self.dependencies = deps.iter().map(|s| (*s).to_string()).collect();
        self
    }

    /// SI value of the parameter.
    #[must_use]
    pub fn si_value(&self) -> f64 {
        self.quantity.si_value()
    }
}

/// Physics domain tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    /// Motion without regard to forces.
    Kinematics,
    /// Forces and Newton's laws.
    Dynamics,
    /// Springs, pendulums, harmonic motion.
    Oscillation,
    /// Mechanical waves.
    Wave,
    /// Charges in electric and magnetic fields.
    Electromagnetic,
    /// Heat transfer.
    Thermal,
    /// Geometric optics.
    Optical,
    /// Phenomenological quantum systems.
    Quantum,
    /// Buoyancy and drag.
    Fluid,
    /// Special-relativistic corrections.
    Relativistic,
    /// Fallback for unmatched problems.
    Generic,
}

impl Domain {
    /// Every domain tag.
    pub const ALL: [Self; 11] = [
        Self::Kinematics,
        Self::Dynamics,
        Self::Oscillation,
        Self::Wave,
        Self::Electromagnetic,
        Self::Thermal,
        Self::Optical,
        Self::Quantum,
        Self::Fluid,
        Self::Relativistic,
        Self::Generic,
    ];

    /// Lower-case tag.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Kinematics => "kinematics",
            Self::Dynamics => "dynamics",
            Self::Oscillation => "oscillation",
            Self::Wave => "wave",
            Self::Electromagnetic => "electromagnetic",
            Self::Thermal => "thermal",
            Self::Optical => "optical",
            Self::Quantum => "quantum",
            Self::Fluid => "fluid",
            Self::Relativistic => "relativistic",
            Self::Generic => "generic",
        }
    }

    /// Keywords that point at this domain in free text.
    #[must_use]
    pub const fn keywords(&self) -> &'static [&'static str] {
        match self {
            Self::Kinematics => &["kinematic", "projectile", "motion", "trajectory", "free fall", "velocity"],
            Self::Dynamics => &["dynamic", "force", "newton", "friction", "incline", "collision", "mechanics"],
            Self::Oscillation => &["oscillat", "spring", "pendulum", "harmonic", "vibration"],
            Self::Wave => &["wave", "sound", "interference", "standing", "frequency"],
            Self::Electromagnetic => &["electr", "magnet", "charge", "lorentz", "field", "circuit"],
            Self::Thermal => &["thermal", "heat", "temperature", "cooling", "thermodynamic"],
            Self::Optical => &["optic", "light", "lens", "refraction", "reflection", "mirror"],
            Self::Quantum => &["quantum", "photon", "electron", "wavefunction", "tunnel"],
            Self::Fluid => &["fluid", "buoyan", "drag", "viscous", "flow", "liquid"],
            Self::Relativistic => &["relativ", "lorentz factor", "speed of light", "time dilation"],
            Self::Generic => &[],
        }
    }

    /// Infer every domain mentioned in `text`, in enum order.
    #[must_use]
    pub fn infer_from_text(text: &str) -> Vec<Self> {
        let lower = text.to_lowercase();
        Self::ALL
            .iter()
            .copied()
            .filter(|d| d.keywords().iter().any(|k| lower.contains(k)))
            .collect()
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Equation classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EquationKind {
    /// Contains time derivatives.
    Differential,
    /// Plain algebraic relation.
    Algebraic,
    /// Geometric or kinematic constraint.
    Constraint,
    /// Conserved-quantity statement.
    Conservation,
    /// Definition of a derived quantity.
    Definition,
}

/// A governing equation attached to a module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Equation {
    /// Identifier, unique within the IR.
    pub id: String,
    /// Classification.
    pub kind: EquationKind,
    /// Expression text.
    pub expression: String,
    /// Every identifier the expression references.
    #[serde(default)]
    pub variables: Vec<String>,
    /// Identifiers that name module inputs (given or constant).
    #[serde(default)]
    pub parameters: Vec<String>,
    /// Derivative order for differential equations.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<u8>,
    /// Whether the relation is linear in its variables.
    #[serde(default)]
    pub linear: bool,
    /// Physical meaning.
    #[serde(default)]
    pub physical_meaning: String,
}

/// Complexity tier of a module.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplexityTier {
    /// Introductory.
    #[default]
    Basic,
    /// Undergraduate.
    Intermediate,
    /// Specialist.
    Advanced,
}

/// Conserved quantity kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConservationKind {
    /// Total mechanical energy.
    Energy,
    /// Linear momentum.
    Momentum,
    /// Angular momentum about the origin.
    AngularMomentum,
    /// Electric charge.
    Charge,
    /// Total mass.
    Mass,
    /// Number of simulated entities.
    ParticleCount,
}

impl ConservationKind {
    /// Lower-case label.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Energy => "energy",
            Self::Momentum => "momentum",
            Self::AngularMomentum => "angular_momentum",
            Self::Charge => "charge",
            Self::Mass => "mass",
            Self::ParticleCount => "particle_count",
        }
    }
}

impl fmt::Display for ConservationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A conservation law declared by a module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConservationLaw {
    /// Conserved quantity.
    pub kind: ConservationKind,
    /// Statement of the law.
    pub expression: String,
    /// Symbols the law involves.
    #[serde(default)]
    pub variables: Vec<String>,
    /// Relative tolerance for drift checks.
    pub tolerance: f64,
}

/// A physics-domain knowledge block inside the IR.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IrModule {
    /// Identifier, unique within the IR.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Domain descriptor.
    #[serde(default)]
    pub description: String,
    /// Domain tag.
    pub domain: Domain,
    /// Module-local parameters.
    #[serde(default)]
    pub parameters: IndexMap<String, Parameter>,
    /// Governing equations.
    #[serde(default)]
    pub equations: Vec<Equation>,
    /// Ids of modules this one depends on.
    #[serde(default)]
    pub dependencies: Vec<String>,
    /// Conservation laws the module implies.
    #[serde(default)]
    pub conservation_laws: Vec<ConservationLaw>,
    /// Modelling assumptions.
    #[serde(default)]
    pub assumptions: Vec<String>,
    /// Known limitations.
    #[serde(default)]
    pub limitations: Vec<String>,
    /// Complexity tier.
    #[serde(default)]
    pub complexity: ComplexityTier,
    /// Output symbols the module produces.
    #[serde(default)]
    pub outputs: Vec<String>,
}

/// Kind of simulated body.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// Point mass.
    #[default]
    Particle,
    /// Extended rigid body (simulated at its centre of mass).
    RigidBody,
    /// Field source.
    Field,
    /// Wave carrier.
    Wave,
}

impl EntityKind {
    /// Lenient parse of an upstream object type; unrecognised labels map
    /// to `Particle`.
    #[must_use]
    pub fn parse(label: &str) -> Self {
        let lower = label.to_lowercase();
        if lower.contains("rigid") || lower.contains("block") || lower.contains("box") {
            Self::RigidBody
        } else if lower.contains("field") {
            Self::Field
        } else if lower.contains("wave") {
            Self::Wave
        } else {
            Self::Particle
        }
    }
}

/// A simulated body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    /// Identifier.
    pub id: String,
    /// Kind of body.
    pub kind: EntityKind,
    /// Position (m).
    pub position: Vec3,
    /// Velocity (m/s).
    pub velocity: Vec3,
    /// Acceleration (m/s²).
    pub acceleration: Vec3,
    /// Mass (kg).
    pub mass: f64,
    /// Free-form properties (charge, incline angle, temperature, ...).
    #[serde(default)]
    pub properties: IndexMap<String, serde_json::Value>,
    /// Free-form constraints.
    #[serde(default)]
    pub constraints: Vec<String>,
}

impl Entity {
    /// Create a particle at rest at the origin with unit mass.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: EntityKind::Particle,
            position: Vec3::zero(),
            velocity: Vec3::zero(),
            acceleration: Vec3::zero(),
            mass: 1.0,
            properties: IndexMap::new(),
            constraints: Vec::new(),
        }
    }

    /// Numeric property, if present.
    #[must_use]
    pub fn property_f64(&self, key: &str) -> Option<f64> {
        self.properties.get(key).and_then(serde_json::Value::as_f64)
    }
}

/// Constraint classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintKind {
    /// `lhs = rhs`.
    Equality,
    /// `lhs < rhs` and friends.
    Inequality,
    /// Walls, floors, ground.
    Boundary,
    /// Initial conditions.
    Initial,
    /// Anything else stated about the physics.
    Physical,
}

impl ConstraintKind {
    /// Classify free constraint text.
    #[must_use]
    pub fn classify(text: &str) -> Self {
        let lower = text.to_lowercase();
        if ["initial", "t=0", "t = 0", "at rest", "starts", "released"]
            .iter()
            .any(|k| lower.contains(k))
        {
            Self::Initial
        } else if ["boundary", "wall", "ground", "floor", "ceiling", "surface"]
            .iter()
            .any(|k| lower.contains(k))
        {
            Self::Boundary
        } else if ["<=", ">=", "<", ">", "≤", "≥"].iter().any(|k| lower.contains(k)) {
            Self::Inequality
        } else if lower.contains('=') {
            Self::Equality
        } else {
            Self::Physical
        }
    }
}

/// A constraint on the problem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IrConstraint {
    /// Identifier.
    pub id: String,
    /// Classification.
    pub kind: ConstraintKind,
    /// Constraint text.
    pub expression: String,
}

/// IR metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IrMetadata {
    /// Deterministic IR id.
    pub id: String,
    /// IR schema version.
    pub version: String,
    /// Problem topic.
    #[serde(default)]
    pub topic: String,
    /// Difficulty label.
    #[serde(default)]
    pub difficulty: String,
    /// Domain tags inferred from type and topic text.
    #[serde(default)]
    pub domains: Vec<Domain>,
    /// Complexity score in [0, 100].
    pub complexity_score: f64,
    /// Estimated solve time in seconds.
    pub estimated_solve_time: f64,
}

/// Ambient conditions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Environment {
    /// Gravitational acceleration magnitude (m/s²), acting along -y.
    pub gravity: f64,
    /// Ambient temperature (K).
    pub temperature: f64,
    /// Kinetic friction coefficient against the ground.
    pub friction: f64,
    /// Coefficient of restitution for ground contact.
    pub restitution: f64,
    /// Whether linear air drag applies.
    pub air_resistance: bool,
    /// Linear drag coefficient (kg/s).
    pub drag_coefficient: f64,
}

impl Default for Environment {
    fn default() -> Self {
        Self {
            gravity: crate::units::STANDARD_GRAVITY,
            temperature: ROOM_TEMPERATURE_K,
            friction: 0.0,
            restitution: 0.8,
            air_resistance: false,
            drag_coefficient: 0.0,
        }
    }
}

/// System section: what kind of system and where it lives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemDescription {
    /// System type hint (`projectile`, `spring_mass`, ...).
    pub system_type: String,
    /// Spatial dimensions used (1-3).
    pub dimensions: u8,
    /// Coordinate system label.
    pub coordinate_system: String,
    /// Ambient conditions.
    pub environment: Environment,
}

/// Pre-computed hints for the engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OptimizationHints {
    /// Constant-role parameters, pre-evaluated to SI values.
    #[serde(default)]
    pub constant_cache: IndexMap<String, f64>,
    /// Differential-equation expressions by equation id.
    #[serde(default)]
    pub differential_cache: IndexMap<String, String>,
    /// Module dependency graph (module id → dependency ids).
    #[serde(default)]
    pub module_graph: IndexMap<String, Vec<String>>,
    /// Topological layers of the module graph; modules within a layer are
    /// independent of each other.
    #[serde(default)]
    pub parallel_groups: Vec<Vec<String>>,
}

/// The canonical IR.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PhysicsIr {
    /// Metadata section.
    #[serde(default)]
    pub metadata: Option<IrMetadata>,
    /// System section.
    #[serde(default)]
    pub system: Option<SystemDescription>,
    /// Global parameter table.
    #[serde(default)]
    pub parameters: IndexMap<String, Parameter>,
    /// Simulated bodies.
    #[serde(default)]
    pub entities: Vec<Entity>,
    /// Physics modules.
    #[serde(default)]
    pub modules: Vec<IrModule>,
    /// Classified constraints.
    #[serde(default)]
    pub constraints: Vec<IrConstraint>,
    /// Union of module conservation laws.
    #[serde(default)]
    pub conservation_laws: Vec<ConservationLaw>,
    /// Symmetry tags.
    #[serde(default)]
    pub symmetries: Vec<String>,
    /// Simulation section.
    #[serde(default)]
    pub simulation: Option<SimulationConfig>,
    /// Output section.
    #[serde(default)]
    pub output: Option<OutputConfig>,
    /// Optimization hints.
    #[serde(default)]
    pub optimization: OptimizationHints,
}

impl PhysicsIr {
    /// Simulation section, or defaults when absent.
    #[must_use]
    pub fn simulation_config(&self) -> SimulationConfig {
        self.simulation.unwrap_or_default()
    }

    /// Ambient conditions, or defaults when the system section is absent.
    #[must_use]
    pub fn environment(&self) -> Environment {
        self.system
            .as_ref()
            .map(|s| s.environment)
            .unwrap_or_default()
    }

    /// System type hint, or the empty string.
    #[must_use]
    pub fn system_type(&self) -> &str {
        self.system.as_ref().map_or("", |s| s.system_type.as_str())
    }

    /// SI value of a parameter; constant cache first, then the global table.
    #[must_use]
    pub fn parameter_value(&self, symbol: &str) -> Option<f64> {
        self.optimization
            .constant_cache
            .get(symbol)
            .copied()
            .or_else(|| self.parameters.get(symbol).map(Parameter::si_value))
    }

    /// First value found among several candidate symbols.
    #[must_use]
    pub fn first_parameter_value(&self, symbols: &[&str]) -> Option<f64> {
        symbols.iter().find_map(|s| self.parameter_value(s))
    }

    /// Whether any module carries the domain tag.
    #[must_use]
    pub fn has_domain(&self, domain: Domain) -> bool {
        self.modules.iter().any(|m| m.domain == domain)
    }

    /// Module by id.
    #[must_use]
    pub fn module(&self, id: &str) -> Option<&IrModule> {
        self.modules.iter().find(|m| m.id == id)
    }

    /// Serialize to pretty JSON.
    ///
    /// # Errors
    ///
    /// Returns error if serialization fails.
    pub fn to_json(&self) -> SimResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Deserialize from JSON.
    ///
    /// # Errors
    ///
    /// Returns error if the document is not a valid IR.
    pub fn from_json(json: &str) -> SimResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::units::DimensionVector;

    #[test]
    fn test_quantity_dimension_from_unit() {
        let q = PhysicalQuantity::new(9.8, "m/s^2");
        assert_eq!(q.dimension, Dimension::Known(DimensionVector::ACCELERATION));
        let bad = PhysicalQuantity::new(1.0, "cubits");
        assert!(bad.dimension.is_unknown());
    }

    #[test]
    fn test_quantity_multiply_divide() {
        let m = PhysicalQuantity::new(2.0, "kg");
        let a = PhysicalQuantity::new(3.0, "m/s^2");
        let f = m.multiply(&a);
        assert!((f.value - 6.0).abs() < f64::EPSILON);
        assert_eq!(f.dimension, Dimension::Known(DimensionVector::FORCE));
        assert_eq!(f.unit, "kg*(m/s^2)");
        assert_eq!(parse_dimension(&f.unit), f.dimension);

        let back = f.divide(&m);
        assert_eq!(back.dimension, a.dimension);
    }

    #[test]
    fn test_quantity_si_value() {
        assert!((PhysicalQuantity::new(50.0, "cm").si_value() - 0.5).abs() < 1e-12);
        assert!((PhysicalQuantity::new(4.0, "m").si_value() - 4.0).abs() < 1e-12);
        assert!((PhysicalQuantity::new(4.0, "cubits").si_value() - 4.0).abs() < 1e-12);
        assert!((PhysicalQuantity::new(50.0, "cm/s").si_value() - 0.5).abs() < 1e-12);
        assert!((PhysicalQuantity::new(980.0, "cm/s^2").si_value() - 9.8).abs() < 1e-12);
        assert!((PhysicalQuantity::new(1.0, "g/cm^3").si_value() - 1000.0).abs() < 1e-9);
    }

    #[test]
    fn test_role_parse() {
        assert_eq!(ParameterRole::parse("Unknown"), ParameterRole::Unknown);
        assert_eq!(ParameterRole::parse("const"), ParameterRole::Constant);
        assert_eq!(ParameterRole::parse("computed"), ParameterRole::Derived);
        assert_eq!(ParameterRole::parse("whatever"), ParameterRole::Given);
    }

    #[test]
    fn test_domain_inference() {
        let domains = Domain::infer_from_text("A mass on a spring with friction");
        assert!(domains.contains(&Domain::Oscillation));
        assert!(domains.contains(&Domain::Dynamics));
        assert!(Domain::infer_from_text("").is_empty());
    }

    #[test]
    fn test_constraint_classification() {
        assert_eq!(ConstraintKind::classify("released from rest"), ConstraintKind::Initial);
        assert_eq!(ConstraintKind::classify("ball bounces on the ground"), ConstraintKind::Boundary);
        assert_eq!(ConstraintKind::classify("v < 10"), ConstraintKind::Inequality);
        assert_eq!(ConstraintKind::classify("x1 = x2"), ConstraintKind::Equality);
        assert_eq!(ConstraintKind::classify("rope is massless"), ConstraintKind::Physical);
    }

    #[test]
    fn test_entity_kind_parse() {
        assert_eq!(EntityKind::parse("wooden block"), EntityKind::RigidBody);
        assert_eq!(EntityKind::parse("ball"), EntityKind::Particle);
        assert_eq!(EntityKind::parse("magnetic field"), EntityKind::Field);
    }

    #[test]
    fn test_entity_property() {
        let mut e = Entity::new("b");
        e.properties.insert("charge".into(), serde_json::json!(1.5e-6));
        e.properties.insert("color".into(), serde_json::json!("red"));
        assert_eq!(e.property_f64("charge"), Some(1.5e-6));
        assert_eq!(e.property_f64("color"), None);
        assert_eq!(e.property_f64("missing"), None);
    }

    #[test]
    fn test_ir_defaults_for_missing_sections() {
        let ir = PhysicsIr::default();
        assert_eq!(ir.system_type(), "");
        assert_eq!(ir.simulation_config(), SimulationConfig::default());
        assert!((ir.environment().gravity - crate::units::STANDARD_GRAVITY).abs() < 1e-12);
    }

    #[test]
    fn test_parameter_value_prefers_cache() {
        let mut ir = PhysicsIr::default();
        ir.parameters
            .insert("k".into(), Parameter::new("k", 50.0, "N/m", ParameterRole::Given));
        assert_eq!(ir.parameter_value("k"), Some(50.0));
        ir.optimization.constant_cache.insert("k".into(), 75.0);
        assert_eq!(ir.parameter_value("k"), Some(75.0));
        assert_eq!(ir.first_parameter_value(&["q", "k"]), Some(75.0));
    }

    #[test]
    fn test_ir_json_roundtrip_preserves_sections() {
        let mut ir = PhysicsIr::default();
        ir.simulation = Some(SimulationConfig::default());
        let json = ir.to_json().unwrap();
        let back = PhysicsIr::from_json(&json).unwrap();
        assert_eq!(back, ir);
    }
}
