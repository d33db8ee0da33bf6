//! Upstream problem payload.
//!
//! The structured description handed to the IR builder: parameters,
//! objects, free constraints and metadata hints. It is produced by an
//! extraction stage outside this crate; nothing here parses prose.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::config::SimulationConfig;
use crate::engine::state::Vec3;
use crate::error::SimResult;

/// One stated parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputParameter {
    /// Symbol (`m`, `v0`, `k`).
    #[serde(alias = "name")]
    pub symbol: String,
    /// Numeric value in `unit`.
    pub value: f64,
    /// Unit token; empty for dimensionless values.
    #[serde(default)]
    pub unit: String,
    /// Role label (`given`, `unknown`, `constant`, `derived`).
    #[serde(default)]
    pub role: String,
    /// Description.
    #[serde(default)]
    pub description: String,
    /// Formula text for derived values.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formula: Option<String>,
    /// Absolute uncertainty.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uncertainty: Option<f64>,
}

/// A vector as upstream writes it: a bare number (x component), a
/// component list, or named components.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VectorInput {
    /// Single number along x.
    Scalar(f64),
    /// `[x]`, `[x, y]` or `[x, y, z]`.
    Components(Vec<f64>),
    /// `{ "x": .., "y": .., "z": .. }` with missing components zero.
    Named {
        /// x component.
        #[serde(default)]
        x: f64,
        /// y component.
        #[serde(default)]
        y: f64,
        /// z component.
        #[serde(default)]
        z: f64,
    },
}

impl VectorInput {
    /// Convert to a 3-vector, padding missing components with zero.
    #[must_use]
    pub fn to_vec3(&self) -> Vec3 {
        match self {
            Self::Scalar(x) => Vec3::new(*x, 0.0, 0.0),
            Self::Components(c) => Vec3::new(
                c.first().copied().unwrap_or(0.0),
                c.get(1).copied().unwrap_or(0.0),
                c.get(2).copied().unwrap_or(0.0),
            ),
            Self::Named { x, y, z } => Vec3::new(*x, *y, *z),
        }
    }
}

/// One stated object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InputObject {
    /// Object id.
    #[serde(alias = "name")]
    pub id: String,
    /// Object type label (`ball`, `block`, `particle`).
    #[serde(rename = "type", default)]
    pub kind: String,
    /// Mass in kg.
    #[serde(default)]
    pub mass: Option<f64>,
    /// Initial position.
    #[serde(default)]
    pub position: Option<VectorInput>,
    /// Initial velocity.
    #[serde(default)]
    pub velocity: Option<VectorInput>,
    /// Initial acceleration.
    #[serde(default)]
    pub acceleration: Option<VectorInput>,
    /// Free-form properties copied onto the entity.
    #[serde(default)]
    pub properties: IndexMap<String, serde_json::Value>,
    /// Free-form constraints.
    #[serde(default)]
    pub constraints: Vec<String>,
}

impl InputObject {
    /// Object with an id and nothing else.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    /// Set the mass.
    #[must_use]
    pub const fn with_mass(mut self, mass: f64) -> Self {
        self.mass = Some(mass);
        self
    }

    /// Set the initial position.
    #[must_use]
    pub fn with_position(mut self, x: f64, y: f64, z: f64) -> Self {
        self.position = Some(VectorInput::Components(vec![x, y, z]));
        self
    }

    /// Set the initial velocity.
    #[must_use]
    pub fn with_velocity(mut self, x: f64, y: f64, z: f64) -> Self {
        self.velocity = Some(VectorInput::Components(vec![x, y, z]));
        self
    }

    /// Add a property.
    #[must_use]
    pub fn with_property(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.properties.insert(key.into(), value);
        self
    }
}

/// The full upstream payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProblemInput {
    /// Stated parameters.
    #[serde(default)]
    pub parameters: Vec<InputParameter>,
    /// Stated objects.
    #[serde(default)]
    pub objects: Vec<InputObject>,
    /// Free constraint text.
    #[serde(default)]
    pub constraints: Vec<String>,
    /// System type hint (`projectile`, `spring_mass`, ...).
    #[serde(default)]
    pub system_type: String,
    /// Topic label.
    #[serde(default)]
    pub topic: String,
    /// Difficulty label (`easy`, `medium`, `hard`, `expert`).
    #[serde(default)]
    pub difficulty: String,
    /// Free text used for keyword matching.
    #[serde(default)]
    pub text: String,
    /// Catalog module ids to include regardless of matching.
    #[serde(default)]
    pub modules: Vec<String>,
    /// Simulation configuration override.
    #[serde(default)]
    pub simulation: Option<SimulationConfig>,
}

impl ProblemInput {
    /// Empty payload with a system type hint.
    #[must_use]
    pub fn new(system_type: impl Into<String>) -> Self {
        Self {
            system_type: system_type.into(),
            ..Self::default()
        }
    }

    /// Parse a JSON payload.
    ///
    /// # Errors
    ///
    /// Returns error if the JSON does not describe a payload.
    pub fn from_json(json: &str) -> SimResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a JSON payload from disk.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or parsed.
    pub fn load<P: AsRef<Path>>(path: P) -> SimResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Add a given parameter.
    #[must_use]
    pub fn with_parameter(self, symbol: &str, value: f64, unit: &str) -> Self {
        self.with_role_parameter(symbol, value, unit, "given")
    }

    /// Add a parameter with an explicit role label.
    #[must_use]
    pub fn with_role_parameter(mut self, symbol: &str, value: f64, unit: &str, role: &str) -> Self {
        self.parameters.push(InputParameter {
            symbol: symbol.to_string(),
            value,
            unit: unit.to_string(),
            role: role.to_string(),
            description: String::new(),
            formula: None,
            uncertainty: None,
        });
        self
    }

    /// Add an object.
    #[must_use]
    pub fn with_object(mut self, object: InputObject) -> Self {
        self.objects.push(object);
        self
    }

    /// Add a free constraint.
    #[must_use]
    pub fn with_constraint(mut self, text: impl Into<String>) -> Self {
        self.constraints.push(text.into());
        self
    }

    /// Request a catalog module by id.
    #[must_use]
    pub fn with_module(mut self, id: impl Into<String>) -> Self {
        self.modules.push(id.into());
        self
    }

    /// Set the topic.
    #[must_use]
    pub fn with_topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = topic.into();
        self
    }

    /// Set the free text.
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Set the difficulty label.
    #[must_use]
    pub fn with_difficulty(mut self, difficulty: impl Into<String>) -> Self {
        self.difficulty = difficulty.into();
        self
    }

    /// Override the simulation configuration.
    #[must_use]
    pub const fn with_simulation(mut self, simulation: SimulationConfig) -> Self {
        self.simulation = Some(simulation);
        self
    }

    /// Stated parameter symbols.
    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        self.parameters.iter().map(|p| p.symbol.as_str())
    }

    /// Topic, system type and free text joined for keyword matching.
    #[must_use]
    pub fn free_text(&self) -> String {
        [self.system_type.as_str(), self.topic.as_str(), self.text.as_str()]
            .iter()
            .filter(|s| !s.is_empty())
            .copied()
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_vector_input_forms() {
        let json = r#"[3.0, {"y": 2.0}, [1.0, 2.0]]"#;
        let v: Vec<VectorInput> = serde_json::from_str(json).unwrap();
        assert_eq!(v[0].to_vec3(), Vec3::new(3.0, 0.0, 0.0));
        assert_eq!(v[1].to_vec3(), Vec3::new(0.0, 2.0, 0.0));
        assert_eq!(v[2].to_vec3(), Vec3::new(1.0, 2.0, 0.0));
    }

    #[test]
    fn test_problem_from_json() {
        let json = r#"{
            "system_type": "projectile",
            "parameters": [
                {"symbol": "v0", "value": 20.0, "unit": "m/s"},
                {"name": "theta", "value": 45.0, "unit": "deg", "role": "given"}
            ],
            "objects": [
                {"id": "ball", "type": "sphere", "mass": 0.5, "position": [0, 2]}
            ],
            "constraints": ["ball lands on the ground"]
        }"#;
        let input = ProblemInput::from_json(json).unwrap();
        assert_eq!(input.parameters.len(), 2);
        assert_eq!(input.parameters[1].symbol, "theta");
        assert_eq!(input.objects[0].kind, "sphere");
        assert_eq!(input.objects[0].mass, Some(0.5));
        assert!(input.simulation.is_none());
    }

    #[test]
    fn test_builder_helpers() {
        let input = ProblemInput::new("spring")
            .with_parameter("k", 100.0, "N/m")
            .with_role_parameter("T", 0.0, "s", "unknown")
            .with_module("oscillation")
            .with_topic("harmonic motion");
        let symbols: Vec<&str> = input.symbols().collect();
        assert_eq!(symbols, vec!["k", "T"]);
        assert_eq!(input.free_text(), "spring harmonic motion");
        assert_eq!(input.modules, vec!["oscillation"]);
    }

    #[test]
    fn test_load_from_file() {
        use std::io::Write;
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"system_type": "free_fall"}}"#).unwrap();
        let input = ProblemInput::load(file.path()).unwrap();
        assert_eq!(input.system_type, "free_fall");
    }
}
