//! Simulation state and recorded output.
//!
//! - [`Vec3`] for positions, velocities and accelerations
//! - [`EntityState`], the per-entity kinematic state advanced by a rule
//! - [`Sample`], one recorded instant with aggregate quantities
//! - [`TimeSeries`], the ordered run output with a content fingerprint

use serde::{Deserialize, Serialize};

use crate::error::{SimError, SimResult};
use crate::ir::{Domain, Entity, PhysicsIr};

/// 3D vector for positions and velocities.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec3 {
    /// X component.
    pub x: f64,
    /// Y component.
    pub y: f64,
    /// Z component.
    pub z: f64,
}

impl Vec3 {
    /// Create a new vector.
    #[must_use]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Zero vector.
    #[must_use]
    pub const fn zero() -> Self {
        Self { x: 0.0, y: 0.0, z: 0.0 }
    }

    /// Magnitude squared.
    #[must_use]
    pub fn magnitude_squared(&self) -> f64 {
        self.x * self.x + self.y * self.y + self.z * self.z
    }

    /// Magnitude (length).
    #[must_use]
    pub fn magnitude(&self) -> f64 {
        self.magnitude_squared().sqrt()
    }

    /// Dot product.
    #[must_use]
    pub fn dot(&self, other: &Self) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    /// Cross product.
    #[must_use]
    pub fn cross(&self, other: &Self) -> Self {
        Self {
            x: self.y * other.z - self.z * other.y,
            y: self.z * other.x - self.x * other.z,
            z: self.x * other.y - self.y * other.x,
        }
    }

    /// Scale by scalar.
    #[must_use]
    pub fn scale(&self, s: f64) -> Self {
        Self {
            x: self.x * s,
            y: self.y * s,
            z: self.z * s,
        }
    }

    /// Check if all components are finite.
    #[must_use]
    #[allow(clippy::missing_const_for_fn)] // is_finite not const
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl std::ops::Add for Vec3 {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x + rhs.x,
            y: self.y + rhs.y,
            z: self.z + rhs.z,
        }
    }
}

impl std::ops::Sub for Vec3 {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
            z: self.z - rhs.z,
        }
    }
}

impl std::ops::Mul<f64> for Vec3 {
    type Output = Self;

    fn mul(self, rhs: f64) -> Self::Output {
        self.scale(rhs)
    }
}

impl std::ops::Neg for Vec3 {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Self {
            x: -self.x,
            y: -self.y,
            z: -self.z,
        }
    }
}

/// Kinematic state of one entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityState {
    /// Entity id from the IR.
    pub id: String,
    /// Position (m).
    pub position: Vec3,
    /// Velocity (m/s).
    pub velocity: Vec3,
    /// Acceleration applied in the last step (m/s²).
    pub acceleration: Vec3,
    /// Mass (kg).
    pub mass: f64,
    /// Charge (C).
    pub charge: f64,
    /// Temperature (K), for thermal systems.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
}

impl EntityState {
    /// Initial state of an IR entity.
    ///
    /// Non-finite vectors start at zero and a non-positive mass becomes
    /// unit mass. Charge and temperature fall back to the IR's `q` and
    /// body-temperature parameters.
    #[must_use]
    pub fn from_entity(entity: &Entity, ir: &PhysicsIr) -> Self {
        let finite_or_zero = |v: Vec3| if v.is_finite() { v } else { Vec3::zero() };
        let mass = if entity.mass.is_finite() && entity.mass > 0.0 {
            entity.mass
        } else {
            1.0
        };
        let charge = entity
            .property_f64("charge")
            .or_else(|| ir.parameter_value("q"))
            .unwrap_or(0.0);
        let temperature = entity.property_f64("temperature").or_else(|| {
            if ir.has_domain(Domain::Thermal) {
                ir.first_parameter_value(&["T0", "T_body", "T"])
            } else {
                None
            }
        });

        Self {
            id: entity.id.clone(),
            position: finite_or_zero(entity.position),
            velocity: finite_or_zero(entity.velocity),
            acceleration: finite_or_zero(entity.acceleration),
            mass,
            charge,
            temperature,
        }
    }

    /// Linear momentum.
    #[must_use]
    pub fn momentum(&self) -> Vec3 {
        self.velocity * self.mass
    }

    /// Whether every numeric field is finite.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.position.is_finite()
            && self.velocity.is_finite()
            && self.acceleration.is_finite()
            && self.mass.is_finite()
            && self.temperature.map_or(true, f64::is_finite)
    }
}

/// Energy split at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct EnergyBreakdown {
    /// Kinetic energy (J).
    pub kinetic: f64,
    /// Potential energy (J).
    pub potential: f64,
    /// Kinetic plus potential (J).
    pub total: f64,
}

impl EnergyBreakdown {
    /// Breakdown from kinetic and potential parts.
    #[must_use]
    pub fn new(kinetic: f64, potential: f64) -> Self {
        Self {
            kinetic,
            potential,
            total: kinetic + potential,
        }
    }
}

/// One recorded instant of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Simulation time (s).
    pub time: f64,
    /// Per-entity state.
    pub entities: Vec<EntityState>,
    /// Aggregate energy.
    pub energy: EnergyBreakdown,
    /// Total linear momentum.
    pub momentum: Vec3,
    /// Total angular momentum about the origin.
    pub angular_momentum: Vec3,
    /// Center of mass.
    pub center_of_mass: Vec3,
    /// Total mass.
    pub total_mass: f64,
    /// Total charge.
    pub total_charge: f64,
}

impl Sample {
    /// Record `entities` at `time`, deriving the aggregates.
    #[must_use]
    pub fn new(time: f64, entities: Vec<EntityState>, energy: EnergyBreakdown) -> Self {
        let mut momentum = Vec3::zero();
        let mut angular_momentum = Vec3::zero();
        let mut weighted = Vec3::zero();
        let mut total_mass = 0.0;
        let mut total_charge = 0.0;
        for e in &entities {
            let p = e.momentum();
            momentum = momentum + p;
            angular_momentum = angular_momentum + e.position.cross(&p);
            weighted = weighted + e.position * e.mass;
            total_mass += e.mass;
            total_charge += e.charge;
        }
        let center_of_mass = if total_mass > 0.0 {
            weighted * (1.0 / total_mass)
        } else {
            Vec3::zero()
        };

        Self {
            time,
            entities,
            energy,
            momentum,
            angular_momentum,
            center_of_mass,
            total_mass,
            total_charge,
        }
    }

    /// State of one entity by id.
    #[must_use]
    pub fn entity(&self, id: &str) -> Option<&EntityState> {
        self.entities.iter().find(|e| e.id == id)
    }
}

/// Ordered samples of one run.
///
/// Append-only: timestamps must strictly increase.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimeSeries {
    samples: Vec<Sample>,
}

impl TimeSeries {
    /// Empty series.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a sample.
    ///
    /// # Errors
    ///
    /// Returns `NonMonotonicSample` if the timestamp does not follow the
    /// last sample.
    pub fn push(&mut self, sample: Sample) -> SimResult<()> {
        if let Some(last) = self.samples.last() {
            if sample.time.partial_cmp(&last.time) != Some(std::cmp::Ordering::Greater) {
                return Err(SimError::NonMonotonicSample {
                    previous: last.time,
                    next: sample.time,
                });
            }
        }
        self.samples.push(sample);
        Ok(())
    }

    /// All samples in time order.
    #[must_use]
    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    /// First sample.
    #[must_use]
    pub fn first(&self) -> Option<&Sample> {
        self.samples.first()
    }

    /// Last sample.
    #[must_use]
    pub fn last(&self) -> Option<&Sample> {
        self.samples.last()
    }

    /// Number of samples.
    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Content hash of the series (blake3 over the bincode encoding).
    ///
    /// Identical runs produce identical fingerprints.
    ///
    /// # Errors
    ///
    /// Returns a serialization error if encoding fails.
    pub fn fingerprint(&self) -> SimResult<String> {
        let bytes =
            bincode::serialize(&self.samples).map_err(|e| SimError::serialization(e.to_string()))?;
        Ok(blake3::hash(&bytes).to_hex().to_string())
    }
}
