//! Domain state-update rules.
//!
//! The IR's dominant physics character is chosen from the module domains
//! present, in a fixed precedence order, and selects one [`DomainRule`].
//! Every rule computes a net acceleration (gravity plus the domain's force
//! term), integrates semi-implicitly (velocity first, then position with
//! the new velocity) and finally applies its geometric constraints.

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use super::state::{EnergyBreakdown, EntityState, Vec3};
use crate::ir::{Domain, PhysicsIr};
use crate::units::SPEED_OF_LIGHT;

/// Dominant physics character of an IR.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhysicsCharacter {
    /// Kinematics and dynamics modules together.
    MixedKinematics,
    /// Oscillatory systems.
    Oscillation,
    /// Wave systems.
    Wave,
    /// Charged particles in fields.
    Electromagnetic,
    /// Heat transfer.
    Thermal,
    /// Fluid mechanics.
    Fluid,
    /// Quantum mechanics.
    Quantum,
    /// Relativistic mechanics.
    Relativistic,
    /// Fallback.
    Generic,
}

impl PhysicsCharacter {
    /// Dispatch precedence, highest first.
    pub const PRECEDENCE: [Self; 9] = [
        Self::MixedKinematics,
        Self::Oscillation,
        Self::Wave,
        Self::Electromagnetic,
        Self::Thermal,
        Self::Fluid,
        Self::Quantum,
        Self::Relativistic,
        Self::Generic,
    ];

    /// Highest-precedence character whose modules are present.
    #[must_use]
    pub fn classify(ir: &PhysicsIr) -> Self {
        let domains: Vec<Domain> = ir.modules.iter().map(|m| m.domain).collect();
        Self::from_domains(&domains)
    }

    /// Highest-precedence character for a set of module domains.
    #[must_use]
    pub fn from_domains(domains: &[Domain]) -> Self {
        let has = |d: Domain| domains.contains(&d);
        Self::PRECEDENCE
            .into_iter()
            .find(|c| match c {
                Self::MixedKinematics => has(Domain::Kinematics) && has(Domain::Dynamics),
                Self::Oscillation => has(Domain::Oscillation),
                Self::Wave => has(Domain::Wave),
                Self::Electromagnetic => has(Domain::Electromagnetic),
                Self::Thermal => has(Domain::Thermal),
                Self::Fluid => has(Domain::Fluid),
                Self::Quantum => has(Domain::Quantum),
                Self::Relativistic => has(Domain::Relativistic),
                Self::Generic => true,
            })
            .unwrap_or(Self::Generic)
    }

    /// Lower-case label.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::MixedKinematics => "mixed_kinematics",
            Self::Oscillation => "oscillation",
            Self::Wave => "wave",
            Self::Electromagnetic => "electromagnetic",
            Self::Thermal => "thermal",
            Self::Fluid => "fluid",
            Self::Quantum => "quantum",
            Self::Relativistic => "relativistic",
            Self::Generic => "generic",
        }
    }
}

impl std::fmt::Display for PhysicsCharacter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ground contact parameters shared by the rules that have a ground.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ground {
    /// Coefficient of restitution.
    pub restitution: f64,
    /// Kinetic friction coefficient while in contact.
    pub friction: f64,
}

/// State-update rule, one variant per physics character.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum DomainRule {
    /// Gravity with ground contact; optionally constrained to an incline
    /// descending along +x.
    MixedKinematics {
        /// Gravitational acceleration (m/s²).
        gravity: f64,
        /// Ground contact.
        ground: Ground,
        /// Incline angle (rad).
        incline: Option<f64>,
    },
    /// Hooke's law along x with linear damping; floor at y = 0.
    Oscillation {
        /// Gravitational acceleration (m/s²).
        gravity: f64,
        /// Spring constant (N/m).
        stiffness: f64,
        /// Damping coefficient (kg/s).
        damping: f64,
    },
    /// Transverse sinusoidal source term.
    Wave {
        /// Gravitational acceleration (m/s²).
        gravity: f64,
        /// Amplitude (m).
        amplitude: f64,
        /// Angular frequency (rad/s).
        omega: f64,
        /// Wavenumber (1/m).
        wavenumber: f64,
    },
    /// Lorentz force with E along x and B along z.
    Electromagnetic {
        /// Gravitational acceleration (m/s²).
        gravity: f64,
        /// Electric field (V/m).
        e_field: f64,
        /// Magnetic flux density (T).
        b_field: f64,
    },
    /// Gravity with ground contact and Newton cooling of entity
    /// temperature.
    Thermal {
        /// Gravitational acceleration (m/s²).
        gravity: f64,
        /// Ground contact.
        ground: Ground,
        /// Ambient temperature (K).
        ambient: f64,
        /// Cooling rate (1/s).
        cooling_rate: f64,
    },
    /// Gravity, buoyancy and linear drag.
    Fluid {
        /// Gravitational acceleration (m/s²).
        gravity: f64,
        /// Ground contact.
        ground: Ground,
        /// Fluid density (kg/m³).
        density: f64,
        /// Displaced volume (m³).
        displaced_volume: f64,
        /// Linear drag coefficient (kg/s).
        drag: f64,
    },
    /// Free particle.
    Quantum,
    /// Momentum update with the Lorentz factor.
    Relativistic {
        /// Gravitational acceleration (m/s²).
        gravity: f64,
        /// Applied force along x (N).
        force: f64,
        /// Speed of light (m/s).
        light_speed: f64,
    },
    /// Plain gravity with ground contact.
    Generic {
        /// Gravitational acceleration (m/s²).
        gravity: f64,
        /// Ground contact.
        ground: Ground,
    },
}

/// Fraction of `c` a relativistic body may reach.
const LIGHT_SPEED_CAP: f64 = 1.0 - 1e-12;

impl DomainRule {
    /// Rule for the IR's physics character, parameterized from the IR.
    #[must_use]
    pub fn from_ir(ir: &PhysicsIr) -> Self {
        let env = ir.environment();
        let gravity = env.gravity;
        let ground = Ground {
            restitution: env.restitution.clamp(0.0, 1.0),
            friction: env.friction.max(0.0),
        };
        let value = |symbols: &[&str], default: f64| {
            ir.first_parameter_value(symbols)
                .filter(|v| v.is_finite())
                .unwrap_or(default)
        };

        match PhysicsCharacter::classify(ir) {
            PhysicsCharacter::MixedKinematics => Self::MixedKinematics {
                gravity,
                ground,
                incline: ir
                    .first_parameter_value(&["incline", "incline_angle", "alpha_incline"])
                    .filter(|a| a.is_finite() && *a > 0.0 && *a < PI / 2.0),
            },
            PhysicsCharacter::Oscillation => Self::Oscillation {
                gravity,
                stiffness: value(&["k"], 10.0),
                damping: value(&["b"], 0.0),
            },
            PhysicsCharacter::Wave => {
                let wavelength = value(&["lambda"], 1.0);
                Self::Wave {
                    gravity,
                    amplitude: value(&["A"], 0.1),
                    omega: 2.0 * PI * value(&["f"], 1.0),
                    wavenumber: if wavelength > 0.0 {
                        2.0 * PI / wavelength
                    } else {
                        0.0
                    },
                }
            }
            PhysicsCharacter::Electromagnetic => Self::Electromagnetic {
                gravity,
                e_field: value(&["E_field"], 0.0),
                b_field: value(&["B"], 0.0),
            },
            PhysicsCharacter::Thermal => Self::Thermal {
                gravity,
                ground,
                ambient: env.temperature,
                cooling_rate: value(&["k_cool"], 0.1),
            },
            PhysicsCharacter::Fluid => Self::Fluid {
                gravity,
                ground,
                density: value(&["rho"], 1000.0),
                displaced_volume: value(&["V_obj"], 0.0),
                drag: if env.drag_coefficient > 0.0 {
                    env.drag_coefficient
                } else {
                    value(&["b_drag"], 0.0)
                },
            },
            PhysicsCharacter::Quantum => Self::Quantum,
            PhysicsCharacter::Relativistic => {
                let c = value(&["c"], SPEED_OF_LIGHT);
                Self::Relativistic {
                    gravity,
                    force: value(&["F"], 0.0),
                    light_speed: if c > 0.0 { c } else { SPEED_OF_LIGHT },
                }
            }
            PhysicsCharacter::Generic => Self::Generic { gravity, ground },
        }
    }

    /// Physics character this rule implements.
    #[must_use]
    pub const fn character(&self) -> PhysicsCharacter {
        match self {
            Self::MixedKinematics { .. } => PhysicsCharacter::MixedKinematics,
            Self::Oscillation { .. } => PhysicsCharacter::Oscillation,
            Self::Wave { .. } => PhysicsCharacter::Wave,
            Self::Electromagnetic { .. } => PhysicsCharacter::Electromagnetic,
            Self::Thermal { .. } => PhysicsCharacter::Thermal,
            Self::Fluid { .. } => PhysicsCharacter::Fluid,
            Self::Quantum => PhysicsCharacter::Quantum,
            Self::Relativistic { .. } => PhysicsCharacter::Relativistic,
            Self::Generic { .. } => PhysicsCharacter::Generic,
        }
    }

    const fn gravity(&self) -> f64 {
        match self {
            Self::MixedKinematics { gravity, .. }
            | Self::Oscillation { gravity, .. }
            | Self::Wave { gravity, .. }
            | Self::Electromagnetic { gravity, .. }
            | Self::Thermal { gravity, .. }
            | Self::Fluid { gravity, .. }
            | Self::Relativistic { gravity, .. }
            | Self::Generic { gravity, .. } => *gravity,
            Self::Quantum => 0.0,
        }
    }

    /// Net acceleration of `e` at `time`.
    #[must_use]
    pub fn acceleration(&self, e: &EntityState, time: f64) -> Vec3 {
        let down = Vec3::new(0.0, -self.gravity(), 0.0);
        match *self {
            Self::MixedKinematics {
                gravity,
                ground,
                incline: Some(angle),
            } => {
                let along = incline_direction(angle);
                let moving_down = e.velocity.dot(&along) >= 0.0;
                let friction = ground.friction * gravity * angle.cos();
                let mut a = gravity * angle.sin() - if moving_down { friction } else { -friction };
                if e.velocity.dot(&along).abs() < f64::EPSILON && a < 0.0 {
                    a = 0.0;
                }
                along * a
            }
            Self::Oscillation {
                stiffness, damping, ..
            } => {
                let spring = -(stiffness / e.mass) * e.position.x - (damping / e.mass) * e.velocity.x;
                down + Vec3::new(spring, 0.0, 0.0)
            }
            Self::Wave {
                amplitude,
                omega,
                wavenumber,
                ..
            } => {
                let source = -amplitude * omega * omega * (wavenumber * e.position.x - omega * time).sin();
                down + Vec3::new(0.0, source, 0.0)
            }
            Self::Electromagnetic {
                e_field, b_field, ..
            } => {
                let field = Vec3::new(e_field, 0.0, 0.0) + e.velocity.cross(&Vec3::new(0.0, 0.0, b_field));
                down + field * (e.charge / e.mass)
            }
            Self::Fluid {
                gravity,
                density,
                displaced_volume,
                drag,
                ..
            } => {
                let buoyancy = Vec3::new(0.0, density * displaced_volume * gravity / e.mass, 0.0);
                down + buoyancy - e.velocity * (drag / e.mass)
            }
            Self::Quantum => Vec3::zero(),
            Self::Relativistic { force, .. } => down + Vec3::new(force / e.mass, 0.0, 0.0),
            Self::MixedKinematics { .. } | Self::Thermal { .. } | Self::Generic { .. } => down,
        }
    }

    /// Advance every entity by `dt` from `time`. Pure: the input slice is
    /// untouched, so a rejected attempt leaves no trace.
    #[must_use]
    pub fn advance(&self, entities: &[EntityState], time: f64, dt: f64) -> Vec<EntityState> {
        entities
            .iter()
            .map(|e| {
                let mut next = e.clone();
                if let Self::Relativistic { light_speed, .. } = *self {
                    self.advance_relativistic(e, &mut next, time, dt, light_speed);
                } else {
                    let a = self.acceleration(e, time);
                    next.acceleration = a;
                    next.velocity = e.velocity + a * dt;
                    next.position = e.position + next.velocity * dt;
                }
                self.constrain(&mut next, dt);
                next
            })
            .collect()
    }

    fn advance_relativistic(
        &self,
        e: &EntityState,
        next: &mut EntityState,
        time: f64,
        dt: f64,
        c: f64,
    ) {
        let gamma = lorentz_factor(e.velocity.magnitude(), c);
        let force = self.acceleration(e, time) * e.mass;
        let p = e.velocity * (gamma * e.mass) + force * dt;
        let mc = e.mass * c;
        let mut v = p * (1.0 / (e.mass * (1.0 + p.magnitude_squared() / (mc * mc)).sqrt()));
        let speed = v.magnitude();
        if speed >= c * LIGHT_SPEED_CAP {
            v = v * (c * LIGHT_SPEED_CAP / speed);
        }
        next.acceleration = (v - e.velocity) * (1.0 / dt);
        next.velocity = v;
        next.position = e.position + v * dt;
    }

    /// Geometric constraints and non-kinematic updates after integration.
    fn constrain(&self, e: &mut EntityState, dt: f64) {
        match *self {
            Self::MixedKinematics {
                gravity,
                ground,
                incline,
            } => {
                if let Some(angle) = incline {
                    let along = incline_direction(angle);
                    e.velocity = along * e.velocity.dot(&along);
                }
                ground_contact(e, ground, gravity, dt);
            }
            Self::Oscillation { .. } => {
                if e.position.y < 0.0 {
                    e.position.y = 0.0;
                    e.velocity.y = e.velocity.y.max(0.0);
                }
            }
            Self::Thermal {
                gravity,
                ground,
                ambient,
                cooling_rate,
            } => {
                ground_contact(e, ground, gravity, dt);
                if let Some(t) = e.temperature {
                    e.temperature = Some(t - cooling_rate * (t - ambient) * dt);
                }
            }
            Self::Fluid {
                gravity, ground, ..
            }
            | Self::Generic { gravity, ground } => ground_contact(e, ground, gravity, dt),
            Self::Wave { .. }
            | Self::Electromagnetic { .. }
            | Self::Quantum
            | Self::Relativistic { .. } => {}
        }
    }

    /// Kinetic energy of one entity.
    #[must_use]
    pub fn kinetic_energy(&self, e: &EntityState) -> f64 {
        match *self {
            Self::Relativistic { light_speed, .. } => {
                (lorentz_factor(e.velocity.magnitude(), light_speed) - 1.0)
                    * e.mass
                    * light_speed
                    * light_speed
            }
            _ => 0.5 * e.mass * e.velocity.magnitude_squared(),
        }
    }

    /// Potential energy of one entity (ground at y = 0).
    #[must_use]
    pub fn potential_energy(&self, e: &EntityState) -> f64 {
        let height = e.mass * self.gravity() * e.position.y;
        match *self {
            Self::Oscillation { stiffness, .. } => {
                0.5 * stiffness * e.position.x * e.position.x + height
            }
            Self::Electromagnetic { e_field, .. } => -e.charge * e_field * e.position.x + height,
            Self::Fluid {
                gravity,
                density,
                displaced_volume,
                ..
            } => (e.mass - density * displaced_volume) * gravity * e.position.y,
            _ => height,
        }
    }

    /// Aggregate energy of a set of entities.
    #[must_use]
    pub fn energy(&self, entities: &[EntityState]) -> EnergyBreakdown {
        let kinetic = entities.iter().map(|e| self.kinetic_energy(e)).sum();
        let potential = entities.iter().map(|e| self.potential_energy(e)).sum();
        EnergyBreakdown::new(kinetic, potential)
    }
}

/// Unit vector down an incline of `angle` descending along +x.
fn incline_direction(angle: f64) -> Vec3 {
    Vec3::new(angle.cos(), -angle.sin(), 0.0)
}

fn lorentz_factor(speed: f64, c: f64) -> f64 {
    let beta = (speed / c).min(LIGHT_SPEED_CAP);
    1.0 / (1.0 - beta * beta).sqrt()
}

/// Clamp to the ground with restitution; friction slows sliding contact.
fn ground_contact(e: &mut EntityState, ground: Ground, gravity: f64, dt: f64) {
    if e.position.y >= 0.0 {
        return;
    }
    e.position.y = 0.0;
    if e.velocity.y < 0.0 {
        let rebound = -e.velocity.y * ground.restitution;
        // Rebounds smaller than two steps of gravity settle into contact.
        e.velocity.y = if rebound < 2.0 * gravity * dt { 0.0 } else { rebound };
    }
    if ground.friction > 0.0 {
        let horizontal = Vec3::new(e.velocity.x, 0.0, e.velocity.z);
        let speed = horizontal.magnitude();
        if speed > 0.0 {
            let slowed = (speed - ground.friction * gravity * dt).max(0.0);
            let scaled = horizontal * (slowed / speed);
            e.velocity.x = scaled.x;
            e.velocity.z = scaled.z;
        }
    }
}
