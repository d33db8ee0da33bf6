//! Multi-pass IR validation.
//!
//! Six independent passes, each producing a [`PassResult`]:
//!
//! | Pass | Blocks a run |
//! |------|--------------|
//! | structural | yes |
//! | logical | no |
//! | dependency | yes |
//! | physics | no |
//! | units | no |
//! | equations | yes |
//!
//! The validator is the single place IR findings surface; the builder
//! never reports.

pub mod report;
pub mod tables;

use indexmap::IndexMap;
use petgraph::algo::{is_cyclic_directed, toposort};
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::HashMap;
use tracing::{debug, info};

pub use report::{Finding, PassResult, ValidationCategory, ValidationReport};

use crate::ir::heuristics::{infer_dimension, unit_for};
use crate::ir::scan::{extract_identifiers, has_undefined_marker};
use crate::ir::{ConservationKind, Parameter, ParameterRole, PhysicsIr};
use crate::units::{Dimension, DimensionVector, ABSOLUTE_ZERO_K};

bitflags::bitflags! {
    /// Selection of validation passes to run.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ValidationPasses: u32 {
        /// Required sections and simulation bounds.
        const STRUCTURAL = 0b00_0001;
        /// Parameter uniqueness, roles and resolution.
        const LOGICAL = 0b00_0010;
        /// Dependency graphs.
        const DEPENDENCY = 0b00_0100;
        /// Dimensions and environment.
        const PHYSICS = 0b00_1000;
        /// Units.
        const UNITS = 0b01_0000;
        /// Equation token resolution.
        const EQUATIONS = 0b10_0000;
    }
}

impl Default for ValidationPasses {
    fn default() -> Self {
        Self::all()
    }
}

/// Magnitude below which an unknown-role value counts as unset.
const UNKNOWN_VALUE_EPSILON: f64 = 1e-9;

/// Smallest duration / time-step ratio that does not warn.
const MIN_STEPS_PER_RUN: f64 = 100.0;

/// IR validator.
#[derive(Debug, Clone, Copy, Default)]
pub struct IrValidator {
    passes: ValidationPasses,
}

impl IrValidator {
    /// Validator running every pass.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validator running a subset of passes.
    #[must_use]
    pub const fn with_passes(passes: ValidationPasses) -> Self {
        Self { passes }
    }

    /// Run the selected passes.
    #[must_use]
    pub fn validate(&self, ir: &PhysicsIr) -> ValidationReport {
        let plan: [(ValidationPasses, fn(&PhysicsIr) -> PassResult); 6] = [
            (ValidationPasses::STRUCTURAL, structural),
            (ValidationPasses::LOGICAL, logical),
            (ValidationPasses::DEPENDENCY, dependency),
            (ValidationPasses::PHYSICS, physics),
            (ValidationPasses::UNITS, units),
            (ValidationPasses::EQUATIONS, equations),
        ];
        let results: Vec<PassResult> = plan
            .iter()
            .filter(|(flag, _)| self.passes.contains(*flag))
            .map(|(_, pass)| {
                let result = pass(ir);
                debug!(
                    pass = %result.category,
                    valid = result.valid,
                    errors = result.errors.len(),
                    warnings = result.warnings.len(),
                    "validation pass finished"
                );
                result
            })
            .collect();

        let report = ValidationReport::from_passes(results);
        info!(
            score = report.score,
            valid = report.valid,
            can_run = report.can_run(),
            "IR validated"
        );
        report
    }
}

// ----------------------------------------------------------------------
// a. Structural
// ----------------------------------------------------------------------

fn structural(ir: &PhysicsIr) -> PassResult {
    let mut pass = PassResult::new(ValidationCategory::Structural);
    let sections = [
        ("metadata", ir.metadata.is_some()),
        ("system", ir.system.is_some()),
        ("simulation", ir.simulation.is_some()),
        ("output", ir.output.is_some()),
    ];
    for (name, present) in sections {
        if !present {
            pass.error(1, |c| {
                Finding::new(&c, format!("missing required section: {name}")).about(name)
            });
        }
    }

    if let Some(sim) = &ir.simulation {
        if !(sim.duration.is_finite() && sim.duration > 0.0) {
            pass.error(2, |c| {
                Finding::new(&c, format!("duration must be positive, got {}", sim.duration))
                    .about("duration")
            });
        }
        if !(sim.time_step.is_finite() && sim.time_step > 0.0) {
            pass.error(3, |c| {
                Finding::new(&c, format!("time step must be positive, got {}", sim.time_step))
                    .about("time_step")
            });
        }
        if sim.duration > 0.0
            && sim.time_step > 0.0
            && sim.duration / sim.time_step < MIN_STEPS_PER_RUN
        {
            pass.warn(4, |c| {
                Finding::new(
                    &c,
                    format!(
                        "time step {} is not much smaller than duration {}",
                        sim.time_step, sim.duration
                    ),
                )
                .suggest(format!("use a time step below {}", sim.duration / MIN_STEPS_PER_RUN))
            });
        }
    }

    if ir.modules.is_empty() {
        pass.warn(5, |c| Finding::new(&c, "IR has no modules"));
    }
    if ir.entities.is_empty() {
        pass.warn(6, |c| Finding::new(&c, "IR has no entities to simulate"));
    }
    pass
}

// ----------------------------------------------------------------------
// b. Logical
// ----------------------------------------------------------------------

fn logical(ir: &PhysicsIr) -> PassResult {
    let mut pass = PassResult::new(ValidationCategory::Logical);

    for (key, param) in &ir.parameters {
        if param.symbol.trim().is_empty() {
            pass.error(1, |c| Finding::new(&c, "parameter with empty symbol").about(key.clone()));
        } else if key != &param.symbol {
            pass.error(2, |c| {
                Finding::new(
                    &c,
                    format!("parameter slot '{key}' holds symbol '{}'", param.symbol),
                )
                .about(param.symbol.clone())
            });
        }
        if param.role == ParameterRole::Unknown
            && param.quantity.value.abs() > UNKNOWN_VALUE_EPSILON
        {
            pass.warn(3, |c| {
                Finding::new(
                    &c,
                    format!(
                        "unknown '{}' already has value {}",
                        param.symbol, param.quantity.value
                    ),
                )
                .about(param.symbol.clone())
            });
        }
    }

    let mut seen: HashMap<&str, usize> = HashMap::new();
    for param in ir.parameters.values() {
        *seen.entry(param.symbol.as_str()).or_default() += 1;
    }
    for (symbol, count) in seen.into_iter().filter(|(_, n)| *n > 1) {
        pass.error(4, |c| {
            Finding::new(&c, format!("symbol '{symbol}' registered {count} times")).about(symbol)
        });
    }

    for module in &ir.modules {
        for symbol in module.parameters.keys() {
            if !ir.parameters.contains_key(symbol) {
                pass.error(5, |c| {
                    Finding::new(
                        &c,
                        format!(
                            "module '{}' parameter '{symbol}' is not in the global table",
                            module.id
                        ),
                    )
                    .about(symbol.clone())
                });
            }
        }
    }
    pass
}

// ----------------------------------------------------------------------
// c. Dependency
// ----------------------------------------------------------------------

fn dependency(ir: &PhysicsIr) -> PassResult {
    let mut pass = PassResult::new(ValidationCategory::Dependency);

    // Module graph.
    let mut graph: DiGraph<&str, ()> = DiGraph::new();
    let mut nodes: HashMap<&str, NodeIndex> = HashMap::new();
    for module in &ir.modules {
        if nodes.contains_key(module.id.as_str()) {
            pass.error(1, |c| {
                Finding::new(&c, format!("duplicate module id '{}'", module.id))
                    .about(module.id.clone())
            });
            continue;
        }
        nodes.insert(module.id.as_str(), graph.add_node(module.id.as_str()));
    }
    for module in &ir.modules {
        for dep in &module.dependencies {
            match (nodes.get(module.id.as_str()), nodes.get(dep.as_str())) {
                (Some(&from), Some(&to)) => {
                    graph.add_edge(from, to, ());
                }
                _ => pass.error(2, |c| {
                    Finding::new(
                        &c,
                        format!("module '{}' depends on missing module '{dep}'", module.id),
                    )
                    .about(dep.clone())
                }),
            }
        }
    }
    if is_cyclic_directed(&graph) {
        pass.error(3, |c| {
            Finding::new(&c, "module dependency graph has a cycle")
                .suggest("remove the dependency that closes the cycle")
        });
    }

    // Parameter graph.
    let mut pgraph: DiGraph<&str, ()> = DiGraph::new();
    let pnodes: IndexMap<&str, NodeIndex> = ir
        .parameters
        .keys()
        .map(|k| (k.as_str(), pgraph.add_node(k.as_str())))
        .collect();
    for param in ir.parameters.values() {
        for dep in &param.dependencies {
            match (pnodes.get(param.symbol.as_str()), pnodes.get(dep.as_str())) {
                (Some(&from), Some(&to)) => {
                    pgraph.add_edge(from, to, ());
                }
                _ => pass.error(4, |c| {
                    Finding::new(
                        &c,
                        format!("parameter '{}' depends on undefined '{dep}'", param.symbol),
                    )
                    .about(dep.clone())
                }),
            }
        }
    }
    if let Err(cycle) = toposort(&pgraph, None) {
        let symbol = pgraph[cycle.node_id()];
        pass.error(5, |c| {
            Finding::new(&c, format!("parameter dependency cycle through '{symbol}'"))
                .about(symbol)
        });
    }
    pass
}

// ----------------------------------------------------------------------
// d. Physics
// ----------------------------------------------------------------------

fn has_dimension(params: &IndexMap<String, Parameter>, d: DimensionVector) -> bool {
    params
        .values()
        .any(|p| p.quantity.dimension == Dimension::Known(d))
}

fn law_is_represented(ir: &PhysicsIr, kind: ConservationKind) -> bool {
    let p = &ir.parameters;
    let mass = has_dimension(p, DimensionVector::MASS);
    let velocity = has_dimension(p, DimensionVector::VELOCITY);
    match kind {
        ConservationKind::Energy => has_dimension(p, DimensionVector::ENERGY) || (mass && velocity),
        ConservationKind::Momentum => {
            has_dimension(p, DimensionVector::MOMENTUM) || (mass && velocity)
        }
        ConservationKind::AngularMomentum => {
            has_dimension(p, DimensionVector::ANGULAR_MOMENTUM)
                || (mass && velocity && has_dimension(p, DimensionVector::LENGTH))
        }
        ConservationKind::Charge => has_dimension(p, DimensionVector::CHARGE),
        ConservationKind::Mass => mass || !ir.entities.is_empty(),
        ConservationKind::ParticleCount => !ir.entities.is_empty(),
    }
}

fn physics(ir: &PhysicsIr) -> PassResult {
    let mut pass = PassResult::new(ValidationCategory::Physics);
    let system_type = ir.system_type();

    for param in ir.parameters.values() {
        let Some(expected) = tables::expected_dimension(&param.symbol, system_type) else {
            continue;
        };
        let Dimension::Known(actual) = param.quantity.dimension else {
            continue;
        };
        if actual != expected {
            pass.error(1, |c| {
                Finding::new(
                    &c,
                    format!("'{}' has dimension {actual}, expected {expected}", param.symbol),
                )
                .about(param.symbol.clone())
                .suggest(format!("state '{}' in {}", param.symbol, unit_for(expected)))
            });
        }
    }

    if let Some(system) = &ir.system {
        let env = system.environment;
        if !(env.gravity.is_finite() && env.gravity >= 0.0) {
            pass.error(2, |c| {
                Finding::new(&c, format!("gravity must be non-negative, got {}", env.gravity))
                    .about("gravity")
            });
        }
        if !(env.temperature.is_finite() && env.temperature >= ABSOLUTE_ZERO_K) {
            pass.error(3, |c| {
                Finding::new(
                    &c,
                    format!("temperature {} K is below absolute zero", env.temperature),
                )
                .about("temperature")
            });
        }
        if !(0.0..=1.0).contains(&env.restitution) {
            pass.warn(4, |c| {
                Finding::new(&c, format!("restitution {} outside [0, 1]", env.restitution))
                    .about("restitution")
            });
        }
    }

    for entity in &ir.entities {
        if !(entity.mass.is_finite() && entity.mass > 0.0) {
            pass.error(5, |c| {
                Finding::new(&c, format!("entity '{}' has mass {}", entity.id, entity.mass))
                    .about(entity.id.clone())
            });
        }
        if !(entity.position.is_finite() && entity.velocity.is_finite()) {
            pass.error(6, |c| {
                Finding::new(&c, format!("entity '{}' has a non-finite state", entity.id))
                    .about(entity.id.clone())
            });
        }
    }

    for law in &ir.conservation_laws {
        if !law_is_represented(ir, law.kind) {
            pass.warn(7, |c| {
                Finding::new(
                    &c,
                    format!("no parameter carries the quantity of the {} law", law.kind),
                )
                .about(law.kind.as_str())
            });
        }
    }
    pass
}

// ----------------------------------------------------------------------
// e. Units
// ----------------------------------------------------------------------

fn units(ir: &PhysicsIr) -> PassResult {
    let mut pass = PassResult::new(ValidationCategory::Units);

    for param in ir.parameters.values() {
        let unit = param.quantity.unit.trim();
        if unit.is_empty() {
            pass.error(1, |c| {
                Finding::new(&c, format!("'{}' has no unit", param.symbol))
                    .about(param.symbol.clone())
                    .suggest(
                        infer_dimension(&param.symbol, None)
                            .map_or_else(|| "use '1' for dimensionless values".to_string(), |d| {
                                format!("expected {}", unit_for(d))
                            }),
                    )
            });
            continue;
        }
        if param.quantity.dimension.is_unknown() {
            pass.warn(2, |c| {
                Finding::new(
                    &c,
                    format!(
                        "'{}' has unrecognised unit '{unit}'; its value is used without SI conversion",
                        param.symbol
                    ),
                )
                .about(param.symbol.clone())
            });
        } else if !tables::is_allowed_unit(unit) {
            pass.warn(3, |c| {
                Finding::new(&c, format!("'{}' uses unit '{unit}' outside the allow-list", param.symbol))
                    .about(param.symbol.clone())
            });
        }
        if tables::TIME_SYMBOLS.contains(&param.symbol.as_str()) && unit != "s" {
            pass.warn(4, |c| {
                Finding::new(&c, format!("'{}' should be stated in s, got '{unit}'", param.symbol))
                    .about(param.symbol.clone())
            });
        }
        if param.symbol == "g" && !tables::ACCELERATION_UNITS.contains(&unit) {
            pass.warn(5, |c| {
                Finding::new(&c, format!("gravity should be stated in m/s^2, got '{unit}'"))
                    .about("g")
            });
        }
    }
    pass
}

// ----------------------------------------------------------------------
// f. Equations
// ----------------------------------------------------------------------

fn equations(ir: &PhysicsIr) -> PassResult {
    let mut pass = PassResult::new(ValidationCategory::Equations);

    for module in &ir.modules {
        for eq in &module.equations {
            if eq.expression.trim().is_empty() {
                pass.error(1, |c| {
                    Finding::new(&c, format!("equation '{}' is empty", eq.id)).about(eq.id.clone())
                });
                continue;
            }
            if has_undefined_marker(&eq.expression) {
                pass.error(2, |c| {
                    Finding::new(&c, format!("equation '{}' contains an undefined term", eq.id))
                        .about(eq.id.clone())
                });
            }

            let mut tokens = extract_identifiers(&eq.expression);
            for extra in eq.variables.iter().chain(&eq.parameters) {
                if !tokens.contains(extra) {
                    tokens.push(extra.clone());
                }
            }
            for token in tokens {
                if module.parameters.contains_key(&token) || ir.parameters.contains_key(&token) {
                    continue;
                }
                let suggestion = infer_dimension(&token, Some(module.domain)).map_or_else(
                    || "no dimension could be inferred; declare it explicitly".to_string(),
                    |d| format!("declare '{token}' with dimension {d} [{}]", unit_for(d)),
                );
                pass.error(3, |c| {
                    Finding::new(
                        &c,
                        format!("equation '{}' references unresolved '{token}'", eq.id),
                    )
                    .about(token.clone())
                    .suggest(suggestion)
                });
            }
        }
    }
    pass
}
