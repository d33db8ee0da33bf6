//! IR construction.
//!
//! [`IrBuilder::build`] is total: missing or malformed data is replaced by
//! defaults and every finding is left for the validator to report.
//! Construction runs in a fixed order:
//!
//! 1. metadata
//! 2. parameters
//! 3. entities
//! 4. constraints
//! 5. modules (matcher, translation, auto-created parameters)
//! 6. merge into the global parameter table
//! 7. conservation laws
//! 8. symmetries
//! 9. optimization hints

use indexmap::IndexMap;
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::HashMap;
use tracing::{debug, info, warn};

use super::heuristics::{default_value, infer_dimension, unit_for};
use super::scan::{differential_order, extract_identifiers, referenced_symbols};
use super::{
    ConservationKind, ConservationLaw, ConstraintKind, Domain, Entity, EntityKind, Environment,
    Equation, IrConstraint, IrMetadata, IrModule, OptimizationHints, Parameter, ParameterRole,
    PhysicalQuantity, PhysicsIr, SystemDescription,
};
use crate::config::{OutputConfig, SimulationConfig};
use crate::engine::state::Vec3;
use crate::input::{InputObject, InputParameter, ProblemInput, VectorInput};
use crate::library::{CatalogEntry, ModuleLibrary, ModuleMatcher, Resolution};
use crate::units::{ROOM_TEMPERATURE_K, STANDARD_GRAVITY};

/// IR schema version.
pub const IR_VERSION: &str = "2.0";

/// Assembles a [`PhysicsIr`] from an upstream payload.
#[derive(Debug, Clone)]
pub struct IrBuilder<'a> {
    library: &'a ModuleLibrary,
    simulation: Option<SimulationConfig>,
    output: Option<OutputConfig>,
}

impl<'a> IrBuilder<'a> {
    /// Builder over a module library.
    #[must_use]
    pub const fn new(library: &'a ModuleLibrary) -> Self {
        Self {
            library,
            simulation: None,
            output: None,
        }
    }

    /// Simulation section used when the payload carries none.
    #[must_use]
    pub const fn with_simulation(mut self, simulation: SimulationConfig) -> Self {
        self.simulation = Some(simulation);
        self
    }

    /// Output section written into the IR.
    #[must_use]
    pub fn with_output(mut self, output: OutputConfig) -> Self {
        self.output = Some(output);
        self
    }

    /// Build the IR. Never fails.
    #[must_use]
    pub fn build(&self, input: &ProblemInput) -> PhysicsIr {
        let metadata = build_metadata(input);
        let given = build_parameters(&input.parameters);
        let entities = build_entities(input, &given);
        let constraints = build_constraints(&input.constraints);
        let modules = self.build_modules(input, &given);
        let parameters = merge_module_parameters(&given, &modules);
        let conservation_laws = union_conservation_laws(&modules);
        let symmetries = infer_symmetries(&input.system_type);
        let optimization = build_optimization_hints(&parameters, &modules);

        let environment = build_environment(&parameters, &modules);
        let system = SystemDescription {
            system_type: input.system_type.clone(),
            dimensions: spatial_dimensions(&entities),
            coordinate_system: "cartesian".to_string(),
            environment,
        };

        info!(
            ir = %metadata.id,
            modules = modules.len(),
            parameters = parameters.len(),
            entities = entities.len(),
            "IR built"
        );

        PhysicsIr {
            metadata: Some(metadata),
            system: Some(system),
            parameters,
            entities,
            modules,
            constraints,
            conservation_laws,
            symmetries,
            simulation: Some(
                input
                    .simulation
                    .or(self.simulation)
                    .unwrap_or_default(),
            ),
            output: Some(self.output.clone().unwrap_or_default()),
            optimization,
        }
    }

    fn select_entries(&self, input: &ProblemInput) -> Vec<&'a CatalogEntry> {
        let matcher = ModuleMatcher::new(self.library);
        let mut selected: Vec<&'a CatalogEntry> = Vec::new();

        for id in &input.modules {
            match self.library.get(id) {
                Some(entry) if !selected.iter().any(|e| e.id == entry.id) => selected.push(entry),
                Some(_) => {}
                None => warn!(module = %id, "requested module not in library"),
            }
        }

        let symbols: Vec<&str> = input.symbols().collect();
        for entry in matcher.match_modules(&symbols, &input.system_type, &input.free_text()) {
            if !selected.iter().any(|e| e.id == entry.id) {
                selected.push(entry);
            }
        }
        selected
    }

    fn build_modules(
        &self,
        input: &ProblemInput,
        given: &IndexMap<String, Parameter>,
    ) -> Vec<IrModule> {
        let selected = self.select_entries(input);
        if selected.is_empty() {
            debug!("no module matched, synthesizing generic module");
            return vec![generic_module(given)];
        }

        let resolution: Resolution<'a> = ModuleMatcher::new(self.library).resolve(selected);
        let modules: Vec<IrModule> = resolution
            .entries
            .iter()
            .map(|entry| translate_entry(entry, &resolution, given))
            .collect();

        info!(
            modules = ?modules.iter().map(|m| m.id.as_str()).collect::<Vec<_>>(),
            "modules selected"
        );
        modules
    }
}

// ----------------------------------------------------------------------
// 1. Metadata
// ----------------------------------------------------------------------

fn difficulty_weight(label: &str) -> f64 {
    match label.trim().to_lowercase().as_str() {
        "easy" | "beginner" | "basic" => 20.0,
        "medium" | "intermediate" => 40.0,
        "hard" | "advanced" => 60.0,
        "expert" | "olympiad" => 80.0,
        _ => 30.0,
    }
}

const fn domain_bonus(domain: Domain) -> f64 {
    match domain {
        Domain::Kinematics => 5.0,
        Domain::Dynamics | Domain::Oscillation | Domain::Thermal | Domain::Optical => 10.0,
        Domain::Wave | Domain::Fluid => 15.0,
        Domain::Electromagnetic => 20.0,
        Domain::Quantum | Domain::Relativistic => 25.0,
        Domain::Generic => 0.0,
    }
}

const fn domain_time_weight(domain: Domain) -> f64 {
    match domain {
        Domain::Quantum | Domain::Relativistic => 2.0,
        Domain::Electromagnetic | Domain::Fluid => 1.5,
        Domain::Wave | Domain::Thermal => 1.3,
        _ => 1.0,
    }
}

fn build_metadata(input: &ProblemInput) -> IrMetadata {
    let payload = serde_json::to_vec(input).unwrap_or_default();
    let id = format!("ir-{}", &blake3::hash(&payload).to_hex()[..16]);

    let domains = Domain::infer_from_text(&input.free_text());
    let complexity_score = (difficulty_weight(&input.difficulty)
        + domains.iter().copied().map(domain_bonus).sum::<f64>())
    .clamp(0.0, 100.0);
    let multiplier = domains
        .iter()
        .copied()
        .map(domain_time_weight)
        .fold(1.0_f64, f64::max);

    IrMetadata {
        id,
        version: IR_VERSION.to_string(),
        topic: input.topic.clone(),
        difficulty: input.difficulty.clone(),
        domains,
        complexity_score,
        estimated_solve_time: complexity_score * multiplier,
    }
}

// ----------------------------------------------------------------------
// 2. Parameters
// ----------------------------------------------------------------------

fn build_parameters(inputs: &[InputParameter]) -> IndexMap<String, Parameter> {
    let mut table: IndexMap<String, Parameter> = IndexMap::new();
    for input in inputs {
        let symbol = input.symbol.trim();
        if symbol.is_empty() {
            debug!("parameter without symbol skipped");
            continue;
        }
        if table.contains_key(symbol) {
            debug!(symbol, "duplicate parameter, first value kept");
            continue;
        }
        let mut quantity = PhysicalQuantity::new(input.value, input.unit.trim());
        quantity.uncertainty = input.uncertainty;
        table.insert(
            symbol.to_string(),
            Parameter {
                symbol: symbol.to_string(),
                quantity,
                role: ParameterRole::parse(&input.role),
                description: input.description.clone(),
                dependencies: Vec::new(),
                constraints: Vec::new(),
                formula: input.formula.clone(),
            },
        );
    }

    let symbols: Vec<String> = table.keys().cloned().collect();
    for param in table.values_mut() {
        param.dependencies = formula_dependencies(param, symbols.iter().map(String::as_str));
    }
    table
}

fn formula_dependencies<'s, I>(param: &Parameter, symbols: I) -> Vec<String>
where
    I: IntoIterator<Item = &'s str>,
{
    param.formula.as_deref().map_or_else(Vec::new, |formula| {
        referenced_symbols(formula, symbols.into_iter().filter(|s| *s != param.symbol))
    })
}

// ----------------------------------------------------------------------
// 3. Entities
// ----------------------------------------------------------------------

fn value_of(params: &IndexMap<String, Parameter>, symbols: &[&str]) -> Option<f64> {
    symbols
        .iter()
        .find_map(|s| params.get(*s))
        .map(Parameter::si_value)
}

fn build_entities(input: &ProblemInput, params: &IndexMap<String, Parameter>) -> Vec<Entity> {
    if input.objects.is_empty() {
        debug!("no objects supplied, synthesizing default entity");
        return vec![default_entity(params)];
    }
    input
        .objects
        .iter()
        .enumerate()
        .map(|(i, object)| entity_from_object(i, object, params))
        .collect()
}

fn entity_from_object(
    index: usize,
    object: &InputObject,
    params: &IndexMap<String, Parameter>,
) -> Entity {
    let id = if object.id.trim().is_empty() {
        format!("entity_{index}")
    } else {
        object.id.clone()
    };
    let mass = object.mass.unwrap_or_else(|| {
        debug!(entity = %id, "mass defaulted");
        value_of(params, &["m", "M"]).unwrap_or(1.0)
    });
    let vector = |v: &Option<VectorInput>| v.as_ref().map_or_else(Vec3::zero, VectorInput::to_vec3);

    Entity {
        kind: EntityKind::parse(&object.kind),
        position: vector(&object.position),
        velocity: vector(&object.velocity),
        acceleration: vector(&object.acceleration),
        mass,
        properties: object.properties.clone(),
        constraints: object.constraints.clone(),
        id,
    }
}

fn default_entity(params: &IndexMap<String, Parameter>) -> Entity {
    let mut entity = Entity::new("body");
    entity.mass = value_of(params, &["m", "M"]).unwrap_or(1.0);
    entity.position = Vec3::new(
        value_of(params, &["x0", "x_0"]).unwrap_or(0.0),
        value_of(params, &["y0", "y_0", "h", "h0"]).unwrap_or(0.0),
        0.0,
    );
    let speed = value_of(params, &["v0", "v_0", "u"]).unwrap_or(0.0);
    entity.velocity = match value_of(params, &["theta", "θ", "angle"]) {
        Some(angle) => Vec3::new(speed * angle.cos(), speed * angle.sin(), 0.0),
        None => Vec3::new(speed, 0.0, 0.0),
    };
    for (key, symbols) in [("charge", &["q", "Q"][..]), ("temperature", &["T0", "T_body"][..])] {
        if let Some(value) = value_of(params, symbols) {
            entity.properties.insert(key.to_string(), serde_json::json!(value));
        }
    }
    entity
}

fn spatial_dimensions(entities: &[Entity]) -> u8 {
    let any = |f: fn(&Vec3) -> f64| {
        entities
            .iter()
            .any(|e| f(&e.position) != 0.0 || f(&e.velocity) != 0.0)
    };
    if any(|v| v.z) {
        3
    } else if any(|v| v.y) {
        2
    } else {
        1
    }
}

// ----------------------------------------------------------------------
// 4. Constraints
// ----------------------------------------------------------------------

fn build_constraints(texts: &[String]) -> Vec<IrConstraint> {
    texts
        .iter()
        .filter(|t| !t.trim().is_empty())
        .enumerate()
        .map(|(i, text)| IrConstraint {
            id: format!("constraint_{i}"),
            kind: ConstraintKind::classify(text),
            expression: text.trim().to_string(),
        })
        .collect()
}

// ----------------------------------------------------------------------
// 5. Modules
// ----------------------------------------------------------------------

fn law_for(kind: ConservationKind) -> ConservationLaw {
    let (expression, variables, tolerance): (&str, &[&str], f64) = match kind {
        ConservationKind::Energy => ("KE + PE = const", &["KE", "PE"], 0.01),
        ConservationKind::Momentum => ("sum(m * v) = const", &["m", "v"], 0.01),
        ConservationKind::AngularMomentum => ("sum(r x m * v) = const", &["r", "m", "v"], 0.01),
        ConservationKind::Charge => ("sum(q) = const", &["q"], 0.001),
        ConservationKind::Mass => ("sum(m) = const", &["m"], 0.001),
        ConservationKind::ParticleCount => ("N = const", &["N"], 0.0),
    };
    ConservationLaw {
        kind,
        expression: expression.to_string(),
        variables: variables.iter().map(|s| (*s).to_string()).collect(),
        tolerance,
    }
}

fn generic_module(given: &IndexMap<String, Parameter>) -> IrModule {
    IrModule {
        id: "generic".to_string(),
        name: "Generic Mechanics".to_string(),
        description: "Known parameters under uniform gravity".to_string(),
        domain: Domain::Generic,
        parameters: given.clone(),
        equations: Vec::new(),
        dependencies: Vec::new(),
        conservation_laws: vec![law_for(ConservationKind::Mass)],
        assumptions: vec!["uniform gravity".to_string()],
        limitations: vec!["no domain-specific forces".to_string()],
        complexity: super::ComplexityTier::Basic,
        outputs: Vec::new(),
    }
}

fn auto_parameter(symbol: &str, domain: Domain, equation_id: &str) -> Parameter {
    let dimension = infer_dimension(symbol, Some(domain));
    let unit = dimension.map_or_else(String::new, unit_for);
    debug!(symbol, equation = equation_id, unit = %unit, "parameter auto-created");
    Parameter::new(
        symbol,
        default_value(symbol, Some(domain)),
        &unit,
        ParameterRole::Derived,
    )
    .with_description(format!("referenced by {equation_id}"))
}

fn translate_entry(
    entry: &CatalogEntry,
    resolution: &Resolution<'_>,
    given: &IndexMap<String, Parameter>,
) -> IrModule {
    if entry.domain == Domain::Generic && entry.parameters.is_empty() {
        let mut module = generic_module(given);
        module.dependencies = resolution.dependencies_of(&entry.id);
        return module;
    }

    let mut parameters: IndexMap<String, Parameter> = IndexMap::new();
    for p in &entry.parameters {
        let mut param = Parameter::new(&p.symbol, p.value, &p.unit, p.role)
            .with_description(p.description.clone());
        param.formula.clone_from(&p.formula);
        parameters.insert(p.symbol.clone(), param);
    }

    let mut equations = Vec::with_capacity(entry.equations.len());
    for eq in &entry.equations {
        let id = format!("{}_{}", entry.id, eq.id);
        let variables = extract_identifiers(&eq.expression);
        for var in &variables {
            if !parameters.contains_key(var) && !given.contains_key(var) {
                parameters.insert(var.clone(), auto_parameter(var, entry.domain, &id));
            }
        }
        let inputs: Vec<String> = variables
            .iter()
            .filter(|v| {
                parameters
                    .get(*v)
                    .or_else(|| given.get(*v))
                    .is_some_and(|p| matches!(p.role, ParameterRole::Given | ParameterRole::Constant))
            })
            .cloned()
            .collect();
        equations.push(Equation {
            id,
            kind: eq.kind,
            order: differential_order(&eq.expression),
            expression: eq.expression.clone(),
            variables,
            parameters: inputs,
            linear: eq.linear,
            physical_meaning: eq.meaning.clone(),
        });
    }

    let known: Vec<String> = parameters.keys().chain(given.keys()).cloned().collect();
    for param in parameters.values_mut() {
        param.dependencies = formula_dependencies(param, known.iter().map(String::as_str));
    }

    IrModule {
        id: entry.id.clone(),
        name: entry.name.clone(),
        description: entry.description.clone(),
        domain: entry.domain,
        parameters,
        equations,
        dependencies: resolution.dependencies_of(&entry.id),
        conservation_laws: entry.conservation.iter().copied().map(law_for).collect(),
        assumptions: entry.assumptions.clone(),
        limitations: entry.limitations.clone(),
        complexity: entry.complexity,
        outputs: entry.outputs.clone(),
    }
}

// ----------------------------------------------------------------------
// 6. Merge
// ----------------------------------------------------------------------

/// Fold module-local parameters into the global table.
///
/// First value wins, metadata merges: a clashing symbol keeps its
/// first-registered quantity (and formula) but adopts the later
/// registration's role, description, dependencies and constraints.
#[must_use]
pub fn merge_module_parameters(
    base: &IndexMap<String, Parameter>,
    modules: &[IrModule],
) -> IndexMap<String, Parameter> {
    let mut merged = base.clone();
    for module in modules {
        for (symbol, incoming) in &module.parameters {
            match merged.get_mut(symbol) {
                Some(existing) => {
                    existing.role = incoming.role;
                    existing.dependencies.clone_from(&incoming.dependencies);
                    existing.constraints.clone_from(&incoming.constraints);
                    existing.description.clone_from(&incoming.description);
                    if existing.formula.is_none() {
                        existing.formula.clone_from(&incoming.formula);
                    }
                }
                None => {
                    merged.insert(symbol.clone(), incoming.clone());
                }
            }
        }
    }
    merged
}

// ----------------------------------------------------------------------
// 7. Conservation laws, 8. Symmetries
// ----------------------------------------------------------------------

fn union_conservation_laws(modules: &[IrModule]) -> Vec<ConservationLaw> {
    let mut laws: Vec<ConservationLaw> = Vec::new();
    for law in modules.iter().flat_map(|m| &m.conservation_laws) {
        if !laws.iter().any(|l| l.kind == law.kind) {
            laws.push(law.clone());
        }
    }
    laws
}

fn infer_symmetries(system_type: &str) -> Vec<String> {
    const RULES: &[(&[&str], &[&str])] = &[
        (&["projectile", "fall", "throw", "launch"], &["translational_x", "time_translation"]),
        (&["spring", "oscillat", "pendulum", "harmonic"], &["time_reversal", "parity"]),
        (&["orbit", "circular", "central", "rotation"], &["rotational", "time_translation"]),
        (&["wave", "string"], &["translational", "time_translation"]),
        (&["collision", "particle"], &["translational", "galilean"]),
    ];
    let lower = system_type.to_lowercase();
    let mut tags: Vec<String> = Vec::new();
    for (keys, symmetries) in RULES {
        if keys.iter().any(|k| lower.contains(k)) {
            for s in *symmetries {
                if !tags.iter().any(|t| t == s) {
                    tags.push((*s).to_string());
                }
            }
        }
    }
    if tags.is_empty() {
        tags.push("time_translation".to_string());
    }
    tags
}

// ----------------------------------------------------------------------
// 9. Optimization hints and environment
// ----------------------------------------------------------------------

/// Topological layers of a module graph (dependencies first).
///
/// Returns a single layer with every module when the graph is cyclic.
#[must_use]
pub fn parallel_groups(graph: &IndexMap<String, Vec<String>>) -> Vec<Vec<String>> {
    let mut g: DiGraph<&str, ()> = DiGraph::new();
    let mut nodes: HashMap<&str, NodeIndex> = HashMap::new();
    for id in graph.keys() {
        nodes.insert(id.as_str(), g.add_node(id.as_str()));
    }
    for (id, deps) in graph {
        for dep in deps {
            if let (Some(&from), Some(&to)) = (nodes.get(dep.as_str()), nodes.get(id.as_str())) {
                g.add_edge(from, to, ());
            }
        }
    }

    let Ok(order) = toposort(&g, None) else {
        warn!("module graph is cyclic, no parallel grouping");
        return vec![graph.keys().cloned().collect()];
    };

    let mut level: HashMap<NodeIndex, usize> = HashMap::new();
    for node in &order {
        let lvl = g
            .neighbors_directed(*node, petgraph::Direction::Incoming)
            .filter_map(|dep| level.get(&dep))
            .map(|l| l + 1)
            .max()
            .unwrap_or(0);
        level.insert(*node, lvl);
    }

    let depth = level.values().copied().max().map_or(0, |d| d + 1);
    let mut groups: Vec<Vec<String>> = vec![Vec::new(); depth];
    // Graph insertion order keeps the grouping deterministic.
    for id in graph.keys() {
        if let Some(lvl) = nodes.get(id.as_str()).and_then(|n| level.get(n)) {
            groups[*lvl].push(id.clone());
        }
    }
    groups
}

fn build_optimization_hints(
    parameters: &IndexMap<String, Parameter>,
    modules: &[IrModule],
) -> OptimizationHints {
    let constant_cache = parameters
        .values()
        .filter(|p| p.role == ParameterRole::Constant)
        .map(|p| (p.symbol.clone(), p.si_value()))
        .collect();
    let differential_cache = modules
        .iter()
        .flat_map(|m| &m.equations)
        .filter(|e| e.kind == super::EquationKind::Differential)
        .map(|e| (e.id.clone(), e.expression.clone()))
        .collect();
    let module_graph: IndexMap<String, Vec<String>> = modules
        .iter()
        .map(|m| (m.id.clone(), m.dependencies.clone()))
        .collect();
    let parallel_groups = parallel_groups(&module_graph);

    OptimizationHints {
        constant_cache,
        differential_cache,
        module_graph,
        parallel_groups,
    }
}

fn build_environment(parameters: &IndexMap<String, Parameter>, modules: &[IrModule]) -> Environment {
    let gravity_free = !modules.is_empty()
        && modules.iter().all(|m| {
            matches!(
                m.domain,
                Domain::Electromagnetic
                    | Domain::Wave
                    | Domain::Quantum
                    | Domain::Optical
                    | Domain::Relativistic
            )
        });
    let gravity = value_of(parameters, &["g"]).unwrap_or(if gravity_free {
        0.0
    } else {
        STANDARD_GRAVITY
    });
    let drag = value_of(parameters, &["b_drag", "drag"]).unwrap_or(0.0);

    Environment {
        gravity,
        temperature: value_of(parameters, &["T_env", "T_ambient"]).unwrap_or(ROOM_TEMPERATURE_K),
        friction: value_of(parameters, &["mu", "mu_k"]).unwrap_or(0.0),
        restitution: value_of(parameters, &["e", "restitution"]).unwrap_or(0.8),
        air_resistance: drag > 0.0,
        drag_coefficient: drag,
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn module_with(id: &str, params: &[(String, f64, u8)]) -> IrModule {
        let mut module = generic_module(&IndexMap::new());
        module.id = id.to_string();
        for (symbol, value, role) in params {
            let role = match role % 4 {
                0 => ParameterRole::Given,
                1 => ParameterRole::Unknown,
                2 => ParameterRole::Constant,
                _ => ParameterRole::Derived,
            };
            module.parameters.insert(
                symbol.clone(),
                Parameter::new(symbol, *value, "m", role).with_description(format!("{id}:{symbol}")),
            );
        }
        module
    }

    proptest! {
        #[test]
        fn prop_merge_idempotent(
            a in prop::collection::vec(("[a-e]", -10.0f64..10.0, 0u8..4), 0..6),
            b in prop::collection::vec(("[a-e]", -10.0f64..10.0, 0u8..4), 0..6),
        ) {
            let modules = vec![module_with("m1", &a), module_with("m2", &b)];
            let once = merge_module_parameters(&IndexMap::new(), &modules);
            let twice = merge_module_parameters(&once, &modules);
            prop_assert_eq!(&once, &twice);
        }

        #[test]
        fn prop_merge_first_value_wins(
            first in -100.0f64..100.0,
            later in -100.0f64..100.0,
        ) {
            let m1 = module_with("m1", &[("x".to_string(), first, 0)]);
            let m2 = module_with("m2", &[("x".to_string(), later, 2)]);
            let merged = merge_module_parameters(&IndexMap::new(), &[m1, m2]);
            prop_assert!((merged["x"].quantity.value - first).abs() < f64::EPSILON);
            prop_assert_eq!(merged["x"].role, ParameterRole::Constant);
            prop_assert_eq!(&merged["x"].description, "m2:x");
        }
    }
}
