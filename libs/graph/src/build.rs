//! Graph assembly: validation, binder expansion, edge inference, cycle check.

use std::collections::{BTreeMap, BTreeSet};

use groundwork_model::{OutputKey, ResourceUnit, UnitName};
use tracing::debug;

use crate::{bind, cycle, DeploymentGraph, GraphError};

/// Assemble a deployment graph from a set of resource units.
///
/// Performs, in order:
/// 1. construction-time validation of every descriptor (fail fast);
/// 2. binder expansion (synthetic identity-binding units);
/// 3. duplicate-name detection;
/// 4. producer indexing — at most one producer per output identifier;
/// 5. explicit edges (`depends_on`) and implicit edges (consumed output
///    identifiers matched against the producer index);
/// 6. cycle detection.
///
/// Any error aborts the whole run before a single side effect occurs.
pub fn build(units: impl IntoIterator<Item = ResourceUnit>) -> Result<DeploymentGraph, GraphError> {
    let units: Vec<ResourceUnit> = units.into_iter().collect();
    for unit in &units {
        unit.validate()?;
    }

    let units = bind::expand_bindings(units)?;

    let mut store: BTreeMap<UnitName, ResourceUnit> = BTreeMap::new();
    for unit in units {
        let name = unit.name.clone();
        if store.insert(name.clone(), unit).is_some() {
            return Err(GraphError::DuplicateUnit { name });
        }
    }

    // Producer index: output key -> the single unit that claims it.
    let mut producers: BTreeMap<OutputKey, UnitName> = BTreeMap::new();
    for (name, unit) in &store {
        for key in &unit.produces {
            if let Some(first) = producers.insert(key.clone(), name.clone()) {
                return Err(GraphError::AmbiguousProducer {
                    key: key.clone(),
                    first,
                    second: name.clone(),
                });
            }
        }
    }

    let mut deps: BTreeMap<UnitName, BTreeSet<UnitName>> = BTreeMap::new();
    let mut dependents: BTreeMap<UnitName, BTreeSet<UnitName>> = BTreeMap::new();
    for name in store.keys() {
        deps.insert(name.clone(), BTreeSet::new());
        dependents.insert(name.clone(), BTreeSet::new());
    }
    let mut add_edge = |from: &UnitName, to: &UnitName| {
        if let Some(set) = deps.get_mut(from) {
            set.insert(to.clone());
        }
        if let Some(set) = dependents.get_mut(to) {
            set.insert(from.clone());
        }
    };

    for (name, unit) in &store {
        for dep in &unit.depends_on {
            if !store.contains_key(dep) {
                return Err(GraphError::DanglingReference {
                    unit: name.clone(),
                    missing: dep.clone(),
                });
            }
            add_edge(name, dep);
        }
        for key in unit.consumes() {
            match producers.get(&key) {
                Some(producer) => add_edge(name, producer),
                None => {
                    return Err(GraphError::UnresolvedConsumer {
                        unit: name.clone(),
                        key,
                    })
                }
            }
        }
    }

    let graph = DeploymentGraph {
        units: store,
        deps,
        dependents,
    };
    cycle::check_acyclic(&graph)?;

    debug!(
        units = graph.len(),
        edges = graph.edges().len(),
        "deployment graph built"
    );
    Ok(graph)
}
