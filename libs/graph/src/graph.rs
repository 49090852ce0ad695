//! The deployment graph: units plus the combined edge set for one run.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use groundwork_model::{ResourceUnit, UnitName};

/// The set of all resource units plus the dependency edges between them.
///
/// Owned exclusively by the orchestrator for the lifetime of one apply run;
/// never persisted. All storage is `BTreeMap`/`BTreeSet`, so iteration
/// order (and everything derived from it) is deterministic.
#[derive(Debug, Clone)]
pub struct DeploymentGraph {
    pub(crate) units: BTreeMap<UnitName, ResourceUnit>,
    /// unit -> the units it depends on.
    pub(crate) deps: BTreeMap<UnitName, BTreeSet<UnitName>>,
    /// unit -> the units that depend on it.
    pub(crate) dependents: BTreeMap<UnitName, BTreeSet<UnitName>>,
}

impl DeploymentGraph {
    /// Number of units in the graph.
    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn contains(&self, name: &UnitName) -> bool {
        self.units.contains_key(name)
    }

    /// Look up one unit.
    pub fn unit(&self, name: &UnitName) -> Option<&ResourceUnit> {
        self.units.get(name)
    }

    /// All units in name order.
    pub fn units(&self) -> impl Iterator<Item = &ResourceUnit> {
        self.units.values()
    }

    /// All unit names in order.
    pub fn names(&self) -> impl Iterator<Item = &UnitName> {
        self.units.keys()
    }

    /// The units `name` depends on.
    pub fn dependencies_of(&self, name: &UnitName) -> impl Iterator<Item = &UnitName> {
        self.deps.get(name).into_iter().flatten()
    }

    /// The units that directly depend on `name`.
    pub fn dependents_of(&self, name: &UnitName) -> impl Iterator<Item = &UnitName> {
        self.dependents.get(name).into_iter().flatten()
    }

    /// Every edge as `(dependent, dependency)`, in deterministic order.
    pub fn edges(&self) -> Vec<(UnitName, UnitName)> {
        self.deps
            .iter()
            .flat_map(|(unit, deps)| deps.iter().map(move |d| (unit.clone(), d.clone())))
            .collect()
    }

    /// The unit claiming a produced identifier, if any.
    pub fn producer_of(&self, key: &groundwork_model::OutputKey) -> Option<&UnitName> {
        self.units
            .iter()
            .find(|(_, unit)| unit.produces.contains(key))
            .map(|(name, _)| name)
    }

    /// Everything downstream of `name`, directly or transitively.
    ///
    /// Used for skip propagation: when a unit fails, this is the set that
    /// must never be attempted.
    pub fn transitive_dependents(&self, name: &UnitName) -> BTreeSet<UnitName> {
        let mut seen = BTreeSet::new();
        let mut queue: VecDeque<&UnitName> = self.dependents_of(name).collect();
        while let Some(next) = queue.pop_front() {
            if seen.insert(next.clone()) {
                queue.extend(self.dependents_of(next));
            }
        }
        seen
    }

    /// Topological levels: every unit in level `n` has all its dependencies
    /// in levels `< n`. Within a level, names are in ascending lexical
    /// order — the deterministic tie-break for logging and admission.
    ///
    /// Only called on acyclic graphs (the builder guarantees this); any
    /// unit caught in a residual cycle would simply be absent.
    pub fn levels(&self) -> Vec<Vec<UnitName>> {
        let mut remaining: BTreeMap<&UnitName, usize> = self
            .units
            .keys()
            .map(|n| (n, self.deps.get(n).map_or(0, BTreeSet::len)))
            .collect();
        let mut levels = Vec::new();

        while !remaining.is_empty() {
            let ready: Vec<UnitName> = remaining
                .iter()
                .filter(|(_, indegree)| **indegree == 0)
                .map(|(name, _)| (*name).clone())
                .collect();
            if ready.is_empty() {
                break;
            }
            for name in &ready {
                remaining.remove(name);
                for dependent in self.dependents_of(name) {
                    if let Some(indegree) = remaining.get_mut(dependent) {
                        *indegree = indegree.saturating_sub(1);
                    }
                }
            }
            levels.push(ready);
        }

        levels
    }
}
