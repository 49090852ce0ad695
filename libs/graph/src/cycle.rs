//! Cycle detection over the dependency relation.

use std::collections::BTreeMap;

use groundwork_model::UnitName;

use crate::{DeploymentGraph, GraphError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Color {
    White,
    Gray,
    Black,
}

/// Reject the graph if the dependency relation contains a cycle.
///
/// Three-color depth-first search in deterministic (name) order; the error
/// names the cycle path. Runs before any apply attempt.
pub(crate) fn check_acyclic(graph: &DeploymentGraph) -> Result<(), GraphError> {
    let mut colors: BTreeMap<&UnitName, Color> =
        graph.names().map(|n| (n, Color::White)).collect();
    let mut path: Vec<UnitName> = Vec::new();

    for name in graph.names() {
        if colors[name] == Color::White {
            visit(graph, name, &mut colors, &mut path)?;
        }
    }
    Ok(())
}

fn visit<'a>(
    graph: &'a DeploymentGraph,
    name: &'a UnitName,
    colors: &mut BTreeMap<&'a UnitName, Color>,
    path: &mut Vec<UnitName>,
) -> Result<(), GraphError> {
    colors.insert(name, Color::Gray);
    path.push(name.clone());

    for dep in graph.dependencies_of(name) {
        match colors.get(dep).copied().unwrap_or(Color::White) {
            Color::Gray => {
                // Back edge: the cycle is the path suffix starting at `dep`.
                let start = path.iter().position(|n| n == dep).unwrap_or(0);
                return Err(GraphError::CycleDetected {
                    path: path[start..].to_vec(),
                });
            }
            Color::White => visit(graph, dep, colors, path)?,
            Color::Black => {}
        }
    }

    path.pop();
    colors.insert(name, Color::Black);
    Ok(())
}
