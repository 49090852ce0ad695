//! # groundwork-graph
//!
//! Deployment graph construction for the groundwork bootstrap orchestrator.
//!
//! ## Design Principles
//!
//! - The graph is built and fully validated before any side effect; a cycle
//!   or dangling reference is never discovered mid-apply
//! - Edges come from two sources: explicit `depends_on` declarations, and
//!   implicit data flow (a unit consuming an output another unit produces)
//! - Identity bindings are expanded into ordinary graph nodes, so ordering
//!   has exactly one source of truth
//! - Building is deterministic and idempotent: the same descriptors always
//!   yield the same edge set and the same topological levels

mod bind;
mod build;
mod cycle;
mod error;
mod graph;

pub use build::build;
pub use error::GraphError;
pub use graph::DeploymentGraph;
