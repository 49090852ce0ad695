//! # groundwork-model
//!
//! Resource descriptors for the groundwork bootstrap orchestrator.
//!
//! ## Design Principles
//!
//! - Descriptors are pure value objects; validation happens at construction
//!   time and never has side effects
//! - The kind set is closed: per-kind behavior is a tagged variant with a
//!   dispatch table, never inheritance
//! - Data flow is static: what a unit produces and what it consumes is
//!   derivable from the descriptor alone, without executing anything
//! - Descriptors never carry secret values, only external references
//!
//! ## Units
//!
//! A [`ResourceUnit`] names one provisionable thing (a network, an identity
//! trust, a managed cluster, a package release, a cluster-scoped object, a
//! secret store, or a synthetic identity binding), its kind-specific payload,
//! its explicit dependencies, the output identifiers it claims to produce,
//! and the [`ReadinessPolicy`] that decides when dependents may start.

mod error;
mod id;
mod kind;
mod name;
mod readiness;
mod spec;
mod unit;
mod value;

pub use error::ConfigurationError;
pub use id::{RunId, RunIdError};
pub use kind::ResourceKind;
pub use name::UnitName;
pub use readiness::ReadinessPolicy;
pub use spec::{
    AccessRule, BindingRequest, BindingSpec, ClusterSpec, NetworkSpec, ObjectSpec, ReleaseSpec,
    SecretStoreSpec, TrustSpec, UnitSpec,
};
pub use unit::ResourceUnit;
pub use value::{OutputKey, Outputs, ValueRef};
