//! # groundwork-engine
//!
//! The topological apply scheduler for the groundwork bootstrap
//! orchestrator.
//!
//! ## Design Principles
//!
//! - A unit's apply call is never issued before every dependency's record
//!   is Ready — the single correctness invariant under concurrency
//! - Independent units fan out as concurrent tasks; only the scheduler
//!   loop mutates records and published outputs
//! - Apply failures are contained: transitive dependents are skipped,
//!   independent branches keep running
//! - The handoff record is all-or-nothing: withheld entirely unless every
//!   unit reached Ready
//!
//! The engine talks to the outside world through the [`Provider`] seam:
//! opaque `apply` and `describe` operations per unit. [`SimProvider`] is a
//! deterministic in-memory implementation for tests and dry runs.

mod config;
mod error;
mod handoff;
mod provider;
mod record;
mod report;
mod scheduler;
mod sim;
mod waiter;

pub use config::EngineConfig;
pub use error::UnitError;
pub use handoff::{Handoff, HandoffError, HandoffSpec};
pub use provider::{Applied, ConditionStatus, Provider, ProviderHandle, ResolvedInputs};
pub use record::{ApplyRecord, ApplyState};
pub use report::{RunReport, RunResult, UnitReport};
pub use scheduler::Scheduler;
pub use sim::SimProvider;
