//! Deterministic in-memory provider for tests and dry runs.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use groundwork_model::{Outputs, ResourceUnit, UnitName};
use tracing::debug;

use crate::{Applied, ConditionStatus, Provider, ProviderHandle, ResolvedInputs};

#[derive(Debug, Clone)]
struct Behavior {
    /// Reject the apply call with this message.
    fail_apply: Option<String>,
    /// Number of describe calls until the condition reports satisfied.
    /// 1 means satisfied at the first check; `u32::MAX` means never.
    satisfied_after: u32,
}

impl Default for Behavior {
    fn default() -> Self {
        Self {
            fail_apply: None,
            satisfied_after: 1,
        }
    }
}

#[derive(Debug, Default)]
struct SimState {
    seq: u64,
    applied: Vec<UnitName>,
    behaviors: HashMap<String, Behavior>,
    polls: HashMap<String, u32>,
}

/// Simulated provider: scripted failures and convergence, synthesised
/// outputs for every declared output key.
///
/// Apply order and poll counts are recorded so tests can assert on what
/// the scheduler actually issued.
#[derive(Debug, Default)]
pub struct SimProvider {
    state: Mutex<SimState>,
    apply_delay: Duration,
}

impl SimProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the named unit's apply call to fail.
    pub fn failing(self, unit: &str, reason: &str) -> Self {
        self.behavior(unit, |b| b.fail_apply = Some(reason.to_string()))
    }

    /// Script the named unit's condition to become satisfied at the n-th
    /// describe call.
    pub fn satisfied_after(self, unit: &str, polls: u32) -> Self {
        self.behavior(unit, |b| b.satisfied_after = polls)
    }

    /// Script the named unit's condition to never become satisfied.
    pub fn never_satisfied(self, unit: &str) -> Self {
        self.satisfied_after(unit, u32::MAX)
    }

    /// Make every apply call take this long.
    pub fn with_apply_delay(mut self, delay: Duration) -> Self {
        self.apply_delay = delay;
        self
    }

    fn behavior(self, unit: &str, update: impl FnOnce(&mut Behavior)) -> Self {
        {
            let mut state = self.state.lock().expect("sim state poisoned");
            update(state.behaviors.entry(unit.to_string()).or_default());
        }
        self
    }

    /// Number of apply calls issued so far.
    pub fn apply_count(&self) -> usize {
        self.state.lock().expect("sim state poisoned").applied.len()
    }

    /// Units applied, in issue order.
    pub fn applied_units(&self) -> Vec<UnitName> {
        self.state.lock().expect("sim state poisoned").applied.clone()
    }

    /// Describe calls issued for the named unit.
    pub fn poll_count(&self, unit: &str) -> u32 {
        self.state
            .lock()
            .expect("sim state poisoned")
            .polls
            .get(unit)
            .copied()
            .unwrap_or(0)
    }
}

#[async_trait]
impl Provider for SimProvider {
    async fn apply(&self, unit: &ResourceUnit, inputs: &ResolvedInputs) -> anyhow::Result<Applied> {
        if !self.apply_delay.is_zero() {
            tokio::time::sleep(self.apply_delay).await;
        }

        let mut state = self.state.lock().expect("sim state poisoned");
        state.seq += 1;
        let seq = state.seq;
        state.applied.push(unit.name.clone());

        if let Some(reason) = state
            .behaviors
            .get(unit.name.as_str())
            .and_then(|b| b.fail_apply.clone())
        {
            anyhow::bail!("{reason}");
        }

        debug!(unit = %unit.name, kind = %unit.kind(), inputs = inputs.len(), "sim apply");

        let outputs: Outputs = unit
            .produces
            .iter()
            .map(|key| (key.clone(), format!("sim:{}:{}#{:04}", unit.name, key, seq)))
            .collect();

        Ok(Applied {
            handle: ProviderHandle {
                unit: unit.name.clone(),
                id: format!("op-{seq:04}"),
            },
            outputs,
        })
    }

    async fn describe(&self, handle: &ProviderHandle) -> anyhow::Result<ConditionStatus> {
        let mut state = self.state.lock().expect("sim state poisoned");
        let polls = state
            .polls
            .entry(handle.unit.as_str().to_string())
            .and_modify(|p| *p += 1)
            .or_insert(1);
        let polls = *polls;
        let needed = state
            .behaviors
            .get(handle.unit.as_str())
            .map(|b| b.satisfied_after)
            .unwrap_or(1);

        if polls >= needed {
            Ok(ConditionStatus::Satisfied)
        } else {
            Ok(ConditionStatus::Pending {
                reason: format!("still converging ({polls}/{needed} checks)"),
            })
        }
    }
}
