//! The topological apply scheduler.
//!
//! A single coordinating loop drives the graph. Eligible units (every
//! dependency Ready) are admitted in ascending lexical name order and run
//! as independent tokio tasks; tasks report state transitions and terminal
//! outcomes over a channel, and only this loop mutates records, the unmet
//! dependency counts and the published-output map. The loop ends when every
//! unit is Ready, Failed or Skipped.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use groundwork_graph::DeploymentGraph;
use groundwork_model::{Outputs, ReadinessPolicy, ResourceUnit, RunId, UnitName};
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use crate::{
    waiter, ApplyRecord, ApplyState, EngineConfig, Provider, ResolvedInputs, RunReport, UnitError,
};

/// Events sent from unit tasks back to the scheduler loop.
enum TaskEvent {
    /// The unit's apply was accepted and it entered its readiness wait.
    Waiting(UnitName),
    /// The unit finished, successfully or not.
    Done(UnitName, Result<Outputs, UnitError>),
}

/// Drives one deployment graph to completion against a provider.
pub struct Scheduler {
    provider: Arc<dyn Provider>,
    config: EngineConfig,
}

impl Scheduler {
    pub fn new(provider: Arc<dyn Provider>, config: EngineConfig) -> Self {
        Self { provider, config }
    }

    /// Run the graph until every unit is terminal.
    ///
    /// A unit's apply call is never issued before every dependency's
    /// record is Ready. On cancellation, pending units are skipped and
    /// in-flight units fail with [`UnitError::Cancelled`].
    pub async fn run(
        &self,
        graph: &DeploymentGraph,
        mut shutdown: watch::Receiver<bool>,
    ) -> RunReport {
        let run_id = RunId::new();
        let started_at = Utc::now();
        info!(
            run_id = %run_id,
            units = graph.len(),
            max_parallel = ?self.config.max_parallel,
            "starting apply run"
        );

        let mut records: BTreeMap<UnitName, ApplyRecord> = graph
            .names()
            .map(|n| (n.clone(), ApplyRecord::new()))
            .collect();
        let mut unmet: BTreeMap<UnitName, usize> = graph
            .names()
            .map(|n| (n.clone(), graph.dependencies_of(n).count()))
            .collect();
        let mut published = Outputs::new();
        let (events_tx, mut events_rx) = mpsc::unbounded_channel::<TaskEvent>();
        let mut in_flight: usize = 0;
        let mut cancelled = false;
        let mut watch_alive = true;

        loop {
            if !cancelled {
                loop {
                    let capacity_left = self
                        .config
                        .max_parallel
                        .map_or(usize::MAX, |m| m.saturating_sub(in_flight));
                    if capacity_left == 0 {
                        break;
                    }
                    // BTreeMap iteration gives the lexical tie-break.
                    let next = records
                        .iter()
                        .find(|(name, rec)| {
                            rec.state == ApplyState::Pending && unmet[*name] == 0
                        })
                        .map(|(name, _)| name.clone());
                    let Some(name) = next else { break };
                    let unit = graph.unit(&name).cloned().expect("unit is in the graph");

                    match resolve_inputs(graph, &unit, &published) {
                        Ok(inputs) => {
                            records
                                .get_mut(&name)
                                .expect("record exists")
                                .start();
                            debug!(
                                run_id = %run_id,
                                unit = %name,
                                kind = %unit.kind(),
                                spec_hash = %unit.spec_hash(),
                                "applying unit"
                            );
                            in_flight += 1;
                            let provider = Arc::clone(&self.provider);
                            let tx = events_tx.clone();
                            let mut task_shutdown = shutdown.clone();
                            let poll_floor = self.config.poll_floor;
                            tokio::spawn(async move {
                                let result = run_unit(
                                    provider,
                                    &unit,
                                    inputs,
                                    poll_floor,
                                    &tx,
                                    &mut task_shutdown,
                                )
                                .await;
                                let _ = tx.send(TaskEvent::Done(name, result));
                            });
                        }
                        Err(err) => {
                            let detail = err.to_string();
                            warn!(unit = %name, error = %detail, "unit failed before apply");
                            records
                                .get_mut(&name)
                                .expect("record exists")
                                .failed(detail);
                            skip_dependents(graph, &mut records, &name);
                        }
                    }
                }
            }

            if records.values().all(|r| r.state.is_terminal()) {
                break;
            }

            if in_flight == 0 {
                // Unreachable on a validated graph: no task running, no
                // unit admissible, yet some unit is non-terminal.
                warn!(run_id = %run_id, "scheduler has no runnable units; skipping remainder");
                for rec in records.values_mut() {
                    if !rec.state.is_terminal() {
                        rec.skipped("no runnable dependency path".to_string());
                    }
                }
                break;
            }

            tokio::select! {
                changed = shutdown.changed(), if watch_alive && !cancelled => {
                    match changed {
                        Ok(()) if *shutdown.borrow() => {
                            cancelled = true;
                            info!(run_id = %run_id, "cancellation requested; skipping pending units");
                            for rec in records.values_mut() {
                                if rec.state == ApplyState::Pending {
                                    rec.skipped("run cancelled before start".to_string());
                                }
                            }
                        }
                        Ok(()) => {}
                        Err(_) => watch_alive = false,
                    }
                }
                event = events_rx.recv() => {
                    match event.expect("scheduler holds a sender") {
                        TaskEvent::Waiting(name) => {
                            if let Some(rec) = records.get_mut(&name) {
                                rec.waiting();
                            }
                        }
                        TaskEvent::Done(name, result) => {
                            in_flight -= 1;
                            match result {
                                Ok(outputs) => {
                                    published.extend(
                                        outputs.iter().map(|(k, v)| (k.clone(), v.clone())),
                                    );
                                    records
                                        .get_mut(&name)
                                        .expect("record exists")
                                        .ready(outputs);
                                    info!(run_id = %run_id, unit = %name, "unit ready");
                                    for dependent in graph.dependents_of(&name) {
                                        if let Some(count) = unmet.get_mut(dependent) {
                                            *count = count.saturating_sub(1);
                                        }
                                    }
                                }
                                Err(err) => {
                                    let detail = err.to_string();
                                    warn!(run_id = %run_id, unit = %name, error = %detail, "unit failed");
                                    records
                                        .get_mut(&name)
                                        .expect("record exists")
                                        .failed(detail);
                                    skip_dependents(graph, &mut records, &name);
                                }
                            }
                        }
                    }
                }
            }
        }

        let report = RunReport::assemble(run_id, started_at, Utc::now(), cancelled, graph, records);
        let (ready, failed, skipped) = report.counts();
        info!(
            run_id = %run_id,
            result = %report.result(),
            ready, failed, skipped,
            "apply run finished"
        );
        report
    }
}

/// Mark every transitive dependent of `origin` that has not started as
/// Skipped, with a reason naming the originating failure.
fn skip_dependents(
    graph: &DeploymentGraph,
    records: &mut BTreeMap<UnitName, ApplyRecord>,
    origin: &UnitName,
) {
    let cause = records
        .get(origin)
        .and_then(|r| r.detail.clone())
        .unwrap_or_else(|| "failed".to_string());
    for dependent in graph.transitive_dependents(origin) {
        if let Some(rec) = records.get_mut(&dependent) {
            if rec.state == ApplyState::Pending {
                rec.skipped(format!("upstream unit '{origin}' failed: {cause}"));
            }
        }
    }
}

/// Resolve the unit's consumed output keys against what Ready units have
/// published.
fn resolve_inputs(
    graph: &DeploymentGraph,
    unit: &ResourceUnit,
    published: &Outputs,
) -> Result<ResolvedInputs, UnitError> {
    let mut inputs = ResolvedInputs::new();
    for key in unit.consumes() {
        match published.get(&key) {
            Some(value) => {
                inputs.insert(key, value.clone());
            }
            None => {
                let producer = graph
                    .producer_of(&key)
                    .cloned()
                    .unwrap_or_else(|| unit.name.clone());
                return Err(UnitError::MissingInput { key, producer });
            }
        }
    }
    Ok(inputs)
}

/// One unit's lifecycle: apply, verify declared outputs, then wait per
/// the unit's readiness policy. Runs inside its own task and owns nothing
/// but its own outcome.
async fn run_unit(
    provider: Arc<dyn Provider>,
    unit: &ResourceUnit,
    inputs: ResolvedInputs,
    poll_floor: Duration,
    tx: &mpsc::UnboundedSender<TaskEvent>,
    shutdown: &mut watch::Receiver<bool>,
) -> Result<Outputs, UnitError> {
    if *shutdown.borrow() {
        return Err(UnitError::Cancelled);
    }

    let applied = tokio::select! {
        _ = wait_cancelled(shutdown) => return Err(UnitError::Cancelled),
        result = provider.apply(unit, &inputs) => result.map_err(UnitError::Apply)?,
    };

    for key in &unit.produces {
        if !applied.outputs.contains_key(key) {
            return Err(UnitError::Apply(anyhow::anyhow!(
                "provider did not publish declared output '{key}'"
            )));
        }
    }

    match unit.readiness {
        ReadinessPolicy::Synchronous | ReadinessPolicy::FireAndForget => Ok(applied.outputs),
        ReadinessPolicy::WaitForCondition { .. } => {
            let _ = tx.send(TaskEvent::Waiting(unit.name.clone()));
            waiter::wait_ready(&provider, &applied.handle, unit.readiness, poll_floor, shutdown)
                .await?;
            Ok(applied.outputs)
        }
    }
}

/// Resolves once the shutdown signal reads true; never resolves otherwise.
async fn wait_cancelled(rx: &mut watch::Receiver<bool>) {
    loop {
        if *rx.borrow() {
            return;
        }
        if rx.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}
