//! Readiness waiting: per-policy convergence checks.

use std::sync::Arc;
use std::time::{Duration, Instant};

use groundwork_model::ReadinessPolicy;
use tokio::sync::watch;
use tokio::time::sleep;
use tracing::trace;

use crate::{ConditionStatus, Provider, ProviderHandle, UnitError};

/// Block until the applied unit satisfies its readiness policy.
///
/// - `Synchronous` and `FireAndForget` return immediately: for the former
///   the apply call itself already confirmed creation, for the latter no
///   confirmation is wanted.
/// - `WaitForCondition` polls `describe` until satisfied or the budget
///   elapses. The first check always happens, so a zero timeout fails
///   exactly once the condition reports unsatisfied.
///
/// A cancellation signal observed between polls fails the wait with
/// [`UnitError::Cancelled`].
pub(crate) async fn wait_ready(
    provider: &Arc<dyn Provider>,
    handle: &ProviderHandle,
    policy: ReadinessPolicy,
    poll_floor: Duration,
    shutdown: &mut watch::Receiver<bool>,
) -> Result<(), UnitError> {
    let (Some(budget), Some(declared_interval)) = (policy.timeout(), policy.poll_interval())
    else {
        return Ok(());
    };
    let interval = declared_interval.max(poll_floor);
    let started = Instant::now();
    // Once the sender side is gone no further signal can arrive; stop
    // selecting on the channel or `changed` resolves instantly every
    // iteration and the sleep arm never runs.
    let mut watch_alive = true;

    loop {
        if *shutdown.borrow() {
            return Err(UnitError::Cancelled);
        }

        let status = provider
            .describe(handle)
            .await
            .map_err(UnitError::Apply)?;
        match status {
            ConditionStatus::Satisfied => return Ok(()),
            ConditionStatus::Pending { reason } => {
                let elapsed = started.elapsed();
                trace!(unit = %handle.unit, ?elapsed, %reason, "condition pending");
                if elapsed >= budget {
                    return Err(UnitError::ReadinessTimeout {
                        budget_secs: budget.as_secs(),
                        last: reason,
                    });
                }
                let remaining = budget - elapsed;
                tokio::select! {
                    changed = shutdown.changed(), if watch_alive => {
                        if changed.is_err() {
                            watch_alive = false;
                        }
                    }
                    _ = sleep(interval.min(remaining)) => {}
                }
            }
        }
    }
}
