//! Orchestration loop — drives the one-for-one replacement of old
//! instances by healthy new ones.
//!
//! Each tick takes a fresh snapshot and splits it into instances running
//! the target revision and everything else. For every target instance that
//! is observed healthy, exactly one old instance is retired, oldest first
//! in snapshot order. A single unhealthy target instance aborts the rollout.
//!
//! The loop always terminates with exactly one [`Outcome`].

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::oneshot;
use tracing::{debug, error, info, warn};

use shipyard_fleet::{FleetClient, Instance, InstanceStatus, RunContext};

use crate::snapshot::{snapshot, Snapshot};

/// Default time between two polls of the fleet.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Terminal result of an orchestration run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// The fleet converged on the target revision.
    Success,
    /// A remote call failed.
    Error,
    /// The deadline passed, or the run was cancelled, before convergence.
    Timeout,
    /// A target-revision instance reported unhealthy.
    Unhealthy,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Outcome::Success => "success",
            Outcome::Error => "error",
            Outcome::Timeout => "timeout",
            Outcome::Unhealthy => "unhealthy",
        };
        f.write_str(s)
    }
}

/// Poll `lb_name` until it holds `replicas` healthy instances of
/// `revision`, retiring old instances as replacements become healthy.
pub async fn orchestrate(
    ctx: &RunContext,
    client: &dyn FleetClient,
    lb_name: &str,
    revision: &str,
    replicas: u32,
    poll_interval: Duration,
) -> Outcome {
    let mut ticks = 0u64;
    loop {
        if ctx.is_done() {
            warn!(load_balancer = %lb_name, ticks, "deadline exceeded before the rollout converged");
            return Outcome::Timeout;
        }
        ticks += 1;

        if let Some(outcome) = tick(ctx, client, lb_name, revision, replicas).await {
            debug!(load_balancer = %lb_name, ticks, %outcome, "orchestration finished");
            return outcome;
        }

        ctx.sleep(poll_interval).await;
    }
}

/// Run [`orchestrate`] on its own task. The outcome is delivered once on
/// the returned receiver.
pub fn spawn_orchestration(
    ctx: RunContext,
    client: Arc<dyn FleetClient>,
    lb_name: String,
    revision: String,
    replicas: u32,
    poll_interval: Duration,
) -> oneshot::Receiver<Outcome> {
    let (tx, rx) = oneshot::channel();
    tokio::spawn(async move {
        let outcome = orchestrate(
            &ctx,
            client.as_ref(),
            &lb_name,
            &revision,
            replicas,
            poll_interval,
        )
        .await;
        // The caller may have gone away; nothing left to report to.
        let _ = tx.send(outcome);
    });
    rx
}

/// One polling step. `None` means "not finished, poll again".
async fn tick(
    ctx: &RunContext,
    client: &dyn FleetClient,
    lb_name: &str,
    revision: &str,
    replicas: u32,
) -> Option<Outcome> {
    if replicas == 0 {
        return Some(drain(ctx, client, lb_name).await);
    }

    let current = match snapshot(ctx, client, lb_name).await {
        Ok(ss) => ss,
        Err(e) => {
            error!(load_balancer = %lb_name, error = %e, "could not poll fleet state");
            return Some(Outcome::Error);
        }
    };

    let (target, mut other) = partition(&current, revision);

    if other.is_empty() && target.len() == replicas as usize {
        info!(load_balancer = %lb_name, %revision, replicas, "fleet converged");
        return Some(Outcome::Success);
    }

    for instance in &target {
        match instance.status {
            InstanceStatus::Provisioning => continue,
            InstanceStatus::Unhealthy => {
                warn!(load_balancer = %lb_name, instance = %instance.id, %revision, "new instance is unhealthy");
                return Some(Outcome::Unhealthy);
            }
            InstanceStatus::Healthy => {
                let Some(old) = other.pop_front() else {
                    info!(load_balancer = %lb_name, %revision, "no old instances left");
                    return Some(Outcome::Success);
                };

                if let Err(e) = client.delete_instance(ctx, lb_name, old).await {
                    error!(load_balancer = %lb_name, instance = %old, error = %e, "could not retire old instance");
                    return Some(Outcome::Error);
                }
                info!(
                    load_balancer = %lb_name,
                    retired = %old,
                    replacement = %instance.id,
                    "retired old instance"
                );
            }
        }
    }

    debug!(
        load_balancer = %lb_name,
        target = target.len(),
        old_remaining = other.len(),
        replicas,
        "rollout in progress"
    );
    None
}

/// Delete every instance; any failure ends the run with `Error`.
async fn drain(ctx: &RunContext, client: &dyn FleetClient, lb_name: &str) -> Outcome {
    let current = match snapshot(ctx, client, lb_name).await {
        Ok(ss) => ss,
        Err(e) => {
            error!(load_balancer = %lb_name, error = %e, "could not poll fleet state");
            return Outcome::Error;
        }
    };

    for instance in current.instances() {
        if let Err(e) = client.delete_instance(ctx, lb_name, &instance.id).await {
            error!(load_balancer = %lb_name, instance = %instance.id, error = %e, "could not remove instance");
            return Outcome::Error;
        }
    }
    Outcome::Success
}

/// Split a snapshot into target-revision instances and a FIFO queue of the
/// ids of all other instances, both in snapshot order.
fn partition<'a>(ss: &'a Snapshot, revision: &str) -> (Vec<&'a Instance>, VecDeque<&'a str>) {
    let mut target = Vec::new();
    let mut other = VecDeque::new();
    for instance in ss.instances() {
        if instance.version == revision {
            target.push(instance);
        } else {
            other.push_back(instance.id.as_str());
        }
    }
    (target, other)
}
