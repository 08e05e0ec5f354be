//! Deploy workflow — ties snapshot, scale, orchestration and rollback
//! together for one deployment run.
//!
//! ```text
//! snapshot ──► perform_scale ──► spawn_orchestration ──► Success
//!                  │ rollback needed        │ Error / Timeout / Unhealthy
//!                  ▼                        ▼
//!               rollback(original)      rollback(original)
//! ```

use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info};

use shipyard_fleet::{load_balancer_name, FleetClient, FleetError, RunContext};

use crate::error::DeployError;
use crate::orchestrate::{spawn_orchestration, Outcome, DEFAULT_POLL_INTERVAL};
use crate::rollback::rollback;
use crate::scale::perform_scale;
use crate::snapshot::{snapshot, Snapshot};

/// Default time budget of one rollout attempt.
pub const DEFAULT_ATTEMPT_TIMEOUT: Duration = Duration::from_secs(360);

/// Default time budget of a rollback, counted from when it starts.
pub const DEFAULT_ROLLBACK_TIMEOUT: Duration = Duration::from_secs(300);

/// What the caller asks to be deployed.
#[derive(Debug, Clone)]
pub struct DeploymentIntent {
    pub application: String,
    pub revision: String,
    /// Desired instance count. `None` keeps the current count.
    pub replicas: Option<u32>,
    /// Time budget of the rollout attempt.
    pub timeout: Duration,
}

impl DeploymentIntent {
    pub fn new(application: &str, revision: &str) -> Self {
        Self {
            application: application.to_string(),
            revision: revision.to_string(),
            replicas: None,
            timeout: DEFAULT_ATTEMPT_TIMEOUT,
        }
    }

    pub fn with_replicas(mut self, replicas: u32) -> Self {
        self.replicas = Some(replicas);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Engine tuning knobs.
#[derive(Debug, Clone)]
pub struct DeployOptions {
    pub poll_interval: Duration,
    /// Budget of a rollback. Not bounded by the run's own deadline, so a
    /// rollout that exhausted it can still be reverted.
    pub rollback_timeout: Duration,
}

impl Default for DeployOptions {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            rollback_timeout: DEFAULT_ROLLBACK_TIMEOUT,
        }
    }
}

/// Successful end of a deployment run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeployReport {
    /// The fleet now runs `replicas` instances of the revision.
    Deployed { load_balancer: String, replicas: u32 },
    /// The fleet already ran exactly what was asked for; nothing was changed.
    AlreadyDeployed { load_balancer: String, replicas: u32 },
    /// Zero replicas on an empty fleet; nothing to do.
    Skipped { load_balancer: String },
}

/// Deploy `intent` onto the fleet behind `client`.
///
/// `ctx` bounds the whole run. The rollout attempt runs on a child context
/// limited by `intent.timeout`. A rollback runs on a detached context with
/// its own `options.rollback_timeout`, so a rollout that was cancelled or ran
/// into the deadline is still reverted.
pub async fn deploy(
    ctx: &RunContext,
    client: Arc<dyn FleetClient>,
    intent: &DeploymentIntent,
    options: &DeployOptions,
) -> Result<DeployReport, DeployError> {
    let lb_name = load_balancer_name(&intent.application);
    let attempt = ctx.child(intent.timeout);
    let revision = intent.revision.as_str();

    let original = snapshot(&attempt, client.as_ref(), &lb_name)
        .await
        .map_err(DeployError::Snapshot)?;

    let replicas = match intent.replicas {
        Some(replicas) => replicas,
        None => current_replicas(original.len())?,
    };

    if original.is_empty() && replicas == 0 {
        info!(load_balancer = %lb_name, replicas, "replica count is zero and the fleet is empty, skipping");
        return Ok(DeployReport::Skipped {
            load_balancer: lb_name,
        });
    }

    if original.is_converged(revision, replicas) {
        info!(load_balancer = %lb_name, %revision, replicas, "revision already deployed, nothing to do");
        return Ok(DeployReport::AlreadyDeployed {
            load_balancer: lb_name,
            replicas,
        });
    }

    info!(
        application = %intent.application,
        load_balancer = %lb_name,
        %revision,
        replicas,
        current = original.len(),
        "starting rollout"
    );

    if let Err(e) = perform_scale(&attempt, client.as_ref(), &lb_name, revision, replicas).await {
        if !e.rollback_needed {
            return Err(DeployError::Scale(e.source));
        }
        error!(load_balancer = %lb_name, error = %e.source, "an error has occurred while deploying");
        revert(ctx, client.as_ref(), &original, options, &e.to_string()).await?;
        return Err(DeployError::RolledBack { source: e.source });
    }

    let handoff = spawn_orchestration(
        attempt,
        client.clone(),
        lb_name.clone(),
        intent.revision.clone(),
        replicas,
        options.poll_interval,
    );
    // A dropped sender means the loop task died without reporting.
    let outcome = handoff.await.unwrap_or(Outcome::Error);

    if outcome == Outcome::Success {
        info!(application = %intent.application, %revision, replicas, "successfully deployed application");
        return Ok(DeployReport::Deployed {
            load_balancer: lb_name,
            replicas,
        });
    }

    match outcome {
        Outcome::Timeout => error!(load_balancer = %lb_name, "timeout exceeded"),
        Outcome::Unhealthy => error!(load_balancer = %lb_name, "service unhealthy"),
        _ => error!(load_balancer = %lb_name, "an error has occurred while orchestrating"),
    }

    revert(ctx, client.as_ref(), &original, options, &format!("rollout {outcome}")).await?;
    Err(DeployError::Failed { outcome })
}

/// Roll back to `original`, surfacing a failure as `RollbackFailed`.
async fn revert(
    ctx: &RunContext,
    client: &dyn FleetClient,
    original: &Snapshot,
    options: &DeployOptions,
    reason: &str,
) -> Result<(), DeployError> {
    info!(
        snapshot = %serde_json::to_string(original).unwrap_or_default(),
        "rolling back"
    );

    let cleanup = ctx.detached(options.rollback_timeout);
    match rollback(&cleanup, client, original).await {
        Ok(_) => {
            info!(load_balancer = %original.load_balancer(), "rolling back succeeded");
            Ok(())
        }
        Err(source) => {
            error!(load_balancer = %original.load_balancer(), error = %source, "rolling back failed");
            Err(rollback_failed(reason, source))
        }
    }
}

/// The current instance count as a replica count.
fn current_replicas(len: usize) -> Result<u32, DeployError> {
    u32::try_from(len).map_err(|_| {
        DeployError::Snapshot(FleetError::Decode(format!(
            "{len} instances exceed the largest replica count"
        )))
    })
}

fn rollback_failed(reason: &str, source: FleetError) -> DeployError {
    DeployError::RollbackFailed {
        reason: reason.to_string(),
        source,
    }
}
