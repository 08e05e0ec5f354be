//! Scale/rollout initiator — the immediate bulk action of a deployment.
//!
//! Only issues requests; it never waits for health. Convergence is the
//! orchestration loop's job.

use tracing::{debug, info, warn};

use shipyard_fleet::{FleetClient, RunContext};

use crate::error::ScaleError;
use crate::snapshot::snapshot;

/// Scale `lb_name` towards `replicas` instances of `revision`.
///
/// With zero replicas every current instance is deleted on a best-effort
/// basis. Otherwise `replicas` new instances are requested one at a time;
/// the first failure stops and asks for a rollback, since the fleet is then
/// partially scaled.
pub async fn perform_scale(
    ctx: &RunContext,
    client: &dyn FleetClient,
    lb_name: &str,
    revision: &str,
    replicas: u32,
) -> Result<(), ScaleError> {
    if replicas == 0 {
        let current = snapshot(ctx, client, lb_name)
            .await
            .map_err(ScaleError::terminal)?;

        for instance in current.instances() {
            if let Err(e) = client.delete_instance(ctx, lb_name, &instance.id).await {
                warn!(
                    load_balancer = %lb_name,
                    instance = %instance.id,
                    error = %e,
                    "could not remove instance, skipping"
                );
            }
        }
        info!(load_balancer = %lb_name, removed = current.len(), "scaled down to zero");
        return Ok(());
    }

    for n in 1..=replicas {
        let created = client
            .create_instance(ctx, lb_name, revision)
            .await
            .map_err(ScaleError::fatal)?;
        debug!(
            load_balancer = %lb_name,
            instance = %created.id,
            %revision,
            n,
            replicas,
            "requested instance"
        );
    }
    info!(load_balancer = %lb_name, %revision, replicas, "requested new instances");
    Ok(())
}
