//! Snapshot capture — the only way fleet state enters the engine.

use serde::Serialize;
use tracing::{error, info};

use shipyard_fleet::{FleetClient, FleetError, FleetResult, Instance, RunContext};

/// Immutable point-in-time capture of a load balancer's instances.
///
/// Instance order is whatever the backend returned; compare by id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Snapshot {
    load_balancer: String,
    instances: Vec<Instance>,
}

impl Snapshot {
    pub fn new(load_balancer: &str, instances: Vec<Instance>) -> Self {
        Self {
            load_balancer: load_balancer.to_string(),
            instances,
        }
    }

    pub fn load_balancer(&self) -> &str {
        &self.load_balancer
    }

    pub fn instances(&self) -> &[Instance] {
        &self.instances
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    /// Whether an instance with this id was captured.
    pub fn contains(&self, id: &str) -> bool {
        self.instances.iter().any(|i| i.id == id)
    }

    /// Exactly `replicas` instances, all running `revision`.
    pub fn is_converged(&self, revision: &str, replicas: u32) -> bool {
        self.instances.len() == replicas as usize
            && self.instances.iter().all(|i| i.version == revision)
    }
}

/// Read the instances of `lb_name`, creating the load balancer if the
/// backend does not know it yet (an empty snapshot is returned then).
pub async fn snapshot(
    ctx: &RunContext,
    client: &dyn FleetClient,
    lb_name: &str,
) -> FleetResult<Snapshot> {
    match client.get_instances(ctx, lb_name).await {
        Ok(instances) => Ok(Snapshot::new(lb_name, instances)),
        Err(FleetError::NotFound) => {
            info!(load_balancer = %lb_name, "load balancer not found, creating it");
            if let Err(e) = client.create_load_balancer(ctx, lb_name).await {
                error!(load_balancer = %lb_name, error = %e, "could not create load balancer");
                return Err(e);
            }
            info!(load_balancer = %lb_name, "load balancer created");
            Ok(Snapshot::new(lb_name, Vec::new()))
        }
        Err(e) => {
            error!(load_balancer = %lb_name, error = %e, "could not get load balancer instances");
            Err(e)
        }
    }
}
