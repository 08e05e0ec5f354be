//! Error types for the rollout engine.

use thiserror::Error;

use shipyard_fleet::FleetError;

use crate::orchestrate::Outcome;

/// Failure of the bulk scale step.
#[derive(Debug, Error)]
#[error("could not scale load balancer: {source}")]
pub struct ScaleError {
    /// The fleet was left partially scaled and must be reverted.
    pub rollback_needed: bool,
    #[source]
    pub source: FleetError,
}

impl ScaleError {
    pub(crate) fn fatal(source: FleetError) -> Self {
        Self {
            rollback_needed: true,
            source,
        }
    }

    pub(crate) fn terminal(source: FleetError) -> Self {
        Self {
            rollback_needed: false,
            source,
        }
    }
}

/// Terminal errors of a deployment run.
#[derive(Debug, Error)]
pub enum DeployError {
    /// The pre-deployment state could not be read. Nothing was changed.
    #[error("could not capture fleet state: {0}")]
    Snapshot(#[source] FleetError),

    /// Scaling failed in a way that needs no revert.
    #[error("scaling failed: {0}")]
    Scale(#[source] FleetError),

    /// Scaling failed part way; the fleet was restored to its prior state.
    #[error("scaling failed and the fleet was rolled back: {source}")]
    RolledBack {
        #[source]
        source: FleetError,
    },

    /// The rollout did not converge; the fleet was restored to its prior state.
    #[error("deployment has failed (outcome: {outcome})")]
    Failed { outcome: Outcome },

    /// The deployment failed and the revert failed too. The fleet is in an
    /// unknown mixed state and needs operator attention.
    #[error("deployment failed ({reason}) and could not be rolled back: {source}")]
    RollbackFailed {
        reason: String,
        #[source]
        source: FleetError,
    },
}

impl DeployError {
    /// Whether the fleet may have been left in a mixed state.
    pub fn needs_operator(&self) -> bool {
        matches!(self, DeployError::RollbackFailed { .. })
    }
}
