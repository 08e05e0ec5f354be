//! Domain types exchanged with the fleet backend.
//!
//! Field names match the backend's JSON representation.

use serde::{Deserialize, Serialize};

/// Backend-assigned identifier of an instance.
pub type InstanceId = String;

/// Lifecycle status reported by the backend for an instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InstanceStatus {
    Provisioning,
    Healthy,
    Unhealthy,
}

/// A compute unit behind a load balancer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instance {
    pub id: InstanceId,
    pub status: InstanceStatus,
    /// Application revision this instance runs.
    pub version: String,
}

impl Instance {
    /// Convenience constructor, mostly used by tests and fakes.
    pub fn new(id: &str, status: InstanceStatus, version: &str) -> Self {
        Self {
            id: id.to_string(),
            status,
            version: version.to_string(),
        }
    }
}

/// A named routing group fronting a set of instances.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LoadBalancer {
    #[serde(default)]
    pub name: String,
}

/// Body of an instance creation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateInstanceParams {
    pub version: String,
}

/// Derive the load balancer name fronting an application.
pub fn load_balancer_name(application: &str) -> String {
    format!("{application}-lb")
}
