//! Shipyard rolling updates — replace one revision of an application with
//! another without a full outage.
//!
//! A deployment run captures a snapshot of the load balancer, requests the
//! new instances, then polls the fleet and retires one old instance for
//! every new instance observed healthy. Any failure restores the fleet to
//! the captured snapshot.
//!
//! # Components
//!
//! - **`snapshot`** — Point-in-time capture, auto-provisions the load balancer
//! - **`scale`** — Bulk create (or scale-to-zero) at the start of a run
//! - **`orchestrate`** — Polling state machine, one outcome per run
//! - **`rollback`** — Restore count and revision of a snapshot
//! - **`deploy`** — The whole workflow

pub mod deploy;
pub mod error;
pub mod orchestrate;
pub mod rollback;
pub mod scale;
pub mod snapshot;

#[cfg(test)]
mod testing;

pub use deploy::{deploy, DeployOptions, DeployReport, DeploymentIntent};
pub use error::{DeployError, ScaleError};
pub use orchestrate::{orchestrate, spawn_orchestration, Outcome};
pub use rollback::{rollback, RollbackReport};
pub use scale::perform_scale;
pub use snapshot::{snapshot, Snapshot};
