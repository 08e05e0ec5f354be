//! shipyard-fleet — access to the remote fleet-management backend.
//!
//! The backend owns load balancers and the instances behind them. This
//! crate exposes the four operations the rollout engine needs through the
//! [`FleetClient`] trait, plus an HTTP implementation of that trait.
//!
//! # Architecture
//!
//! ```text
//! FleetClient (trait)
//!   ├── create_load_balancer  PUT    /loadbalancers/{name}
//!   ├── get_instances         GET    /loadbalancers/{name}/instances
//!   ├── create_instance       POST   /loadbalancers/{name}/instances
//!   └── delete_instance       DELETE /loadbalancers/{name}/instances/{id}
//! ```
//!
//! Every call takes a [`RunContext`], which carries the deadline and the
//! cancel signal of the run. The client never retries: any failure is
//! returned to the caller as a [`FleetError`].

pub mod client;
pub mod context;
pub mod error;
pub mod http;
pub mod types;

pub use client::{FleetClient, FleetFuture};
pub use context::RunContext;
pub use error::{FleetError, FleetResult};
pub use http::HttpFleetClient;
pub use types::*;
