//! The fleet client capability consumed by the rollout engine.

use std::future::Future;
use std::pin::Pin;

use crate::context::RunContext;
use crate::error::FleetResult;
use crate::types::{Instance, LoadBalancer};

/// Boxed future returned by every [`FleetClient`] operation.
pub type FleetFuture<'a, T> = Pin<Box<dyn Future<Output = FleetResult<T>> + Send + 'a>>;

/// Remote operations on a load balancer and its instances.
///
/// Implementations must not retry; recovery policy belongs to the caller.
/// Injected as `Arc<dyn FleetClient>` so the engine can be driven by an
/// in-memory fleet in tests.
pub trait FleetClient: Send + Sync {
    /// Create the load balancer `name`.
    ///
    /// Not guaranteed to be idempotent; callers only invoke it after
    /// [`get_instances`](Self::get_instances) reported `NotFound`.
    fn create_load_balancer<'a>(
        &'a self,
        ctx: &'a RunContext,
        name: &'a str,
    ) -> FleetFuture<'a, LoadBalancer>;

    /// List the instances behind `lb_name`. Fails with `NotFound` when the
    /// load balancer does not exist.
    fn get_instances<'a>(
        &'a self,
        ctx: &'a RunContext,
        lb_name: &'a str,
    ) -> FleetFuture<'a, Vec<Instance>>;

    /// Request one new instance running `version`.
    fn create_instance<'a>(
        &'a self,
        ctx: &'a RunContext,
        lb_name: &'a str,
        version: &'a str,
    ) -> FleetFuture<'a, Instance>;

    /// Request removal of instance `id`. Fails with `NotFound` if it is
    /// already gone.
    fn delete_instance<'a>(
        &'a self,
        ctx: &'a RunContext,
        lb_name: &'a str,
        id: &'a str,
    ) -> FleetFuture<'a, ()>;
}
