//! In-memory fleet used by the engine's tests.
//!
//! Behaves like a tiny backend: creates append instances, deletes remove
//! them. Reads can also be scripted so a test controls exactly what each
//! tick observes. Every call is recorded in order.

use std::collections::{HashSet, VecDeque};
use std::sync::Mutex;

use shipyard_fleet::*;

/// A recorded call against the fake fleet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    CreateLoadBalancer(String),
    GetInstances(String),
    CreateInstance(String, String),
    DeleteInstance(String, String),
}

/// Scripted result of one `get_instances` call.
#[derive(Debug, Clone)]
pub enum Read {
    Instances(Vec<Instance>),
    NotFound,
    Status(u16),
}

#[derive(Debug)]
struct FleetState {
    exists: bool,
    instances: Vec<Instance>,
    reads: VecDeque<Read>,
    calls: Vec<Call>,
    next_id: usize,
    new_status: InstanceStatus,
    /// Number of creates that succeed before every further create fails.
    creates_allowed: Option<usize>,
    failing_deletes: HashSet<String>,
    /// Ids whose delete answers 404, as if removed behind our back.
    vanished: HashSet<String>,
    fail_create_lb: bool,
    /// Refuse calls once the run context is done, like the HTTP client.
    honor_context: bool,
}

impl FleetState {
    fn refuses(&self, ctx: &RunContext) -> bool {
        self.honor_context && ctx.is_done()
    }
}

#[derive(Debug)]
pub struct FakeFleet {
    state: Mutex<FleetState>,
}

impl FakeFleet {
    /// A fleet whose load balancer exists and holds `instances`.
    pub fn with_instances(instances: Vec<Instance>) -> Self {
        Self {
            state: Mutex::new(FleetState {
                exists: true,
                instances,
                reads: VecDeque::new(),
                calls: Vec::new(),
                next_id: 100,
                new_status: InstanceStatus::Healthy,
                creates_allowed: None,
                failing_deletes: HashSet::new(),
                vanished: HashSet::new(),
                fail_create_lb: false,
                honor_context: false,
            }),
        }
    }

    /// A fleet whose load balancer does not exist yet.
    pub fn missing() -> Self {
        let fleet = Self::with_instances(Vec::new());
        fleet.state.lock().unwrap().exists = false;
        fleet
    }

    /// Queue scripted reads, consumed before the live state is consulted.
    pub fn script(self, reads: Vec<Read>) -> Self {
        self.state.lock().unwrap().reads.extend(reads);
        self
    }

    /// Status given to newly created instances.
    pub fn new_status(self, status: InstanceStatus) -> Self {
        self.state.lock().unwrap().new_status = status;
        self
    }

    /// Let `n` creates succeed, then fail every further one.
    pub fn creates_allowed(self, n: usize) -> Self {
        self.state.lock().unwrap().creates_allowed = Some(n);
        self
    }

    /// Make deleting `id` fail with an unknown backend error.
    pub fn failing_delete(self, id: &str) -> Self {
        self.state.lock().unwrap().failing_deletes.insert(id.to_string());
        self
    }

    /// Make deleting `id` answer "not found".
    pub fn vanished(self, id: &str) -> Self {
        self.state.lock().unwrap().vanished.insert(id.to_string());
        self
    }

    /// Fail every call with `Cancelled` once its run context is done.
    pub fn honor_context(self) -> Self {
        self.state.lock().unwrap().honor_context = true;
        self
    }

    pub fn failing_create_lb(self) -> Self {
        self.state.lock().unwrap().fail_create_lb = true;
        self
    }

    /// Change the status of every live instance running `version`.
    pub fn set_status(&self, version: &str, status: InstanceStatus) {
        let mut state = self.state.lock().unwrap();
        for instance in state.instances.iter_mut().filter(|i| i.version == version) {
            instance.status = status;
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn instances(&self) -> Vec<Instance> {
        self.state.lock().unwrap().instances.clone()
    }

    pub fn deletes(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::DeleteInstance(_, id) => Some(id),
                _ => None,
            })
            .collect()
    }

    pub fn creates(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::CreateInstance(_, version) => Some(version),
                _ => None,
            })
            .collect()
    }

    /// Calls that change the fleet.
    pub fn mutations(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| !matches!(c, Call::GetInstances(_)))
            .count()
    }
}

impl FleetClient for FakeFleet {
    fn create_load_balancer<'a>(
        &'a self,
        ctx: &'a RunContext,
        name: &'a str,
    ) -> FleetFuture<'a, LoadBalancer> {
        Box::pin(async move {
            let mut state = self.state.lock().unwrap();
            state.calls.push(Call::CreateLoadBalancer(name.to_string()));
            if state.refuses(ctx) {
                return Err(FleetError::Cancelled);
            }
            if state.fail_create_lb {
                return Err(FleetError::Forbidden);
            }
            state.exists = true;
            Ok(LoadBalancer {
                name: name.to_string(),
            })
        })
    }

    fn get_instances<'a>(
        &'a self,
        ctx: &'a RunContext,
        lb_name: &'a str,
    ) -> FleetFuture<'a, Vec<Instance>> {
        Box::pin(async move {
            let mut state = self.state.lock().unwrap();
            state.calls.push(Call::GetInstances(lb_name.to_string()));
            if state.refuses(ctx) {
                return Err(FleetError::Cancelled);
            }
            match state.reads.pop_front() {
                Some(Read::Instances(instances)) => Ok(instances),
                Some(Read::NotFound) => Err(FleetError::NotFound),
                Some(Read::Status(code)) => Err(FleetError::Unknown(code)),
                None if !state.exists => Err(FleetError::NotFound),
                None => Ok(state.instances.clone()),
            }
        })
    }

    fn create_instance<'a>(
        &'a self,
        ctx: &'a RunContext,
        lb_name: &'a str,
        version: &'a str,
    ) -> FleetFuture<'a, Instance> {
        Box::pin(async move {
            let mut state = self.state.lock().unwrap();
            state
                .calls
                .push(Call::CreateInstance(lb_name.to_string(), version.to_string()));
            if state.refuses(ctx) {
                return Err(FleetError::Cancelled);
            }
            if let Some(left) = state.creates_allowed {
                if left == 0 {
                    return Err(FleetError::Unknown(503));
                }
                state.creates_allowed = Some(left - 1);
            }
            state.next_id += 1;
            let instance = Instance::new(
                &format!("ins_{}", state.next_id),
                state.new_status,
                version,
            );
            state.instances.push(instance.clone());
            Ok(instance)
        })
    }

    fn delete_instance<'a>(
        &'a self,
        ctx: &'a RunContext,
        lb_name: &'a str,
        id: &'a str,
    ) -> FleetFuture<'a, ()> {
        Box::pin(async move {
            let mut state = self.state.lock().unwrap();
            state
                .calls
                .push(Call::DeleteInstance(lb_name.to_string(), id.to_string()));
            if state.refuses(ctx) {
                return Err(FleetError::Cancelled);
            }
            if state.failing_deletes.contains(id) {
                return Err(FleetError::Unknown(500));
            }
            if state.vanished.contains(id) {
                return Err(FleetError::NotFound);
            }
            // Scripted reads may name instances the live state never held.
            state.instances.retain(|i| i.id != id);
            Ok(())
        })
    }
}

pub fn healthy(id: &str, version: &str) -> Instance {
    Instance::new(id, InstanceStatus::Healthy, version)
}

pub fn provisioning(id: &str, version: &str) -> Instance {
    Instance::new(id, InstanceStatus::Provisioning, version)
}

pub fn unhealthy(id: &str, version: &str) -> Instance {
    Instance::new(id, InstanceStatus::Unhealthy, version)
}
