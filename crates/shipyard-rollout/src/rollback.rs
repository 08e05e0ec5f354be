//! Rollback reconciler — restore a fleet to a captured snapshot.
//!
//! Restores count and revision composition, not identifiers: the backend
//! assigns ids, so missing originals are replaced by fresh instances
//! running the original revision.

use tracing::{debug, info};

use shipyard_fleet::{FleetClient, FleetResult, RunContext};

use crate::snapshot::{snapshot, Snapshot};

/// What a rollback changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RollbackReport {
    pub created: usize,
    pub removed: usize,
}

/// Reconcile the load balancer of `original` back to its composition.
///
/// Creates run before deletes so capacity never dips below the current
/// count. A leftover that is already gone counts as removed; any other
/// failing call aborts the rollback.
pub async fn rollback(
    ctx: &RunContext,
    client: &dyn FleetClient,
    original: &Snapshot,
) -> FleetResult<RollbackReport> {
    let lb_name = original.load_balancer();
    let current = snapshot(ctx, client, lb_name).await?;

    let mut to_create = original.len();
    let mut to_remove = Vec::new();
    for instance in current.instances() {
        if !original.is_empty() && original.contains(&instance.id) {
            to_create = to_create.saturating_sub(1);
        } else {
            to_remove.push(instance.id.as_str());
        }
    }

    let mut report = RollbackReport::default();

    // Original instances predate the rollout and share one revision.
    if let Some(first) = original.instances().first() {
        for _ in 0..to_create {
            let created = client.create_instance(ctx, lb_name, &first.version).await?;
            debug!(load_balancer = %lb_name, instance = %created.id, revision = %first.version, "restored instance");
            report.created += 1;
        }
    }

    for id in to_remove {
        match client.delete_instance(ctx, lb_name, id).await {
            Ok(()) => debug!(load_balancer = %lb_name, instance = %id, "removed leftover instance"),
            Err(e) if e.is_not_found() => {
                debug!(load_balancer = %lb_name, instance = %id, "leftover instance already gone")
            }
            Err(e) => return Err(e),
        }
        report.removed += 1;
    }

    info!(
        load_balancer = %lb_name,
        created = report.created,
        removed = report.removed,
        "fleet restored to snapshot"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use shipyard_fleet::FleetError;

    use super::*;
    use crate::testing::*;

    fn ctx() -> RunContext {
        RunContext::with_timeout(Duration::from_secs(10))
    }

    #[tokio::test]
    async fn restores_count_and_revision() {
        let original = Snapshot::new("app-lb", vec![healthy("A", "1"), healthy("B", "1")]);
        let fleet = FakeFleet::with_instances(vec![
            healthy("A", "1"),
            provisioning("C", "2"),
            healthy("D", "2"),
        ]);

        let report = rollback(&ctx(), &fleet, &original).await.unwrap();

        assert_eq!(report, RollbackReport { created: 1, removed: 2 });
        assert_eq!(fleet.creates(), ["1"]);
        assert_eq!(fleet.deletes(), ["C", "D"]);

        let remaining = fleet.instances();
        assert_eq!(remaining.len(), 2);
        assert!(remaining.iter().all(|i| i.version == "1"));
    }

    #[tokio::test]
    async fn leftover_already_gone_counts_as_removed() {
        let original = Snapshot::new("app-lb", vec![healthy("A", "1")]);
        let fleet = FakeFleet::with_instances(vec![healthy("A", "1"), healthy("C", "2")])
            .vanished("C");

        let report = rollback(&ctx(), &fleet, &original).await.unwrap();

        assert_eq!(report, RollbackReport { created: 0, removed: 1 });
        assert_eq!(fleet.deletes(), ["C"]);
    }

    #[tokio::test]
    async fn creates_run_before_deletes() {
        let original = Snapshot::new("app-lb", vec![healthy("A", "1")]);
        let fleet = FakeFleet::with_instances(vec![healthy("X", "2")]);

        rollback(&ctx(), &fleet, &original).await.unwrap();

        let calls = fleet.calls();
        let create = calls
            .iter()
            .position(|c| matches!(c, Call::CreateInstance(..)))
            .unwrap();
        let delete = calls
            .iter()
            .position(|c| matches!(c, Call::DeleteInstance(..)))
            .unwrap();
        assert!(create < delete);
    }

    #[tokio::test]
    async fn empty_original_drains_the_fleet() {
        let original = Snapshot::new("app-lb", vec![]);
        let fleet = FakeFleet::with_instances(vec![healthy("C", "2"), healthy("D", "2")]);

        let report = rollback(&ctx(), &fleet, &original).await.unwrap();

        assert_eq!(report, RollbackReport { created: 0, removed: 2 });
        assert!(fleet.creates().is_empty());
        assert!(fleet.instances().is_empty());
    }

    #[tokio::test]
    async fn untouched_fleet_needs_no_calls() {
        let original = Snapshot::new("app-lb", vec![healthy("A", "1"), healthy("B", "1")]);
        let fleet = FakeFleet::with_instances(vec![healthy("B", "1"), healthy("A", "1")]);

        let report = rollback(&ctx(), &fleet, &original).await.unwrap();

        assert_eq!(report, RollbackReport::default());
        assert_eq!(fleet.mutations(), 0);
    }

    #[tokio::test]
    async fn all_originals_gone_are_recreated() {
        let original = Snapshot::new("app-lb", vec![healthy("A", "1"), healthy("B", "1")]);
        let fleet = FakeFleet::with_instances(vec![]);

        let report = rollback(&ctx(), &fleet, &original).await.unwrap();

        assert_eq!(report.created, 2);
        assert_eq!(fleet.creates(), ["1", "1"]);
    }

    #[tokio::test]
    async fn create_failure_aborts_before_deletes() {
        let original = Snapshot::new("app-lb", vec![healthy("A", "1")]);
        let fleet = FakeFleet::with_instances(vec![healthy("X", "2")]).creates_allowed(0);

        let err = rollback(&ctx(), &fleet, &original).await.unwrap_err();

        assert!(matches!(err, FleetError::Unknown(503)));
        assert!(fleet.deletes().is_empty());
    }

    #[tokio::test]
    async fn delete_failure_aborts() {
        let original = Snapshot::new("app-lb", vec![]);
        let fleet = FakeFleet::with_instances(vec![healthy("C", "2"), healthy("D", "2")])
            .failing_delete("C");

        let err = rollback(&ctx(), &fleet, &original).await.unwrap_err();

        assert!(matches!(err, FleetError::Unknown(500)));
        assert_eq!(fleet.deletes(), ["C"]);
    }
}
