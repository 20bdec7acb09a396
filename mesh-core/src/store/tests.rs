use super::*;
use crate::config::default_baseline;
use crate::model::Severity;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashSet;

fn create_test_store() -> (NodeStore, IdAllocator, NotificationBus) {
    let store = NodeStore::new(default_baseline());
    let ids = store.allocator();
    (store, ids, NotificationBus::new())
}

fn rng() -> StdRng {
    StdRng::seed_from_u64(42)
}

fn id(s: &str) -> NodeId {
    NodeId::from(s)
}

#[test]
fn test_add_allocates_after_baseline() {
    let (mut store, mut ids, mut bus) = create_test_store();

    let new_id = store.add(&mut ids, &mut bus, &mut rng()).unwrap();

    assert_eq!(new_id.as_str(), "4");
    let node = store.get(&new_id).unwrap();
    assert_eq!(node.status(), NodeStatus::Healthy);
    assert!(node.metrics().latency >= 10.0 && node.metrics().latency < 60.0);
    assert!(node.metrics().resource_usage < 0.3);
    assert!(node.metrics().anomaly_score < 0.2);

    let n = bus.latest().unwrap();
    assert_eq!(n.title(), "Node Added");
    assert_eq!(n.message(), "Node 4 has been added to the network");
    assert_eq!(n.severity(), Severity::Info);
}

#[test]
fn test_add_ids_pairwise_distinct() {
    let (mut store, mut ids, mut bus) = create_test_store();
    let mut rng = rng();

    for _ in 0..50 {
        store.add(&mut ids, &mut bus, &mut rng);
    }

    let unique: HashSet<_> = store.nodes().iter().map(|n| n.id().clone()).collect();
    assert_eq!(unique.len(), store.len());
    assert_eq!(store.len(), 53);
}

#[test]
fn test_add_drops_colliding_id() {
    let (mut store, _, mut bus) = create_test_store();
    // An allocator seeded inside the baseline range collides on "2"
    let mut rogue = IdAllocator::new(2);

    let result = store.add(&mut rogue, &mut bus, &mut rng());

    assert!(result.is_none());
    assert_eq!(store.len(), 3);
    assert!(bus.is_empty(), "Dropped add must not notify");
}

#[test]
fn test_rename_changes_name_only() {
    let (mut store, _, mut bus) = create_test_store();
    let before = store.get(&id("2")).unwrap().clone();

    assert!(store.rename(&id("2"), "  door-sensor ", &mut bus));

    let after = store.get(&id("2")).unwrap();
    assert_eq!(after.name(), Some("  door-sensor "));
    assert_eq!(after.status(), before.status());
    assert_eq!(after.metrics(), before.metrics());

    let n = bus.latest().unwrap();
    assert_eq!(n.severity(), Severity::Success);
    assert_eq!(n.message(), "Node 2 renamed to   door-sensor ");
}

#[test]
fn test_rename_missing_or_blank_is_noop() {
    let (mut store, _, mut bus) = create_test_store();
    let before = store.nodes().to_vec();

    assert!(!store.rename(&id("99"), "ghost", &mut bus));
    assert!(!store.rename(&id("1"), "   ", &mut bus));

    assert_eq!(store.nodes(), before.as_slice());
    assert!(bus.is_empty());
}

#[test]
fn test_inject_fault_sets_degraded_metrics() {
    let (mut store, _, mut bus) = create_test_store();

    assert!(store.inject_fault(Some(&id("3")), &mut bus).unwrap());

    let node = store.get(&id("3")).unwrap();
    assert_eq!(node.status(), NodeStatus::Compromised);
    assert_eq!(node.metrics().latency, 150.0);
    assert_eq!(node.metrics().resource_usage, 0.8);
    assert_eq!(node.metrics().anomaly_score, 0.9);

    let n = bus.latest().unwrap();
    assert_eq!(n.title(), "Fault Injected");
    assert_eq!(n.severity(), Severity::Error);
}

#[test]
fn test_inject_fault_without_target() {
    let (mut store, _, mut bus) = create_test_store();

    let result = store.inject_fault(None, &mut bus);

    assert!(matches!(result, Err(SimulationError::NoFaultTarget)));
    assert_eq!(store.nodes(), store.baseline());
    let n = bus.latest().unwrap();
    assert_eq!(n.title(), "Error");
    assert_eq!(n.message(), "Please select a node to inject fault");
}

#[test]
fn test_inject_fault_unknown_node_is_noop() {
    let (mut store, _, mut bus) = create_test_store();

    assert!(!store.inject_fault(Some(&id("42")), &mut bus).unwrap());
    assert!(bus.is_empty());
}

#[test]
fn test_reset_restores_baseline_and_seed() {
    let (mut store, mut ids, mut bus) = create_test_store();
    let mut rng = rng();
    store.add(&mut ids, &mut bus, &mut rng);
    store.add(&mut ids, &mut bus, &mut rng);
    store.inject_fault(Some(&id("1")), &mut bus).unwrap();
    store.rename(&id("2"), "renamed", &mut bus);

    store.reset(&mut ids, &mut bus);

    assert_eq!(store.nodes(), store.baseline());
    assert_eq!(ids.peek(), 4);
    assert_eq!(bus.latest().unwrap().title(), "Simulation Reset");

    // Ids continue right after the baseline again
    assert_eq!(store.add(&mut ids, &mut bus, &mut rng).unwrap().as_str(), "4");
}

#[test]
fn test_reset_starts_new_generation() {
    let (mut store, mut ids, mut bus) = create_test_store();
    let mut rng = rng();

    let first = store.add(&mut ids, &mut bus, &mut rng).unwrap();
    assert_eq!(store.get(&first).unwrap().generation(), 0);

    store.reset(&mut ids, &mut bus);
    let second = store.add(&mut ids, &mut bus, &mut rng).unwrap();

    // Same id, different instance
    assert_eq!(first, second);
    assert_eq!(store.generation(), 1);
    assert!(store.resolve(&second, 0).is_none());
    assert!(store.resolve(&second, 1).is_some());
    // Baseline nodes keep generation 0 across resets
    assert!(store.resolve(&id("1"), 0).is_some());
}

#[test]
fn test_apply_action_skips_stale_instance() {
    let (mut store, mut ids, mut bus) = create_test_store();
    let mut rng = rng();
    let added = store.add(&mut ids, &mut bus, &mut rng).unwrap();
    store.reset(&mut ids, &mut bus);
    store.add(&mut ids, &mut bus, &mut rng).unwrap();

    assert!(!store.apply_action(&added, 0, SuggestedAction::Isolate));
    assert_eq!(store.get(&added).unwrap().status(), NodeStatus::Healthy);
}

#[test]
fn test_apply_action_authoritative() {
    let (mut store, _, _) = create_test_store();

    // Healthy -> Restored is outside the table, but approval is authoritative
    assert!(store.apply_action(&id("1"), 0, SuggestedAction::Restore));
    assert_eq!(store.get(&id("1")).unwrap().status(), NodeStatus::Restored);

    assert!(store.apply_action(&id("1"), 0, SuggestedAction::Isolate));
    assert_eq!(store.get(&id("1")).unwrap().status(), NodeStatus::Isolated);
}

#[test]
fn test_apply_action_strict_rejects_disallowed() {
    let (store, _, mut bus) = create_test_store();
    let mut store = store.with_policy(TransitionPolicy::Strict);

    assert!(!store.apply_action(&id("1"), 0, SuggestedAction::Isolate));
    assert_eq!(store.get(&id("1")).unwrap().status(), NodeStatus::Healthy);

    store.inject_fault(Some(&id("1")), &mut bus).unwrap();
    assert!(store.apply_action(&id("1"), 0, SuggestedAction::Isolate));
    assert!(store.apply_action(&id("1"), 0, SuggestedAction::Restore));
    assert_eq!(store.get(&id("1")).unwrap().status(), NodeStatus::Restored);
}

#[test]
fn test_apply_action_missing_node() {
    let (mut store, _, _) = create_test_store();
    assert!(!store.apply_action(&id("77"), 0, SuggestedAction::Isolate));
}

#[test]
fn test_summary_counts() {
    let (mut store, _, mut bus) = create_test_store();
    store.inject_fault(Some(&id("2")), &mut bus).unwrap();

    let summary = store.summary(0.7);

    assert_eq!(summary.total, 3);
    assert_eq!(summary.by_status.get(&NodeStatus::Healthy), Some(&2));
    assert_eq!(summary.by_status.get(&NodeStatus::Compromised), Some(&1));
    assert_eq!(summary.at_risk, 1);
}
