use crate::nat::{EdgeId, EdgeRegistry};
use std::sync::Arc;

#[test]
fn test_ids_are_stable_per_edge() {
    let registry = EdgeRegistry::new();
    let first = registry.id_for(42);
    assert_eq!(first, EdgeId(1));
    assert_eq!(registry.id_for(42), first);
    assert_eq!(registry.lookup(42), Some(first));
}

#[test]
fn test_distinct_edges_get_distinct_ids() {
    let registry = EdgeRegistry::new();
    let a = registry.id_for(10);
    let b = registry.id_for(20);
    assert_ne!(a, b);
    assert_eq!(registry.len(), 2);
}

#[test]
fn test_lookup_does_not_assign() {
    let registry = EdgeRegistry::new();
    assert_eq!(registry.lookup(7), None);
    assert!(registry.is_empty());
}

#[test]
fn test_release_forgets_edge_without_reusing_id() {
    let registry = EdgeRegistry::new();
    let old = registry.id_for(7);
    assert_eq!(registry.release(7), Some(old));
    assert_eq!(registry.lookup(7), None);
    assert!(registry.is_empty());

    // Same key after release is a new edge
    let new = registry.id_for(7);
    assert_ne!(new, old);
    assert_eq!(registry.release(99), None);
}

#[test]
fn test_global_registry_is_shared() {
    let a = EdgeRegistry::global();
    let b = EdgeRegistry::global();
    assert!(Arc::ptr_eq(&a, &b));
}

#[test]
fn test_concurrent_registration_agrees() {
    let registry = EdgeRegistry::new();
    let ids: Vec<EdgeId> = std::thread::scope(|s| {
        let handles: Vec<_> = (0..8).map(|_| s.spawn(|| registry.id_for(1234))).collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert!(ids.iter().all(|id| *id == ids[0]));
    assert_eq!(registry.len(), 1);
}
