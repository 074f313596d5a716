use super::fixtures::{at, udp};
use crate::nat::{EdgeInfo, EdgeKey, EdgeRegistry, NatRecorder, PointKind, TransportAddress};
use std::sync::Arc;

struct TestEdge {
    key: EdgeKey,
    local: &'static str,
}

impl EdgeInfo for TestEdge {
    fn edge_key(&self) -> EdgeKey {
        self.key
    }

    fn local_ta(&self) -> TransportAddress {
        udp(self.local)
    }

    fn remote_ta(&self) -> TransportAddress {
        udp("198.51.100.1:9000")
    }
}

fn edge(key: EdgeKey) -> TestEdge {
    TestEdge {
        key,
        local: "10.0.0.2:6000",
    }
}

#[test]
fn test_lifecycle_events_are_recorded_in_order() {
    let recorder = NatRecorder::new();
    let e = edge(1);

    recorder.edge_opened_at(&e, at(0));
    recorder.remote_mapping_changed_at(&e, at(1));
    recorder.edge_closed_at(&e, at(2));

    let history = recorder.history();
    let kinds: Vec<&PointKind> = history.iter().map(|p| &p.kind).collect();
    assert_eq!(
        kinds,
        vec![
            &PointKind::EdgeClosed,
            &PointKind::RemoteMappingChanged,
            &PointKind::EdgeOpened,
        ]
    );
    assert!(history.iter().all(|p| p.edge == history.iter().last().unwrap().edge));
}

#[test]
fn test_peer_view_recorded_only_when_changed() {
    let recorder = NatRecorder::new();
    let e = edge(1);
    recorder.edge_opened_at(&e, at(0));

    assert!(recorder.peer_view_reported_at(&e, udp("203.0.113.7:4500"), at(1)));
    assert!(!recorder.peer_view_reported_at(&e, udp("203.0.113.7:4500"), at(2)));
    assert!(recorder.peer_view_reported_at(&e, udp("203.0.113.7:4600"), at(3)));

    let history = recorder.history();
    assert_eq!(history.len(), 3);

    let head = history.head().unwrap();
    assert_eq!(head.peer_view(), Some(&udp("203.0.113.7:4600")));
    assert_eq!(head.previous_peer_view(), Some(&udp("203.0.113.7:4500")));
}

#[test]
fn test_views_are_tracked_per_edge() {
    let recorder = NatRecorder::new();
    recorder.edge_opened(&edge(1));
    recorder.edge_opened(&edge(2));

    assert!(recorder.peer_view_reported(&edge(1), udp("203.0.113.7:4500")));
    assert!(recorder.peer_view_reported(&edge(2), udp("203.0.113.7:4500")));
    assert_eq!(recorder.history().len(), 4);
}

#[test]
fn test_views_on_closed_edges_are_ignored() {
    let registry = Arc::new(EdgeRegistry::new());
    let recorder = NatRecorder::with_registry(registry.clone());
    let e = edge(3);

    assert!(!recorder.peer_view_reported(&e, udp("203.0.113.7:4500")));
    assert!(registry.is_empty());

    recorder.edge_opened(&e);
    assert!(recorder.peer_view_reported(&e, udp("203.0.113.7:4500")));
    recorder.edge_closed(&e);

    let len = recorder.history().len();
    assert!(!recorder.peer_view_reported(&e, udp("203.0.113.7:4600")));
    assert_eq!(recorder.history().len(), len);
    assert!(registry.is_empty());
}

#[test]
fn test_close_releases_edge() {
    let registry = Arc::new(EdgeRegistry::new());
    let recorder = NatRecorder::with_registry(registry.clone());
    let e = edge(5);

    recorder.edge_opened(&e);
    recorder.peer_view_reported(&e, udp("203.0.113.7:4500"));
    let id = registry.lookup(5).expect("Edge should be registered");

    recorder.edge_closed(&e);
    assert_eq!(registry.lookup(5), None);
    assert_eq!(recorder.history().head().map(|p| p.edge), Some(id));

    // A reopened edge starts without a known view
    recorder.edge_opened(&e);
    assert!(recorder.peer_view_reported(&e, udp("203.0.113.7:4500")));
    assert_ne!(registry.lookup(5), Some(id));
}

#[test]
fn test_snapshots_are_independent() {
    let recorder = NatRecorder::new();
    recorder.edge_opened(&edge(1));
    let before = recorder.history();

    recorder.edge_opened(&edge(2));
    assert_eq!(before.len(), 1);
    assert_eq!(recorder.history().len(), 2);
}

#[test]
fn test_recorder_candidates() {
    let recorder = NatRecorder::new();
    let cone = TestEdge {
        key: 1,
        local: "10.0.0.2:6000",
    };
    let other = TestEdge {
        key: 2,
        local: "10.0.0.2:6001",
    };

    recorder.edge_opened(&cone);
    recorder.peer_view_reported(&cone, udp("203.0.113.7:4500"));
    recorder.edge_opened(&other);
    recorder.peer_view_reported(&other, udp("203.0.113.7:4500"));

    let tas = recorder.candidates(vec![udp("192.0.2.10:4500")]);
    assert_eq!(
        tas.to_vec(),
        vec![udp("203.0.113.7:4500"), udp("192.0.2.10:4500")]
    );
}

#[test]
fn test_concurrent_reports() {
    let recorder = NatRecorder::new();

    std::thread::scope(|s| {
        for key in 0..8u64 {
            let recorder = &recorder;
            s.spawn(move || {
                let e = edge(key);
                recorder.edge_opened(&e);
                recorder.peer_view_reported(&e, udp("203.0.113.7:4500"));
            });
        }
    });

    assert_eq!(recorder.history().len(), 16);
    assert_eq!(recorder.registry().len(), 8);
}
