//! Connectivity boundary - turns edge events into NAT history
//!
//! The connectivity layer owns the edges. It reports edge lifecycle events
//! and the peer's view of our address through a `NatRecorder`, which keeps
//! the process's current `NatHistory` and hands out immutable snapshots.

use super::history::NatHistory;
use super::orchestrator::NatTas;
use super::point::NatDataPoint;
use super::registry::{EdgeKey, EdgeRegistry};
use super::types::TransportAddress;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::trace;

/// What the NAT engine reads from an edge
pub trait EdgeInfo {
    /// Stable identity the connectivity layer assigned to this edge
    fn edge_key(&self) -> EdgeKey;
    /// Address we bound locally for this edge
    fn local_ta(&self) -> TransportAddress;
    /// Address of the peer on the other end
    fn remote_ta(&self) -> TransportAddress;
}

#[derive(Debug, Default)]
struct RecorderState {
    history: NatHistory,
    /// Last peer view reported on each open edge
    views: HashMap<EdgeKey, TransportAddress>,
}

/// Records NAT observations for a node
///
/// # Example
///
/// ```
/// use natlearn::nat::{EdgeInfo, EdgeKey, NatRecorder, TransportAddress};
///
/// struct Edge;
///
/// impl EdgeInfo for Edge {
///     fn edge_key(&self) -> EdgeKey { 7 }
///     fn local_ta(&self) -> TransportAddress { "udp://10.0.0.2:4500".parse().unwrap() }
///     fn remote_ta(&self) -> TransportAddress { "udp://198.51.100.1:9000".parse().unwrap() }
/// }
///
/// let recorder = NatRecorder::new();
/// recorder.edge_opened(&Edge);
/// recorder.peer_view_reported(&Edge, "udp://203.0.113.7:4500".parse().unwrap());
///
/// let first = recorder.candidates(Vec::new()).to_vec();
/// assert_eq!(first[0].to_string(), "udp://203.0.113.7:4500");
/// ```
#[derive(Debug)]
pub struct NatRecorder {
    registry: Arc<EdgeRegistry>,
    state: RwLock<RecorderState>,
}

impl NatRecorder {
    /// Create a recorder with its own edge registry
    pub fn new() -> Self {
        Self::with_registry(Arc::new(EdgeRegistry::new()))
    }

    /// Create a recorder sharing `registry`, e.g. `EdgeRegistry::global()`
    pub fn with_registry(registry: Arc<EdgeRegistry>) -> Self {
        Self {
            registry,
            state: RwLock::new(RecorderState::default()),
        }
    }

    /// The registry that numbers this recorder's edges
    pub fn registry(&self) -> &Arc<EdgeRegistry> {
        &self.registry
    }

    /// Current history snapshot
    pub fn history(&self) -> NatHistory {
        self.state.read().history.clone()
    }

    /// Ranked candidates over the current snapshot
    pub fn candidates(&self, local_config: Vec<TransportAddress>) -> NatTas {
        NatTas::new(local_config, self.history())
    }

    /// Record that `edge` was opened
    pub fn edge_opened<E: EdgeInfo + ?Sized>(&self, edge: &E) {
        self.edge_opened_at(edge, Utc::now());
    }

    /// Record that `edge` was opened at `at`
    pub fn edge_opened_at<E: EdgeInfo + ?Sized>(&self, edge: &E, at: DateTime<Utc>) {
        let id = self.registry.id_for(edge.edge_key());
        self.append(NatDataPoint::edge_opened(at, id, edge.local_ta(), edge.remote_ta()));
    }

    /// Record that `edge` was closed and forget it
    pub fn edge_closed<E: EdgeInfo + ?Sized>(&self, edge: &E) {
        self.edge_closed_at(edge, Utc::now());
    }

    /// Record that `edge` was closed at `at` and forget it
    pub fn edge_closed_at<E: EdgeInfo + ?Sized>(&self, edge: &E, at: DateTime<Utc>) {
        let key = edge.edge_key();
        let id = self.registry.id_for(key);
        let point = NatDataPoint::edge_closed(at, id, edge.local_ta(), edge.remote_ta());
        let mut state = self.state.write();
        state.history = state.history.add(point);
        state.views.remove(&key);
        // Released under the state lock so a racing view report cannot
        // store a view for this key again.
        self.registry.release(key);
    }

    /// Record that the remote peer's own mapping changed
    pub fn remote_mapping_changed<E: EdgeInfo + ?Sized>(&self, edge: &E) {
        self.remote_mapping_changed_at(edge, Utc::now());
    }

    /// Record that the remote peer's own mapping changed at `at`
    pub fn remote_mapping_changed_at<E: EdgeInfo + ?Sized>(&self, edge: &E, at: DateTime<Utc>) {
        let id = self.registry.id_for(edge.edge_key());
        self.append(NatDataPoint::remote_mapping_changed(
            at,
            id,
            edge.local_ta(),
            edge.remote_ta(),
        ));
    }

    /// The peer on `edge` reports seeing us at `view`
    ///
    /// A point is appended only when the edge is open and the view differs
    /// from the last one reported on it. Returns whether a point was
    /// appended.
    pub fn peer_view_reported<E: EdgeInfo + ?Sized>(&self, edge: &E, view: TransportAddress) -> bool {
        self.peer_view_reported_at(edge, view, Utc::now())
    }

    /// Like `peer_view_reported`, observed at `at`
    pub fn peer_view_reported_at<E: EdgeInfo + ?Sized>(
        &self,
        edge: &E,
        view: TransportAddress,
        at: DateTime<Utc>,
    ) -> bool {
        let key = edge.edge_key();
        let (local_ta, remote_ta) = (edge.local_ta(), edge.remote_ta());

        let mut state = self.state.write();
        let Some(id) = self.registry.lookup(key) else {
            trace!("Ignoring view {} on unknown edge key {}", view, key);
            return false;
        };
        if state.views.get(&key) == Some(&view) {
            return false;
        }
        let previous = state.views.insert(key, view.clone());
        trace!("{} now seen at {} (was {:?})", id, view, previous);
        let point =
            NatDataPoint::local_mapping_changed(at, id, local_ta, remote_ta, Some(view), previous);
        state.history = state.history.add(point);
        true
    }

    fn append(&self, point: NatDataPoint) {
        trace!("Recording {:?} for {}", point.kind, point.edge);
        let mut state = self.state.write();
        state.history = state.history.add(point);
    }
}

impl Default for NatRecorder {
    fn default() -> Self {
        Self::new()
    }
}
