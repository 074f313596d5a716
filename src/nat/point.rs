//! NAT observations
//!
//! A `NatDataPoint` records something we learned about an edge at a point
//! in time. Only mapping changes carry a peer view of our address, and only
//! those take part in NAT classification.

use super::registry::EdgeId;
use super::types::TransportAddress;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::net::IpAddr;

/// What kind of event a data point records
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PointKind {
    /// An edge was opened
    EdgeOpened,
    /// An edge was closed
    EdgeClosed,
    /// The peer reported a new view of our address
    LocalMappingChanged {
        /// The address the peer now sees us at
        peer_view: Option<TransportAddress>,
        /// The view this edge reported before the change
        previous: Option<TransportAddress>,
    },
    /// The remote peer's own external mapping changed
    RemoteMappingChanged,
}

/// An immutable observation about one edge
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NatDataPoint {
    /// When the event was observed
    pub timestamp: DateTime<Utc>,
    /// Edge the event belongs to
    pub edge: EdgeId,
    /// Address we bound locally
    pub local_ta: TransportAddress,
    /// Address of the remote peer
    pub remote_ta: TransportAddress,
    /// Event details
    pub kind: PointKind,
}

impl NatDataPoint {
    fn with_kind(
        timestamp: DateTime<Utc>,
        edge: EdgeId,
        local_ta: TransportAddress,
        remote_ta: TransportAddress,
        kind: PointKind,
    ) -> Self {
        Self {
            timestamp,
            edge,
            local_ta,
            remote_ta,
            kind,
        }
    }

    /// An edge was opened
    pub fn edge_opened(
        timestamp: DateTime<Utc>,
        edge: EdgeId,
        local_ta: TransportAddress,
        remote_ta: TransportAddress,
    ) -> Self {
        Self::with_kind(timestamp, edge, local_ta, remote_ta, PointKind::EdgeOpened)
    }

    /// An edge was closed
    pub fn edge_closed(
        timestamp: DateTime<Utc>,
        edge: EdgeId,
        local_ta: TransportAddress,
        remote_ta: TransportAddress,
    ) -> Self {
        Self::with_kind(timestamp, edge, local_ta, remote_ta, PointKind::EdgeClosed)
    }

    /// The peer on `edge` now sees us at `peer_view`
    pub fn local_mapping_changed(
        timestamp: DateTime<Utc>,
        edge: EdgeId,
        local_ta: TransportAddress,
        remote_ta: TransportAddress,
        peer_view: Option<TransportAddress>,
        previous: Option<TransportAddress>,
    ) -> Self {
        Self::with_kind(
            timestamp,
            edge,
            local_ta,
            remote_ta,
            PointKind::LocalMappingChanged {
                peer_view,
                previous,
            },
        )
    }

    /// The remote peer's external mapping changed
    pub fn remote_mapping_changed(
        timestamp: DateTime<Utc>,
        edge: EdgeId,
        local_ta: TransportAddress,
        remote_ta: TransportAddress,
    ) -> Self {
        Self::with_kind(
            timestamp,
            edge,
            local_ta,
            remote_ta,
            PointKind::RemoteMappingChanged,
        )
    }

    /// The address the peer reported seeing us at, if this point has one
    pub fn peer_view(&self) -> Option<&TransportAddress> {
        match &self.kind {
            PointKind::LocalMappingChanged { peer_view, .. } => peer_view.as_ref(),
            _ => None,
        }
    }

    /// The peer view this edge reported before a mapping change
    pub fn previous_peer_view(&self) -> Option<&TransportAddress> {
        match &self.kind {
            PointKind::LocalMappingChanged { previous, .. } => previous.as_ref(),
            _ => None,
        }
    }

    /// External IP of the peer view
    pub fn peer_view_ip(&self) -> Option<IpAddr> {
        self.peer_view().map(TransportAddress::ip)
    }

    /// Whether this point records an edge closing
    pub fn is_close(&self) -> bool {
        matches!(self.kind, PointKind::EdgeClosed)
    }
}
