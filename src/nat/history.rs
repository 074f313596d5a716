//! Persistent NAT history
//!
//! `NatHistory` is a singly linked, newest-first list of data points whose
//! nodes are shared between snapshots. Adding a point builds a new head in
//! front of the existing one and never touches the old list, so a snapshot
//! can be read from any thread while the producer keeps appending.

use super::point::NatDataPoint;
use super::types::TransportAddress;
use std::collections::HashSet;
use std::fmt;
use std::net::IpAddr;
use std::sync::Arc;

struct Node {
    point: NatDataPoint,
    prev: Option<Arc<Node>>,
}

/// Immutable, append-only sequence of `NatDataPoint`s, most recent first
///
/// Cloning is O(1): the clone shares every node with the original.
///
/// # Example
///
/// ```
/// use chrono::Utc;
/// use natlearn::nat::{EdgeId, NatDataPoint, NatHistory, TransportAddress};
///
/// let local: TransportAddress = "udp://10.0.0.2:4500".parse().unwrap();
/// let remote: TransportAddress = "udp://198.51.100.1:9000".parse().unwrap();
///
/// let empty = NatHistory::new();
/// let one = empty.add(NatDataPoint::edge_opened(Utc::now(), EdgeId(1), local, remote));
///
/// assert!(empty.is_empty());
/// assert_eq!(one.len(), 1);
/// ```
#[derive(Clone, Default)]
pub struct NatHistory {
    head: Option<Arc<Node>>,
    len: usize,
}

impl NatHistory {
    /// Create an empty history
    pub fn new() -> Self {
        Self { head: None, len: 0 }
    }

    /// Return a new history with `point` in front of this one
    ///
    /// The receiver is left unchanged.
    pub fn add(&self, point: NatDataPoint) -> NatHistory {
        NatHistory {
            head: Some(Arc::new(Node {
                point,
                prev: self.head.clone(),
            })),
            len: self.len + 1,
        }
    }

    /// Build a history by adding `points` in the order given, oldest first
    pub fn from_points<I: IntoIterator<Item = NatDataPoint>>(points: I) -> Self {
        points
            .into_iter()
            .fold(NatHistory::new(), |hist, point| hist.add(point))
    }

    /// The most recent data point
    pub fn head(&self) -> Option<&NatDataPoint> {
        self.head.as_deref().map(|node| &node.point)
    }

    /// Number of data points
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the history has no data points
    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    /// Iterate from the most recent to the oldest data point
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            next: self.head.as_deref(),
            remaining: self.len,
        }
    }

    /// Project each point through `f`, skipping points where it yields `None`
    pub fn filter_map<'a, T, F>(&'a self, f: F) -> impl Iterator<Item = T> + 'a
    where
        F: FnMut(&'a NatDataPoint) -> Option<T> + 'a,
    {
        self.iter().filter_map(f)
    }

    /// Distinct local addresses we bound, most recent first
    pub fn local_tas(&self) -> impl Iterator<Item = &TransportAddress> + '_ {
        let mut seen = HashSet::new();
        self.iter()
            .map(|p| &p.local_ta)
            .filter(move |ta| seen.insert(*ta))
    }

    /// Points whose peer view has external IP `ip`
    pub fn points_for_ip(&self, ip: IpAddr) -> impl Iterator<Item = &NatDataPoint> + '_ {
        self.iter().filter(move |p| p.peer_view_ip() == Some(ip))
    }

    /// Distinct external IPs peers have seen us at, most recent first
    pub fn peer_view_ips(&self) -> Vec<IpAddr> {
        let mut seen = HashSet::new();
        self.filter_map(NatDataPoint::peer_view_ip)
            .filter(|ip| seen.insert(*ip))
            .collect()
    }
}

impl Drop for NatHistory {
    fn drop(&mut self) {
        // Unlink uniquely owned nodes one at a time so dropping a long
        // history does not recurse once per node.
        let mut next = self.head.take();
        while let Some(node) = next {
            match Arc::try_unwrap(node) {
                Ok(mut node) => next = node.prev.take(),
                Err(_) => break,
            }
        }
    }
}

impl fmt::Debug for NatHistory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl FromIterator<NatDataPoint> for NatHistory {
    fn from_iter<I: IntoIterator<Item = NatDataPoint>>(iter: I) -> Self {
        Self::from_points(iter)
    }
}

impl<'a> IntoIterator for &'a NatHistory {
    type Item = &'a NatDataPoint;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over a `NatHistory`, most recent first
pub struct Iter<'a> {
    next: Option<&'a Node>,
    remaining: usize,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a NatDataPoint;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.next?;
        self.next = node.prev.as_deref();
        self.remaining -= 1;
        Some(&node.point)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for Iter<'_> {}
