//! NAT behavior models
//!
//! Each `NatStrategy` recognizes one kind of NAT from the observations made
//! through a single external IP, and proposes the external addresses that
//! NAT is most likely to give us next. Observation groups are always passed
//! in history order, most recent first.

use super::point::NatDataPoint;
use super::predict::PortPrediction;
use super::types::TransportAddress;
use std::collections::HashSet;
use std::fmt;
use tracing::{debug, trace};

/// A model of one known NAT behavior
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NatStrategy {
    /// No translation: every peer sees one of our local addresses.
    ///
    /// Not part of the active chain; `FullCone` already covers public nodes.
    Public,
    /// One external port per internal socket, reused for every peer
    FullCone,
    /// Keeps the internal port when it can, otherwise allocates like a
    /// symmetric NAT
    LinuxStyle(PortPrediction),
    /// A new external port per destination, predictable from past ports
    Symmetric(PortPrediction),
    /// Last resort that accepts any history
    Fallback,
}

impl NatStrategy {
    /// The strategies tried for every external IP, in priority order
    pub fn active_chain(prediction: PortPrediction) -> [NatStrategy; 4] {
        [
            NatStrategy::FullCone,
            NatStrategy::LinuxStyle(prediction),
            NatStrategy::Symmetric(prediction),
            NatStrategy::Fallback,
        ]
    }

    /// Short name used in logs
    pub fn name(&self) -> &'static str {
        match self {
            NatStrategy::Public => "public",
            NatStrategy::FullCone => "full-cone",
            NatStrategy::LinuxStyle(_) => "linux",
            NatStrategy::Symmetric(_) => "symmetric",
            NatStrategy::Fallback => "fallback",
        }
    }

    /// Whether this model explains the observations in `points`
    pub fn matches(&self, points: &[&NatDataPoint]) -> bool {
        match self {
            NatStrategy::Public => is_public(points),
            NatStrategy::FullCone => is_single_port(points),
            NatStrategy::LinuxStyle(_) => preserved_port(points).is_some(),
            NatStrategy::Symmetric(prediction) => {
                prediction.is_confident(&prediction.predict(points))
            }
            NatStrategy::Fallback => true,
        }
    }

    /// External addresses to try, most likely first
    pub fn candidates(&self, points: &[&NatDataPoint]) -> Vec<TransportAddress> {
        match self {
            NatStrategy::FullCone => points
                .iter()
                .find_map(|p| p.peer_view())
                .cloned()
                .into_iter()
                .collect(),
            NatStrategy::LinuxStyle(prediction) => linux_candidates(prediction, points),
            NatStrategy::Symmetric(prediction) => prediction.predict(points),
            NatStrategy::Public | NatStrategy::Fallback => reported_views(points),
        }
    }
}

impl fmt::Display for NatStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The first strategy in `chain` that matches `points`
pub fn classify<'c>(chain: &'c [NatStrategy], points: &[&NatDataPoint]) -> Option<&'c NatStrategy> {
    chain.iter().find(|strategy| strategy.matches(points))
}

/// Every distinct peer view, most recent first
pub fn reported_views(points: &[&NatDataPoint]) -> Vec<TransportAddress> {
    let mut seen = HashSet::new();
    points
        .iter()
        .filter_map(|p| p.peer_view())
        .filter(|ta| seen.insert(*ta))
        .cloned()
        .collect()
}

fn is_public(points: &[&NatDataPoint]) -> bool {
    let local: HashSet<&TransportAddress> = points.iter().map(|p| &p.local_ta).collect();
    points
        .iter()
        .filter_map(|p| p.peer_view())
        .all(|view| local.contains(view))
}

fn is_single_port(points: &[&NatDataPoint]) -> bool {
    let mut ports = points.iter().filter_map(|p| p.peer_view()).map(|ta| ta.port);
    match ports.next() {
        Some(first) => ports.all(|port| port == first),
        None => true,
    }
}

/// The oldest peer view whose port equals the port we bound locally
fn preserved_port<'a>(points: &[&'a NatDataPoint]) -> Option<&'a TransportAddress> {
    points.iter().rev().find_map(|&p| {
        p.peer_view()
            .filter(|view| view.port == p.local_ta.port)
    })
}

fn linux_candidates(prediction: &PortPrediction, points: &[&NatDataPoint]) -> Vec<TransportAddress> {
    let Some(preserved) = preserved_port(points) else {
        return Vec::new();
    };

    // Only the collisions tell us how the NAT allocates when it cannot keep
    // the port.
    let remapped: Vec<&NatDataPoint> = points
        .iter()
        .copied()
        .filter(|p| p.peer_view().is_some_and(|view| view.port != preserved.port))
        .collect();

    let mut predicted = prediction.predict(&remapped);
    if predicted.len() > prediction.max_candidates {
        debug!(
            "Linux NAT prediction from port {} spans {} ports, keeping the nearest {}",
            preserved.port,
            predicted.len(),
            prediction.max_candidates
        );
        predicted.truncate(prediction.max_candidates);
    }

    let mut candidates = Vec::with_capacity(predicted.len() + 1);
    candidates.push(preserved.clone());
    candidates.extend(predicted);
    trace!(
        "Linux NAT keeps port {} ({} predicted from {} remapped points)",
        preserved.port,
        candidates.len() - 1,
        remapped.len()
    );
    candidates
}
