//! Statistical port prediction for symmetric NATs
//!
//! Many symmetric NATs hand out external ports from a counter. Walking the
//! observed ports from oldest to newest, every drop in port number is a
//! sample of how far the allocator moved between our connections. The mean
//! and standard deviation of those samples give a window of likely offsets
//! from the last port we saw.

use super::point::NatDataPoint;
use super::types::TransportAddress;
use serde::{Deserialize, Serialize};

/// Default window half-width, in standard deviations
pub const DEFAULT_SAFETY_FACTOR: f64 = 2.0;

/// Largest prediction set still treated as a confident guess
pub const DEFAULT_MAX_CANDIDATES: usize = 14;

/// Per-step growth of the window when an offset is not positive
const WINDOW_EXTENSION: f64 = 1.001;

/// Summary of the port decreases seen in a group of observations
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DiffStats {
    /// Number of decreases observed
    pub samples: usize,
    /// Mean decrease
    pub mean: f64,
    /// Sample standard deviation of the decreases
    pub stddev: f64,
}

/// Parameters for symmetric NAT port prediction
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PortPrediction {
    /// How many standard deviations on each side of the mean to scan
    pub safety_factor: f64,
    /// A prediction larger than this is too vague to classify a NAT
    pub max_candidates: usize,
}

impl Default for PortPrediction {
    fn default() -> Self {
        Self {
            safety_factor: DEFAULT_SAFETY_FACTOR,
            max_candidates: DEFAULT_MAX_CANDIDATES,
        }
    }
}

impl PortPrediction {
    /// Create prediction parameters
    pub fn new(safety_factor: f64, max_candidates: usize) -> Self {
        Self {
            safety_factor,
            max_candidates,
        }
    }

    /// Predict the next external addresses the NAT will hand out
    ///
    /// `points` is in history order (most recent first). Close events are
    /// ignored. Returns an empty list when fewer than two port decreases
    /// were observed. Predictions are in ascending offset order.
    pub fn predict(&self, points: &[&NatDataPoint]) -> Vec<TransportAddress> {
        let walk = PortWalk::over(points);
        let (Some(stats), Some(last)) = (walk.stats(), walk.last) else {
            return Vec::new();
        };

        let mut upper = stats.mean + self.safety_factor * stats.stddev;
        let lower = (stats.mean - self.safety_factor * stats.stddev).ceil();
        if lower.is_nan() || upper.is_nan() {
            return Vec::new();
        }

        // Offsets at or below zero never predict a port; each one widens
        // the window instead, keeping the scan width constant.
        let first = if lower <= 0.0 {
            upper += (1.0 - lower) * WINDOW_EXTENSION;
            1.0
        } else {
            lower
        };

        let mut predictions = Vec::new();
        let room = f64::from(u16::MAX - last.port);
        if first > room {
            return predictions;
        }

        // Bounded by the ports left above `last`.
        let mut delta = first as u16;
        while f64::from(delta) <= upper {
            let Some(port) = last.port.checked_add(delta) else {
                break;
            };
            predictions.push(last.with_port(port));
            let Some(next) = delta.checked_add(1) else {
                break;
            };
            delta = next;
        }
        predictions
    }

    /// Whether a prediction is narrow enough to trust
    pub fn is_confident(&self, predictions: &[TransportAddress]) -> bool {
        !predictions.is_empty() && predictions.len() <= self.max_candidates
    }
}

/// Mean and standard deviation of the port decreases in `points`
///
/// `None` when fewer than two decreases were observed.
pub fn diff_stats(points: &[&NatDataPoint]) -> Option<DiffStats> {
    PortWalk::over(points).stats()
}

/// One oldest-to-newest pass over the peer-view ports of a group
struct PortWalk<'a> {
    samples: usize,
    sum: f64,
    sum_sq: f64,
    last: Option<&'a TransportAddress>,
}

impl<'a> PortWalk<'a> {
    fn over(points: &[&'a NatDataPoint]) -> Self {
        let mut walk = PortWalk {
            samples: 0,
            sum: 0.0,
            sum_sq: 0.0,
            last: None,
        };

        for &point in points.iter().rev() {
            if point.is_close() {
                continue;
            }
            let Some(ta) = point.peer_view() else {
                continue;
            };
            if let Some(prev) = walk.last {
                if prev.port > ta.port {
                    let diff = f64::from(prev.port - ta.port);
                    walk.samples += 1;
                    walk.sum += diff;
                    walk.sum_sq += diff * diff;
                }
            }
            walk.last = Some(ta);
        }
        walk
    }

    fn stats(&self) -> Option<DiffStats> {
        if self.samples < 2 {
            return None;
        }
        let n = self.samples as f64;
        let mean = self.sum / n;
        let variance = (self.sum_sq - self.sum * self.sum / n) / (n - 1.0);
        Some(DiffStats {
            samples: self.samples,
            mean,
            stddev: variance.max(0.0).sqrt(),
        })
    }
}
