//! Candidate address generation - ranks what to advertise

use super::history::NatHistory;
use super::point::NatDataPoint;
use super::predict::PortPrediction;
use super::strategy::{classify, NatStrategy};
use super::types::TransportAddress;
use crate::settings::NatSettings;
use std::collections::{HashMap, HashSet};
use std::net::IpAddr;
use std::sync::OnceLock;
use tracing::debug;

/// How often peers saw us behind one external IP
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IpAddressGroup {
    /// External IP address
    pub ip: IpAddr,
    /// Number of observations through that IP
    pub count: usize,
}

/// Ranked transport addresses for one history snapshot
///
/// The list is computed on first use and cached; build a new `NatTas` over a
/// newer snapshot to pick up new observations.
///
/// Candidates are produced as follows:
/// 1. Group peer views by external IP, most observed IP first
/// 2. For each IP, take the first strategy of the active chain that matches
///    and append its candidates
/// 3. Append the locally configured addresses
///
/// No address appears twice; the first occurrence keeps its position.
///
/// # Example
///
/// ```
/// use natlearn::nat::{NatHistory, NatTas, TransportAddress};
///
/// let local: Vec<TransportAddress> = vec!["udp://192.0.2.10:4500".parse().unwrap()];
/// let tas = NatTas::new(local.clone(), NatHistory::new());
///
/// assert_eq!(tas.to_vec(), local);
/// ```
#[derive(Debug)]
pub struct NatTas {
    history: NatHistory,
    local_config: Vec<TransportAddress>,
    prediction: PortPrediction,
    generated: OnceLock<Vec<TransportAddress>>,
}

impl NatTas {
    /// Create a generator over `history`, with `local_config` as last resort
    pub fn new(local_config: Vec<TransportAddress>, history: NatHistory) -> Self {
        Self::with_prediction(local_config, history, PortPrediction::default())
    }

    /// Like `new`, with custom symmetric NAT prediction parameters
    pub fn with_prediction(
        local_config: Vec<TransportAddress>,
        history: NatHistory,
        prediction: PortPrediction,
    ) -> Self {
        Self {
            history,
            local_config,
            prediction,
            generated: OnceLock::new(),
        }
    }

    /// Create a generator using the local addresses and prediction
    /// parameters from `settings`
    pub fn from_settings(settings: &NatSettings, history: NatHistory) -> Self {
        Self::with_prediction(settings.local_tas.clone(), history, settings.prediction())
    }

    /// The history snapshot this generator reads
    pub fn history(&self) -> &NatHistory {
        &self.history
    }

    /// External IPs ranked by observation count, highest first
    ///
    /// IPs with equal counts keep the order in which they first appear in
    /// the history, most recent first.
    pub fn ip_groups(&self) -> Vec<IpAddressGroup> {
        let mut index: HashMap<IpAddr, usize> = HashMap::new();
        let mut groups: Vec<IpAddressGroup> = Vec::new();

        for ip in self.history.filter_map(NatDataPoint::peer_view_ip) {
            let i = *index.entry(ip).or_insert_with(|| {
                groups.push(IpAddressGroup { ip, count: 0 });
                groups.len() - 1
            });
            groups[i].count += 1;
        }

        // Stable, so ties stay in first-seen order.
        groups.sort_by(|a, b| b.count.cmp(&a.count));
        groups
    }

    /// Iterate over the ranked candidates
    pub fn iter(&self) -> std::slice::Iter<'_, TransportAddress> {
        self.candidates().iter()
    }

    /// The ranked candidates as an owned list
    pub fn to_vec(&self) -> Vec<TransportAddress> {
        self.candidates().to_vec()
    }

    fn candidates(&self) -> &[TransportAddress] {
        self.generated.get_or_init(|| self.generate())
    }

    fn generate(&self) -> Vec<TransportAddress> {
        let chain = NatStrategy::active_chain(self.prediction);
        let mut seen: HashSet<TransportAddress> = HashSet::new();
        let mut generated = Vec::new();

        for group in self.ip_groups() {
            let points: Vec<&NatDataPoint> = self.history.points_for_ip(group.ip).collect();
            let Some(strategy) = classify(&chain, &points) else {
                continue;
            };

            let candidates = strategy.candidates(&points);
            debug!(
                "NAT at {} ({} observations) looks {}: {} candidates",
                group.ip,
                group.count,
                strategy,
                candidates.len()
            );
            for ta in candidates {
                if seen.insert(ta.clone()) {
                    generated.push(ta);
                }
            }
        }

        for ta in &self.local_config {
            if seen.insert(ta.clone()) {
                generated.push(ta.clone());
            }
        }
        generated
    }
}

impl<'a> IntoIterator for &'a NatTas {
    type Item = &'a TransportAddress;
    type IntoIter = std::slice::Iter<'a, TransportAddress>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
