//! Edge identity registry
//!
//! Data points never hold on to an edge. Instead each edge gets a small
//! integer id the first time it is seen, keyed by the stable identity the
//! connectivity layer already assigns to its edges. The connectivity layer
//! releases the key when the edge goes away, so the registry never keeps
//! entries for dead edges.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock};
use tracing::trace;

/// Stable edge identity owned by the connectivity layer
pub type EdgeKey = u64;

/// Small integer identifying an edge inside the NAT history
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EdgeId(pub u32);

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "edge#{}", self.0)
    }
}

#[derive(Debug)]
struct RegistryInner {
    ids: HashMap<EdgeKey, EdgeId>,
    next_id: u32,
}

/// Assigns `EdgeId`s to edge keys
///
/// All access goes through one lock that is held only for the lookup or
/// insert itself. Ids start at 1 and are never handed out twice, even after
/// the edge has been released.
#[derive(Debug)]
pub struct EdgeRegistry {
    inner: Mutex<RegistryInner>,
}

impl EdgeRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(RegistryInner {
                ids: HashMap::new(),
                next_id: 1,
            }),
        }
    }

    /// The process-wide registry
    pub fn global() -> Arc<EdgeRegistry> {
        static GLOBAL: OnceLock<Arc<EdgeRegistry>> = OnceLock::new();
        GLOBAL.get_or_init(|| Arc::new(EdgeRegistry::new())).clone()
    }

    /// Id for `key`, assigning a fresh one if the edge has not been seen
    pub fn id_for(&self, key: EdgeKey) -> EdgeId {
        let mut inner = self.inner.lock();
        if let Some(id) = inner.ids.get(&key) {
            return *id;
        }
        let id = EdgeId(inner.next_id);
        inner.next_id = inner.next_id.wrapping_add(1).max(1);
        inner.ids.insert(key, id);
        trace!("Registered edge key {} as {}", key, id);
        id
    }

    /// Id for `key` if one has been assigned
    pub fn lookup(&self, key: EdgeKey) -> Option<EdgeId> {
        self.inner.lock().ids.get(&key).copied()
    }

    /// Forget `key`, returning the id it had
    pub fn release(&self, key: EdgeKey) -> Option<EdgeId> {
        let released = self.inner.lock().ids.remove(&key);
        if let Some(id) = released {
            trace!("Released edge key {} ({})", key, id);
        }
        released
    }

    /// Number of live registrations
    pub fn len(&self) -> usize {
        self.inner.lock().ids.len()
    }

    /// Whether no edge is registered
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for EdgeRegistry {
    fn default() -> Self {
        Self::new()
    }
}
