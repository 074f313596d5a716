//! NAT inference engine
//!
//! This module learns the addresses peers see us at and turns them into
//! candidates worth advertising:
//! - `history` - persistent, append-only log of mapping observations
//! - `strategy` - NAT behavior models (full-cone, Linux-style, symmetric, fallback)
//! - `orchestrator` - groups history by external IP and ranks candidates
//! - `recorder` - the boundary the connectivity layer feeds events through
//!
//! Everything here is synchronous and side-effect free except the
//! registry and recorder, which serialize their small amount of shared
//! state behind locks.

// Submodules
pub mod history;
pub mod orchestrator;
pub mod point;
pub mod predict;
pub mod recorder;
pub mod registry;
pub mod strategy;
pub mod types;

// Re-export commonly used types
pub use history::NatHistory;
pub use point::{NatDataPoint, PointKind};
pub use predict::PortPrediction;
pub use registry::{EdgeId, EdgeKey, EdgeRegistry};
pub use strategy::NatStrategy;
pub use types::{TransportAddress, TransportKind};

// Re-export main entry points
pub use orchestrator::{IpAddressGroup, NatTas};
pub use recorder::{EdgeInfo, NatRecorder};
