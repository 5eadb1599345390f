//! Deterministic simulation module
//!
//! Everything that moves or gets placed lives here. This module must stay
//! pure and deterministic:
//! - Seeded RNG only
//! - Stable iteration order (by node id)
//! - No rendering, timers or platform dependencies

pub mod driver;
pub mod engine;
pub mod factory;
pub mod forces;
pub mod pack;
pub mod state;

pub use driver::{DriverState, SimulationDriver};
pub use engine::ForceSimulation;
pub use factory::{ClusterLayout, NodeFactory, generate_clusters};
pub use forces::{Force, ForceContext};
pub use pack::{PackedCircle, pack_leaves};
pub use state::{Cluster, ClusterBall, ClusterEdge, Node, SizeClass};
