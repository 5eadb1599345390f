//! Phase sequencing
//!
//! - `phase`: the one-way phase sequence
//! - `timers`: owned virtual-clock timer queue
//! - `reveal`: cluster reveal planning
//! - `tokens`: steady-state token flow over the cluster graph
//! - `orchestrator`: drives everything from mount to disposal

pub mod orchestrator;
pub mod phase;
pub mod reveal;
pub mod timers;
pub mod tokens;

pub use orchestrator::Orchestrator;
pub use phase::{Phase, PhaseMachine};
pub use reveal::{
    BallReveal, ClusterReveal, EDGE_OPACITY, EdgeReveal, LabelReveal, Tween, plan_cluster_reveal, stagger_offset,
    steady_offset,
};
pub use timers::{Fired, TimerId, TimerQueue};
pub use tokens::{ClusterDag, DagEdge, StageMark, TokenHop, TokenRun, TokenStage, plan_run};
