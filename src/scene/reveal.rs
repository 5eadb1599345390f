//! Cluster reveal planning
//!
//! Turns a cluster into timed instructions: every ball grows from radius 0
//! and fades in, every spoke's endpoint travels from the cluster center out
//! to its ball, and the representative's label fades in with its ball.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::config::TimingConfig;
use crate::sim::Cluster;

/// Final opacity of a revealed spoke
pub const EDGE_OPACITY: f32 = 0.3;

/// A transition window on the virtual clock
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tween {
    pub start_ms: f64,
    pub duration_ms: f64,
}

impl Tween {
    pub fn new(start_ms: f64, duration_ms: f64) -> Self {
        Self {
            start_ms,
            duration_ms,
        }
    }

    pub fn end_ms(&self) -> f64 {
        self.start_ms + self.duration_ms
    }

    /// Linear progress in `0.0..=1.0` at `now_ms`
    pub fn progress(&self, now_ms: f64) -> f32 {
        if now_ms <= self.start_ms {
            0.0
        } else if self.duration_ms <= 0.0 || now_ms >= self.end_ms() {
            1.0
        } else {
            ((now_ms - self.start_ms) / self.duration_ms) as f32
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BallReveal {
    pub ball_id: u32,
    pub pos: Vec2,
    pub target_radius: f32,
    pub target_opacity: f32,
    pub tween: Tween,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeReveal {
    /// Index of the target ball within its cluster
    pub ball_index: usize,
    /// Fixed end at the representative ball
    pub from: Vec2,
    /// Where the moving endpoint starts
    pub origin: Vec2,
    /// Where the moving endpoint stops
    pub to: Vec2,
    pub target_opacity: f32,
    pub tween: Tween,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelReveal {
    pub text: String,
    pub pos: Vec2,
    pub tween: Tween,
}

/// Everything needed to reveal one cluster
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterReveal {
    pub cluster_id: usize,
    pub start_ms: f64,
    pub balls: Vec<BallReveal>,
    pub edges: Vec<EdgeReveal>,
    pub label: Option<LabelReveal>,
}

impl ClusterReveal {
    /// When the last transition of this cluster ends
    pub fn end_ms(&self) -> f64 {
        let balls = self.balls.iter().map(|b| b.tween.end_ms());
        let edges = self.edges.iter().map(|e| e.tween.end_ms());
        balls.chain(edges).fold(self.start_ms, f64::max)
    }
}

/// When cluster `index` starts revealing, relative to the reveal phase start
#[inline]
pub fn stagger_offset(index: usize, timing: &TimingConfig) -> f64 {
    index as f64 * timing.reveal_stagger_ms
}

/// Delay between the reveal phase start and the steady phase
#[inline]
pub fn steady_offset(num_clusters: usize, timing: &TimingConfig) -> f64 {
    num_clusters as f64 * timing.reveal_stagger_ms + timing.last_transition_ms
}

/// Plan the reveal of `cluster`, starting at `start_ms`
pub fn plan_cluster_reveal(cluster: &Cluster, start_ms: f64, timing: &TimingConfig) -> ClusterReveal {
    let duration = timing.reveal_duration_ms;

    let balls = cluster
        .balls
        .iter()
        .map(|ball| BallReveal {
            ball_id: ball.id,
            pos: ball.pos,
            target_radius: ball.radius,
            target_opacity: 1.0,
            tween: Tween::new(start_ms, duration),
        })
        .collect();

    // Spokes grow one after another in ball order
    let edges = cluster
        .edges()
        .into_iter()
        .enumerate()
        .map(|(order, edge)| EdgeReveal {
            ball_index: edge.ball_index,
            from: edge.from,
            origin: cluster.center,
            to: edge.to,
            target_opacity: EDGE_OPACITY,
            tween: Tween::new(start_ms + order as f64 * timing.edge_delay_ms, duration),
        })
        .collect();

    let label = cluster.representative().map(|rep| LabelReveal {
        text: cluster.label(),
        pos: rep.pos,
        tween: Tween::new(start_ms, duration),
    });

    ClusterReveal {
        cluster_id: cluster.id,
        start_ms,
        balls,
        edges,
        label,
    }
}
