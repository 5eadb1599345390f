//! Scene data model
//!
//! Loose nodes are mutated only by the simulation driver. Cluster geometry is
//! computed once per breakpoint and replaced wholesale on breakpoint change.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Size class of a loose node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SizeClass {
    Large,
    Small,
}

/// A loose, individually simulated circle on the left side
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: u32,
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
    pub size_class: SizeClass,
    /// Set once the node has entered the live simulation
    pub admitted: bool,
}

impl Node {
    /// A node parked at `anchor`, at rest, not yet admitted
    pub fn new(id: u32, radius: f32, size_class: SizeClass, anchor: Vec2) -> Self {
        Self {
            id,
            pos: anchor,
            vel: Vec2::ZERO,
            radius,
            size_class,
            admitted: false,
        }
    }

    #[inline]
    pub fn is_large(&self) -> bool {
        self.size_class == SizeClass::Large
    }
}

/// One packed ball inside a cluster
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterBall {
    pub id: u32,
    pub cluster_id: usize,
    pub pos: Vec2,
    pub radius: f32,
    /// The first ball of every cluster carries the label
    pub is_representative: bool,
}

/// Spoke from a cluster's representative ball to another of its balls
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClusterEdge {
    /// Index of the target ball within the cluster
    pub ball_index: usize,
    pub from: Vec2,
    pub to: Vec2,
}

/// A fixed group of balls packed around a center
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cluster {
    pub id: usize,
    pub center: Vec2,
    /// Side of the square the balls were packed into
    pub pack_extent: f32,
    pub balls: Vec<ClusterBall>,
}

impl Cluster {
    /// The labeled ball
    pub fn representative(&self) -> Option<&ClusterBall> {
        self.balls.first()
    }

    /// Text shown on the representative ball
    pub fn label(&self) -> String {
        (self.id + 1).to_string()
    }

    /// Spokes ordered by ball index
    pub fn edges(&self) -> Vec<ClusterEdge> {
        let Some(hub) = self.representative() else {
            return Vec::new();
        };
        self.balls
            .iter()
            .enumerate()
            .skip(1)
            .map(|(ball_index, ball)| ClusterEdge {
                ball_index,
                from: hub.pos,
                to: ball.pos,
            })
            .collect()
    }

    /// True if every ball lies inside the pack square around the center
    pub fn contains_balls(&self) -> bool {
        let half = self.pack_extent / 2.0 + 1e-3;
        self.balls.iter().all(|b| {
            let d = (b.pos - self.center).abs() + Vec2::splat(b.radius);
            d.x <= half && d.y <= half
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cluster() -> Cluster {
        let balls = (0..3)
            .map(|i| ClusterBall {
                id: i,
                cluster_id: 2,
                pos: Vec2::new(100.0 + i as f32 * 10.0, 50.0),
                radius: 4.0,
                is_representative: i == 0,
            })
            .collect();
        Cluster {
            id: 2,
            center: Vec2::new(110.0, 50.0),
            pack_extent: 40.0,
            balls,
        }
    }

    #[test]
    fn test_edges_start_at_representative() {
        let c = cluster();
        let edges = c.edges();
        assert_eq!(edges.len(), 2);
        assert_eq!(edges[0].ball_index, 1);
        assert!(edges.iter().all(|e| e.from == c.balls[0].pos));
        assert_eq!(c.label(), "3");
    }

    #[test]
    fn test_containment() {
        let mut c = cluster();
        assert!(c.contains_balls());
        c.balls[2].pos.x = 200.0;
        assert!(!c.contains_balls());
    }

    #[test]
    fn test_new_node_is_parked() {
        let n = Node::new(7, 5.0, SizeClass::Large, Vec2::new(3.0, 4.0));
        assert_eq!(n.pos, Vec2::new(3.0, 4.0));
        assert_eq!(n.vel, Vec2::ZERO);
        assert!(!n.admitted);
        assert!(n.is_large());
    }
}
