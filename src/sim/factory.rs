//! Node factory
//!
//! Builds the loose node population for the left side and the packed
//! clusters for the right side. Randomness comes from a seeded PCG stream so
//! the same seed always produces the same scene.

use std::f32::consts::TAU;

use glam::Vec2;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::pack::pack_leaves;
use super::state::{Cluster, ClusterBall, Node, SizeClass};
use crate::config::{ClusterConfig, RadiusRange, SizingPolicy};
use crate::error::{Error, Result};
use crate::layout::{BreakpointProfile, Resolution, Side};

/// Geometry for one generation of clusters, fixed per breakpoint
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClusterLayout {
    /// Right-side anchor the clusters orbit
    pub anchor: Vec2,
    /// Distance from the anchor to every cluster center
    pub orbit_radius: f32,
    /// Side of the square each cluster is packed into
    pub pack_extent: f32,
    /// Upper bound on a ball's radius
    pub ball_radius: f32,
    /// Gap between packed balls
    pub padding: f32,
}

impl ClusterLayout {
    /// Scale the breakpoint profile by the current layout
    pub fn from_resolution(resolution: &Resolution, config: &ClusterConfig) -> Self {
        let scale = resolution.layout.scale_factor;
        let profile = &resolution.profile;
        Self {
            anchor: resolution.anchor(Side::Right),
            orbit_radius: profile.cluster_radius * scale,
            pack_extent: profile.cluster_pack_size * scale,
            ball_radius: profile.cluster_ball_size * scale,
            padding: config.pack_padding,
        }
    }
}

pub struct NodeFactory {
    rng: Pcg32,
}

impl NodeFactory {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    /// Create `count` loose nodes parked at `anchor`.
    ///
    /// `floor(count * large_fraction)` of them, chosen by a seeded shuffle,
    /// are flagged large. Radii come from whichever sizing policy is active.
    pub fn generate_loose_nodes(
        &mut self,
        count: usize,
        large_fraction: f32,
        policy: &SizingPolicy,
        profile: &BreakpointProfile,
        anchor: Vec2,
    ) -> Result<Vec<Node>> {
        if count == 0 {
            return Err(Error::InvalidCount {
                field: "node_count",
                value: count,
            });
        }
        if !(0.0..=1.0).contains(&large_fraction) {
            return Err(Error::InvalidFraction {
                field: "large_fraction",
                value: large_fraction,
            });
        }

        let large_count = ((count as f32) * large_fraction).floor() as usize;
        let mut order: Vec<usize> = (0..count).collect();
        order.shuffle(&mut self.rng);
        let classes: Vec<SizeClass> = order
            .iter()
            .map(|&rank| if rank < large_count { SizeClass::Large } else { SizeClass::Small })
            .collect();

        let radii = match policy {
            SizingPolicy::Absolute { small, large } => classes
                .iter()
                .map(|class| match class {
                    SizeClass::Large => self.sample_radius(large),
                    SizeClass::Small => self.sample_radius(small),
                })
                .collect::<Result<Vec<f32>>>()?,
            SizingPolicy::Packed {
                value_min,
                value_max,
                extent,
                padding,
            } => {
                let weights: Vec<f32> = (0..count)
                    .map(|_| {
                        if value_max > value_min {
                            self.rng.random_range(*value_min..*value_max)
                        } else {
                            *value_min
                        }
                    })
                    .collect();
                pack_leaves(&weights, *extent, *padding)
                    .iter()
                    .zip(&classes)
                    .map(|(packed, class)| {
                        packed.radius
                            * match class {
                                SizeClass::Large => profile.left_large_ball_multiplier,
                                SizeClass::Small => profile.left_ball_size_multiplier,
                            }
                    })
                    .collect()
            }
        };

        let nodes: Vec<Node> = radii
            .into_iter()
            .zip(classes)
            .enumerate()
            .map(|(id, (radius, class))| Node::new(id as u32, radius, class, anchor))
            .collect();

        if let Some(bad) = nodes.iter().find(|n| !(n.radius.is_finite() && n.radius > 0.0)) {
            return Err(Error::InvalidRadius {
                field: "node radius",
                value: bad.radius,
            });
        }

        log::debug!(
            "Generated {} loose nodes ({} large) at ({:.1}, {:.1})",
            nodes.len(),
            large_count,
            anchor.x,
            anchor.y
        );
        Ok(nodes)
    }

    fn sample_radius(&mut self, range: &RadiusRange) -> Result<f32> {
        if !(range.min.is_finite() && range.min > 0.0) {
            return Err(Error::InvalidRadius {
                field: "sizing",
                value: range.min,
            });
        }
        if !(range.max.is_finite() && range.max >= range.min) {
            return Err(Error::InvalidRange {
                field: "sizing",
                min: range.min,
                max: range.max,
            });
        }
        if range.max == range.min {
            return Ok(range.min);
        }
        Ok(self.rng.random_range(range.min..range.max))
    }
}

/// Place `num_clusters` clusters evenly on a circle around the layout anchor
/// and pack `balls_per_cluster` equal balls into each one.
///
/// Cluster `i` sits at angle `2πi/N`. The first ball of each cluster is its
/// representative.
pub fn generate_clusters(num_clusters: usize, balls_per_cluster: usize, layout: &ClusterLayout) -> Result<Vec<Cluster>> {
    let counts = [
        ("clusters.num_clusters", num_clusters),
        ("clusters.balls_per_cluster", balls_per_cluster),
    ];
    for (field, value) in counts {
        if value == 0 {
            return Err(Error::InvalidCount { field, value });
        }
    }
    let radii = [
        ("cluster orbit radius", layout.orbit_radius),
        ("cluster pack extent", layout.pack_extent),
        ("cluster ball radius", layout.ball_radius),
    ];
    for (field, value) in radii {
        if !(value.is_finite() && value > 0.0) {
            return Err(Error::InvalidRadius { field, value });
        }
    }

    let weights = vec![1.0; balls_per_cluster];
    let packed = pack_leaves(&weights, layout.pack_extent, layout.padding);
    let half = Vec2::splat(layout.pack_extent / 2.0);

    let mut next_id = 0u32;
    let clusters = (0..num_clusters)
        .map(|i| {
            let angle = TAU * i as f32 / num_clusters as f32;
            let center = layout.anchor + crate::polar_to_cartesian(layout.orbit_radius, angle);
            let balls = packed
                .iter()
                .enumerate()
                .map(|(j, leaf)| {
                    let ball = ClusterBall {
                        id: next_id,
                        cluster_id: i,
                        pos: leaf.pos + center - half,
                        radius: leaf.radius.min(layout.ball_radius),
                        is_representative: j == 0,
                    };
                    next_id += 1;
                    ball
                })
                .collect();
            Cluster {
                id: i,
                center,
                pack_extent: layout.pack_extent,
                balls,
            }
        })
        .collect();
    Ok(clusters)
}
