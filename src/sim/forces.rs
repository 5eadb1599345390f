//! Force terms for the loose-node simulation
//!
//! Each force is a pure function of the node list and a `ForceContext`
//! (current energy and the live anchor). It returns one velocity delta per
//! node; the engine applies them in force order.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Pairs closer than this are treated as this far apart (squared)
const DISTANCE_MIN2: f32 = 1.0;

/// Per-tick inputs shared by every force
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForceContext {
    /// Current simulation energy
    pub alpha: f32,
    /// Left-side anchor, read from the current layout every tick
    pub anchor: Vec2,
}

/// A force term attached to the engine under a name
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Force {
    /// Pairwise inverse-distance repulsion (negative strength repels)
    ManyBody { strength: f32 },
    /// Overlap resolution for discs of `radius + padding`
    Collide { padding: f32, strength: f32 },
    /// One-dimensional pull toward the anchor's x
    PackX { strength: f32 },
    /// Radial pull toward the anchor in both axes
    WeakCenter { strength: f32 },
}

impl Force {
    /// Velocity deltas this force adds to each node
    pub fn contribution(&self, positions: &[Vec2], velocities: &[Vec2], radii: &[f32], ctx: &ForceContext) -> Vec<Vec2> {
        match *self {
            Force::ManyBody { strength } => many_body(positions, strength, ctx.alpha),
            Force::Collide { padding, strength } => collide(positions, velocities, radii, padding, strength),
            Force::PackX { strength } => positions
                .iter()
                .map(|p| Vec2::new((ctx.anchor.x - p.x) * strength * ctx.alpha, 0.0))
                .collect(),
            Force::WeakCenter { strength } => positions
                .iter()
                .map(|p| {
                    let d = ctx.anchor - *p;
                    if d.length_squared() > 0.0 {
                        d * strength * ctx.alpha
                    } else {
                        Vec2::ZERO
                    }
                })
                .collect(),
        }
    }
}

/// Tiny deterministic offset (never zero)
#[inline]
fn jiggle(i: usize, j: usize) -> f32 {
    let hash = (i as u64)
        .wrapping_mul(0x9E37_79B9_7F4A_7C15)
        .wrapping_add((j as u64).wrapping_mul(0xC2B2_AE3D_27D4_EB4F))
        >> 33;
    (((hash % 1000) as f32 + 0.5) / 1000.0 - 0.5) * 1e-6
}

/// Separation vector for a coincident pair; `pair_offset(j, i) == -pair_offset(i, j)`
#[inline]
fn pair_offset(i: usize, j: usize) -> Vec2 {
    let (lo, hi, sign) = if i < j { (i, j, 1.0) } else { (j, i, -1.0) };
    Vec2::new(jiggle(lo, hi), jiggle(hi, lo)) * sign
}

fn many_body(positions: &[Vec2], strength: f32, alpha: f32) -> Vec<Vec2> {
    let mut deltas = vec![Vec2::ZERO; positions.len()];
    for (i, pi) in positions.iter().enumerate() {
        for (j, pj) in positions.iter().enumerate() {
            if i == j {
                continue;
            }
            let mut d = *pj - *pi;
            let offset = pair_offset(j, i);
            if d.x == 0.0 {
                d.x = offset.x;
            }
            if d.y == 0.0 {
                d.y = offset.y;
            }
            let mut l = d.length_squared();
            if l < DISTANCE_MIN2 {
                l = (DISTANCE_MIN2 * l).sqrt();
            }
            deltas[i] += d * (strength * alpha / l);
        }
    }
    deltas
}

fn collide(positions: &[Vec2], velocities: &[Vec2], radii: &[f32], padding: f32, strength: f32) -> Vec<Vec2> {
    let n = positions.len();
    let mut deltas = vec![Vec2::ZERO; n];
    // Predicted positions after this tick's velocity
    let next: Vec<Vec2> = positions.iter().zip(velocities).map(|(p, v)| *p + *v).collect();

    for i in 0..n {
        let ri = radii[i] + padding;
        for j in (i + 1)..n {
            let rj = radii[j] + padding;
            let r = ri + rj;
            let mut d = next[i] - next[j];
            let mut l = d.length_squared();
            if l >= r * r {
                continue;
            }
            let offset = pair_offset(i, j);
            if d.x == 0.0 {
                d.x = offset.x;
                l += d.x * d.x;
            }
            if d.y == 0.0 {
                d.y = offset.y;
                l += d.y * d.y;
            }
            let dist = l.sqrt();
            let push = d * ((r - dist) / dist * strength);
            // Smaller disc moves more
            let share = (rj * rj) / (ri * ri + rj * rj);
            deltas[i] += push * share;
            deltas[j] -= push * (1.0 - share);
        }
    }
    deltas
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(alpha: f32) -> ForceContext {
        ForceContext {
            alpha,
            anchor: Vec2::new(100.0, 50.0),
        }
    }

    #[test]
    fn test_many_body_repels() {
        let pos = [Vec2::new(0.0, 0.0), Vec2::new(10.0, 0.0)];
        let vel = [Vec2::ZERO; 2];
        let deltas = Force::ManyBody { strength: -30.0 }.contribution(&pos, &vel, &[1.0, 1.0], &ctx(1.0));
        assert!(deltas[0].x < 0.0);
        assert!(deltas[1].x > 0.0);
        assert!((deltas[0].x + deltas[1].x).abs() < 1e-5);
    }

    #[test]
    fn test_coincident_nodes_separate() {
        let pos = [Vec2::splat(5.0); 3];
        let vel = [Vec2::ZERO; 3];
        let deltas = Force::ManyBody { strength: -80.0 }.contribution(&pos, &vel, &[3.0; 3], &ctx(0.3));
        assert!(deltas.iter().all(|d| d.is_finite()));
        assert!(deltas.iter().any(|d| d.length() > 0.0));
    }

    #[test]
    fn test_collide_pushes_overlap_apart() {
        let pos = [Vec2::new(0.0, 0.0), Vec2::new(4.0, 0.0)];
        let vel = [Vec2::ZERO; 2];
        let deltas = Force::Collide { padding: 1.0, strength: 1.0 }.contribution(&pos, &vel, &[5.0, 5.0], &ctx(1.0));
        assert!(deltas[0].x < 0.0);
        assert!(deltas[1].x > 0.0);
        // Equal radii: each moves half the overlap (12 - 4) / 2
        assert!((deltas[1].x - 4.0).abs() < 1e-4);
    }

    #[test]
    fn test_collide_ignores_separated() {
        let pos = [Vec2::new(0.0, 0.0), Vec2::new(40.0, 0.0)];
        let vel = [Vec2::ZERO; 2];
        let deltas = Force::Collide { padding: 4.0, strength: 1.0 }.contribution(&pos, &vel, &[5.0, 5.0], &ctx(1.0));
        assert_eq!(deltas, vec![Vec2::ZERO; 2]);
    }

    #[test]
    fn test_pack_x_is_horizontal_only() {
        let pos = [Vec2::new(0.0, 0.0), Vec2::new(200.0, 300.0)];
        let vel = [Vec2::ZERO; 2];
        let deltas = Force::PackX { strength: 0.1 }.contribution(&pos, &vel, &[1.0; 2], &ctx(0.5));
        assert!((deltas[0].x - 5.0).abs() < 1e-5);
        assert!((deltas[1].x + 5.0).abs() < 1e-5);
        assert!(deltas.iter().all(|d| d.y == 0.0));
    }

    #[test]
    fn test_weak_center_pulls_toward_anchor() {
        let pos = [Vec2::new(0.0, 0.0), Vec2::new(100.0, 50.0)];
        let vel = [Vec2::ZERO; 2];
        let deltas = Force::WeakCenter { strength: 0.001 }.contribution(&pos, &vel, &[1.0; 2], &ctx(1.0));
        assert!(deltas[0].x > 0.0 && deltas[0].y > 0.0);
        assert_eq!(deltas[1], Vec2::ZERO);
    }

    #[test]
    fn test_jiggle_is_never_zero() {
        for i in 0..50 {
            for j in 0..50 {
                assert!(jiggle(i, j) != 0.0);
                if i != j {
                    assert_eq!(pair_offset(i, j), -pair_offset(j, i));
                }
            }
        }
    }
}
