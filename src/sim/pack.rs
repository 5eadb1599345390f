//! Circle packing engine
//!
//! Packs weighted leaves of a flat hierarchy into a square. Siblings are
//! placed with the front-chain algorithm (each new circle tangent to two
//! circles on the current hull), then the whole pack is enclosed and scaled
//! to fit. Arithmetic is done in f64; results come back as f32.

use glam::Vec2;

/// A leaf's placement in pack-local coordinates (origin at the square's corner)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PackedCircle {
    pub pos: Vec2,
    pub radius: f32,
}

#[derive(Debug, Clone, Copy, Default)]
struct Circle {
    x: f64,
    y: f64,
    r: f64,
}

/// Place `c` tangent to both `a` and `b`
fn place(b: Circle, a: Circle, c: &mut Circle) {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let d2 = dx * dx + dy * dy;
    if d2 > 0.0 {
        let a2 = (a.r + c.r) * (a.r + c.r);
        let b2 = (b.r + c.r) * (b.r + c.r);
        if a2 > b2 {
            let x = (d2 + b2 - a2) / (2.0 * d2);
            let y = (b2 / d2 - x * x).max(0.0).sqrt();
            c.x = b.x - x * dx - y * dy;
            c.y = b.y - x * dy + y * dx;
        } else {
            let x = (d2 + a2 - b2) / (2.0 * d2);
            let y = (a2 / d2 - x * x).max(0.0).sqrt();
            c.x = a.x + x * dx - y * dy;
            c.y = a.y + x * dy + y * dx;
        }
    } else {
        c.x = a.x + c.r;
        c.y = a.y;
    }
}

fn intersects(a: Circle, b: Circle) -> bool {
    let dr = a.r + b.r - 1e-6;
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    dr > 0.0 && dr * dr > dx * dx + dy * dy
}

/// Squared distance from the origin to the weighted midpoint of a chain link
fn score(a: Circle, b: Circle) -> f64 {
    let ab = a.r + b.r;
    let dx = (a.x * b.r + b.x * a.r) / ab;
    let dy = (a.y * b.r + b.y * a.r) / ab;
    dx * dx + dy * dy
}

/// Pack circles around the origin, returning the enclosing radius
fn pack_siblings(circles: &mut [Circle]) -> f64 {
    let n = circles.len();
    if n == 0 {
        return 0.0;
    }

    circles[0].x = 0.0;
    circles[0].y = 0.0;
    if n == 1 {
        return circles[0].r;
    }

    circles[0].x = -circles[1].r;
    circles[1].x = circles[0].r;
    circles[1].y = 0.0;
    if n == 2 {
        return circles[0].r + circles[1].r;
    }

    let (c0, c1) = (circles[0], circles[1]);
    place(c1, c0, &mut circles[2]);

    // Front chain as a doubly linked ring over circle indices
    let mut next = vec![0usize; n];
    let mut prev = vec![0usize; n];
    let (mut a, mut b) = (0usize, 1usize);
    next[0] = 1;
    prev[2] = 1;
    next[1] = 2;
    prev[0] = 2;
    next[2] = 0;
    prev[1] = 0;

    let mut i = 3;
    'pack: while i < n {
        let (ca, cb) = (circles[a], circles[b]);
        place(ca, cb, &mut circles[i]);
        let c = circles[i];

        // Closest intersecting circle along the chain, searching both ways
        let (mut j, mut k) = (next[b], prev[a]);
        let (mut sj, mut sk) = (circles[b].r, circles[a].r);
        loop {
            if sj <= sk {
                if intersects(circles[j], c) {
                    b = j;
                    next[a] = b;
                    prev[b] = a;
                    continue 'pack;
                }
                sj += circles[j].r;
                j = next[j];
            } else {
                if intersects(circles[k], c) {
                    a = k;
                    next[a] = b;
                    prev[b] = a;
                    continue 'pack;
                }
                sk += circles[k].r;
                k = prev[k];
            }
            if j == next[k] {
                break;
            }
        }

        // Insert between a and b
        prev[i] = a;
        next[i] = b;
        next[a] = i;
        prev[b] = i;
        b = i;

        // Restart from the chain link closest to the centroid
        let mut best = score(circles[a], circles[next[a]]);
        let mut cursor = next[b];
        while cursor != b {
            let s = score(circles[cursor], circles[next[cursor]]);
            if s < best {
                a = cursor;
                best = s;
            }
            cursor = next[cursor];
        }
        b = next[a];
        i += 1;
    }

    let enclosing = enclose(circles);
    for circle in circles.iter_mut() {
        circle.x -= enclosing.x;
        circle.y -= enclosing.y;
    }
    enclosing.r
}

/// A circle containing every input circle (bounding-box centered)
fn enclose(circles: &[Circle]) -> Circle {
    let (mut min_x, mut min_y) = (f64::INFINITY, f64::INFINITY);
    let (mut max_x, mut max_y) = (f64::NEG_INFINITY, f64::NEG_INFINITY);
    for c in circles {
        min_x = min_x.min(c.x - c.r);
        min_y = min_y.min(c.y - c.r);
        max_x = max_x.max(c.x + c.r);
        max_y = max_y.max(c.y + c.r);
    }
    let cx = (min_x + max_x) / 2.0;
    let cy = (min_y + max_y) / 2.0;
    let r = circles
        .iter()
        .map(|c| ((c.x - cx).powi(2) + (c.y - cy).powi(2)).sqrt() + c.r)
        .fold(0.0, f64::max);
    Circle { x: cx, y: cy, r }
}

/// Pack leaves with the given weights into an `extent` x `extent` square.
///
/// Leaf radius is proportional to the square root of its weight. `padding`
/// is the gap between neighbours in output pixels. Non-positive weights are
/// treated as zero-area leaves.
pub fn pack_leaves(weights: &[f32], extent: f32, padding: f32) -> Vec<PackedCircle> {
    if weights.is_empty() {
        return Vec::new();
    }

    let base: Vec<f64> = weights.iter().map(|w| (w.max(0.0) as f64).sqrt()).collect();
    let extent = extent.max(0.0) as f64;
    let mut circles: Vec<Circle> = base
        .iter()
        .map(|&r| Circle { r, ..Default::default() })
        .collect();

    // First pass without padding fixes the unit scale
    let unpadded = pack_siblings(&mut circles);

    // Second pass with padding expressed in pack units
    let gap = if extent > 0.0 && unpadded > 0.0 {
        padding.max(0.0) as f64 * unpadded / extent
    } else {
        0.0
    };
    for (circle, &r) in circles.iter_mut().zip(&base) {
        *circle = Circle { r: r + gap, ..Default::default() };
    }
    let padded = pack_siblings(&mut circles);
    for circle in circles.iter_mut() {
        circle.r -= gap;
    }
    let root_r = padded + gap;

    let k = if root_r > 0.0 { extent / (2.0 * root_r) } else { 0.0 };
    let half = extent / 2.0;
    circles
        .iter()
        .map(|c| PackedCircle {
            pos: Vec2::new((half + c.x * k) as f32, (half + c.y * k) as f32),
            radius: (c.r * k).max(0.0) as f32,
        })
        .collect()
}
