//! Cerebral Viz - responsive force-packing animation
//!
//! Loose nodes grow one by one under a force simulation, settle and freeze;
//! then a ring of packed clusters is revealed and a token loops through the
//! cluster graph. All geometry follows the container's breakpoint.
//!
//! Core modules:
//! - `layout`: Breakpoints, canvas/anchor resolution, resize classification
//! - `sim`: Force engine, circle packing, node/cluster factories
//! - `scene`: Phase machine, timers, reveal planning, orchestrator
//! - `renderer`: Renderer boundary and SVG export
//! - `config`: Tunables and presets

pub mod config;
pub mod error;
pub mod layout;
pub mod renderer;
pub mod scene;
pub mod sim;
#[cfg(target_arch = "wasm32")]
pub mod web;

pub use config::{AnimationConfig, Preset};
pub use error::{Error, Result};
pub use renderer::{Renderer, SvgRenderer};
pub use scene::{Orchestrator, Phase};

use glam::Vec2;

/// Clock constants
pub mod consts {
    /// Fixed frame step (60 Hz), in milliseconds
    pub const FRAME_MS: f64 = 1000.0 / 60.0;
    /// Maximum frames run per `advance` call
    pub const MAX_SUBSTEPS: u32 = 8;
    /// Longer wall-clock gaps (tab in background) are clamped to this
    pub const MAX_FRAME_MS: f64 = 100.0;
}

/// Convert polar (r, theta) to cartesian (x, y)
#[inline]
pub fn polar_to_cartesian(r: f32, theta: f32) -> Vec2 {
    Vec2::new(r * theta.cos(), r * theta.sin())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    #[test]
    fn test_polar_to_cartesian() {
        let p = polar_to_cartesian(10.0, 0.0);
        assert!((p - Vec2::new(10.0, 0.0)).length() < 1e-5);
        let p = polar_to_cartesian(10.0, PI / 2.0);
        assert!((p - Vec2::new(0.0, 10.0)).length() < 1e-5);
    }
}
