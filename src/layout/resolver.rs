//! Container size -> breakpoint -> canvas -> layout anchors
//!
//! `resolve` is a pure function: it reads nothing but its arguments and the
//! breakpoint table, so identical inputs always give identical output.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::breakpoint::{Breakpoint, BreakpointProfile, BreakpointTable, CONTAINER_MAX_WIDTH, LayoutMode};

/// Reference canvas the scale factor is measured against
pub const REFERENCE_WIDTH: f32 = 1400.0;
pub const REFERENCE_HEIGHT: f32 = 700.0;
/// Width / height for side-by-side layouts
pub const ASPECT_RATIO: f32 = REFERENCE_WIDTH / REFERENCE_HEIGHT;

/// Stacked canvases never grow past this
pub const STACKED_MAX_WIDTH: f32 = 600.0;
pub const STACKED_MAX_HEIGHT: f32 = 800.0;
const STACKED_HEIGHT_FRACTION: f32 = 0.8;

/// Captions keep at least this distance from the canvas top/bottom
pub const CAPTION_MARGIN: f32 = 20.0;

/// Which half of the scene
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    /// Loose nodes
    Left,
    /// Clusters
    Right,
}

/// Pixel size of the drawing surface
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CanvasSize {
    pub width: f32,
    pub height: f32,
}

impl CanvasSize {
    pub const ZERO: Self = Self {
        width: 0.0,
        height: 0.0,
    };

    pub fn is_empty(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }
}

/// Anchors and scale derived from a canvas
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayoutParams {
    pub mode: LayoutMode,
    pub left_anchor: Vec2,
    pub right_anchor: Vec2,
    /// Multiplier for downstream radii and distances
    pub scale_factor: f32,
    pub spacing: f32,
    pub padding: f32,
}

impl LayoutParams {
    /// All-zero layout used while the container has no usable size
    pub fn degenerate(mode: LayoutMode) -> Self {
        Self {
            mode,
            left_anchor: Vec2::ZERO,
            right_anchor: Vec2::ZERO,
            scale_factor: 0.0,
            spacing: 0.0,
            padding: 0.0,
        }
    }

    #[inline]
    pub fn anchor(&self, side: Side) -> Vec2 {
        match side {
            Side::Left => self.left_anchor,
            Side::Right => self.right_anchor,
        }
    }
}

/// Where a side's caption goes
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CaptionPlacement {
    pub position: Vec2,
    pub font_size: f32,
}

/// Everything derived from one container measurement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resolution {
    pub breakpoint: Breakpoint,
    pub profile: BreakpointProfile,
    pub canvas: CanvasSize,
    pub layout: LayoutParams,
}

impl Resolution {
    /// True when the container had no usable area
    pub fn is_degenerate(&self) -> bool {
        self.canvas.is_empty()
    }

    #[inline]
    pub fn anchor(&self, side: Side) -> Vec2 {
        self.layout.anchor(side)
    }

    /// Caption position for a side, clamped inside the canvas
    pub fn caption(&self, side: Side) -> CaptionPlacement {
        let anchor = self.anchor(side);
        let stacked = self.layout.mode.is_stacked();

        let y = if stacked {
            let title_offset = match side {
                Side::Left => self.profile.left_title_y_offset,
                Side::Right => self.profile.right_title_y_offset,
            };
            anchor.y * self.profile.text_offset + title_offset
        } else {
            anchor.y + self.canvas.height * 0.15
        };

        // Clamp without panicking on canvases shorter than two margins
        let upper = (self.canvas.height - CAPTION_MARGIN).max(0.0);
        let lower = CAPTION_MARGIN.min(upper);
        let y = y.clamp(lower, upper);

        let base_font = if stacked { 14.0 } else { 16.0 };
        CaptionPlacement {
            position: Vec2::new(anchor.x, y),
            font_size: base_font * self.layout.scale_factor,
        }
    }
}

/// Map a container box to breakpoint, canvas and layout
pub fn resolve(table: &BreakpointTable, container_width: f32, container_height: f32) -> Resolution {
    let entry = table.select(container_width);
    let profile = entry.profile.clone();
    let breakpoint = entry.breakpoint;

    let valid = container_width.is_finite()
        && container_height.is_finite()
        && container_width > 0.0
        && container_height > 0.0;

    let canvas = if valid {
        canvas_size(breakpoint, &profile, container_width, container_height)
    } else {
        CanvasSize::ZERO
    };

    let layout = if canvas.is_empty() {
        LayoutParams::degenerate(profile.layout)
    } else {
        layout_params(profile.layout, canvas)
    };

    Resolution {
        breakpoint,
        profile,
        canvas,
        layout,
    }
}

fn canvas_size(
    breakpoint: Breakpoint,
    profile: &BreakpointProfile,
    container_width: f32,
    container_height: f32,
) -> CanvasSize {
    let available_w = (container_width - profile.padding * 2.0).max(0.0);
    let available_h = (container_height - profile.padding * 2.0).max(0.0);

    let (mut width, mut height) = if profile.layout.is_stacked() {
        (
            available_w.min(STACKED_MAX_WIDTH),
            (available_h * STACKED_HEIGHT_FRACTION).min(STACKED_MAX_HEIGHT),
        )
    } else {
        let width_based_height = available_w / ASPECT_RATIO;
        if width_based_height <= available_h {
            (available_w, width_based_height)
        } else {
            (available_h * ASPECT_RATIO, available_h)
        }
    };

    if breakpoint == Breakpoint::Xxl && !profile.layout.is_stacked() {
        width = width.min(CONTAINER_MAX_WIDTH);
        height = width / ASPECT_RATIO;
    }

    CanvasSize {
        width: width.round(),
        height: height.round(),
    }
}

fn layout_params(mode: LayoutMode, canvas: CanvasSize) -> LayoutParams {
    let CanvasSize { width, height } = canvas;
    let scale_factor =
        (width / REFERENCE_WIDTH).min(height / REFERENCE_HEIGHT) * mode.scale_multiplier();

    match mode {
        LayoutMode::Stacked => LayoutParams {
            mode,
            // Each side owns half the height
            left_anchor: Vec2::new(width / 2.0, height / 4.0),
            right_anchor: Vec2::new(width / 2.0, height * 3.0 / 4.0),
            scale_factor,
            spacing: height * 0.4,
            padding: 20.0,
        },
        LayoutMode::Hybrid | LayoutMode::Dual => LayoutParams {
            mode,
            // Each side owns half the width
            left_anchor: Vec2::new(width / 4.0, height / 2.0),
            right_anchor: Vec2::new(width * 3.0 / 4.0, height / 2.0),
            scale_factor,
            spacing: width / 2.0,
            padding: if mode == LayoutMode::Hybrid { 30.0 } else { 50.0 },
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_desktop_dual_layout() {
        let table = BreakpointTable::default();
        let res = resolve(&table, 1280.0, 600.0);

        assert_eq!(res.breakpoint, Breakpoint::Xl);
        assert_eq!(res.layout.mode, LayoutMode::Dual);
        // 1160 x 480 available; height-limited 2:1 box
        assert_eq!(res.canvas, CanvasSize { width: 960.0, height: 480.0 });
        assert_eq!(res.layout.left_anchor, Vec2::new(240.0, 240.0));
        assert_eq!(res.layout.right_anchor, Vec2::new(720.0, 240.0));
        assert!((res.layout.scale_factor - 480.0 / 700.0).abs() < 1e-6);
        assert!(!res.is_degenerate());
    }

    #[test]
    fn test_hybrid_differs_only_in_scale() {
        let table = BreakpointTable::default();
        let res = resolve(&table, 900.0, 600.0);

        assert_eq!(res.breakpoint, Breakpoint::Md);
        assert_eq!(res.layout.mode, LayoutMode::Hybrid);
        // 820 wide available -> 820 x 410
        assert_eq!(res.canvas, CanvasSize { width: 820.0, height: 410.0 });
        assert_eq!(res.layout.left_anchor.x, 205.0);
        assert_eq!(res.layout.right_anchor.x, 615.0);
        let expected = (820.0 / REFERENCE_WIDTH).min(410.0 / REFERENCE_HEIGHT) * 0.9;
        assert!((res.layout.scale_factor - expected).abs() < 1e-6);
    }

    #[test]
    fn test_stacked_splits_height() {
        let table = BreakpointTable::default();
        let res = resolve(&table, 400.0, 800.0);

        assert_eq!(res.breakpoint, Breakpoint::Xs);
        assert_eq!(res.canvas, CanvasSize { width: 360.0, height: 608.0 });
        assert_eq!(res.layout.left_anchor, Vec2::new(180.0, 152.0));
        assert_eq!(res.layout.right_anchor, Vec2::new(180.0, 456.0));
        assert_eq!(res.layout.left_anchor.x, res.layout.right_anchor.x);
    }

    #[test]
    fn test_huge_container_is_clamped() {
        let table = BreakpointTable::default();
        let res = resolve(&table, 4000.0, 3000.0);

        assert_eq!(res.breakpoint, Breakpoint::Xxl);
        assert!(res.canvas.width <= CONTAINER_MAX_WIDTH);
        assert_eq!(res.canvas.height, (res.canvas.width / ASPECT_RATIO).round());
    }

    #[test]
    fn test_zero_size_is_degenerate_not_error() {
        let table = BreakpointTable::default();
        for (w, h) in [(0.0, 0.0), (-5.0, 300.0), (800.0, 0.0), (f32::NAN, 100.0), (30.0, 30.0)] {
            let res = resolve(&table, w, h);
            assert!(res.is_degenerate(), "{w}x{h}");
            assert_eq!(res.layout.scale_factor, 0.0);
        }
    }

    #[test]
    fn test_caption_stays_inside_canvas() {
        let table = BreakpointTable::default();

        // xs right caption offset pushes far up; it must clamp to the top margin
        let res = resolve(&table, 400.0, 800.0);
        let right = res.caption(Side::Right);
        assert!(right.position.y >= CAPTION_MARGIN);
        assert!(right.position.y <= res.canvas.height - CAPTION_MARGIN);

        let res = resolve(&table, 1280.0, 600.0);
        let left = res.caption(Side::Left);
        assert_eq!(left.position.x, res.layout.left_anchor.x);
        assert!((left.position.y - (240.0 + 480.0 * 0.15)).abs() < 1e-4);
        assert!((left.font_size - 16.0 * res.layout.scale_factor).abs() < 1e-6);
    }

    #[test]
    fn test_caption_on_tiny_canvas_does_not_panic() {
        let table = BreakpointTable::default();
        let res = resolve(&table, 100.0, 60.0);
        let caption = res.caption(Side::Left);
        assert!(caption.position.y >= 0.0);
    }

    proptest! {
        #[test]
        fn prop_resolve_is_idempotent(w in -100.0f32..5000.0, h in -100.0f32..3000.0) {
            let table = BreakpointTable::default();
            let a = resolve(&table, w, h);
            let b = resolve(&table, w, h);
            prop_assert_eq!(a, b);
        }

        #[test]
        fn prop_canvas_fits_container(w in 1.0f32..5000.0, h in 1.0f32..3000.0) {
            let table = BreakpointTable::default();
            let res = resolve(&table, w, h);
            prop_assert!(res.canvas.width <= w.min(CONTAINER_MAX_WIDTH) + 0.5);
            prop_assert!(res.canvas.height <= h + 0.5);
        }
    }
}
