//! Responsive geometry
//!
//! - `breakpoint`: width tiers and their sizing profiles
//! - `resolver`: container box -> canvas size and anchors
//! - `monitor`: classifies container resizes

pub mod breakpoint;
pub mod monitor;
pub mod resolver;

pub use breakpoint::{
    Breakpoint, BreakpointEntry, BreakpointProfile, BreakpointTable, CONTAINER_MAX_WIDTH,
    LayoutMode,
};
pub use monitor::{ResizeMonitor, ResizeOutcome};
pub use resolver::{
    ASPECT_RATIO, CanvasSize, CaptionPlacement, LayoutParams, REFERENCE_HEIGHT, REFERENCE_WIDTH,
    Resolution, Side, resolve,
};
