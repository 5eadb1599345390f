//! Responsive breakpoints and their per-tier sizing profiles

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Container widths above this are treated as this width
pub const CONTAINER_MAX_WIDTH: f32 = 1600.0;

/// Named viewport-width tier (Tailwind-compatible thresholds)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Breakpoint {
    #[serde(rename = "xs")]
    Xs,
    #[serde(rename = "sm")]
    Sm,
    #[serde(rename = "md")]
    Md,
    #[serde(rename = "lg")]
    Lg,
    #[serde(rename = "xl")]
    Xl,
    #[serde(rename = "2xl")]
    Xxl,
}

impl Breakpoint {
    pub const ALL: [Breakpoint; 6] = [
        Breakpoint::Xs,
        Breakpoint::Sm,
        Breakpoint::Md,
        Breakpoint::Lg,
        Breakpoint::Xl,
        Breakpoint::Xxl,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Breakpoint::Xs => "xs",
            Breakpoint::Sm => "sm",
            Breakpoint::Md => "md",
            Breakpoint::Lg => "lg",
            Breakpoint::Xl => "xl",
            Breakpoint::Xxl => "2xl",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "xs" => Some(Breakpoint::Xs),
            "sm" => Some(Breakpoint::Sm),
            "md" => Some(Breakpoint::Md),
            "lg" => Some(Breakpoint::Lg),
            "xl" => Some(Breakpoint::Xl),
            "2xl" | "xxl" => Some(Breakpoint::Xxl),
            _ => None,
        }
    }

    /// Default minimum container width for this tier
    pub fn min_width(&self) -> f32 {
        match self {
            Breakpoint::Xs => 0.0,
            Breakpoint::Sm => 640.0,
            Breakpoint::Md => 768.0,
            Breakpoint::Lg => 1024.0,
            Breakpoint::Xl => 1280.0,
            Breakpoint::Xxl => 1536.0,
        }
    }
}

/// How the two animation sides share the canvas
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutMode {
    /// Single column: left side on top, right side below
    Stacked,
    /// Side by side with a reduced scale factor
    Hybrid,
    /// Side by side at full scale
    Dual,
}

impl LayoutMode {
    /// Multiplier applied on top of the canvas/reference ratio
    pub fn scale_multiplier(&self) -> f32 {
        match self {
            LayoutMode::Stacked => 0.8,
            LayoutMode::Hybrid => 0.9,
            LayoutMode::Dual => 1.0,
        }
    }

    pub fn is_stacked(&self) -> bool {
        matches!(self, LayoutMode::Stacked)
    }
}

/// Sizing knobs for one breakpoint tier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreakpointProfile {
    /// Padding between container edge and canvas (px)
    pub padding: f32,
    pub layout: LayoutMode,
    /// Caption y multiplier (stacked layouts only)
    pub text_offset: f32,
    /// Extra caption y offset for the left side (stacked layouts only)
    #[serde(default)]
    pub left_title_y_offset: f32,
    /// Extra caption y offset for the right side (stacked layouts only)
    #[serde(default)]
    pub right_title_y_offset: f32,
    /// Radius multiplier for small loose nodes
    pub left_ball_size_multiplier: f32,
    /// Radius multiplier for large loose nodes
    pub left_large_ball_multiplier: f32,
    /// Nominal cluster ball radius
    pub cluster_ball_size: f32,
    /// Distance from the right anchor to each cluster center (before scaling)
    pub cluster_radius: f32,
    /// Side of the square each cluster is packed into (before scaling)
    pub cluster_pack_size: f32,
}

/// One row of the breakpoint table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreakpointEntry {
    pub breakpoint: Breakpoint,
    pub min_width: f32,
    pub profile: BreakpointProfile,
}

/// Ordered breakpoint thresholds with their profiles
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreakpointTable {
    entries: Vec<BreakpointEntry>,
}

impl Default for BreakpointTable {
    fn default() -> Self {
        #[allow(clippy::too_many_arguments)]
        fn profile(
            padding: f32,
            layout: LayoutMode,
            text_offset: f32,
            titles: (f32, f32),
            multipliers: (f32, f32),
            cluster_ball_size: f32,
            cluster_radius: f32,
            cluster_pack_size: f32,
        ) -> BreakpointProfile {
            BreakpointProfile {
                padding,
                layout,
                text_offset,
                left_title_y_offset: titles.0,
                right_title_y_offset: titles.1,
                left_ball_size_multiplier: multipliers.0,
                left_large_ball_multiplier: multipliers.1,
                cluster_ball_size,
                cluster_radius,
                cluster_pack_size,
            }
        }

        use LayoutMode::*;
        let rows = [
            (Breakpoint::Xs, profile(20.0, Stacked, 0.8, (30.0, -200.0), (0.6, 0.5), 6.0, 300.0, 170.0)),
            (Breakpoint::Sm, profile(30.0, Stacked, 0.4, (80.0, 0.0), (0.7, 0.5), 6.0, 230.0, 160.0)),
            (Breakpoint::Md, profile(40.0, Hybrid, 0.3, (0.0, 0.0), (0.8, 0.7), 8.0, 200.0, 130.0)),
            (Breakpoint::Lg, profile(50.0, Dual, 0.25, (0.0, 0.0), (0.9, 0.8), 9.0, 180.0, 110.0)),
            (Breakpoint::Xl, profile(60.0, Dual, 0.2, (0.0, 0.0), (1.0, 0.9), 10.0, 220.0, 120.0)),
            (Breakpoint::Xxl, profile(60.0, Dual, 0.15, (0.0, 0.0), (1.1, 1.0), 14.0, 220.0, 130.0)),
        ];

        Self {
            entries: rows
                .into_iter()
                .map(|(breakpoint, profile)| BreakpointEntry {
                    breakpoint,
                    min_width: breakpoint.min_width(),
                    profile,
                })
                .collect(),
        }
    }
}

impl BreakpointTable {
    /// Build a table from explicit rows, validating threshold order
    pub fn new(entries: Vec<BreakpointEntry>) -> Result<Self> {
        let table = Self { entries };
        table.validate()?;
        Ok(table)
    }

    /// Thresholds must start at 0 and strictly increase; profiles must be sane
    pub fn validate(&self) -> Result<()> {
        let first = self
            .entries
            .first()
            .ok_or_else(|| Error::InvalidBreakpointTable("table is empty".into()))?;
        if first.min_width != 0.0 {
            return Err(Error::InvalidBreakpointTable(format!(
                "first threshold must be 0, got {}",
                first.min_width
            )));
        }

        for pair in self.entries.windows(2) {
            if !(pair[1].min_width > pair[0].min_width) {
                return Err(Error::InvalidBreakpointTable(format!(
                    "{} ({}) does not exceed {} ({})",
                    pair[1].breakpoint.as_str(),
                    pair[1].min_width,
                    pair[0].breakpoint.as_str(),
                    pair[0].min_width
                )));
            }
            if pair[1].breakpoint == pair[0].breakpoint {
                return Err(Error::InvalidBreakpointTable(format!(
                    "duplicate breakpoint {}",
                    pair[1].breakpoint.as_str()
                )));
            }
        }

        for entry in &self.entries {
            let p = &entry.profile;
            let name = entry.breakpoint.as_str();
            let positive = [
                ("left_ball_size_multiplier", p.left_ball_size_multiplier),
                ("left_large_ball_multiplier", p.left_large_ball_multiplier),
                ("cluster_ball_size", p.cluster_ball_size),
                ("cluster_radius", p.cluster_radius),
                ("cluster_pack_size", p.cluster_pack_size),
            ];
            for (field, value) in positive {
                if !(value.is_finite() && value > 0.0) {
                    return Err(Error::InvalidBreakpointTable(format!(
                        "{name}.{field} must be positive (got {value})"
                    )));
                }
            }
            if !(p.padding.is_finite() && p.padding >= 0.0) {
                return Err(Error::InvalidBreakpointTable(format!(
                    "{name}.padding must be non-negative (got {})",
                    p.padding
                )));
            }
        }

        Ok(())
    }

    /// Select the highest tier whose threshold does not exceed the clamped width
    pub fn select(&self, container_width: f32) -> &BreakpointEntry {
        let width = if container_width.is_finite() {
            container_width.clamp(0.0, CONTAINER_MAX_WIDTH)
        } else {
            0.0
        };

        self.entries
            .iter()
            .rev()
            .find(|e| e.min_width <= width)
            .unwrap_or(&self.entries[0])
    }

    /// Profile for a specific breakpoint, if the table defines it
    pub fn profile(&self, breakpoint: Breakpoint) -> Option<&BreakpointProfile> {
        self.entries
            .iter()
            .find(|e| e.breakpoint == breakpoint)
            .map(|e| &e.profile)
    }

    pub fn entries(&self) -> &[BreakpointEntry] {
        &self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_default_thresholds() {
        let table = BreakpointTable::default();
        assert!(table.validate().is_ok());

        let cases = [
            (0.0, Breakpoint::Xs),
            (639.0, Breakpoint::Xs),
            (640.0, Breakpoint::Sm),
            (767.9, Breakpoint::Sm),
            (768.0, Breakpoint::Md),
            (1023.0, Breakpoint::Md),
            (1024.0, Breakpoint::Lg),
            (1280.0, Breakpoint::Xl),
            (1535.0, Breakpoint::Xl),
            (1536.0, Breakpoint::Xxl),
            (5000.0, Breakpoint::Xxl),
        ];
        for (width, expected) in cases {
            assert_eq!(table.select(width).breakpoint, expected, "width {width}");
        }
    }

    #[test]
    fn test_garbage_width_selects_smallest() {
        let table = BreakpointTable::default();
        assert_eq!(table.select(-10.0).breakpoint, Breakpoint::Xs);
        assert_eq!(table.select(f32::NAN).breakpoint, Breakpoint::Xs);
    }

    #[test]
    fn test_rejects_unordered_table() {
        let mut entries = BreakpointTable::default().entries().to_vec();
        entries.swap(2, 3);
        assert!(matches!(
            BreakpointTable::new(entries),
            Err(Error::InvalidBreakpointTable(_))
        ));
    }

    #[test]
    fn test_rejects_nonzero_first_threshold() {
        let mut entries = BreakpointTable::default().entries().to_vec();
        entries.remove(0);
        assert!(BreakpointTable::new(entries).is_err());
        assert!(BreakpointTable::new(Vec::new()).is_err());
    }

    #[test]
    fn test_rejects_zero_multiplier() {
        let mut entries = BreakpointTable::default().entries().to_vec();
        entries[4].profile.cluster_radius = 0.0;
        assert!(BreakpointTable::new(entries).is_err());
    }

    #[test]
    fn test_breakpoint_names_round_trip() {
        for bp in Breakpoint::ALL {
            assert_eq!(Breakpoint::from_str(bp.as_str()), Some(bp));
        }
        assert_eq!(Breakpoint::from_str("huge"), None);
    }

    proptest! {
        #[test]
        fn prop_selection_is_monotonic(a in 0.0f32..4000.0, b in 0.0f32..4000.0) {
            let table = BreakpointTable::default();
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(table.select(lo).breakpoint <= table.select(hi).breakpoint);
        }
    }
}
