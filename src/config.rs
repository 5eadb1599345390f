//! Animation configuration and presets
//!
//! Every timing constant, force strength and sizing choice is data. The two
//! shipped presets differ mostly in cadence and force tuning.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::layout::BreakpointTable;

/// Named starting points for the tunables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Preset {
    /// Slow, deliberate growth (one node every half second)
    Component,
    /// Fast growth for embedding in a larger page
    #[default]
    Embedded,
}

impl Preset {
    pub fn as_str(&self) -> &'static str {
        match self {
            Preset::Component => "Component",
            Preset::Embedded => "Embedded",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "component" => Some(Preset::Component),
            "embedded" | "embed" => Some(Preset::Embedded),
            _ => None,
        }
    }
}

/// Inclusive-exclusive radius interval sampled uniformly
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RadiusRange {
    pub min: f32,
    pub max: f32,
}

impl RadiusRange {
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    fn validate(&self, field: &'static str) -> Result<()> {
        if !(self.min.is_finite() && self.min > 0.0) {
            return Err(Error::InvalidRadius {
                field,
                value: self.min,
            });
        }
        if !(self.max.is_finite() && self.max >= self.min) {
            return Err(Error::InvalidRange {
                field,
                min: self.min,
                max: self.max,
            });
        }
        Ok(())
    }
}

/// How loose node radii are chosen. Exactly one policy is active per run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum SizingPolicy {
    /// Uniform sample from a fixed range per size class
    Absolute {
        small: RadiusRange,
        large: RadiusRange,
    },
    /// Pack random weights, then scale by the breakpoint multiplier
    Packed {
        value_min: f32,
        value_max: f32,
        /// Side of the packing square before the breakpoint multiplier
        extent: f32,
        padding: f32,
    },
}

impl Default for SizingPolicy {
    fn default() -> Self {
        SizingPolicy::Packed {
            value_min: 10.0,
            value_max: 60.0,
            extent: 300.0,
            padding: 3.0,
        }
    }
}

impl SizingPolicy {
    pub fn absolute_default() -> Self {
        SizingPolicy::Absolute {
            small: RadiusRange::new(8.0, 25.0),
            large: RadiusRange::new(20.0, 35.0),
        }
    }

    fn validate(&self) -> Result<()> {
        match self {
            SizingPolicy::Absolute { small, large } => {
                small.validate("sizing.small")?;
                large.validate("sizing.large")
            }
            SizingPolicy::Packed {
                value_min,
                value_max,
                extent,
                padding,
            } => {
                if !(value_min.is_finite() && *value_min > 0.0 && value_max >= value_min) {
                    return Err(Error::InvalidRange {
                        field: "sizing.value",
                        min: *value_min,
                        max: *value_max,
                    });
                }
                if !(extent.is_finite() && *extent > 0.0) {
                    return Err(Error::InvalidRadius {
                        field: "sizing.extent",
                        value: *extent,
                    });
                }
                if !(padding.is_finite() && *padding >= 0.0) {
                    return Err(Error::InvalidRadius {
                        field: "sizing.padding",
                        value: *padding,
                    });
                }
                Ok(())
            }
        }
    }
}

/// Phase timings (milliseconds)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimingConfig {
    /// Mount -> first admission cycle
    pub start_delay_ms: f64,
    /// Gap between node admissions
    pub admission_interval_ms: f64,
    /// Last admission -> freeze
    pub settle_ms: f64,
    /// Freeze -> cluster reveal
    pub reveal_delay_ms: f64,
    /// Gap between consecutive cluster reveal starts
    pub reveal_stagger_ms: f64,
    /// Ball grow / fade duration
    pub reveal_duration_ms: f64,
    /// Extra per-edge delay, multiplied by the edge index
    pub edge_delay_ms: f64,
    /// Added to `clusters * stagger` before steady state
    pub last_transition_ms: f64,
    /// Caption fade-in duration
    pub caption_fade_ms: f64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            start_delay_ms: 100.0,
            admission_interval_ms: 10.0,
            settle_ms: 6000.0,
            reveal_delay_ms: 1000.0,
            reveal_stagger_ms: 500.0,
            reveal_duration_ms: 800.0,
            edge_delay_ms: 100.0,
            last_transition_ms: 1000.0,
            caption_fade_ms: 1000.0,
        }
    }
}

/// Simulation tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForceConfig {
    /// Energy restored on every admission
    pub initial_alpha: f32,
    /// Engine stops by itself below this
    pub alpha_min: f32,
    pub alpha_decay: f32,
    /// Fraction of velocity lost per tick
    pub velocity_decay: f32,
    /// Pairwise repulsion (negative repels)
    pub charge_strength: f32,
    /// Extra gap added to every node radius for collisions
    pub collision_padding: f32,
    /// Horizontal pull toward the left anchor
    pub pack_strength: f32,
    /// Radial pull toward the left anchor
    pub weak_center_strength: f32,
}

impl Default for ForceConfig {
    fn default() -> Self {
        Self {
            initial_alpha: 0.3,
            alpha_min: 0.001,
            alpha_decay: 0.05,
            velocity_decay: 0.6,
            charge_strength: -80.0,
            collision_padding: 4.0,
            pack_strength: 0.1,
            weak_center_strength: 0.001,
        }
    }
}

/// Right-side cluster shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterConfig {
    pub num_clusters: usize,
    pub balls_per_cluster: usize,
    /// Gap between packed balls
    pub pack_padding: f32,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            num_clusters: 6,
            balls_per_cluster: 8,
            pack_padding: 2.0,
        }
    }
}

/// Steady-state token animation over the inter-cluster graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenFlowConfig {
    pub enabled: bool,
    /// Forward edges per cluster
    pub out_degree: usize,
    /// Edge bend as a fraction of its length
    pub curve: f32,
    /// Interval between runs
    pub step_ms: f64,
    /// Time for the token to cross one edge
    pub hop_ms: f64,
    /// Commit / verify / execute highlight duration
    pub stage_ms: f64,
    pub token_radius: f32,
}

impl Default for TokenFlowConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            out_degree: 2,
            curve: 0.25,
            step_ms: 4000.0,
            hop_ms: 700.0,
            stage_ms: 300.0,
            token_radius: 4.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptionConfig {
    pub left: String,
    pub right: String,
}

impl Default for CaptionConfig {
    fn default() -> Self {
        Self {
            left: "Traditional Node Distribution".into(),
            right: "Cerebral Node Distribution".into(),
        }
    }
}

/// Complete animation configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationConfig {
    pub preset: Preset,
    /// Seed for node sizing and token paths
    pub seed: u64,
    /// Loose nodes on the left side
    pub node_count: usize,
    /// Share of loose nodes flagged large
    pub large_fraction: f32,
    /// Draw spokes from every loose node to the first one
    pub show_lines: bool,
    pub sizing: SizingPolicy,
    pub timing: TimingConfig,
    pub forces: ForceConfig,
    pub clusters: ClusterConfig,
    pub tokens: TokenFlowConfig,
    pub captions: CaptionConfig,
    pub breakpoints: BreakpointTable,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            preset: Preset::Embedded,
            seed: 0x5EED,
            node_count: 60,
            large_fraction: 0.2,
            show_lines: true,
            sizing: SizingPolicy::default(),
            timing: TimingConfig::default(),
            forces: ForceConfig::default(),
            clusters: ClusterConfig::default(),
            tokens: TokenFlowConfig::default(),
            captions: CaptionConfig::default(),
            breakpoints: BreakpointTable::default(),
        }
    }
}

impl AnimationConfig {
    /// Create a config from a preset (applies preset defaults)
    pub fn from_preset(preset: Preset) -> Self {
        let mut config = Self::default();
        config.apply_preset(preset);
        config
    }

    /// Apply a preset's cadence and force tuning
    pub fn apply_preset(&mut self, preset: Preset) {
        self.preset = preset;
        match preset {
            Preset::Component => {
                self.timing.admission_interval_ms = 500.0;
                self.timing.settle_ms = 8000.0;
                self.forces.alpha_decay = 0.008;
                self.forces.charge_strength = -300.0;
                self.forces.collision_padding = 3.0;
            }
            Preset::Embedded => {
                self.timing.admission_interval_ms = 10.0;
                self.timing.settle_ms = 6000.0;
                self.forces.alpha_decay = 0.05;
                self.forces.charge_strength = -80.0;
                self.forces.collision_padding = 4.0;
            }
        }
    }

    /// Parse and validate a JSON configuration.
    ///
    /// The named preset (Embedded when absent) supplies the starting values;
    /// fields present in the document override them, nested objects key by key.
    pub fn from_json(json: &str) -> Result<Self> {
        let overrides: Value = serde_json::from_str(json)?;
        let preset = match overrides.get("preset") {
            Some(name) => Preset::deserialize(name)?,
            None => Preset::default(),
        };
        let mut merged = serde_json::to_value(Self::from_preset(preset))?;
        merge_json(&mut merged, overrides);

        let config: Self = serde_json::from_value(merged)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject anything that would produce degenerate geometry or a stuck timeline
    pub fn validate(&self) -> Result<()> {
        let counts = [
            ("node_count", self.node_count),
            ("clusters.num_clusters", self.clusters.num_clusters),
            ("clusters.balls_per_cluster", self.clusters.balls_per_cluster),
        ];
        for (field, value) in counts {
            if value == 0 {
                return Err(Error::InvalidCount { field, value });
            }
        }

        if !(0.0..=1.0).contains(&self.large_fraction) {
            return Err(Error::InvalidFraction {
                field: "large_fraction",
                value: self.large_fraction,
            });
        }

        self.sizing.validate()?;

        if !(self.clusters.pack_padding.is_finite() && self.clusters.pack_padding >= 0.0) {
            return Err(Error::InvalidRadius {
                field: "clusters.pack_padding",
                value: self.clusters.pack_padding,
            });
        }

        let t = &self.timing;
        let durations = [
            ("timing.start_delay_ms", t.start_delay_ms),
            ("timing.settle_ms", t.settle_ms),
            ("timing.reveal_delay_ms", t.reveal_delay_ms),
            ("timing.reveal_stagger_ms", t.reveal_stagger_ms),
            ("timing.reveal_duration_ms", t.reveal_duration_ms),
            ("timing.edge_delay_ms", t.edge_delay_ms),
            ("timing.last_transition_ms", t.last_transition_ms),
            ("timing.caption_fade_ms", t.caption_fade_ms),
            ("tokens.hop_ms", self.tokens.hop_ms),
            ("tokens.stage_ms", self.tokens.stage_ms),
        ];
        for (field, value) in durations {
            if !(value.is_finite() && value >= 0.0) {
                return Err(Error::InvalidTiming { field, value });
            }
        }
        // Repeating timers need at least a millisecond between firings
        let periods = [
            ("timing.admission_interval_ms", t.admission_interval_ms),
            ("tokens.step_ms", self.tokens.step_ms),
        ];
        for (field, value) in periods {
            if !(value.is_finite() && value >= 1.0) {
                return Err(Error::InvalidTiming { field, value });
            }
        }

        let f = &self.forces;
        let fractions = [
            ("forces.initial_alpha", f.initial_alpha),
            ("forces.alpha_min", f.alpha_min),
            ("forces.alpha_decay", f.alpha_decay),
            ("forces.velocity_decay", f.velocity_decay),
        ];
        for (field, value) in fractions {
            if !(0.0..=1.0).contains(&value) {
                return Err(Error::InvalidFraction { field, value });
            }
        }
        if !(f.collision_padding.is_finite() && f.collision_padding >= 0.0) {
            return Err(Error::InvalidRadius {
                field: "forces.collision_padding",
                value: f.collision_padding,
            });
        }
        let strengths = [
            ("forces.charge_strength", f.charge_strength),
            ("forces.pack_strength", f.pack_strength),
            ("forces.weak_center_strength", f.weak_center_strength),
            ("tokens.curve", self.tokens.curve),
        ];
        for (field, value) in strengths {
            if !value.is_finite() {
                return Err(Error::NonFinite { field, value });
            }
        }
        if !(self.tokens.token_radius.is_finite() && self.tokens.token_radius > 0.0) {
            return Err(Error::InvalidRadius {
                field: "tokens.token_radius",
                value: self.tokens.token_radius,
            });
        }

        self.breakpoints.validate()
    }

    /// Number of loose nodes flagged large
    pub fn large_count(&self) -> usize {
        ((self.node_count as f32) * self.large_fraction).floor() as usize
    }
}

/// Overlay `overrides` onto `base`. Objects merge recursively, except that
/// switching a sizing `policy` replaces the whole object; anything else is
/// replaced outright.
fn merge_json(base: &mut Value, overrides: Value) {
    match (base, overrides) {
        (Value::Object(base), Value::Object(overrides)) => {
            let retagged = matches!(
                (base.get("policy"), overrides.get("policy")),
                (Some(old), Some(new)) if old != new
            );
            if retagged {
                base.clear();
            }
            for (key, value) in overrides {
                match base.get_mut(&key) {
                    Some(slot) => merge_json(slot, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}
