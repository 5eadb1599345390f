//! Container resize tracking
//!
//! Fed with container box sizes (not window sizes). Tells the caller whether
//! a measurement changed nothing, only the raw size, or the breakpoint.

use super::breakpoint::{Breakpoint, BreakpointTable};
use super::resolver::{Resolution, resolve};

/// What a new measurement means for dependents
#[derive(Debug, Clone, PartialEq)]
pub enum ResizeOutcome {
    /// Same box as last time
    Unchanged,
    /// Size changed within the same breakpoint
    Resized(Resolution),
    /// Breakpoint changed (or first measurement)
    BreakpointChanged {
        from: Option<Breakpoint>,
        resolution: Resolution,
    },
}

impl ResizeOutcome {
    pub fn resolution(&self) -> Option<&Resolution> {
        match self {
            ResizeOutcome::Unchanged => None,
            ResizeOutcome::Resized(r) => Some(r),
            ResizeOutcome::BreakpointChanged { resolution, .. } => Some(resolution),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ResizeMonitor {
    last_size: Option<(f32, f32)>,
    breakpoint: Option<Breakpoint>,
}

impl ResizeMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current breakpoint, once anything has been observed
    pub fn breakpoint(&self) -> Option<Breakpoint> {
        self.breakpoint
    }

    /// Record a container measurement and classify it
    pub fn observe(&mut self, table: &BreakpointTable, width: f32, height: f32) -> ResizeOutcome {
        if self.last_size == Some((width, height)) {
            return ResizeOutcome::Unchanged;
        }
        self.last_size = Some((width, height));

        let resolution = resolve(table, width, height);
        let previous = self.breakpoint.replace(resolution.breakpoint);

        if previous == Some(resolution.breakpoint) {
            ResizeOutcome::Resized(resolution)
        } else {
            log::info!(
                "Breakpoint {} -> {} ({}x{} container)",
                previous.map(|b| b.as_str()).unwrap_or("none"),
                resolution.breakpoint.as_str(),
                width,
                height
            );
            ResizeOutcome::BreakpointChanged {
                from: previous,
                resolution,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_observation_is_breakpoint_change() {
        let table = BreakpointTable::default();
        let mut monitor = ResizeMonitor::new();

        let outcome = monitor.observe(&table, 1280.0, 600.0);
        assert!(matches!(
            outcome,
            ResizeOutcome::BreakpointChanged { from: None, .. }
        ));
        assert_eq!(monitor.breakpoint(), Some(Breakpoint::Xl));
    }

    #[test]
    fn test_repeat_measurement_is_unchanged() {
        let table = BreakpointTable::default();
        let mut monitor = ResizeMonitor::new();
        monitor.observe(&table, 1280.0, 600.0);

        assert_eq!(monitor.observe(&table, 1280.0, 600.0), ResizeOutcome::Unchanged);
    }

    #[test]
    fn test_size_change_within_breakpoint() {
        let table = BreakpointTable::default();
        let mut monitor = ResizeMonitor::new();
        monitor.observe(&table, 1280.0, 600.0);

        let outcome = monitor.observe(&table, 1400.0, 650.0);
        match outcome {
            ResizeOutcome::Resized(res) => assert_eq!(res.breakpoint, Breakpoint::Xl),
            other => panic!("expected Resized, got {other:?}"),
        }
    }

    #[test]
    fn test_crossing_threshold() {
        let table = BreakpointTable::default();
        let mut monitor = ResizeMonitor::new();
        monitor.observe(&table, 1280.0, 600.0);

        let outcome = monitor.observe(&table, 900.0, 600.0);
        match outcome {
            ResizeOutcome::BreakpointChanged { from, resolution } => {
                assert_eq!(from, Some(Breakpoint::Xl));
                assert_eq!(resolution.breakpoint, Breakpoint::Md);
            }
            other => panic!("expected BreakpointChanged, got {other:?}"),
        }
    }
}
