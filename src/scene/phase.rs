//! Animation lifecycle phases

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Discrete stage of the animation. Only ever moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub enum Phase {
    #[default]
    Idle,
    Growing,
    Settling,
    Frozen,
    Revealing,
    Steady,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::Growing => "growing",
            Phase::Settling => "settling",
            Phase::Frozen => "frozen",
            Phase::Revealing => "revealing",
            Phase::Steady => "steady",
        }
    }

    /// The only phase reachable from this one
    pub fn successor(&self) -> Option<Phase> {
        match self {
            Phase::Idle => Some(Phase::Growing),
            Phase::Growing => Some(Phase::Settling),
            Phase::Settling => Some(Phase::Frozen),
            Phase::Frozen => Some(Phase::Revealing),
            Phase::Revealing => Some(Phase::Steady),
            Phase::Steady => None,
        }
    }

    /// Loose nodes still move in these phases
    pub fn is_simulating(&self) -> bool {
        matches!(self, Phase::Growing | Phase::Settling)
    }

    /// Loose node positions are final
    pub fn left_complete(&self) -> bool {
        *self >= Phase::Frozen
    }

    pub fn right_complete(&self) -> bool {
        *self == Phase::Steady
    }
}

/// Guarded holder for the current phase
#[derive(Debug, Clone, Default)]
pub struct PhaseMachine {
    phase: Phase,
}

impl PhaseMachine {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Move to `next`, which must be the immediate successor
    pub fn advance(&mut self, next: Phase) -> Result<Phase> {
        if self.phase.successor() != Some(next) {
            return Err(Error::IllegalTransition {
                from: self.phase,
                to: next,
            });
        }
        log::info!("Phase {} -> {}", self.phase.as_str(), next.as_str());
        self.phase = next;
        Ok(next)
    }

    /// Back to idle; only for a full remount
    pub fn reset(&mut self) {
        self.phase = Phase::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_sequence() {
        let mut m = PhaseMachine::new();
        for next in [
            Phase::Growing,
            Phase::Settling,
            Phase::Frozen,
            Phase::Revealing,
            Phase::Steady,
        ] {
            assert_eq!(m.advance(next).expect("legal"), next);
        }
        assert!(m.phase().left_complete());
        assert!(m.phase().right_complete());
        assert_eq!(m.phase().successor(), None);
    }

    #[test]
    fn test_rejects_skips_and_regressions() {
        let mut m = PhaseMachine::new();
        assert!(matches!(
            m.advance(Phase::Frozen),
            Err(Error::IllegalTransition {
                from: Phase::Idle,
                to: Phase::Frozen
            })
        ));
        m.advance(Phase::Growing).expect("legal");
        assert!(m.advance(Phase::Idle).is_err());
        assert!(m.advance(Phase::Growing).is_err());
        assert_eq!(m.phase(), Phase::Growing);

        m.reset();
        assert_eq!(m.phase(), Phase::Idle);
    }

    #[test]
    fn test_no_right_complete_without_left() {
        for phase in [Phase::Idle, Phase::Growing, Phase::Settling] {
            assert!(!phase.left_complete());
            assert!(!phase.right_complete());
        }
        assert!(Phase::Revealing.left_complete());
        assert!(!Phase::Revealing.right_complete());
    }
}
