//! Position state machine.
//!
//! One ranked rule list, evaluated once per bar; the first matching rule
//! wins and the rest are skipped:
//!
//! 1. Long  and `z >= -exit_z`            -> Close
//! 2. Short and `z <=  exit_z`            -> Close
//! 3. `z <= -entry_z` and not Long        -> OpenLong
//! 4. `z >=  entry_z` and not Short       -> OpenShort
//! 5. otherwise                           -> Hold
//!
//! A missing z-score always holds. Because a close ends the step, a position
//! can never be reversed within a single bar, and rule 3 never fires while
//! Short (rule 2 already matched).

use std::fmt;

use serde::Serialize;

use super::strategy::StrategyParams;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum PositionState {
    #[default]
    Flat,
    Long,
    Short,
}

impl fmt::Display for PositionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PositionState::Flat => write!(f, "FLAT"),
            PositionState::Long => write!(f, "LONG"),
            PositionState::Short => write!(f, "SHORT"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Transition {
    OpenLong,
    OpenShort,
    Close,
    Hold,
}

impl Transition {
    pub fn is_open(self) -> bool {
        matches!(self, Transition::OpenLong | Transition::OpenShort)
    }
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transition::OpenLong => write!(f, "OPEN_LONG"),
            Transition::OpenShort => write!(f, "OPEN_SHORT"),
            Transition::Close => write!(f, "CLOSE"),
            Transition::Hold => write!(f, "HOLD"),
        }
    }
}

/// Pure transition rule.
pub fn decide(state: PositionState, z: Option<f64>, entry_z: f64, exit_z: f64) -> Transition {
    let Some(z) = z else {
        return Transition::Hold;
    };

    match state {
        PositionState::Long if z >= -exit_z => Transition::Close,
        PositionState::Short if z <= exit_z => Transition::Close,
        s if z <= -entry_z && s != PositionState::Long => Transition::OpenLong,
        s if z >= entry_z && s != PositionState::Short => Transition::OpenShort,
        _ => Transition::Hold,
    }
}

#[derive(Debug, Clone)]
pub struct PositionStateMachine {
    state: PositionState,
    entry_z: f64,
    exit_z: f64,
}

impl PositionStateMachine {
    pub fn new(params: &StrategyParams) -> Self {
        Self {
            state: PositionState::Flat,
            entry_z: params.entry_z,
            exit_z: params.exit_z,
        }
    }

    pub fn state(&self) -> PositionState {
        self.state
    }

    /// Evaluate the rule for this bar and commit the resulting state.
    pub fn step(&mut self, z: Option<f64>) -> Transition {
        let transition = decide(self.state, z, self.entry_z, self.exit_z);
        self.state = match transition {
            Transition::OpenLong => PositionState::Long,
            Transition::OpenShort => PositionState::Short,
            Transition::Close => PositionState::Flat,
            Transition::Hold => self.state,
        };
        transition
    }

    /// Undo an open that could not be filled.
    pub fn reject_open(&mut self) {
        if self.state != PositionState::Flat {
            tracing::debug!(state = %self.state, "open rejected, reverting to FLAT");
            self.state = PositionState::Flat;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ENTRY: f64 = 2.0;
    const EXIT: f64 = 0.5;

    fn d(state: PositionState, z: f64) -> Transition {
        decide(state, Some(z), ENTRY, EXIT)
    }

    #[test]
    fn missing_z_holds_in_every_state() {
        for state in [PositionState::Flat, PositionState::Long, PositionState::Short] {
            assert_eq!(decide(state, None, ENTRY, EXIT), Transition::Hold);
        }
    }

    #[test]
    fn flat_entries() {
        assert_eq!(d(PositionState::Flat, -2.0), Transition::OpenLong);
        assert_eq!(d(PositionState::Flat, -3.1), Transition::OpenLong);
        assert_eq!(d(PositionState::Flat, 2.0), Transition::OpenShort);
        assert_eq!(d(PositionState::Flat, 4.0), Transition::OpenShort);
        assert_eq!(d(PositionState::Flat, -1.99), Transition::Hold);
        assert_eq!(d(PositionState::Flat, 1.99), Transition::Hold);
        assert_eq!(d(PositionState::Flat, 0.0), Transition::Hold);
    }

    #[test]
    fn long_exit_threshold() {
        assert_eq!(d(PositionState::Long, -0.5), Transition::Close);
        assert_eq!(d(PositionState::Long, 0.0), Transition::Close);
        assert_eq!(d(PositionState::Long, -0.51), Transition::Hold);
        assert_eq!(d(PositionState::Long, -2.5), Transition::Hold);
    }

    #[test]
    fn short_exit_threshold() {
        assert_eq!(d(PositionState::Short, 0.5), Transition::Close);
        assert_eq!(d(PositionState::Short, 0.0), Transition::Close);
        assert_eq!(d(PositionState::Short, 0.51), Transition::Hold);
        assert_eq!(d(PositionState::Short, 2.5), Transition::Hold);
    }

    #[test]
    fn no_reversal_in_one_step() {
        // Long at a high z closes; it does not flip short.
        assert_eq!(d(PositionState::Long, 3.0), Transition::Close);
        // Short at a very low z closes; it does not flip long.
        assert_eq!(d(PositionState::Short, -3.0), Transition::Close);
    }

    #[test]
    fn machine_commits_state() {
        let params = StrategyParams::default();
        let mut m = PositionStateMachine::new(&params);
        assert_eq!(m.state(), PositionState::Flat);

        assert_eq!(m.step(Some(-2.5)), Transition::OpenLong);
        assert_eq!(m.state(), PositionState::Long);

        assert_eq!(m.step(None), Transition::Hold);
        assert_eq!(m.step(Some(-1.0)), Transition::Hold);
        assert_eq!(m.state(), PositionState::Long);

        assert_eq!(m.step(Some(-0.4)), Transition::Close);
        assert_eq!(m.state(), PositionState::Flat);

        assert_eq!(m.step(Some(2.1)), Transition::OpenShort);
        assert_eq!(m.state(), PositionState::Short);

        assert_eq!(m.step(Some(0.3)), Transition::Close);
        assert_eq!(m.state(), PositionState::Flat);
    }

    #[test]
    fn reject_open_reverts_to_flat() {
        let mut m = PositionStateMachine::new(&StrategyParams::default());
        m.step(Some(-3.0));
        m.reject_open();
        assert_eq!(m.state(), PositionState::Flat);
        m.reject_open();
        assert_eq!(m.state(), PositionState::Flat);
    }

    #[test]
    fn display() {
        assert_eq!(PositionState::Short.to_string(), "SHORT");
        assert_eq!(Transition::OpenLong.to_string(), "OPEN_LONG");
        assert!(Transition::OpenShort.is_open());
        assert!(!Transition::Close.is_open());
    }
}
