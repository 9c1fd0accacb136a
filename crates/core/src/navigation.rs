//! Step-list and progress projection.
//!
//! Pure functions of the session: the navigation shell renders whatever
//! these return and feeds clicks straight into `set_step`. There is no
//! lock enforcement here — every step is always reachable.

use serde::Serialize;

use crate::session::Session;
use crate::steps::{StepId, ALL_STEPS, TOTAL_STEPS};

/// Display state of one wizard step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepState {
    /// Confirmed by the user; inputs are read-only.
    Completed,
    /// The session's current step.
    InProgress,
    /// Reachable but not yet current or confirmed.
    Ready,
}

/// One row of the step list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepProgress {
    pub step: StepId,
    pub label: &'static str,
    pub state: StepState,
}

/// Project the session onto the five-step navigation list.
///
/// Confirmation wins over currency: a confirmed step shows COMPLETED
/// even while it is being revisited.
pub fn step_progress(session: &Session) -> Vec<StepProgress> {
    ALL_STEPS
        .iter()
        .map(|&step| {
            let state = if session.is_confirmed(step) {
                StepState::Completed
            } else if session.current_step == step {
                StepState::InProgress
            } else {
                StepState::Ready
            };
            StepProgress {
                step,
                label: step.label(),
                state,
            }
        })
        .collect()
}

/// Fraction of steps confirmed, in `0.0..=1.0`.
pub fn progress_fraction(session: &Session) -> f64 {
    session.confirmed_count() as f64 / TOTAL_STEPS as f64
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_session_has_one_in_progress_step() {
        let session = Session::new();
        let progress = step_progress(&session);

        assert_eq!(progress.len(), TOTAL_STEPS as usize);
        assert_eq!(progress[0].state, StepState::InProgress);
        for row in &progress[1..] {
            assert_eq!(row.state, StepState::Ready);
        }
    }

    #[test]
    fn confirmed_step_shows_completed() {
        let mut session = Session::new();
        session.confirm_step(StepId::Character);

        let progress = step_progress(&session);
        assert_eq!(progress[0].state, StepState::Completed);
        assert_eq!(progress[1].state, StepState::InProgress);
    }

    #[test]
    fn completed_wins_over_in_progress_when_revisiting() {
        let mut session = Session::new();
        session.confirm_step(StepId::Character);
        session.set_step(StepId::Character);

        let progress = step_progress(&session);
        assert_eq!(progress[0].state, StepState::Completed);
        // No step is IN PROGRESS while the current step is a confirmed one.
        assert!(progress.iter().all(|p| p.state != StepState::InProgress));
    }

    #[test]
    fn labels_match_steps() {
        let session = Session::new();
        for row in step_progress(&session) {
            assert_eq!(row.label, row.step.label());
        }
    }

    #[test]
    fn progress_fraction_counts_confirmed_steps() {
        let mut session = Session::new();
        assert_eq!(progress_fraction(&session), 0.0);

        session.confirm_step(StepId::Character);
        assert!((progress_fraction(&session) - 0.2).abs() < f64::EPSILON);

        for step in [
            StepId::Lifestyle1,
            StepId::Lifestyle2,
            StepId::Detail,
            StepId::Video,
        ] {
            session.confirm_step(step);
        }
        assert_eq!(progress_fraction(&session), 1.0);
    }
}
