//! Shared controller plumbing: prompt combination and generation
//! gating.
//!
//! Gating checks run before any network call and surface as
//! [`WizardError::Precondition`] — a blocked action, not a failure.
//! Adapter errors are a separate concern and never originate here.

use lumo_core::session::Session;
use lumo_core::StepId;

use crate::error::WizardError;

/// Combine the session-wide shared prompt with a step's own prompt.
///
/// The shared prompt is always the prefix, separated by a blank line.
pub fn combined_prompt(shared: &str, step_prompt: &str) -> String {
    format!("{shared}\n\n{step_prompt}")
}

/// Validate that a generation may be dispatched for a step.
///
/// Blocked when the step is already confirmed or a request for it is
/// already in flight.
pub(crate) fn validate_generation_gate(
    session: &Session,
    step: StepId,
    in_flight: bool,
) -> Result<(), WizardError> {
    if session.is_confirmed(step) {
        return Err(WizardError::Precondition(format!(
            "{} is already confirmed",
            step.label()
        )));
    }
    if in_flight {
        return Err(WizardError::Precondition(format!(
            "A request is already in flight for {}",
            step.label()
        )));
    }
    Ok(())
}

/// Require a non-empty input, named for the error message.
pub(crate) fn require_nonempty(value: &str, what: &str) -> Result<(), WizardError> {
    if value.is_empty() {
        return Err(WizardError::Precondition(format!("Missing {what}")));
    }
    Ok(())
}

/// Validate that a step may be confirmed: not yet confirmed, and its
/// output handle present.
pub(crate) fn validate_confirm_gate(
    session: &Session,
    step: StepId,
    has_output: bool,
) -> Result<(), WizardError> {
    if session.is_confirmed(step) {
        return Err(WizardError::Precondition(format!(
            "{} is already confirmed",
            step.label()
        )));
    }
    if !has_output {
        return Err(WizardError::Precondition(format!(
            "{} has no generated output to confirm",
            step.label()
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
