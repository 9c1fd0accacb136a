use lumo_core::CoreError;
use lumo_services::{GenerationError, PromptError};

/// Errors surfaced by the step controllers.
///
/// `Precondition` covers everything blocked before a network call —
/// a confirmed step, an in-flight request, a missing prompt, reference,
/// or credential. Adapter failures pass through transparently; the
/// controller leaves the step's prior data untouched in every case.
#[derive(Debug, thiserror::Error)]
pub enum WizardError {
    #[error("Precondition failed: {0}")]
    Precondition(String),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error(transparent)]
    Prompt(#[from] PromptError),
}
