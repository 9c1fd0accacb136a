/// Errors raised by the core domain layer.
///
/// Everything here is a caller mistake caught before any work happens;
/// the core performs no I/O and has no transport failure modes.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    Validation(String),
}
