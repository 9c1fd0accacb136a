//! External service adapters for the lumo campaign wizard.
//!
//! Each module wraps exactly one HTTP contract behind typed request and
//! response structures:
//!
//! - [`captcha`] — token service consumed by the generation backend.
//! - [`flow`] — the image-generation backend (batch generation and
//!   reference-image upload).
//! - [`generator`] — the [`ImageGenerator`] seam composing captcha +
//!   flow into one `prompt -> output handle` call.
//! - [`prompter`] — the [`PromptWriter`] chat-completions client.
//! - [`webhook`] — the [`WebhookSink`] generic sink with the offline
//!   simulation fallback.
//!
//! Adapters share no state and fail independently. The traits are the
//! seams the step controllers consume; tests substitute mocks for them.

pub mod captcha;
pub mod flow;
pub mod generator;
pub mod prompter;
pub mod webhook;

pub use captcha::{CaptchaClient, CaptchaError};
pub use flow::{FlowApi, FlowApiError, ImageInput};
pub use generator::{FlowImageGenerator, GenerationError, ImageGenerator};
pub use prompter::{PromptClient, PromptError, PromptWriter};
pub use webhook::{WebhookClient, WebhookJob, WebhookPayload, WebhookSink};
