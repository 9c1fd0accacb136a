//! The image-generation seam consumed by the step controllers.
//!
//! [`ImageGenerator`] is the one-call contract the controllers see:
//! combined prompt in, output-image handle out. The production
//! implementation composes the captcha-token client and the backend
//! REST client; tests substitute mocks.

use async_trait::async_trait;

use crate::captcha::{CaptchaClient, CaptchaError};
use crate::flow::{FlowApi, FlowApiError, ImageInput};

/// Input-type tag for reference media handles.
const IMAGE_INPUT_TYPE_REFERENCE: &str = "IMAGE_INPUT_TYPE_REFERENCE";

/// Errors from a generation attempt.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    /// The captcha token could not be obtained; the backend was never
    /// called and nothing was spent.
    #[error(transparent)]
    Captcha(#[from] CaptchaError),

    /// The backend call failed (transport or upstream status).
    #[error(transparent)]
    Api(#[from] FlowApiError),

    /// The backend answered 2xx but the response carried no output
    /// image locator. Recoverable: the caller keeps its prior data.
    #[error("Generation response did not contain an output image")]
    MissingOutput,

    /// An upload succeeded at the HTTP level but returned no media
    /// handle to reference later.
    #[error("Upload response did not contain a media handle")]
    MissingMediaHandle,
}

/// The image-generation seam: combined prompt + references in, output
/// handle out; raw reference bytes in, media handle out.
///
/// Implementations must not retry — each call may have cost on the
/// remote side.
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    async fn generate(
        &self,
        prompt: &str,
        access_token: &str,
        references: &[String],
    ) -> Result<String, GenerationError>;

    /// Upload a reference image (raw base64 payload) and return the
    /// backend's media handle for it.
    async fn upload_reference(
        &self,
        raw_base64: &str,
        mime_type: &str,
        access_token: &str,
    ) -> Result<String, GenerationError>;
}

/// Production generator: fetches a captcha token, submits the
/// generation request, and extracts the output locator.
pub struct FlowImageGenerator {
    captcha: CaptchaClient,
    api: FlowApi,
}

impl FlowImageGenerator {
    pub fn new(captcha: CaptchaClient, api: FlowApi) -> Self {
        Self { captcha, api }
    }
}

#[async_trait]
impl ImageGenerator for FlowImageGenerator {
    async fn generate(
        &self,
        prompt: &str,
        access_token: &str,
        references: &[String],
    ) -> Result<String, GenerationError> {
        let recaptcha_token = self.captcha.fetch_token().await?;

        let image_inputs = references
            .iter()
            .map(|handle| ImageInput {
                name: handle.clone(),
                image_input_type: IMAGE_INPUT_TYPE_REFERENCE.to_string(),
            })
            .collect();

        let response = self
            .api
            .generate_images(prompt, access_token, &recaptcha_token, image_inputs)
            .await?;

        match response.first_image_url() {
            Some(url) => {
                tracing::info!(references = references.len(), "Image generated");
                Ok(url.to_string())
            }
            None => {
                tracing::warn!("Generation response missing its output image locator");
                Err(GenerationError::MissingOutput)
            }
        }
    }

    async fn upload_reference(
        &self,
        raw_base64: &str,
        mime_type: &str,
        access_token: &str,
    ) -> Result<String, GenerationError> {
        let response = self
            .api
            .upload_user_image(raw_base64, mime_type, access_token)
            .await?;

        match response.media_id() {
            Some(id) => {
                tracing::info!(media_id = id, "Reference image uploaded");
                Ok(id.to_string())
            }
            None => {
                tracing::warn!("Upload response missing its media handle");
                Err(GenerationError::MissingMediaHandle)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
