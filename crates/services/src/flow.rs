//! REST client for the image-generation backend.
//!
//! Wraps the backend's two endpoints — batch image generation and
//! reference-image upload — using [`reqwest`] and explicit request /
//! response structures. Response shapes are deliberately lenient: every
//! nested field is optional so an unexpected payload surfaces as a
//! missing locator, not a deserialization crash.

use serde::{Deserialize, Serialize};

/// Default backend base URL.
const DEFAULT_BASE_URL: &str = "https://aisandbox-pa.googleapis.com/v1";

/// Default project the generation requests run under.
const DEFAULT_PROJECT_ID: &str = "5832eda9-41b4-437c-bb6d-1965e0ead7e2";

/// Image model requested for every generation.
const IMAGE_MODEL_NAME: &str = "GEM_PIX_2";

/// Aspect ratio requested for every generation and upload.
const IMAGE_ASPECT_RATIO: &str = "IMAGE_ASPECT_RATIO_PORTRAIT";

/// Tool tag sent with generation requests.
const GENERATION_TOOL: &str = "PINHOLE";

/// Tool tag sent with upload requests.
const UPLOAD_TOOL: &str = "ASSET_MANAGER";

/// Exclusive upper bound for generation seeds.
const SEED_RANGE: u32 = 1_000_000;

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Errors from the generation backend REST layer.
#[derive(Debug, thiserror::Error)]
pub enum FlowApiError {
    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The backend returned a non-2xx status code.
    #[error("Generation backend error ({status}): {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },
}

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct ClientContext {
    #[serde(skip_serializing_if = "Option::is_none")]
    recaptcha_token: Option<String>,
    session_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    project_id: Option<String>,
    tool: &'static str,
}

/// One reference-image input attached to a generation request.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageInput {
    /// Media handle returned by the upload endpoint.
    pub name: String,
    pub image_input_type: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ImageRequest {
    client_context: ClientContext,
    seed: u32,
    image_model_name: &'static str,
    image_aspect_ratio: &'static str,
    prompt: String,
    image_inputs: Vec<ImageInput>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateImagesRequest {
    client_context: ClientContext,
    requests: Vec<ImageRequest>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct UploadImageInput {
    raw_image_bytes: String,
    mime_type: String,
    is_user_uploaded: bool,
    aspect_ratio: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct UploadImageRequest {
    image_input: UploadImageInput,
    client_context: ClientContext,
}

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

/// Response of the batch-generation endpoint.
#[derive(Debug, Deserialize)]
pub struct GenerateImagesResponse {
    #[serde(default)]
    pub media: Vec<Media>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Media {
    pub image: Option<MediaImage>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaImage {
    pub generated_image: Option<GeneratedImage>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedImage {
    pub fife_url: Option<String>,
}

impl GenerateImagesResponse {
    /// The first generated image's locator, if the response carried one.
    ///
    /// Any missing link in the nested media chain yields `None`; the
    /// caller decides how to surface that.
    pub fn first_image_url(&self) -> Option<&str> {
        self.media
            .first()?
            .image
            .as_ref()?
            .generated_image
            .as_ref()?
            .fife_url
            .as_deref()
    }
}

/// Response of the reference-image upload endpoint.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadImageResponse {
    pub media_generation_id: Option<MediaGenerationId>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaGenerationId {
    pub media_generation_id: Option<String>,
}

impl UploadImageResponse {
    /// The uploaded media's handle, if the response carried one.
    pub fn media_id(&self) -> Option<&str> {
        self.media_generation_id
            .as_ref()?
            .media_generation_id
            .as_deref()
    }
}

// ---------------------------------------------------------------------------
// FlowApi
// ---------------------------------------------------------------------------

/// HTTP client for the image-generation backend.
pub struct FlowApi {
    client: reqwest::Client,
    base_url: String,
    project_id: String,
}

impl FlowApi {
    /// Create a client against the default backend and project.
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL, DEFAULT_PROJECT_ID)
    }

    /// Create a client against a specific backend URL and project.
    pub fn with_base_url(base_url: impl Into<String>, project_id: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            project_id: project_id.into(),
        }
    }

    /// Submit one image-generation request.
    ///
    /// Each call costs on the remote side and is not idempotent; there
    /// is deliberately no retry here.
    pub async fn generate_images(
        &self,
        prompt: &str,
        access_token: &str,
        recaptcha_token: &str,
        image_inputs: Vec<ImageInput>,
    ) -> Result<GenerateImagesResponse, FlowApiError> {
        let context = ClientContext {
            recaptcha_token: Some(recaptcha_token.to_string()),
            session_id: session_id(),
            project_id: Some(self.project_id.clone()),
            tool: GENERATION_TOOL,
        };
        let body = GenerateImagesRequest {
            client_context: context.clone(),
            requests: vec![ImageRequest {
                client_context: context,
                seed: rand::random_range(0..SEED_RANGE),
                image_model_name: IMAGE_MODEL_NAME,
                image_aspect_ratio: IMAGE_ASPECT_RATIO,
                prompt: prompt.to_string(),
                image_inputs,
            }],
        };

        let response = self
            .client
            .post(format!(
                "{}/projects/{}/flowMedia:batchGenerateImages",
                self.base_url, self.project_id
            ))
            .bearer_auth(access_token)
            .json(&body)
            .send()
            .await?;

        Self::parse_response(response).await
    }

    /// Upload a reference image as raw base64 bytes.
    ///
    /// Returns the backend's media handle for use in subsequent
    /// generation requests.
    pub async fn upload_user_image(
        &self,
        raw_image_bytes: &str,
        mime_type: &str,
        access_token: &str,
    ) -> Result<UploadImageResponse, FlowApiError> {
        let body = UploadImageRequest {
            image_input: UploadImageInput {
                raw_image_bytes: raw_image_bytes.to_string(),
                mime_type: mime_type.to_string(),
                is_user_uploaded: true,
                aspect_ratio: IMAGE_ASPECT_RATIO,
            },
            client_context: ClientContext {
                recaptcha_token: None,
                session_id: session_id(),
                project_id: None,
                tool: UPLOAD_TOOL,
            },
        };

        let response = self
            .client
            .post(format!("{}:uploadUserImage", self.base_url))
            .bearer_auth(access_token)
            .json(&body)
            .send()
            .await?;

        Self::parse_response(response).await
    }

    // ---- private helpers ----

    /// Parse a successful JSON response body, or surface the status and
    /// body text of a failed one.
    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, FlowApiError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(FlowApiError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response.json::<T>().await?)
    }
}

impl Default for FlowApi {
    fn default() -> Self {
        Self::new()
    }
}

/// Session correlation id: `;` followed by epoch milliseconds.
fn session_id() -> String {
    format!(";{}", chrono::Utc::now().timestamp_millis())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
