//! Generic webhook sink with an offline simulation fallback.
//!
//! Lifestyle, detail, and video generations are dispatched as
//! `{step, data}` jobs to a user-configured endpoint. The sink never
//! fails: if the endpoint is not an HTTP address, or the request /
//! response goes wrong in any way, a placeholder handle is substituted
//! after a fixed simulation delay so the wizard keeps working in
//! offline and demo conditions.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use lumo_core::StepId;

/// HTTP request timeout for a single dispatch attempt.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Delay before a simulated placeholder result is returned.
const SIMULATION_DELAY: Duration = Duration::from_secs(2);

/// Base of the placeholder handles substituted in simulation mode.
const PLACEHOLDER_BASE: &str = "https://picsum.photos/seed";

// ---------------------------------------------------------------------------
// Payload
// ---------------------------------------------------------------------------

/// Step-specific job data for a webhook dispatch.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum WebhookJob {
    #[serde(rename_all = "camelCase")]
    Lifestyle {
        prompt: String,
        negative_prompt: String,
        character_ref: Option<String>,
        product_ref: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    Detail {
        prompt: String,
        product_ref: Option<String>,
        lifestyle_ref: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    Video {
        prompt: String,
        source_image: Option<String>,
    },
}

/// The `{step, data}` envelope posted to the endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct WebhookPayload {
    /// 1-based step number.
    pub step: u8,
    pub data: WebhookJob,
}

impl WebhookPayload {
    pub fn new(step: StepId, data: WebhookJob) -> Self {
        Self {
            step: step.to_number(),
            data,
        }
    }
}

/// Response shape: any one of several interchangeable URL fields.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WebhookResponse {
    url: Option<String>,
    image_url: Option<String>,
    video_url: Option<String>,
}

impl WebhookResponse {
    fn into_handle(self) -> Option<String> {
        self.url.or(self.image_url).or(self.video_url)
    }
}

#[derive(Debug, thiserror::Error)]
enum WebhookError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Webhook returned HTTP {0}")]
    HttpStatus(u16),
}

// ---------------------------------------------------------------------------
// WebhookSink
// ---------------------------------------------------------------------------

/// The dispatch seam consumed by the step controllers.
///
/// Dispatch is infallible by contract: implementations degrade to a
/// placeholder handle rather than surfacing transport errors.
#[async_trait]
pub trait WebhookSink: Send + Sync {
    async fn dispatch(&self, endpoint: &str, payload: &WebhookPayload) -> String;
}

/// Production webhook client.
pub struct WebhookClient {
    client: reqwest::Client,
    simulation_delay: Duration,
}

impl WebhookClient {
    /// Create a client with the standard request timeout and
    /// simulation delay.
    pub fn new() -> Self {
        Self::with_simulation_delay(SIMULATION_DELAY)
    }

    /// Create a client with a custom simulation delay (tests use a
    /// short one).
    pub fn with_simulation_delay(simulation_delay: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("Failed to build reqwest HTTP client");
        Self {
            client,
            simulation_delay,
        }
    }

    /// Execute a single POST and extract the result handle.
    async fn try_send(
        &self,
        endpoint: &str,
        payload: &WebhookPayload,
    ) -> Result<Option<String>, WebhookError> {
        let response = self.client.post(endpoint).json(payload).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(WebhookError::HttpStatus(status.as_u16()));
        }
        let parsed: WebhookResponse = response.json().await?;
        Ok(parsed.into_handle())
    }

    /// Sleep out the simulation delay, then mint a placeholder handle.
    async fn simulate(&self) -> String {
        tokio::time::sleep(self.simulation_delay).await;
        placeholder_handle()
    }
}

impl Default for WebhookClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl WebhookSink for WebhookClient {
    async fn dispatch(&self, endpoint: &str, payload: &WebhookPayload) -> String {
        tracing::info!(step = payload.step, endpoint, "Dispatching webhook job");

        // Simulation mode for endpoints that are not HTTP addresses.
        if !endpoint.starts_with("http") {
            return self.simulate().await;
        }

        match self.try_send(endpoint, payload).await {
            Ok(Some(handle)) => handle,
            Ok(None) => {
                tracing::warn!(endpoint, "Webhook response carried no result URL");
                placeholder_handle()
            }
            Err(e) => {
                tracing::warn!(endpoint, error = %e, "Webhook dispatch failed, substituting placeholder");
                self.simulate().await
            }
        }
    }
}

/// A well-formed placeholder image handle with a random seed segment.
fn placeholder_handle() -> String {
    format!("{PLACEHOLDER_BASE}/{}/1024/1024", rand::random::<u32>())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
