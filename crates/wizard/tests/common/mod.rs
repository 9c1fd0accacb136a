//! Shared fixtures for the wizard integration tests: scripted mock
//! adapters standing in for the generation backend, the prompt writer,
//! and the webhook sink.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use lumo_services::{
    GenerationError, ImageGenerator, PromptError, PromptWriter, WebhookPayload, WebhookSink,
};

// ---------------------------------------------------------------------------
// ScriptedGenerator
// ---------------------------------------------------------------------------

/// One scripted behavior, applied when the prompt contains `marker`.
pub struct GenScript {
    pub marker: &'static str,
    pub delay: Duration,
    pub fail: bool,
}

impl GenScript {
    pub fn ok(marker: &'static str, delay_ms: u64) -> Self {
        Self {
            marker,
            delay: Duration::from_millis(delay_ms),
            fail: false,
        }
    }

    pub fn fail(marker: &'static str, delay_ms: u64) -> Self {
        Self {
            marker,
            delay: Duration::from_millis(delay_ms),
            fail: true,
        }
    }
}

/// Mock image generator.
///
/// With a fixed handle it always succeeds with that handle; otherwise
/// it matches the prompt against its scripts (delaying / failing as
/// scripted) and falls back to echoing `img:<prompt>`.
#[derive(Default)]
pub struct ScriptedGenerator {
    fixed: Option<String>,
    scripts: Vec<GenScript>,
    calls: AtomicUsize,
    pub seen_prompts: Mutex<Vec<String>>,
    pub seen_references: Mutex<Vec<Vec<String>>>,
}

impl ScriptedGenerator {
    pub fn echo() -> Self {
        Self::default()
    }

    pub fn fixed(handle: &str) -> Self {
        Self {
            fixed: Some(handle.to_string()),
            ..Default::default()
        }
    }

    pub fn with_scripts(scripts: Vec<GenScript>) -> Self {
        Self {
            scripts,
            ..Default::default()
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ImageGenerator for ScriptedGenerator {
    async fn generate(
        &self,
        prompt: &str,
        _access_token: &str,
        references: &[String],
    ) -> Result<String, GenerationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen_prompts.lock().unwrap().push(prompt.to_string());
        self.seen_references.lock().unwrap().push(references.to_vec());

        if let Some(handle) = &self.fixed {
            return Ok(handle.clone());
        }
        for script in &self.scripts {
            if prompt.contains(script.marker) {
                if !script.delay.is_zero() {
                    tokio::time::sleep(script.delay).await;
                }
                return if script.fail {
                    Err(GenerationError::MissingOutput)
                } else {
                    Ok(format!("img:{}", script.marker))
                };
            }
        }
        Ok(format!("img:{prompt}"))
    }

    async fn upload_reference(
        &self,
        _raw_base64: &str,
        _mime_type: &str,
        _access_token: &str,
    ) -> Result<String, GenerationError> {
        Ok("media-ref-1".to_string())
    }
}

// ---------------------------------------------------------------------------
// ScriptedPrompter
// ---------------------------------------------------------------------------

/// One scripted reply, applied when the instruction contains `marker`.
/// `None` simulates a prompt-service failure.
pub struct PromptScript {
    pub marker: &'static str,
    pub text: Option<&'static str>,
}

/// Mock prompt writer: matches the instruction against its scripts and
/// falls back to echoing `refined:<seed>`.
#[derive(Default)]
pub struct ScriptedPrompter {
    scripts: Vec<PromptScript>,
    calls: AtomicUsize,
}

impl ScriptedPrompter {
    pub fn echo() -> Self {
        Self::default()
    }

    pub fn with_scripts(scripts: Vec<PromptScript>) -> Self {
        Self {
            scripts,
            ..Default::default()
        }
    }

    pub fn failing() -> Self {
        Self::with_scripts(vec![PromptScript {
            marker: "",
            text: None,
        }])
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PromptWriter for ScriptedPrompter {
    async fn write_prompt(&self, instruction: &str, seed: &str) -> Result<String, PromptError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        for script in &self.scripts {
            if instruction.contains(script.marker) {
                return script
                    .text
                    .map(str::to_string)
                    .ok_or(PromptError::MissingText);
            }
        }
        Ok(format!("refined:{seed}"))
    }
}

// ---------------------------------------------------------------------------
// RecordingSink
// ---------------------------------------------------------------------------

/// Mock webhook sink: records every dispatch and returns a fixed
/// handle. Infallible, like the production sink.
pub struct RecordingSink {
    handle: String,
    pub dispatches: Mutex<Vec<(String, serde_json::Value)>>,
}

impl RecordingSink {
    pub fn returning(handle: &str) -> Self {
        Self {
            handle: handle.to_string(),
            dispatches: Mutex::new(Vec::new()),
        }
    }

    pub fn last_dispatch(&self) -> (String, serde_json::Value) {
        self.dispatches
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("no webhook dispatch recorded")
    }
}

#[async_trait]
impl WebhookSink for RecordingSink {
    async fn dispatch(&self, endpoint: &str, payload: &WebhookPayload) -> String {
        let value = serde_json::to_value(payload).expect("payload serializes");
        self.dispatches
            .lock()
            .unwrap()
            .push((endpoint.to_string(), value));
        self.handle.clone()
    }
}
