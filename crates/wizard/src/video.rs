//! Video step controller.
//!
//! The final stage animates one of the two lifestyle scenes. The
//! source image is resolved from the selected slot's output at
//! dispatch time and is required — there is nothing to animate before
//! that scene has generated.

use std::sync::Arc;

use lumo_core::session::{SessionStore, StepPatch, VideoPatch};
use lumo_core::{LifestyleSlot, StepId};
use lumo_services::{PromptWriter, WebhookJob, WebhookPayload, WebhookSink};

use crate::controller::{
    combined_prompt, require_nonempty, validate_confirm_gate, validate_generation_gate,
};
use crate::error::WizardError;

/// Fixed prompt-writing instruction for the motion prompt.
const PROMPT_INSTRUCTION: &str = "A cinematic video motion prompt. Describe camera movement \
     (zoom, pan, tilt), lighting changes, or slow motion effects suitable for a lifestyle \
     product video.";

/// Controller for the video step.
pub struct VideoController {
    store: SessionStore,
    prompter: Arc<dyn PromptWriter>,
    sink: Arc<dyn WebhookSink>,
    loading: bool,
    prompt_loading: bool,
}

impl VideoController {
    pub fn new(
        store: SessionStore,
        prompter: Arc<dyn PromptWriter>,
        sink: Arc<dyn WebhookSink>,
    ) -> Self {
        Self {
            store,
            prompter,
            sink,
            loading: false,
            prompt_loading: false,
        }
    }

    pub fn is_generating(&self) -> bool {
        self.loading
    }

    /// Refine the motion prompt through the prompt writer.
    pub async fn generate_prompt(&mut self) -> Result<(), WizardError> {
        let session = self.store.snapshot().await;
        validate_generation_gate(&session, StepId::Video, self.prompt_loading)?;

        let seed = session.data.video.prompt.clone();
        self.prompt_loading = true;
        let result = self.prompter.write_prompt(PROMPT_INSTRUCTION, &seed).await;
        self.prompt_loading = false;

        let refined = result?;
        if !refined.is_empty() {
            self.store
                .update_step(StepPatch::Video(VideoPatch {
                    prompt: Some(refined),
                    ..Default::default()
                }))
                .await;
        }
        Ok(())
    }

    /// Choose which lifestyle scene the video animates.
    pub async fn select_source(&self, slot: LifestyleSlot) -> Result<(), WizardError> {
        let session = self.store.snapshot().await;
        validate_generation_gate(&session, StepId::Video, false)?;
        self.store
            .update_step(StepPatch::Video(VideoPatch {
                selected_image: Some(slot),
                ..Default::default()
            }))
            .await;
        Ok(())
    }

    /// Dispatch the video generation job and store the output handle.
    pub async fn generate(&mut self) -> Result<String, WizardError> {
        let session = self.store.snapshot().await;
        validate_generation_gate(&session, StepId::Video, self.loading)?;
        require_nonempty(&session.data.video.prompt, "video prompt")?;

        let source_image = session
            .lifestyle_output(session.data.video.selected_image)
            .map(str::to_string)
            .ok_or_else(|| {
                WizardError::Precondition(
                    "The selected lifestyle scene has no generated image to animate".to_string(),
                )
            })?;

        let payload = WebhookPayload::new(
            StepId::Video,
            WebhookJob::Video {
                prompt: combined_prompt(&session.shared_prompt, &session.data.video.prompt),
                source_image: Some(source_image),
            },
        );

        self.loading = true;
        let handle = self.sink.dispatch(&session.webhook_url, &payload).await;
        self.loading = false;

        self.store
            .update_step(StepPatch::Video(VideoPatch {
                output_video: Some(handle.clone()),
                ..Default::default()
            }))
            .await;
        Ok(handle)
    }

    /// Confirm the video step once it has a generated output.
    pub async fn confirm(&self) -> Result<(), WizardError> {
        let session = self.store.snapshot().await;
        validate_confirm_gate(
            &session,
            StepId::Video,
            session.data.video.output_video.is_some(),
        )?;
        self.store.confirm_step(StepId::Video).await;
        Ok(())
    }
}
