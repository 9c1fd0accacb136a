//! Lifestyle scene controllers.
//!
//! The second and third wizard stages place the character and the
//! product together in an environment. Both run through the same
//! controller, parameterized by [`LifestyleSlot`]; each owns its own
//! loading flags and writes only to its own slot's record.
//!
//! Generation goes through the webhook sink, carrying the combined
//! prompt, the scene's negative prompt, the character image from step
//! one, and the attached product reference.

use std::sync::Arc;

use lumo_core::encoding;
use lumo_core::session::{LifestylePatch, SessionStore, StepPatch};
use lumo_core::LifestyleSlot;
use lumo_services::{PromptWriter, WebhookJob, WebhookPayload, WebhookSink};

use crate::controller::{
    combined_prompt, require_nonempty, validate_confirm_gate, validate_generation_gate,
};
use crate::error::WizardError;

/// Fixed prompt-writing instruction for lifestyle scenes.
const PROMPT_INSTRUCTION: &str = "A lifestyle photography scene featuring a character and a \
     product. Describe the environment, lighting, and action.";

/// Controller for one lifestyle scene.
pub struct LifestyleController {
    store: SessionStore,
    slot: LifestyleSlot,
    prompter: Arc<dyn PromptWriter>,
    sink: Arc<dyn WebhookSink>,
    loading: bool,
    prompt_loading: bool,
}

impl LifestyleController {
    pub fn new(
        store: SessionStore,
        slot: LifestyleSlot,
        prompter: Arc<dyn PromptWriter>,
        sink: Arc<dyn WebhookSink>,
    ) -> Self {
        Self {
            store,
            slot,
            prompter,
            sink,
            loading: false,
            prompt_loading: false,
        }
    }

    pub fn slot(&self) -> LifestyleSlot {
        self.slot
    }

    pub fn is_generating(&self) -> bool {
        self.loading
    }

    /// Refine this scene's prompt through the prompt writer.
    ///
    /// Replaces the record's prompt on success; on failure the prior
    /// prompt stays intact and the error is surfaced.
    pub async fn generate_prompt(&mut self) -> Result<(), WizardError> {
        let session = self.store.snapshot().await;
        validate_generation_gate(&session, self.slot.step(), self.prompt_loading)?;

        let seed = session.lifestyle(self.slot).prompt.clone();
        self.prompt_loading = true;
        let result = self.prompter.write_prompt(PROMPT_INSTRUCTION, &seed).await;
        self.prompt_loading = false;

        let refined = result?;
        if !refined.is_empty() {
            self.store
                .update_step(StepPatch::lifestyle(
                    self.slot,
                    LifestylePatch {
                        prompt: Some(refined),
                        ..Default::default()
                    },
                ))
                .await;
        }
        Ok(())
    }

    /// Replace this scene's negative prompt.
    pub async fn set_negative_prompt(&self, negative: impl Into<String>) -> Result<(), WizardError> {
        let session = self.store.snapshot().await;
        validate_generation_gate(&session, self.slot.step(), false)?;
        self.store
            .update_step(StepPatch::lifestyle(
                self.slot,
                LifestylePatch {
                    negative_prompt: Some(negative.into()),
                    ..Default::default()
                },
            ))
            .await;
        Ok(())
    }

    /// Encode an uploaded product image and attach it to this scene.
    pub async fn attach_product_image(
        &self,
        mime_type: &str,
        bytes: &[u8],
    ) -> Result<(), WizardError> {
        let session = self.store.snapshot().await;
        validate_generation_gate(&session, self.slot.step(), false)?;

        let data_url = encoding::to_data_url(mime_type, bytes)?;
        self.store
            .update_step(StepPatch::lifestyle(
                self.slot,
                LifestylePatch {
                    product_image: Some(data_url),
                    ..Default::default()
                },
            ))
            .await;
        Ok(())
    }

    /// Dispatch this scene's generation job and store the output
    /// handle. The sink degrades to a placeholder rather than failing.
    pub async fn generate(&mut self) -> Result<String, WizardError> {
        let session = self.store.snapshot().await;
        let step = self.slot.step();
        validate_generation_gate(&session, step, self.loading)?;
        let record = session.lifestyle(self.slot);
        require_nonempty(&record.prompt, "lifestyle prompt")?;

        let payload = WebhookPayload::new(
            step,
            WebhookJob::Lifestyle {
                prompt: combined_prompt(&session.shared_prompt, &record.prompt),
                negative_prompt: record.negative_prompt.clone(),
                character_ref: session.data.character.image.clone(),
                product_ref: record.product_image.clone(),
            },
        );

        self.loading = true;
        let handle = self.sink.dispatch(&session.webhook_url, &payload).await;
        self.loading = false;

        self.store
            .update_step(StepPatch::lifestyle(
                self.slot,
                LifestylePatch {
                    output_image: Some(handle.clone()),
                    ..Default::default()
                },
            ))
            .await;
        Ok(handle)
    }

    /// Confirm this scene once it has a generated output.
    pub async fn confirm(&self) -> Result<(), WizardError> {
        let session = self.store.snapshot().await;
        let step = self.slot.step();
        validate_confirm_gate(
            &session,
            step,
            session.lifestyle(self.slot).output_image.is_some(),
        )?;
        self.store.confirm_step(step).await;
        Ok(())
    }
}
