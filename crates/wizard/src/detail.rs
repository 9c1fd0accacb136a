//! Detail shot controller.
//!
//! The fourth stage renders a macro close-up of the product. It reads
//! the product reference from whichever lifestyle scene has one
//! (scene 1 wins) and optionally anchors the composition to one
//! scene's generated output via the reference selector.

use std::sync::Arc;

use lumo_core::session::{DetailPatch, SessionStore, StepPatch};
use lumo_core::{LifestyleSlot, StepId};
use lumo_services::{PromptWriter, WebhookJob, WebhookPayload, WebhookSink};

use crate::controller::{
    combined_prompt, require_nonempty, validate_confirm_gate, validate_generation_gate,
};
use crate::error::WizardError;

/// Fixed prompt-writing instruction for the detail shot.
const PROMPT_INSTRUCTION: &str = "A macro close-up detail shot of a product. Focus on \
     texture, material, packaging details, and lighting.";

/// Controller for the detail step.
pub struct DetailController {
    store: SessionStore,
    prompter: Arc<dyn PromptWriter>,
    sink: Arc<dyn WebhookSink>,
    loading: bool,
    prompt_loading: bool,
}

impl DetailController {
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

    /// Refine the detail prompt through the prompt writer.
    pub async fn generate_prompt(&mut self) -> Result<(), WizardError> {
        let session = self.store.snapshot().await;
        validate_generation_gate(&session, StepId::Detail, self.prompt_loading)?;

        let seed = session.data.detail.prompt.clone();
        self.prompt_loading = true;
        let result = self.prompter.write_prompt(PROMPT_INSTRUCTION, &seed).await;
        self.prompt_loading = false;

        let refined = result?;
        if !refined.is_empty() {
            self.store
                .update_step(StepPatch::Detail(DetailPatch {
                    prompt: Some(refined),
                    ..Default::default()
                }))
                .await;
        }
        Ok(())
    }

    /// Point the detail shot at one lifestyle scene's output.
    pub async fn set_reference(&self, slot: LifestyleSlot) -> Result<(), WizardError> {
        let session = self.store.snapshot().await;
        validate_generation_gate(&session, StepId::Detail, false)?;
        self.store
            .update_step(StepPatch::Detail(DetailPatch {
                lifestyle_ref: Some(slot),
                ..Default::default()
            }))
            .await;
        Ok(())
    }

    /// Dispatch the detail generation job and store the output handle.
    ///
    /// Requires a product reference from one of the lifestyle scenes;
    /// the lifestyle anchor is resolved to that scene's output image at
    /// dispatch time.
    pub async fn generate(&mut self) -> Result<String, WizardError> {
        let session = self.store.snapshot().await;
        validate_generation_gate(&session, StepId::Detail, self.loading)?;
        require_nonempty(&session.data.detail.prompt, "detail prompt")?;

        let product_ref = session
            .active_product_image()
            .map(str::to_string)
            .ok_or_else(|| {
                WizardError::Precondition(
                    "A product reference image is required for the detail shot".to_string(),
                )
            })?;
        let lifestyle_ref = session
            .data
            .detail
            .lifestyle_ref
            .and_then(|slot| session.lifestyle_output(slot))
            .map(str::to_string);

        let payload = WebhookPayload::new(
            StepId::Detail,
            WebhookJob::Detail {
                prompt: combined_prompt(&session.shared_prompt, &session.data.detail.prompt),
                product_ref: Some(product_ref),
                lifestyle_ref,
            },
        );

        self.loading = true;
        let handle = self.sink.dispatch(&session.webhook_url, &payload).await;
        self.loading = false;

        self.store
            .update_step(StepPatch::Detail(DetailPatch {
                output_image: Some(handle.clone()),
                ..Default::default()
            }))
            .await;
        Ok(handle)
    }

    /// Confirm the detail step once it has a generated output.
    pub async fn confirm(&self) -> Result<(), WizardError> {
        let session = self.store.snapshot().await;
        validate_confirm_gate(
            &session,
            StepId::Detail,
            session.data.detail.output_image.is_some(),
        )?;
        self.store.confirm_step(StepId::Detail).await;
        Ok(())
    }
}
