//! Character step controller.
//!
//! The first wizard stage establishes the campaign's main character.
//! It runs in one of two modes, selected by the thread count:
//!
//! - **1 thread**: one prompt refinement, one generation; the result
//!   lands directly in the session's character record.
//! - **2–4 threads**: fan-out. N prompt-writing requests run
//!   concurrently and fill a local arena of [`Variation`]s; "run all"
//!   then dispatches one generation per non-empty variation, all
//!   independent — one variation failing never affects, delays, or
//!   rolls back a sibling. The user promotes exactly one variation into
//!   the canonical record with [`select_variation`]; nothing in the
//!   arena is canonical before that.
//!
//! The arena is ordered by dispatch index and keyed by monotonic id;
//! results are always reassembled by identity, never completion order.
//!
//! [`select_variation`]: CharacterController::select_variation

use std::sync::Arc;

use tokio::sync::RwLock;

use lumo_core::encoding;
use lumo_core::session::{CharacterPatch, SessionStore, StepPatch};
use lumo_core::StepId;
use lumo_services::{ImageGenerator, PromptWriter};

use crate::controller::{
    combined_prompt, require_nonempty, validate_confirm_gate, validate_generation_gate,
};
use crate::error::WizardError;

/// Fixed prompt-writing instruction for single mode.
const PROMPT_INSTRUCTION: &str =
    "A main character for a lifestyle campaign. Describe age, appearance, style, mood.";

/// Smallest selectable thread count.
pub const MIN_THREADS: usize = 1;

/// Largest selectable thread count.
pub const MAX_THREADS: usize = 4;

/// Prompt-writing instruction for one fan-out variation (1-based).
fn variation_instruction(index: usize) -> String {
    format!(
        "A main character for a lifestyle campaign. Variation {index}. \
         Describe age, appearance, style, mood."
    )
}

// ---------------------------------------------------------------------------
// Variation
// ---------------------------------------------------------------------------

/// One candidate result in a fan-out batch.
///
/// Ephemeral: lives only in the controller's arena and is discarded
/// when a new batch is generated or the step is confirmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variation {
    /// Monotonic identity within this controller instance.
    pub id: u64,
    pub prompt: String,
    pub image: Option<String>,
    /// True from dispatch until this variation's own request settles.
    pub loading: bool,
}

// ---------------------------------------------------------------------------
// CharacterController
// ---------------------------------------------------------------------------

/// Controller for the character step.
pub struct CharacterController {
    store: SessionStore,
    generator: Arc<dyn ImageGenerator>,
    prompter: Arc<dyn PromptWriter>,
    thread_count: usize,
    /// Fan-out arena; shared with in-flight generation tasks so each
    /// can clear its own variation's loading flag as it settles.
    variations: Arc<RwLock<Vec<Variation>>>,
    next_variation_id: u64,
    /// Media handle of an uploaded reference image, passed to every
    /// generation once present.
    reference_media_id: Option<String>,
    loading: bool,
    prompt_loading: bool,
}

impl CharacterController {
    pub fn new(
        store: SessionStore,
        generator: Arc<dyn ImageGenerator>,
        prompter: Arc<dyn PromptWriter>,
    ) -> Self {
        Self {
            store,
            generator,
            prompter,
            thread_count: MIN_THREADS,
            variations: Arc::new(RwLock::new(Vec::new())),
            next_variation_id: 0,
            reference_media_id: None,
            loading: false,
            prompt_loading: false,
        }
    }

    /// Select single mode (1) or a fan-out width (2–4).
    pub fn set_thread_count(&mut self, count: usize) -> Result<(), WizardError> {
        if !(MIN_THREADS..=MAX_THREADS).contains(&count) {
            return Err(WizardError::Precondition(format!(
                "Thread count must be between {MIN_THREADS} and {MAX_THREADS}, got {count}"
            )));
        }
        self.thread_count = count;
        Ok(())
    }

    pub fn thread_count(&self) -> usize {
        self.thread_count
    }

    /// Whether a generation is in flight (single mode or batch).
    pub fn is_generating(&self) -> bool {
        self.loading
    }

    /// Whether a prompt-writing request is in flight.
    pub fn is_writing_prompt(&self) -> bool {
        self.prompt_loading
    }

    /// Media handle of the uploaded reference image, if any.
    pub fn reference_media_id(&self) -> Option<&str> {
        self.reference_media_id.as_deref()
    }

    /// Snapshot of the variation arena, in dispatch order.
    pub async fn variations(&self) -> Vec<Variation> {
        self.variations.read().await.clone()
    }

    fn next_id(&mut self) -> u64 {
        self.next_variation_id += 1;
        self.next_variation_id
    }

    // -----------------------------------------------------------------
    // Prompt writing
    // -----------------------------------------------------------------

    /// Refine the character prompt (single mode) or generate one prompt
    /// per variation (fan-out mode).
    ///
    /// Single mode replaces the record's prompt on success and leaves
    /// it untouched on failure. Fan-out mode awaits all N requests; a
    /// failed request becomes an empty-prompt variation rather than
    /// failing the batch, and the fresh arena replaces any prior one.
    pub async fn generate_prompts(&mut self) -> Result<(), WizardError> {
        let session = self.store.snapshot().await;
        validate_generation_gate(&session, StepId::Character, self.prompt_loading)?;

        self.prompt_loading = true;
        let result = if self.thread_count == 1 {
            self.refine_single(&session.data.character.prompt).await
        } else {
            self.fan_out_prompts(&session.data.character.prompt).await;
            Ok(())
        };
        self.prompt_loading = false;
        result
    }

    async fn refine_single(&self, seed: &str) -> Result<(), WizardError> {
        let refined = self.prompter.write_prompt(PROMPT_INSTRUCTION, seed).await?;
        if !refined.is_empty() {
            self.store
                .update_step(StepPatch::Character(CharacterPatch {
                    prompt: Some(refined),
                    ..Default::default()
                }))
                .await;
        }
        Ok(())
    }

    async fn fan_out_prompts(&mut self, seed: &str) {
        let tasks = (0..self.thread_count).map(|index| {
            let prompter = Arc::clone(&self.prompter);
            let seed = seed.to_string();
            async move {
                let instruction = variation_instruction(index + 1);
                match prompter.write_prompt(&instruction, &seed).await {
                    Ok(prompt) => prompt,
                    Err(e) => {
                        tracing::warn!(
                            variation = index,
                            error = %e,
                            "Variation prompt failed, substituting empty prompt"
                        );
                        String::new()
                    }
                }
            }
        });

        // join_all yields results in dispatch order regardless of
        // completion order.
        let prompts = futures::future::join_all(tasks).await;

        let fresh: Vec<Variation> = prompts
            .into_iter()
            .map(|prompt| Variation {
                id: self.next_id(),
                prompt,
                image: None,
                loading: false,
            })
            .collect();
        *self.variations.write().await = fresh;
    }

    /// Overwrite one variation's prompt (user edit).
    pub async fn set_variation_prompt(
        &self,
        id: u64,
        prompt: impl Into<String>,
    ) -> Result<(), WizardError> {
        let mut variations = self.variations.write().await;
        let variation = variations
            .iter_mut()
            .find(|v| v.id == id)
            .ok_or_else(|| WizardError::Precondition(format!("Unknown variation {id}")))?;
        variation.prompt = prompt.into();
        Ok(())
    }

    // -----------------------------------------------------------------
    // Generation
    // -----------------------------------------------------------------

    /// Single-mode generation: one request, result written straight
    /// into the character record.
    pub async fn generate(&mut self) -> Result<String, WizardError> {
        let session = self.store.snapshot().await;
        validate_generation_gate(&session, StepId::Character, self.loading)?;
        require_nonempty(&session.access_token, "access token")?;
        require_nonempty(&session.data.character.prompt, "character prompt")?;

        let prompt = combined_prompt(&session.shared_prompt, &session.data.character.prompt);
        let references = self.references();

        self.loading = true;
        let result = self
            .generator
            .generate(&prompt, &session.access_token, &references)
            .await;
        self.loading = false;

        let image = result?;
        self.store
            .update_step(StepPatch::Character(CharacterPatch {
                image: Some(image.clone()),
                ..Default::default()
            }))
            .await;
        Ok(image)
    }

    /// Fan-out generation: one independent request per non-empty
    /// variation.
    ///
    /// Every targeted variation's loading flag is set before dispatch
    /// and cleared by its own task as that request settles — success or
    /// failure — independent of sibling timing. A failed variation ends
    /// with no image; siblings are unaffected. Returns once all have
    /// settled.
    pub async fn run_all(&mut self) -> Result<(), WizardError> {
        let session = self.store.snapshot().await;
        validate_generation_gate(&session, StepId::Character, self.loading)?;
        require_nonempty(&session.access_token, "access token")?;

        // Collect targets and mark them loading before any dispatch.
        let targets: Vec<(u64, String)> = {
            let mut variations = self.variations.write().await;
            variations
                .iter_mut()
                .filter(|v| !v.prompt.is_empty())
                .map(|v| {
                    v.loading = true;
                    (v.id, v.prompt.clone())
                })
                .collect()
        };
        if targets.is_empty() {
            return Err(WizardError::Precondition(
                "No variation prompts to run".to_string(),
            ));
        }

        self.loading = true;
        let tasks = targets.into_iter().map(|(id, prompt)| {
            let generator = Arc::clone(&self.generator);
            let arena = Arc::clone(&self.variations);
            let shared = session.shared_prompt.clone();
            let token = session.access_token.clone();
            let references = self.references();
            async move {
                let combined = combined_prompt(&shared, &prompt);
                let result = generator.generate(&combined, &token, &references).await;

                // Settle this variation only; siblings keep running.
                let mut variations = arena.write().await;
                if let Some(variation) = variations.iter_mut().find(|v| v.id == id) {
                    variation.loading = false;
                    match result {
                        Ok(image) => variation.image = Some(image),
                        Err(e) => {
                            tracing::warn!(
                                variation = id,
                                error = %e,
                                "Variation generation failed"
                            );
                        }
                    }
                }
            }
        });
        futures::future::join_all(tasks).await;
        self.loading = false;

        Ok(())
    }

    /// Promote one variation's prompt and image into the canonical
    /// character record. The only point where fan-out results become
    /// canonical state.
    pub async fn select_variation(&self, id: u64) -> Result<(), WizardError> {
        let session = self.store.snapshot().await;
        if session.is_confirmed(StepId::Character) {
            return Err(WizardError::Precondition(
                "Character Generation is already confirmed".to_string(),
            ));
        }

        let (prompt, image) = {
            let variations = self.variations.read().await;
            let variation = variations
                .iter()
                .find(|v| v.id == id)
                .ok_or_else(|| WizardError::Precondition(format!("Unknown variation {id}")))?;
            let image = variation.image.clone().ok_or_else(|| {
                WizardError::Precondition(format!("Variation {id} has no image to select"))
            })?;
            (variation.prompt.clone(), image)
        };

        self.store
            .update_step(StepPatch::Character(CharacterPatch {
                prompt: Some(prompt),
                image: Some(image),
            }))
            .await;
        Ok(())
    }

    // -----------------------------------------------------------------
    // Reference upload
    // -----------------------------------------------------------------

    /// Encode and upload a reference image; the returned media handle
    /// is retained and passed with every subsequent generation.
    pub async fn upload_reference(
        &mut self,
        mime_type: &str,
        bytes: &[u8],
    ) -> Result<String, WizardError> {
        let session = self.store.snapshot().await;
        require_nonempty(&session.access_token, "access token")?;

        let data_url = encoding::to_data_url(mime_type, bytes)?;
        let raw = encoding::raw_base64(&data_url).unwrap_or_default();

        let media_id = self
            .generator
            .upload_reference(raw, mime_type, &session.access_token)
            .await?;
        self.reference_media_id = Some(media_id.clone());
        Ok(media_id)
    }

    fn references(&self) -> Vec<String> {
        self.reference_media_id.iter().cloned().collect()
    }

    // -----------------------------------------------------------------
    // Confirmation
    // -----------------------------------------------------------------

    /// Confirm the character step and discard the variation arena.
    pub async fn confirm(&mut self) -> Result<(), WizardError> {
        let session = self.store.snapshot().await;
        validate_confirm_gate(
            &session,
            StepId::Character,
            session.data.character.image.is_some(),
        )?;

        self.store.confirm_step(StepId::Character).await;
        self.variations.write().await.clear();
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
