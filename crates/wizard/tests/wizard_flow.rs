//! End-to-end wizard flows against mock adapters: generation gating,
//! store propagation, confirmation ordering, and the webhook job
//! payloads each step dispatches.

mod common;

use std::sync::Arc;

use assert_matches::assert_matches;
use common::{RecordingSink, ScriptedGenerator, ScriptedPrompter};
use lumo_core::navigation::{progress_fraction, step_progress, StepState};
use lumo_core::session::{CharacterPatch, LifestylePatch, SessionStore, StepPatch};
use lumo_core::{LifestyleSlot, StepId};
use lumo_wizard::{
    CharacterController, DetailController, LifestyleController, VideoController, WizardError,
};

fn character_controller(
    store: &SessionStore,
    generator: Arc<ScriptedGenerator>,
) -> CharacterController {
    CharacterController::new(store.clone(), generator, Arc::new(ScriptedPrompter::echo()))
}

// ---------------------------------------------------------------------------
// Character step
// ---------------------------------------------------------------------------

#[tokio::test]
async fn character_generation_through_confirmation() {
    let store = SessionStore::new();
    store.set_shared_prompt("X").await;
    store.set_access_token("ya29.test").await;
    store
        .update_step(StepPatch::Character(CharacterPatch {
            prompt: Some("Y".to_string()),
            ..Default::default()
        }))
        .await;

    let generator = Arc::new(ScriptedGenerator::fixed("img1"));
    let mut controller = character_controller(&store, Arc::clone(&generator));

    let handle = controller.generate().await.unwrap();
    assert_eq!(handle, "img1");

    // The generator saw the shared prompt prefixed to the step prompt.
    assert_eq!(generator.seen_prompts.lock().unwrap().as_slice(), ["X\n\nY"]);

    let session = store.snapshot().await;
    assert_eq!(session.data.character.image.as_deref(), Some("img1"));

    controller.confirm().await.unwrap();
    let session = store.snapshot().await;
    assert_eq!(session.current_step, StepId::Lifestyle1);
    assert_eq!(session.confirmed_count(), 1);
    assert!(session.is_confirmed(StepId::Character));
}

#[tokio::test]
async fn generation_requires_access_token() {
    let store = SessionStore::new();
    let mut controller = character_controller(&store, Arc::new(ScriptedGenerator::echo()));

    assert_matches!(
        controller.generate().await,
        Err(WizardError::Precondition(_))
    );
}

#[tokio::test]
async fn generation_requires_a_prompt() {
    let store = SessionStore::new();
    store.set_access_token("tok").await;
    store
        .update_step(StepPatch::Character(CharacterPatch {
            prompt: Some(String::new()),
            ..Default::default()
        }))
        .await;

    let generator = Arc::new(ScriptedGenerator::echo());
    let mut controller = character_controller(&store, Arc::clone(&generator));

    assert_matches!(
        controller.generate().await,
        Err(WizardError::Precondition(_))
    );
    assert_eq!(generator.call_count(), 0);
}

#[tokio::test]
async fn generation_blocked_once_confirmed() {
    let store = SessionStore::new();
    store.set_access_token("tok").await;
    store.confirm_step(StepId::Character).await;

    let mut controller = character_controller(&store, Arc::new(ScriptedGenerator::echo()));
    assert_matches!(
        controller.generate().await,
        Err(WizardError::Precondition(_))
    );
}

#[tokio::test]
async fn generation_failure_leaves_record_untouched() {
    let store = SessionStore::new();
    store.set_access_token("tok").await;

    let generator = Arc::new(ScriptedGenerator::with_scripts(vec![common::GenScript::fail(
        "", 0,
    )]));
    let mut controller = character_controller(&store, generator);

    assert_matches!(
        controller.generate().await,
        Err(WizardError::Generation(_))
    );
    assert!(store.snapshot().await.data.character.image.is_none());
    // A failed generation does not block a retry.
    assert!(!controller.is_generating());
}

#[tokio::test]
async fn prompt_refinement_replaces_prompt() {
    let store = SessionStore::new();
    store
        .update_step(StepPatch::Character(CharacterPatch {
            prompt: Some("a seed idea".to_string()),
            ..Default::default()
        }))
        .await;

    let mut controller = character_controller(&store, Arc::new(ScriptedGenerator::echo()));
    controller.generate_prompts().await.unwrap();

    assert_eq!(
        store.snapshot().await.data.character.prompt,
        "refined:a seed idea"
    );
}

#[tokio::test]
async fn prompt_refinement_failure_leaves_prompt_intact() {
    let store = SessionStore::new();
    let before = store.snapshot().await.data.character.prompt.clone();

    let mut controller = CharacterController::new(
        store.clone(),
        Arc::new(ScriptedGenerator::echo()),
        Arc::new(ScriptedPrompter::failing()),
    );

    assert_matches!(
        controller.generate_prompts().await,
        Err(WizardError::Prompt(_))
    );
    assert_eq!(store.snapshot().await.data.character.prompt, before);
}

#[tokio::test]
async fn confirm_requires_a_generated_image() {
    let store = SessionStore::new();
    let mut controller = character_controller(&store, Arc::new(ScriptedGenerator::echo()));

    assert_matches!(controller.confirm().await, Err(WizardError::Precondition(_)));
    assert_eq!(store.snapshot().await.confirmed_count(), 0);
}

#[tokio::test]
async fn upload_reference_feeds_subsequent_generations() {
    let store = SessionStore::new();
    store.set_access_token("tok").await;

    let generator = Arc::new(ScriptedGenerator::echo());
    let mut controller = character_controller(&store, Arc::clone(&generator));

    let media_id = controller.upload_reference("image/png", b"bytes").await.unwrap();
    assert_eq!(media_id, "media-ref-1");
    assert_eq!(controller.reference_media_id(), Some("media-ref-1"));

    controller.generate().await.unwrap();
    assert_eq!(
        generator.seen_references.lock().unwrap().as_slice(),
        [vec!["media-ref-1".to_string()]]
    );
}

#[tokio::test]
async fn upload_reference_rejects_invalid_mime() {
    let store = SessionStore::new();
    store.set_access_token("tok").await;

    let mut controller = character_controller(&store, Arc::new(ScriptedGenerator::echo()));
    assert_matches!(
        controller.upload_reference("application/pdf", b"x").await,
        Err(WizardError::Core(_))
    );
}

// ---------------------------------------------------------------------------
// Lifestyle steps
// ---------------------------------------------------------------------------

#[tokio::test]
async fn lifestyle_generation_dispatches_job_and_stores_output() {
    let store = SessionStore::new();
    store.set_shared_prompt("shared").await;
    store
        .update_step(StepPatch::Character(CharacterPatch {
            image: Some("char.png".to_string()),
            ..Default::default()
        }))
        .await;

    let sink = Arc::new(RecordingSink::returning("scene1.png"));
    let mut controller = LifestyleController::new(
        store.clone(),
        LifestyleSlot::Lifestyle1,
        Arc::new(ScriptedPrompter::echo()),
        Arc::clone(&sink) as Arc<dyn lumo_services::WebhookSink>,
    );

    controller
        .attach_product_image("image/png", b"product")
        .await
        .unwrap();

    let handle = controller.generate().await.unwrap();
    assert_eq!(handle, "scene1.png");

    let session = store.snapshot().await;
    assert_eq!(
        session.data.lifestyle1.output_image.as_deref(),
        Some("scene1.png")
    );
    // The sibling scene is untouched.
    assert!(session.data.lifestyle2.output_image.is_none());

    let (endpoint, payload) = sink.last_dispatch();
    assert_eq!(endpoint, session.webhook_url);
    assert_eq!(payload["step"], 2);
    assert_eq!(payload["data"]["characterRef"], "char.png");
    assert_eq!(
        payload["data"]["negativePrompt"],
        session.data.lifestyle1.negative_prompt
    );
    assert!(payload["data"]["productRef"]
        .as_str()
        .unwrap()
        .starts_with("data:image/png;base64,"));
    assert!(payload["data"]["prompt"]
        .as_str()
        .unwrap()
        .starts_with("shared\n\n"));
}

#[tokio::test]
async fn lifestyle_prompt_refinement_and_negative_prompt() {
    let store = SessionStore::new();
    let sink = Arc::new(RecordingSink::returning("scene1.png"));
    let mut controller = LifestyleController::new(
        store.clone(),
        LifestyleSlot::Lifestyle1,
        Arc::new(ScriptedPrompter::echo()),
        Arc::clone(&sink) as Arc<dyn lumo_services::WebhookSink>,
    );

    let seed = store.snapshot().await.data.lifestyle1.prompt.clone();
    controller.generate_prompt().await.unwrap();
    assert_eq!(
        store.snapshot().await.data.lifestyle1.prompt,
        format!("refined:{seed}")
    );

    controller.set_negative_prompt("no hands").await.unwrap();
    controller.generate().await.unwrap();

    let (_, payload) = sink.last_dispatch();
    assert_eq!(payload["data"]["negativePrompt"], "no hands");
}

#[tokio::test]
async fn lifestyle_controllers_are_slot_independent() {
    let store = SessionStore::new();
    let sink = Arc::new(RecordingSink::returning("scene2.png"));
    let mut controller = LifestyleController::new(
        store.clone(),
        LifestyleSlot::Lifestyle2,
        Arc::new(ScriptedPrompter::echo()),
        sink,
    );

    controller.generate().await.unwrap();
    controller.confirm().await.unwrap();

    let session = store.snapshot().await;
    assert!(session.is_confirmed(StepId::Lifestyle2));
    assert!(!session.is_confirmed(StepId::Lifestyle1));
    assert_eq!(session.current_step, StepId::Detail);
}

// ---------------------------------------------------------------------------
// Detail step
// ---------------------------------------------------------------------------

#[tokio::test]
async fn detail_requires_a_product_reference() {
    let store = SessionStore::new();
    let sink = Arc::new(RecordingSink::returning("detail.png"));
    let mut controller =
        DetailController::new(store.clone(), Arc::new(ScriptedPrompter::echo()), sink);

    assert_matches!(
        controller.generate().await,
        Err(WizardError::Precondition(_))
    );
}

#[tokio::test]
async fn detail_resolves_product_and_lifestyle_anchor() {
    let store = SessionStore::new();
    store
        .update_step(StepPatch::Lifestyle1(LifestylePatch {
            product_image: Some("data:image/png;base64,cHJvZHVjdA==".to_string()),
            ..Default::default()
        }))
        .await;
    store
        .update_step(StepPatch::Lifestyle2(LifestylePatch {
            output_image: Some("scene2.png".to_string()),
            ..Default::default()
        }))
        .await;

    let sink = Arc::new(RecordingSink::returning("detail.png"));
    let mut controller = DetailController::new(
        store.clone(),
        Arc::new(ScriptedPrompter::echo()),
        Arc::clone(&sink) as Arc<dyn lumo_services::WebhookSink>,
    );

    controller.set_reference(LifestyleSlot::Lifestyle2).await.unwrap();
    let handle = controller.generate().await.unwrap();
    assert_eq!(handle, "detail.png");

    let (_, payload) = sink.last_dispatch();
    assert_eq!(payload["step"], 4);
    assert_eq!(
        payload["data"]["productRef"],
        "data:image/png;base64,cHJvZHVjdA=="
    );
    assert_eq!(payload["data"]["lifestyleRef"], "scene2.png");

    let session = store.snapshot().await;
    assert_eq!(session.data.detail.output_image.as_deref(), Some("detail.png"));
}

// ---------------------------------------------------------------------------
// Video step
// ---------------------------------------------------------------------------

#[tokio::test]
async fn video_requires_the_selected_scene_output() {
    let store = SessionStore::new();
    let sink = Arc::new(RecordingSink::returning("clip.mp4"));
    let mut controller =
        VideoController::new(store.clone(), Arc::new(ScriptedPrompter::echo()), sink);

    // Default selection is lifestyle 1, which has no output yet.
    assert_matches!(
        controller.generate().await,
        Err(WizardError::Precondition(_))
    );
}

#[tokio::test]
async fn video_animates_the_selected_scene() {
    let store = SessionStore::new();
    store
        .update_step(StepPatch::Lifestyle2(LifestylePatch {
            output_image: Some("scene2.png".to_string()),
            ..Default::default()
        }))
        .await;

    let sink = Arc::new(RecordingSink::returning("clip.mp4"));
    let mut controller = VideoController::new(
        store.clone(),
        Arc::new(ScriptedPrompter::echo()),
        Arc::clone(&sink) as Arc<dyn lumo_services::WebhookSink>,
    );

    controller.select_source(LifestyleSlot::Lifestyle2).await.unwrap();
    let handle = controller.generate().await.unwrap();
    assert_eq!(handle, "clip.mp4");

    let (_, payload) = sink.last_dispatch();
    assert_eq!(payload["step"], 5);
    assert_eq!(payload["data"]["sourceImage"], "scene2.png");

    let session = store.snapshot().await;
    assert_eq!(session.data.video.output_video.as_deref(), Some("clip.mp4"));
}

#[tokio::test]
async fn confirming_the_final_step_keeps_current_step() {
    let store = SessionStore::new();
    store.set_step(StepId::Video).await;
    store
        .update_step(StepPatch::Lifestyle1(LifestylePatch {
            output_image: Some("scene1.png".to_string()),
            ..Default::default()
        }))
        .await;

    let sink = Arc::new(RecordingSink::returning("clip.mp4"));
    let mut controller =
        VideoController::new(store.clone(), Arc::new(ScriptedPrompter::echo()), sink);

    controller.generate().await.unwrap();
    controller.confirm().await.unwrap();

    let session = store.snapshot().await;
    assert!(session.is_confirmed(StepId::Video));
    assert_eq!(session.current_step, StepId::Video);
}

// ---------------------------------------------------------------------------
// Full run
// ---------------------------------------------------------------------------

#[tokio::test]
async fn full_wizard_run_confirms_every_step_in_order() {
    let store = SessionStore::new();
    store.set_access_token("tok").await;

    let generator = Arc::new(ScriptedGenerator::fixed("char.png"));
    let prompter = Arc::new(ScriptedPrompter::echo());
    let sink = Arc::new(RecordingSink::returning("out.png"));

    let mut character = CharacterController::new(
        store.clone(),
        Arc::clone(&generator) as Arc<dyn lumo_services::ImageGenerator>,
        Arc::clone(&prompter) as Arc<dyn lumo_services::PromptWriter>,
    );
    character.generate().await.unwrap();
    character.confirm().await.unwrap();

    for slot in [LifestyleSlot::Lifestyle1, LifestyleSlot::Lifestyle2] {
        let mut lifestyle = LifestyleController::new(
            store.clone(),
            slot,
            Arc::clone(&prompter) as Arc<dyn lumo_services::PromptWriter>,
            Arc::clone(&sink) as Arc<dyn lumo_services::WebhookSink>,
        );
        lifestyle
            .attach_product_image("image/jpeg", b"product")
            .await
            .unwrap();
        lifestyle.generate().await.unwrap();
        lifestyle.confirm().await.unwrap();
    }

    let mut detail = DetailController::new(
        store.clone(),
        Arc::clone(&prompter) as Arc<dyn lumo_services::PromptWriter>,
        Arc::clone(&sink) as Arc<dyn lumo_services::WebhookSink>,
    );
    detail.generate().await.unwrap();
    detail.confirm().await.unwrap();

    let mut video = VideoController::new(
        store.clone(),
        Arc::clone(&prompter) as Arc<dyn lumo_services::PromptWriter>,
        Arc::clone(&sink) as Arc<dyn lumo_services::WebhookSink>,
    );
    video.generate().await.unwrap();
    video.confirm().await.unwrap();

    let session = store.snapshot().await;
    assert_eq!(session.confirmed_count(), 5);
    assert_eq!(progress_fraction(&session), 1.0);
    assert!(step_progress(&session)
        .iter()
        .all(|row| row.state == StepState::Completed));
}
