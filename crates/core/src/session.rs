//! Session aggregate and workflow state store.
//!
//! [`Session`] is the root aggregate for one wizard run: the current
//! step, the set of confirmed steps, the shared prompt, session-scoped
//! credentials, and one record per step. It is mutated only through the
//! explicit update operations here — adapters never write to it
//! directly.
//!
//! [`SessionStore`] wraps a session in `Arc<RwLock<_>>` so the step
//! controllers can share it. All mutations happen under the write lock
//! at the granularity of one whole update call, so overlapping in-flight
//! operations never interleave partial writes (last-writer-wins per
//! call). Readers take a [`Session`] snapshot by value.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::steps::{LifestyleSlot, StepId};

// ---------------------------------------------------------------------------
// Seed content
// ---------------------------------------------------------------------------

/// Default webhook endpoint for the generation sink.
pub const DEFAULT_WEBHOOK_URL: &str = "https://n8n.example.com/webhook/lifestyle-gen";

/// Default shared prompt prefixed to every step prompt at generation time.
pub const DEFAULT_SHARED_PROMPT: &str = "High-end luxury aesthetic, clean composition, \
     professional photography, 8k resolution, shot on Hasselblad.";

const DEFAULT_CHARACTER_PROMPT: &str = "A sophisticated woman in her 30s with a minimalist \
     aesthetic, high-fashion portrait, studio lighting, soft neutral background, highly \
     detailed skin texture.";

const DEFAULT_LIFESTYLE1_PROMPT: &str = "Woman holding a premium organic skincare bottle in \
     a sunlit modern bathroom, morning light, luxury atmosphere.";

const DEFAULT_LIFESTYLE2_PROMPT: &str = "Woman applying facial serum in front of a minimalist \
     vanity mirror, soft focus background, elegant interior.";

const DEFAULT_NEGATIVE_PROMPT: &str = "low quality, blurry, distorted hands, text, watermark";

const DEFAULT_DETAIL_PROMPT: &str = "Close-up macro shot of a sleek glass skincare bottle \
     with silver sleeve detail, water droplets, marble surface.";

const DEFAULT_VIDEO_PROMPT: &str = "Cinematic slow zoom into the skincare bottle, luxury \
     transition with soft light leaks.";

// ---------------------------------------------------------------------------
// Step records
// ---------------------------------------------------------------------------

/// Character step record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterData {
    pub prompt: String,
    /// Handle of the accepted character image, once generated/selected.
    pub image: Option<String>,
}

/// Lifestyle scene record (used for both lifestyle slots).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifestyleData {
    pub prompt: String,
    pub negative_prompt: String,
    /// Product reference image, as an encoded data URL.
    pub product_image: Option<String>,
    /// Handle of the generated scene image.
    pub output_image: Option<String>,
}

/// Detail shot record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetailData {
    pub prompt: String,
    /// Which lifestyle scene's output the detail shot references.
    pub lifestyle_ref: Option<LifestyleSlot>,
    pub output_image: Option<String>,
}

/// Video step record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoData {
    /// Which lifestyle scene's output the video animates.
    pub selected_image: LifestyleSlot,
    pub prompt: String,
    pub output_video: Option<String>,
}

/// All five step records, exclusively owned by the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionData {
    pub character: CharacterData,
    pub lifestyle1: LifestyleData,
    pub lifestyle2: LifestyleData,
    pub detail: DetailData,
    pub video: VideoData,
}

// ---------------------------------------------------------------------------
// Step patches
// ---------------------------------------------------------------------------

/// Partial update for the character record. `None` fields are untouched.
#[derive(Debug, Clone, Default)]
pub struct CharacterPatch {
    pub prompt: Option<String>,
    pub image: Option<String>,
}

/// Partial update for a lifestyle record.
#[derive(Debug, Clone, Default)]
pub struct LifestylePatch {
    pub prompt: Option<String>,
    pub negative_prompt: Option<String>,
    pub product_image: Option<String>,
    pub output_image: Option<String>,
}

/// Partial update for the detail record.
#[derive(Debug, Clone, Default)]
pub struct DetailPatch {
    pub prompt: Option<String>,
    pub lifestyle_ref: Option<LifestyleSlot>,
    pub output_image: Option<String>,
}

/// Partial update for the video record.
#[derive(Debug, Clone, Default)]
pub struct VideoPatch {
    pub selected_image: Option<LifestyleSlot>,
    pub prompt: Option<String>,
    pub output_video: Option<String>,
}

/// A partial update addressed to one step's record.
///
/// Merge semantics are shallow: `Some` fields overwrite the current
/// value, `None` fields leave it untouched, and no other step record
/// changes.
#[derive(Debug, Clone)]
pub enum StepPatch {
    Character(CharacterPatch),
    Lifestyle1(LifestylePatch),
    Lifestyle2(LifestylePatch),
    Detail(DetailPatch),
    Video(VideoPatch),
}

impl StepPatch {
    /// The step this patch is addressed to.
    pub fn step(&self) -> StepId {
        match self {
            Self::Character(_) => StepId::Character,
            Self::Lifestyle1(_) => StepId::Lifestyle1,
            Self::Lifestyle2(_) => StepId::Lifestyle2,
            Self::Detail(_) => StepId::Detail,
            Self::Video(_) => StepId::Video,
        }
    }

    /// A lifestyle patch addressed to the given slot.
    pub fn lifestyle(slot: LifestyleSlot, patch: LifestylePatch) -> Self {
        match slot {
            LifestyleSlot::Lifestyle1 => Self::Lifestyle1(patch),
            LifestyleSlot::Lifestyle2 => Self::Lifestyle2(patch),
        }
    }
}

fn merge<T>(target: &mut T, value: Option<T>) {
    if let Some(v) = value {
        *target = v;
    }
}

fn merge_opt<T>(target: &mut Option<T>, value: Option<T>) {
    if let Some(v) = value {
        *target = Some(v);
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// Root aggregate for one wizard run.
///
/// Created once at wizard start with seed content; lives only in memory
/// for the duration of the session. The access token is an opaque
/// session-scoped credential and is never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub current_step: StepId,
    /// Confirmed steps; grows monotonically, never shrinks.
    pub confirmed_steps: BTreeSet<StepId>,
    pub webhook_url: String,
    pub access_token: String,
    pub shared_prompt: String,
    pub data: SessionData,
}

impl Session {
    /// Create a session seeded with the default campaign content.
    pub fn new() -> Self {
        Self {
            current_step: StepId::Character,
            confirmed_steps: BTreeSet::new(),
            webhook_url: DEFAULT_WEBHOOK_URL.to_string(),
            access_token: String::new(),
            shared_prompt: DEFAULT_SHARED_PROMPT.to_string(),
            data: SessionData {
                character: CharacterData {
                    prompt: DEFAULT_CHARACTER_PROMPT.to_string(),
                    image: None,
                },
                lifestyle1: LifestyleData {
                    prompt: DEFAULT_LIFESTYLE1_PROMPT.to_string(),
                    negative_prompt: DEFAULT_NEGATIVE_PROMPT.to_string(),
                    product_image: None,
                    output_image: None,
                },
                lifestyle2: LifestyleData {
                    prompt: DEFAULT_LIFESTYLE2_PROMPT.to_string(),
                    negative_prompt: DEFAULT_NEGATIVE_PROMPT.to_string(),
                    product_image: None,
                    output_image: None,
                },
                detail: DetailData {
                    prompt: DEFAULT_DETAIL_PROMPT.to_string(),
                    lifestyle_ref: None,
                    output_image: None,
                },
                video: VideoData {
                    selected_image: LifestyleSlot::Lifestyle1,
                    prompt: DEFAULT_VIDEO_PROMPT.to_string(),
                    output_video: None,
                },
            },
        }
    }

    /// Merge a partial update into the addressed step's record.
    ///
    /// Shallow merge: `Some` fields overwrite, `None` fields are left
    /// untouched. No other record is modified.
    pub fn update_step(&mut self, patch: StepPatch) {
        match patch {
            StepPatch::Character(p) => {
                merge(&mut self.data.character.prompt, p.prompt);
                merge_opt(&mut self.data.character.image, p.image);
            }
            StepPatch::Lifestyle1(p) => Self::merge_lifestyle(&mut self.data.lifestyle1, p),
            StepPatch::Lifestyle2(p) => Self::merge_lifestyle(&mut self.data.lifestyle2, p),
            StepPatch::Detail(p) => {
                merge(&mut self.data.detail.prompt, p.prompt);
                merge_opt(&mut self.data.detail.lifestyle_ref, p.lifestyle_ref);
                merge_opt(&mut self.data.detail.output_image, p.output_image);
            }
            StepPatch::Video(p) => {
                merge(&mut self.data.video.selected_image, p.selected_image);
                merge(&mut self.data.video.prompt, p.prompt);
                merge_opt(&mut self.data.video.output_video, p.output_video);
            }
        }
    }

    fn merge_lifestyle(record: &mut LifestyleData, p: LifestylePatch) {
        merge(&mut record.prompt, p.prompt);
        merge(&mut record.negative_prompt, p.negative_prompt);
        merge_opt(&mut record.product_image, p.product_image);
        merge_opt(&mut record.output_image, p.output_image);
    }

    /// Mark a step as confirmed and advance the current step.
    ///
    /// Adding an already-confirmed step is a no-op on the set. The
    /// current step moves to `step + 1` unless `step` is the final
    /// step; it never regresses.
    pub fn confirm_step(&mut self, step: StepId) {
        self.confirmed_steps.insert(step);
        if let Some(next) = step.next() {
            self.current_step = next;
        }
    }

    /// Navigate directly to a step.
    ///
    /// Intentionally unvalidated: any step may be visited regardless of
    /// confirmation state. Step locking is a presentation concern, not
    /// enforced here.
    pub fn set_step(&mut self, step: StepId) {
        self.current_step = step;
    }

    /// Whether a step has been confirmed.
    pub fn is_confirmed(&self, step: StepId) -> bool {
        self.confirmed_steps.contains(&step)
    }

    /// Number of confirmed steps.
    pub fn confirmed_count(&self) -> usize {
        self.confirmed_steps.len()
    }

    /// The lifestyle record for a slot.
    pub fn lifestyle(&self, slot: LifestyleSlot) -> &LifestyleData {
        match slot {
            LifestyleSlot::Lifestyle1 => &self.data.lifestyle1,
            LifestyleSlot::Lifestyle2 => &self.data.lifestyle2,
        }
    }

    /// The generated output image of a lifestyle slot, if any.
    pub fn lifestyle_output(&self, slot: LifestyleSlot) -> Option<&str> {
        self.lifestyle(slot).output_image.as_deref()
    }

    /// The product reference in play for the detail step: lifestyle 1's
    /// product image, else lifestyle 2's.
    pub fn active_product_image(&self) -> Option<&str> {
        self.data
            .lifestyle1
            .product_image
            .as_deref()
            .or(self.data.lifestyle2.product_image.as_deref())
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// SessionStore
// ---------------------------------------------------------------------------

/// Shared handle to the session, cheaply cloneable into each controller.
///
/// The store is the only shared mutable resource in the wizard. Every
/// mutation runs under the write lock for the duration of one update
/// call, so concurrent in-flight operations see whole-record
/// transitions only.
#[derive(Clone, Default)]
pub struct SessionStore {
    inner: Arc<RwLock<Session>>,
}

impl SessionStore {
    /// Create a store seeded with the default session content.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store around an existing session.
    pub fn with_session(session: Session) -> Self {
        Self {
            inner: Arc::new(RwLock::new(session)),
        }
    }

    /// Snapshot the whole session by value.
    pub async fn snapshot(&self) -> Session {
        self.inner.read().await.clone()
    }

    /// Merge a partial update into one step's record.
    pub async fn update_step(&self, patch: StepPatch) {
        self.inner.write().await.update_step(patch);
    }

    /// Confirm a step and advance the current step.
    pub async fn confirm_step(&self, step: StepId) {
        self.inner.write().await.confirm_step(step);
    }

    /// Navigate directly to a step (unvalidated).
    pub async fn set_step(&self, step: StepId) {
        self.inner.write().await.set_step(step);
    }

    /// Replace the shared prompt.
    pub async fn set_shared_prompt(&self, prompt: impl Into<String>) {
        self.inner.write().await.shared_prompt = prompt.into();
    }

    /// Replace the session-scoped access token.
    pub async fn set_access_token(&self, token: impl Into<String>) {
        self.inner.write().await.access_token = token.into();
    }

    /// Replace the webhook endpoint.
    pub async fn set_webhook_url(&self, url: impl Into<String>) {
        self.inner.write().await.webhook_url = url.into();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
