//! Step controllers for the lumo campaign wizard.
//!
//! One controller per wizard stage, each owning its transient state
//! (loading flags, the character step's variation arena) and
//! orchestrating the external adapters against the shared
//! [`SessionStore`](lumo_core::SessionStore):
//!
//! - [`character`] — single generation or the parallel variation
//!   fan-out, plus reference-image upload.
//! - [`lifestyle`] — the two lifestyle scenes (one controller,
//!   parameterized by slot).
//! - [`detail`] — the macro detail shot.
//! - [`video`] — the closing motion clip.
//!
//! Controllers check preconditions before any network call, write
//! outputs back through the store only, and keep failures local to
//! their own step.

pub mod character;
pub mod controller;
pub mod detail;
pub mod error;
pub mod lifestyle;
pub mod video;

pub use character::{CharacterController, Variation};
pub use detail::DetailController;
pub use error::WizardError;
pub use lifestyle::LifestyleController;
pub use video::VideoController;
