//! Core domain model for the lumo campaign wizard.
//!
//! This crate holds everything that does not touch the network:
//!
//! - [`steps`] — the five ordered wizard steps and the lifestyle slot
//!   selector.
//! - [`session`] — the [`Session`] root aggregate, per-step records,
//!   typed patches, and the shared [`SessionStore`].
//! - [`navigation`] — the pure step-list / progress projection.
//! - [`encoding`] — data-URL encoding for reference image uploads.
//!
//! Session state is in-memory only and scoped to a single wizard run;
//! nothing in this crate persists anything.

pub mod encoding;
pub mod error;
pub mod navigation;
pub mod session;
pub mod steps;

pub use error::CoreError;
pub use session::{Session, SessionStore, StepPatch};
pub use steps::{LifestyleSlot, StepId};
