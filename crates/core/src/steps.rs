//! Wizard step definitions.
//!
//! The campaign wizard walks through five ordered stages. Steps are
//! numbered 1-based; [`StepId`] converts between the ordinal form used
//! on the wire and the enum used everywhere else.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Total number of steps in the wizard.
pub const TOTAL_STEPS: u8 = 5;

/// Minimum step number (1-based).
pub const MIN_STEP: u8 = 1;

/// Maximum step number (1-based).
pub const MAX_STEP: u8 = 5;

// ---------------------------------------------------------------------------
// StepId
// ---------------------------------------------------------------------------

/// The five steps in the campaign wizard, in confirmation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepId {
    Character,
    Lifestyle1,
    Lifestyle2,
    Detail,
    Video,
}

/// All steps in wizard order.
pub const ALL_STEPS: [StepId; TOTAL_STEPS as usize] = [
    StepId::Character,
    StepId::Lifestyle1,
    StepId::Lifestyle2,
    StepId::Detail,
    StepId::Video,
];

impl StepId {
    /// Convert a 1-based step number to a `StepId`.
    pub fn from_number(n: u8) -> Result<Self, CoreError> {
        match n {
            1 => Ok(Self::Character),
            2 => Ok(Self::Lifestyle1),
            3 => Ok(Self::Lifestyle2),
            4 => Ok(Self::Detail),
            5 => Ok(Self::Video),
            _ => Err(CoreError::Validation(format!(
                "Invalid step number {n}. Must be between {MIN_STEP} and {MAX_STEP}"
            ))),
        }
    }

    /// Convert to a 1-based step number.
    pub fn to_number(self) -> u8 {
        match self {
            Self::Character => 1,
            Self::Lifestyle1 => 2,
            Self::Lifestyle2 => 3,
            Self::Detail => 4,
            Self::Video => 5,
        }
    }

    /// The step after this one, or `None` for the final step.
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Character => Some(Self::Lifestyle1),
            Self::Lifestyle1 => Some(Self::Lifestyle2),
            Self::Lifestyle2 => Some(Self::Detail),
            Self::Detail => Some(Self::Video),
            Self::Video => None,
        }
    }

    /// Human-readable label for the step.
    pub fn label(self) -> &'static str {
        match self {
            Self::Character => "Character Generation",
            Self::Lifestyle1 => "Lifestyle Image 1",
            Self::Lifestyle2 => "Lifestyle Image 2",
            Self::Detail => "Detail Image",
            Self::Video => "Video Generation",
        }
    }

    /// Whether this is the final step of the wizard.
    pub fn is_final(self) -> bool {
        self.next().is_none()
    }
}

// ---------------------------------------------------------------------------
// Lifestyle slot selector
// ---------------------------------------------------------------------------

/// Selector for one of the two lifestyle scenes.
///
/// The detail and video steps reference a lifestyle scene's output by
/// slot; the resolved image URL is read from the session at dispatch
/// time, never stored as a back-reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifestyleSlot {
    Lifestyle1,
    Lifestyle2,
}

impl LifestyleSlot {
    /// The wizard step this slot corresponds to.
    pub fn step(self) -> StepId {
        match self {
            Self::Lifestyle1 => StepId::Lifestyle1,
            Self::Lifestyle2 => StepId::Lifestyle2,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
