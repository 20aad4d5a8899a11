//! Wizard errors

use thiserror::Error;

/// Telegram limit on callback payloads
pub const CALLBACK_DATA_LIMIT: usize = 64;

/// Longest custom exercise name accepted
pub const CUSTOM_NAME_LIMIT: usize = 100;

#[derive(Debug, Error)]
pub enum WizardError {
    #[error("custom exercise name must be 1..=100 characters")]
    InvalidCustomName,

    #[error("all {required} exercises for {subgroup} are already picked")]
    StepSaturated { subgroup: String, required: usize },

    #[error("{exercise} is already picked for {subgroup}")]
    DuplicatePick { subgroup: String, exercise: String },

    #[error("unknown or stale selection token: {0}")]
    UnknownToken(String),

    #[error("not waiting for a custom exercise")]
    NotEnteringCustom,

    #[error("no step is waiting for exercises")]
    NoActiveStep,

    /// Catalog/label data produced a payload Telegram would reject
    #[error("callback data {token:?} is {len} bytes, limit is 64")]
    TokenTooLong { token: String, len: usize },

    #[error("incomplete program on day {day}: expected {expected} exercises, got {got}")]
    Incomplete { day: usize, expected: usize, got: usize },

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

impl WizardError {
    /// Errors answered with a re-prompt, leaving the run intact
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            WizardError::InvalidCustomName
                | WizardError::StepSaturated { .. }
                | WizardError::DuplicatePick { .. }
                | WizardError::UnknownToken(_)
                | WizardError::NotEnteringCustom
                | WizardError::NoActiveStep
        )
    }
}

pub type WizardResult<T> = Result<T, WizardError>;
