use std::borrow::Cow;

use otp_api::{ApiError, NETWORK_ERROR};
use thiserror::Error;

use crate::machine::{Operation, Phase};

/// Everything an operation can fail with.
///
/// The first three variants are user-facing and end up on the status line
/// and in the error callback. The rest are guard rejections: the operation
/// was ignored without touching the view.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FlowError {
    /// Missing required input. Raised before any network call.
    #[error("{0}")]
    Validation(String),

    /// The call never produced a usable response.
    #[error("Network error: {0}")]
    Transport(String),

    /// The API answered and refused.
    #[error("{0}")]
    Application(String),

    #[error("an OTP call is already in flight ({phase})")]
    Busy { phase: Phase },

    #[error("cannot {operation} while {phase}")]
    InvalidPhase { operation: Operation, phase: Phase },

    #[error("illegal phase transition from {phase}")]
    IllegalTransition { phase: Phase },
}

impl FlowError {
    /// Text shown on the status line.
    pub fn message(&self) -> Cow<'_, str> {
        match self {
            Self::Validation(msg) | Self::Application(msg) => Cow::Borrowed(msg),
            Self::Transport(_) => Cow::Borrowed(NETWORK_ERROR),
            other => Cow::Owned(other.to_string()),
        }
    }

    /// Guard rejections never reach the view or callbacks.
    pub fn is_ignored(&self) -> bool {
        matches!(
            self,
            Self::Busy { .. } | Self::InvalidPhase { .. } | Self::IllegalTransition { .. }
        )
    }
}

impl From<ApiError> for FlowError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Transport { detail } | ApiError::Setup { detail } => {
                Self::Transport(detail)
            }
            ApiError::Rejected { message, .. } => Self::Application(message),
        }
    }
}
