//! Failure taxonomy of a classification tick.
//!
//! Every variant is fatal to the current tick only. The loop reports it and the
//! next scheduled tick is the retry. Audio failures never appear here: the
//! transition engine logs and swallows them.

use thiserror::Error;

use crate::classifier::ClassifierError;

pub type TickResult<T> = Result<T, TickError>;

#[derive(Debug, Error)]
pub enum TickError {
    /// Camera unavailable, no frames yet, or no credential configured.
    #[error("acquisition failed: {0}")]
    Acquisition(String),

    /// The classifier answered, but not in the agreed shape or vocabulary.
    #[error("classifier contract violated: {0}")]
    Contract(String),

    /// The classifier could not be reached or returned a non-success status.
    #[error("classifier transport failed: {0}")]
    Transport(String),
}

impl TickError {
    pub fn acquisition(msg: impl Into<String>) -> Self {
        Self::Acquisition(msg.into())
    }

    pub fn contract(msg: impl Into<String>) -> Self {
        Self::Contract(msg.into())
    }

    /// Short status line for the presentation layer.
    pub fn status(&self) -> &'static str {
        match self {
            Self::Acquisition(_) => "Waiting for camera or credentials",
            Self::Contract(_) | Self::Transport(_) => "Error",
        }
    }
}

impl From<ClassifierError> for TickError {
    fn from(err: ClassifierError) -> Self {
        match err {
            ClassifierError::Transport(msg) => Self::Transport(msg),
            ClassifierError::Contract(msg) => Self::Contract(msg),
        }
    }
}
