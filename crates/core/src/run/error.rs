//! Error types for RUN validation.

use thiserror::Error;

/// Errors produced when validating a RUN.
///
/// `Format` means the input is not shaped like a RUN at all, while
/// `ChecksumMismatch` means it is well formed but the check character is wrong.
/// Callers map these to different user-facing messages.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RunError {
    /// Input is malformed (separators in strict mode, non-digit body, bad check character).
    #[error("Malformed RUN {value:?}: {reason}")]
    Format { value: String, reason: String },

    /// Input is well formed but the check character does not match the body.
    #[error("{value} is not a valid RUN (expected check character {expected})")]
    ChecksumMismatch { value: String, expected: char },
}

impl RunError {
    /// Short machine-readable classification of the error.
    pub fn kind(&self) -> &'static str {
        match self {
            RunError::Format { .. } => "format",
            RunError::ChecksumMismatch { .. } => "checksum",
        }
    }

    /// The offending input value.
    pub fn value(&self) -> &str {
        match self {
            RunError::Format { value, .. } | RunError::ChecksumMismatch { value, .. } => value,
        }
    }

    pub(super) fn format(value: impl Into<String>, reason: impl Into<String>) -> Self {
        RunError::Format {
            value: value.into(),
            reason: reason.into(),
        }
    }
}
