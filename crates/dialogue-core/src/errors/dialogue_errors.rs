//! Dialogue error definitions
//!
//! Two classes of failure flow through [`DialogueError`]:
//!
//! - **Recoverable**: [`DialogueError::NotFound`]: the caller routes the
//!   message to its "unidentified dialogue" handling. Rejected messages are
//!   not errors at all; validity checks return `bool`.
//! - **Invariant violations**: [`DialogueError::DuplicateLabel`],
//!   [`DialogueError::InvalidPromotion`],
//!   [`DialogueError::InconsistentState`]: a bug in the calling protocol
//!   logic (nonce reuse, mis-tracked promotion, corrupted history). These
//!   must propagate to whatever supervises the dispatch loop; retrying
//!   cannot repair a corrupted index.

use thiserror::Error;

/// Result type used throughout dialogue-core.
pub type DialogueResult<T> = Result<T, DialogueError>;

/// Errors surfaced by the dialogue engine.
#[derive(Debug, Error)]
pub enum DialogueError {
    /// No registered dialogue matches any candidate label for a message.
    #[error("no dialogue found: {message}")]
    NotFound {
        /// What was looked up.
        message: String,
    },

    /// A label to be inserted is already present in an index.
    #[error("dialogue label already present: {label}")]
    DuplicateLabel {
        /// String form of the offending label.
        label: String,
    },

    /// A provisional-to-final label promotion violated its preconditions.
    #[error("invalid label promotion: {message}")]
    InvalidPromotion {
        /// Which precondition failed.
        message: String,
    },

    /// Dialogue state that can only arise from misuse of the engine.
    #[error("inconsistent dialogue state: {message}")]
    InconsistentState {
        /// Description of the corruption detected.
        message: String,
    },

    /// A dialogue label could not be parsed or deserialized.
    #[error("malformed dialogue label: {message}")]
    MalformedLabel {
        /// Underlying parse failure.
        message: String,
    },
}

impl DialogueError {
    /// Create a not-found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Create a duplicate-label error.
    pub fn duplicate_label(label: impl ToString) -> Self {
        Self::DuplicateLabel {
            label: label.to_string(),
        }
    }

    /// Create an invalid-promotion error.
    pub fn invalid_promotion(message: impl Into<String>) -> Self {
        Self::InvalidPromotion {
            message: message.into(),
        }
    }

    /// Create an inconsistent-state error.
    pub fn inconsistent_state(message: impl Into<String>) -> Self {
        Self::InconsistentState {
            message: message.into(),
        }
    }

    /// Create a malformed-label error.
    pub fn malformed_label(message: impl Into<String>) -> Self {
        Self::MalformedLabel {
            message: message.into(),
        }
    }

    /// Whether this error indicates a bug in the calling protocol logic
    /// rather than a recoverable runtime condition.
    pub fn is_invariant_violation(&self) -> bool {
        matches!(
            self,
            Self::DuplicateLabel { .. }
                | Self::InvalidPromotion { .. }
                | Self::InconsistentState { .. }
        )
    }
}
