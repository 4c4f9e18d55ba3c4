//! Error types for dialogue-core
//!
//! This module defines all error types used throughout the dialogue-core
//! crate. Expected, recoverable conditions (a rejected message, a lookup
//! miss) are distinguished from invariant violations that indicate a bug in
//! the calling protocol logic and must not be retried.

pub mod dialogue_errors;

// Re-export main error types
pub use dialogue_errors::{DialogueError, DialogueResult};
