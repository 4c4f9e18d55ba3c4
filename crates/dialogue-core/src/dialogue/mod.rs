//! Core dialogue types and functionality
//!
//! This module contains the core types and operations for bilateral
//! negotiation dialogues:
//!
//! - [`DialogueLabel`]: Compound identifiers for dialogue instances
//! - [`Dialogue`]: Main dialogue implementation with history and validity
//!   checking
//! - [`DialogueRules`]: The per-protocol reply structure (opening
//!   performatives, adjacency table, terminal performatives)
//!
//! ## Dialogue Lifecycle
//!
//! ```text
//! provisional label → (label promotion) → complete label → terminated
//!        ↓                    ↓                  ↓             ↓
//!   opening msg     counterparty assigns    follow-ups    end-state
//!   sent/recv'd     its responder nonce     exchanged     recorded
//! ```
//!
//! Dialogues are created and indexed through the
//! [`DialogueRegistry`](crate::registry::DialogueRegistry); constructing one
//! directly is only useful in tests.

pub mod dialogue_impl;
pub mod label;
pub mod rules;

// Re-export main types
pub use dialogue_impl::Dialogue;
pub use label::DialogueLabel;
pub use rules::DialogueRules;
