//! # agora-dialogue-core
//!
//! Dialogue management for bilateral agent negotiations.
//!
//! This crate tracks multi-message negotiations (call-for-proposal →
//! propose → accept → match-accept sequences and their declines) between
//! two parties. It classifies every inbound message as opening a new
//! dialogue, continuing a dialogue this agent started, or continuing one
//! the counterparty started; enforces the sequencing protocol (message id,
//! target and performative adjacency) that keeps replayed, reordered or
//! forged continuations out; and aggregates terminal outcomes for
//! reporting.
//!
//! ## Architecture
//!
//! ```text
//! transport / handlers (out of scope)
//!        ↓ decoded message + sender
//! DialogueRegistry  - classification, dual-label resolution, promotion
//!        ↓
//! Dialogue          - per-negotiation history + validity checking
//!        ↓
//! DialogueStats     - end-state counters per initiator side
//! ```
//!
//! The engine owns no transport, wire format or configuration; hosts
//! implement [`DialogueMessage`] for their decoded message type and drive
//! the registry from their dispatch loop.
//!
//! ## Usage
//!
//! ```
//! use agora_dialogue_core::protocols::fipa::{self, NegotiationRole};
//! use agora_dialogue_core::Direction;
//!
//! let mut dialogues = fipa::negotiation_registry("agent-a");
//!
//! let dialogue = dialogues
//!     .create_self_initiated("agent-b", "agent-a", NegotiationRole::Buyer)
//!     .unwrap();
//! let cfp = fipa::FipaMessage::cfp(
//!     dialogue.label().reference().clone(),
//!     "agent-b",
//!     Direction::Outgoing,
//!     serde_json::json!({ "description": "demand" }),
//! );
//! assert!(dialogue.update(cfp).unwrap());
//! ```

pub mod dialogue;
pub mod errors;
pub mod events;
pub mod message;
pub mod protocols;
pub mod registry;
pub mod stats;
pub mod sync;

// Re-export main types
pub use dialogue::{Dialogue, DialogueLabel, DialogueRules};
pub use errors::{DialogueError, DialogueResult};
pub use events::DialogueEvent;
pub use message::{
    Address, DialogueMessage, DialogueReference, Direction, MessageId, Performative,
    STARTING_MESSAGE_ID, STARTING_TARGET,
};
pub use registry::{DialogueRegistry, LabelSide, ResolutionStyle, Route, RouteTable};
pub use stats::DialogueStats;
pub use sync::SharedRegistry;
