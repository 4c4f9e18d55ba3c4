//! Dialogue registry module
//!
//! This module provides the [`DialogueRegistry`], the top-level collection
//! that creates, indexes and retrieves dialogues from inbound and outbound
//! messages, plus the resolution machinery deciding which registered
//! dialogue a message belongs to:
//!
//! - [`ResolutionStyle::Adjacency`]: dual-label resolution backed by the
//!   per-dialogue adjacency check (generic bidirectional dialogues)
//! - [`ResolutionStyle::Routes`]: a fixed [`RouteTable`] narrowing
//!   eligibility by `(performative, target)` before the expectation
//!   predicate runs (single-sided skill dialogues)

pub mod core;
pub mod routes;

// Re-export the main registry types
pub use core::DialogueRegistry;
pub use routes::{LabelSide, ResolutionStyle, Route, RouteTable};
