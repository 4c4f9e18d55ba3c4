//! Dialogue statistics
//!
//! [`DialogueStats`] aggregates terminal outcomes per initiator side. The
//! end-state enum is closed: every cell is zero-initialized at
//! construction and feeding an undeclared end-state is an invariant
//! violation (the counters would otherwise silently grow a new cell and
//! reports would disagree about the universe of outcomes).

use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;

/// Counters of terminated dialogues, keyed by end-state and initiator
/// side. Counters only ever increment.
#[derive(Debug, Clone, Serialize)]
pub struct DialogueStats<E: Copy + Eq + Hash + fmt::Debug> {
    self_initiated: HashMap<E, u64>,
    other_initiated: HashMap<E, u64>,
}

impl<E: Copy + Eq + Hash + fmt::Debug> DialogueStats<E> {
    /// Create zeroed counters for the closed set of end-states.
    pub fn new(end_states: impl IntoIterator<Item = E>) -> Self {
        let zeroed: HashMap<E, u64> = end_states.into_iter().map(|e| (e, 0)).collect();
        Self {
            self_initiated: zeroed.clone(),
            other_initiated: zeroed,
        }
    }

    /// Counters for dialogues this agent opened.
    pub fn self_initiated(&self) -> &HashMap<E, u64> {
        &self.self_initiated
    }

    /// Counters for dialogues the counterparty opened.
    pub fn other_initiated(&self) -> &HashMap<E, u64> {
        &self.other_initiated
    }

    /// Record one terminated dialogue.
    ///
    /// Panics if `end_state` was not declared at construction; the enum is
    /// closed, so this is a bug in the calling protocol logic.
    pub fn add_dialogue_endstate(&mut self, end_state: E, is_self_initiated: bool) {
        let table = if is_self_initiated {
            &mut self.self_initiated
        } else {
            &mut self.other_initiated
        };
        match table.get_mut(&end_state) {
            Some(count) => *count += 1,
            None => panic!("end state {end_state:?} was not declared at construction"),
        }
    }

    /// Total number of terminated dialogues across all cells.
    pub fn total(&self) -> u64 {
        self.self_initiated
            .values()
            .chain(self.other_initiated.values())
            .sum()
    }
}
