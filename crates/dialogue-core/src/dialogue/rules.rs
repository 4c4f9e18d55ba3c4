//! Protocol reply structure
//!
//! [`DialogueRules`] carries the per-protocol constants consumed by the
//! dialogue validity checker: which performatives may open a dialogue,
//! which may terminate one, and the adjacency table saying which
//! performative may legally precede (be the target of) each performative.
//!
//! Rules are plain data fixed at registration time and injected into
//! dialogues and registries; protocol modules build them once (see
//! [`crate::protocols::fipa::negotiation_rules`]).

use std::collections::{HashMap, HashSet};

use crate::message::Performative;

/// The reply structure of a dialogue protocol.
#[derive(Debug, Clone)]
pub struct DialogueRules<P: Performative> {
    initial_performatives: HashSet<P>,
    terminal_performatives: HashSet<P>,
    valid_previous: HashMap<P, HashSet<P>>,
}

impl<P: Performative> DialogueRules<P> {
    /// Build the rules from the three protocol constants.
    ///
    /// `valid_previous` maps each performative to the set of performatives
    /// a message of that kind may respond to; performatives absent from
    /// the map can never continue a dialogue.
    pub fn new<I, T, V>(initial: I, terminal: T, valid_previous: V) -> Self
    where
        I: IntoIterator<Item = P>,
        T: IntoIterator<Item = P>,
        V: IntoIterator<Item = (P, Vec<P>)>,
    {
        Self {
            initial_performatives: initial.into_iter().collect(),
            terminal_performatives: terminal.into_iter().collect(),
            valid_previous: valid_previous
                .into_iter()
                .map(|(performative, previous)| (performative, previous.into_iter().collect()))
                .collect(),
        }
    }

    /// Whether `performative` may open a new dialogue.
    pub fn is_initial(&self, performative: P) -> bool {
        self.initial_performatives.contains(&performative)
    }

    /// Whether a dialogue may terminate after `performative`.
    pub fn is_terminal(&self, performative: P) -> bool {
        self.terminal_performatives.contains(&performative)
    }

    /// Whether a message with `next` may legally follow one with
    /// `previous`.
    pub fn may_follow(&self, previous: P, next: P) -> bool {
        self.valid_previous
            .get(&next)
            .is_some_and(|previous_set| previous_set.contains(&previous))
    }

    /// The set of performatives that may precede `performative`, if it can
    /// continue a dialogue at all.
    pub fn valid_previous(&self, performative: P) -> Option<&HashSet<P>> {
        self.valid_previous.get(&performative)
    }

    /// The performatives that may open a dialogue.
    pub fn initial_performatives(&self) -> &HashSet<P> {
        &self.initial_performatives
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    enum Tag {
        Open,
        Counter,
        Close,
    }

    fn rules() -> DialogueRules<Tag> {
        DialogueRules::new(
            [Tag::Open],
            [Tag::Close],
            [
                (Tag::Counter, vec![Tag::Open, Tag::Counter]),
                (Tag::Close, vec![Tag::Counter]),
            ],
        )
    }

    #[test]
    fn initial_and_terminal_queries() {
        let rules = rules();
        assert!(rules.is_initial(Tag::Open));
        assert!(!rules.is_initial(Tag::Close));
        assert!(rules.is_terminal(Tag::Close));
        assert!(!rules.is_terminal(Tag::Counter));
    }

    #[test]
    fn adjacency_queries() {
        let rules = rules();
        assert!(rules.may_follow(Tag::Open, Tag::Counter));
        assert!(rules.may_follow(Tag::Counter, Tag::Counter));
        assert!(rules.may_follow(Tag::Counter, Tag::Close));
        assert!(!rules.may_follow(Tag::Open, Tag::Close));
        // Open is not in the table: nothing may precede it
        assert!(!rules.may_follow(Tag::Close, Tag::Open));
        assert!(rules.valid_previous(Tag::Open).is_none());
    }
}
