//! Property tests
//!
//! Boundary sweeps over the label, adjacency and statistics invariants:
//! structural label equality, lossless JSON round-trips, strict id/target
//! lockstep and statistics conservation.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use proptest::prelude::*;

use agora_dialogue_core::protocols::fipa::{
    self, FipaBody, FipaMessage, FipaPerformative, NegotiationOutcome, NegotiationRole,
};
use agora_dialogue_core::{
    Dialogue, DialogueLabel, DialogueReference, DialogueStats, Direction,
};

fn hash_of(label: &DialogueLabel) -> u64 {
    let mut hasher = DefaultHasher::new();
    label.hash(&mut hasher);
    hasher.finish()
}

fn address() -> impl Strategy<Value = String> {
    "[a-z0-9]{1,12}"
}

proptest! {
    /// Two labels built from the same triple are equal and hash
    /// identically; changing any one field breaks equality.
    #[test]
    fn label_equality_is_structural(
        starter_ref in "[a-z0-9]{1,8}",
        responder_ref in "[a-z0-9]{0,8}",
        opponent in address(),
        starter in address(),
    ) {
        let reference = DialogueReference::new(starter_ref.clone(), responder_ref.clone());
        let a = DialogueLabel::new(reference.clone(), opponent.clone(), starter.clone());
        let b = DialogueLabel::new(reference, opponent.clone(), starter.clone());
        prop_assert_eq!(&a, &b);
        prop_assert_eq!(hash_of(&a), hash_of(&b));

        let other_ref = DialogueLabel::new(
            DialogueReference::new(format!("{starter_ref}x"), responder_ref),
            opponent.clone(),
            starter.clone(),
        );
        prop_assert_ne!(&a, &other_ref);
        let other_opponent = DialogueLabel::new(
            a.reference().clone(),
            format!("{opponent}x"),
            starter.clone(),
        );
        prop_assert_ne!(&a, &other_opponent);
        let other_starter =
            DialogueLabel::new(a.reference().clone(), opponent, format!("{starter}x"));
        prop_assert_ne!(&a, &other_starter);
    }

    /// The four-field JSON mapping round-trips losslessly.
    #[test]
    fn label_json_round_trips(
        starter_ref in "[a-z0-9]{1,8}",
        responder_ref in "[a-z0-9]{0,8}",
        opponent in address(),
        starter in address(),
    ) {
        let label = DialogueLabel::new(
            DialogueReference::new(starter_ref, responder_ref),
            opponent,
            starter,
        );
        let restored = DialogueLabel::from_json(&label.to_json()).unwrap();
        prop_assert_eq!(restored, label);
    }

    /// Against a last outgoing message (id=k, target=t, CFP), a candidate
    /// propose is accepted iff it carries exactly (k+1, t+1); any other
    /// id/target pair is rejected, as is a performative the table forbids.
    #[test]
    fn adjacency_requires_strict_lockstep(
        k in 1u32..500,
        t in 0u32..500,
        candidate_id in 0u32..502,
        candidate_target in 0u32..502,
    ) {
        let label = DialogueLabel::new(DialogueReference::starter_only("1"), "peer", "self");
        let mut dialogue: Dialogue<FipaMessage, NegotiationRole, NegotiationOutcome> =
            Dialogue::new(label, NegotiationRole::Buyer, Arc::new(fipa::negotiation_rules()));
        dialogue.extend_outgoing(FipaMessage::new(
            k,
            t,
            FipaPerformative::Cfp,
            DialogueReference::starter_only("1"),
            "peer",
            Direction::Outgoing,
            FipaBody::Empty,
        ));

        let propose = FipaMessage::new(
            candidate_id,
            candidate_target,
            FipaPerformative::Propose,
            DialogueReference::starter_only("1"),
            "peer",
            Direction::Incoming,
            FipaBody::Empty,
        );
        let expected = candidate_id == k + 1 && candidate_target == t + 1;
        prop_assert_eq!(dialogue.is_valid_next_message(&propose), expected);

        // CFP is not a legal predecessor of MatchAccept, ids notwithstanding
        let match_accept = FipaMessage::new(
            k + 1,
            t + 1,
            FipaPerformative::MatchAccept,
            DialogueReference::starter_only("1"),
            "peer",
            Direction::Incoming,
            FipaBody::Empty,
        );
        prop_assert!(!dialogue.is_valid_next_message(&match_accept));
    }

    /// N increments of one (end-state, initiator) cell leave every other
    /// cell at zero and the total at N.
    #[test]
    fn stats_conservation(
        n in 0u64..200,
        state_index in 0usize..4,
        is_self_initiated in any::<bool>(),
    ) {
        let end_state = fipa::NEGOTIATION_OUTCOMES[state_index];
        let mut stats = DialogueStats::new(fipa::NEGOTIATION_OUTCOMES);
        for _ in 0..n {
            stats.add_dialogue_endstate(end_state, is_self_initiated);
        }

        for candidate in fipa::NEGOTIATION_OUTCOMES {
            for side_is_self in [true, false] {
                let table = if side_is_self {
                    stats.self_initiated()
                } else {
                    stats.other_initiated()
                };
                let expected = if candidate == end_state && side_is_self == is_self_initiated {
                    n
                } else {
                    0
                };
                prop_assert_eq!(table[&candidate], expected);
            }
        }
        prop_assert_eq!(stats.total(), n);
    }
}
