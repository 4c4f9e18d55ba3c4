//! Dialogue implementation
//!
//! This module contains the main [`Dialogue`] struct: the per-negotiation
//! state machine. A dialogue records the ordered incoming and outgoing
//! message histories, decides whether a candidate message is a legal
//! continuation, and carries the terminal outcome once the negotiation
//! ends.
//!
//! Two validity checks are exposed:
//!
//! - [`Dialogue::is_valid_next_message`] anchors on the last *outgoing*
//!   message and is what registries consult when routing an inbound
//!   message (see §[`crate::registry`]).
//! - [`Dialogue::is_valid_successor`] anchors on the last message in the
//!   conversation regardless of direction and is what the append
//!   operations use, so both sides of the exchange can be recorded
//!   through [`Dialogue::update`].
//!
//! The id/target lockstep (`+1` each per step) is the replay and forgery
//! defense: a continuation is only accepted with the exact next id/target
//! pair and a performative the adjacency table declares as a legal reply.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, trace, warn};

use super::label::DialogueLabel;
use super::rules::DialogueRules;
use crate::errors::{DialogueError, DialogueResult};
use crate::message::{DialogueMessage, MessageId, STARTING_MESSAGE_ID, STARTING_TARGET};

/// A single bilateral negotiation instance.
///
/// Owned by the [`DialogueRegistry`](crate::registry::DialogueRegistry)
/// that created it; generic over the host message type `M`, the agent role
/// `R` and the terminal outcome `E`.
pub struct Dialogue<M: DialogueMessage, R, E> {
    label: DialogueLabel,
    role: R,
    is_self_initiated: bool,
    rules: Arc<DialogueRules<M::Performative>>,
    outgoing: Vec<M>,
    incoming: Vec<M>,
    end_state: Option<E>,
}

impl<M, R, E> Dialogue<M, R, E>
where
    M: DialogueMessage,
    R: Copy + fmt::Debug,
    E: Copy + fmt::Debug,
{
    /// Create a dialogue under `label` with the agent playing `role`.
    ///
    /// A dialogue is self-initiated when its starter is not the opponent,
    /// i.e. this agent sent the very first message.
    pub fn new(label: DialogueLabel, role: R, rules: Arc<DialogueRules<M::Performative>>) -> Self {
        let is_self_initiated = label.opponent_addr() != label.starter_addr();
        Self {
            label,
            role,
            is_self_initiated,
            rules,
            outgoing: Vec::new(),
            incoming: Vec::new(),
            end_state: None,
        }
    }

    /// The current label, provisional until promoted.
    pub fn label(&self) -> &DialogueLabel {
        &self.label
    }

    /// The agent's role in this dialogue, fixed at construction.
    pub fn role(&self) -> R {
        self.role
    }

    /// Whether this agent opened the dialogue.
    pub fn is_self_initiated(&self) -> bool {
        self.is_self_initiated
    }

    /// Messages sent by this agent, in insertion order.
    pub fn outgoing_messages(&self) -> &[M] {
        &self.outgoing
    }

    /// Messages received in this dialogue, in insertion order.
    pub fn incoming_messages(&self) -> &[M] {
        &self.incoming
    }

    /// The terminal outcome, unset until the dialogue terminates.
    pub fn end_state(&self) -> Option<E> {
        self.end_state
    }

    /// Whether an end-state has been recorded.
    pub fn is_terminated(&self) -> bool {
        self.end_state.is_some()
    }

    /// Whether no message has been recorded in either direction.
    pub fn is_empty(&self) -> bool {
        self.outgoing.is_empty() && self.incoming.is_empty()
    }

    /// The last message sent by this agent, if any.
    pub fn last_outgoing_message(&self) -> Option<&M> {
        self.outgoing.last()
    }

    /// The last message received, if any.
    pub fn last_incoming_message(&self) -> Option<&M> {
        self.incoming.last()
    }

    /// The last message overall: the higher message id across both
    /// directions, or the only side present.
    ///
    /// Equal ids on both sides cannot arise from validated appends and are
    /// reported as an inconsistent-state error.
    pub fn last_message(&self) -> DialogueResult<Option<&M>> {
        match (self.last_outgoing_message(), self.last_incoming_message()) {
            (Some(out), Some(inc)) => {
                if out.message_id() > inc.message_id() {
                    Ok(Some(out))
                } else if inc.message_id() > out.message_id() {
                    Ok(Some(inc))
                } else {
                    Err(DialogueError::inconsistent_state(format!(
                        "dialogue {} holds message id {} in both directions",
                        self.label,
                        out.message_id()
                    )))
                }
            }
            (Some(out), None) => Ok(Some(out)),
            (None, Some(inc)) => Ok(Some(inc)),
            (None, None) => Ok(None),
        }
    }

    /// Find the recorded message with id `message_id`, if any.
    pub fn get_message(&self, message_id: MessageId) -> Option<&M> {
        self.outgoing
            .iter()
            .chain(self.incoming.iter())
            .find(|m| m.message_id() == message_id)
    }

    /// Whether the last outgoing performative equals `performative`,
    /// i.e. the dialogue is waiting for a reply to it.
    ///
    /// This is the expectation-flag check used by route-table registries.
    pub fn is_expecting_reply_to(&self, performative: M::Performative) -> bool {
        self.last_outgoing_message()
            .is_some_and(|m| m.performative() == performative)
    }

    /// Whether `message` legally continues this dialogue, anchored on the
    /// last *outgoing* message.
    ///
    /// With no outgoing message yet, the candidate must carry the exact
    /// opening triple (id 1, target 0, an initial performative).
    /// Otherwise its id and target must each exceed the last outgoing
    /// message's by exactly one and the adjacency table must allow the
    /// succession.
    pub fn is_valid_next_message(&self, message: &M) -> bool {
        match self.last_outgoing_message() {
            None => self.is_valid_opening(message),
            Some(last) => self.is_valid_step(last, message),
        }
    }

    /// Whether `message` legally continues the conversation, anchored on
    /// the last message regardless of direction.
    pub fn is_valid_successor(&self, message: &M) -> DialogueResult<bool> {
        let result = match self.last_message()? {
            None => self.is_valid_opening(message),
            Some(last) => self.is_valid_step(last, message),
        };
        Ok(result)
    }

    fn is_valid_opening(&self, message: &M) -> bool {
        message.message_id() == STARTING_MESSAGE_ID
            && message.target() == STARTING_TARGET
            && self.rules.is_initial(message.performative())
    }

    fn is_valid_step(&self, last: &M, message: &M) -> bool {
        message.message_id() == last.message_id() + 1
            && message.target() == last.target() + 1
            && self.rules.may_follow(last.performative(), message.performative())
    }

    /// Append a message sent by this agent without validation.
    ///
    /// Callers use this once validity has been established elsewhere, e.g.
    /// after constructing a reply from the dialogue's own state.
    pub fn extend_outgoing(&mut self, message: M) {
        self.outgoing.push(message);
    }

    /// Append a received message without validation.
    pub fn extend_incoming(&mut self, message: M) {
        self.incoming.push(message);
    }

    /// Validate `message` as a successor and append it on the side its
    /// direction indicates.
    ///
    /// Returns whether the message was recorded; a rejection leaves both
    /// histories untouched.
    pub fn safe_extend(&mut self, message: M) -> DialogueResult<bool> {
        if !self.is_valid_successor(&message)? {
            trace!(
                label = %self.label,
                message_id = message.message_id(),
                target = message.target(),
                performative = ?message.performative(),
                "rejected message"
            );
            return Ok(false);
        }
        if message.direction().is_incoming() {
            self.incoming.push(message);
        } else {
            self.outgoing.push(message);
        }
        Ok(true)
    }

    /// Like [`Dialogue::safe_extend`], additionally requiring the message
    /// to declare this dialogue's counterparty and starter reference.
    pub fn update(&mut self, message: M) -> DialogueResult<bool> {
        if message.counterparty() != self.label.opponent_addr() {
            warn!(
                label = %self.label,
                counterparty = message.counterparty(),
                "message counterparty differs from the dialogue opponent"
            );
            return Ok(false);
        }
        if message.dialogue_reference().starter() != self.label.starter_reference() {
            return Ok(false);
        }
        self.safe_extend(message)
    }

    /// Replace a provisional label with its final version.
    ///
    /// Permitted only when the current label is provisional and the final
    /// label keeps the starter reference and both addresses while carrying
    /// a non-empty responder reference. Anything else means the registry
    /// mis-tracked which dialogue a finalization belongs to and is an
    /// invariant violation.
    pub fn assign_final_dialogue_label(
        &mut self,
        final_label: DialogueLabel,
    ) -> DialogueResult<()> {
        if self.label.is_complete() {
            return Err(DialogueError::invalid_promotion(format!(
                "label {} is already final",
                self.label
            )));
        }
        if !final_label.is_complete() {
            return Err(DialogueError::invalid_promotion(format!(
                "candidate label {final_label} has no responder reference"
            )));
        }
        if final_label.starter_reference() != self.label.starter_reference()
            || final_label.opponent_addr() != self.label.opponent_addr()
            || final_label.starter_addr() != self.label.starter_addr()
        {
            return Err(DialogueError::invalid_promotion(format!(
                "candidate label {} does not match provisional label {}",
                final_label, self.label
            )));
        }
        debug!(from = %self.label, to = %final_label, "assigned final dialogue label");
        self.label = final_label;
        Ok(())
    }

    /// Record the terminal outcome of this dialogue.
    ///
    /// Recording a second outcome is an invariant violation.
    pub fn terminate(&mut self, end_state: E) -> DialogueResult<()> {
        if let Some(existing) = self.end_state {
            return Err(DialogueError::inconsistent_state(format!(
                "dialogue {} already terminated with {existing:?}",
                self.label
            )));
        }
        debug!(label = %self.label, end_state = ?end_state, "dialogue terminated");
        self.end_state = Some(end_state);
        Ok(())
    }
}

impl<M, R, E> fmt::Debug for Dialogue<M, R, E>
where
    M: DialogueMessage,
    R: fmt::Debug,
    E: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dialogue")
            .field("label", &self.label)
            .field("role", &self.role)
            .field("is_self_initiated", &self.is_self_initiated)
            .field("outgoing", &self.outgoing.len())
            .field("incoming", &self.incoming.len())
            .field("end_state", &self.end_state)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{Direction, DialogueReference};
    use crate::protocols::fipa::{self, FipaBody, FipaMessage, FipaPerformative};
    use crate::protocols::fipa::{NegotiationOutcome, NegotiationRole};

    type TestDialogue = Dialogue<FipaMessage, NegotiationRole, NegotiationOutcome>;

    fn dialogue() -> TestDialogue {
        let label = DialogueLabel::new(DialogueReference::starter_only("1"), "seller", "buyer");
        Dialogue::new(label, NegotiationRole::Buyer, Arc::new(fipa::negotiation_rules()))
    }

    fn message(
        id: MessageId,
        target: MessageId,
        performative: FipaPerformative,
        direction: Direction,
    ) -> FipaMessage {
        FipaMessage::new(
            id,
            target,
            performative,
            DialogueReference::starter_only("1"),
            "seller",
            direction,
            FipaBody::Empty,
        )
    }

    #[test]
    fn self_initiation_is_derived_from_the_label() {
        let dialogue = dialogue();
        assert!(dialogue.is_self_initiated());

        let opponent_label =
            DialogueLabel::new(DialogueReference::starter_only("1"), "seller", "seller");
        let other: TestDialogue = Dialogue::new(
            opponent_label,
            NegotiationRole::Seller,
            Arc::new(fipa::negotiation_rules()),
        );
        assert!(!other.is_self_initiated());
    }

    #[test]
    fn opening_message_must_carry_the_starting_triple() {
        let dialogue = dialogue();
        let cfp = message(1, 0, FipaPerformative::Cfp, Direction::Outgoing);
        assert!(dialogue.is_valid_next_message(&cfp));

        let wrong_id = message(2, 0, FipaPerformative::Cfp, Direction::Outgoing);
        assert!(!dialogue.is_valid_next_message(&wrong_id));
        let wrong_target = message(1, 1, FipaPerformative::Cfp, Direction::Outgoing);
        assert!(!dialogue.is_valid_next_message(&wrong_target));
        let wrong_performative = message(1, 0, FipaPerformative::Propose, Direction::Outgoing);
        assert!(!dialogue.is_valid_next_message(&wrong_performative));
    }

    #[test]
    fn successor_check_walks_both_directions() {
        let mut dialogue = dialogue();
        assert!(dialogue
            .safe_extend(message(1, 0, FipaPerformative::Cfp, Direction::Outgoing))
            .unwrap());
        assert!(dialogue
            .safe_extend(message(2, 1, FipaPerformative::Propose, Direction::Incoming))
            .unwrap());
        // our accept follows the incoming propose
        assert!(dialogue
            .safe_extend(message(3, 2, FipaPerformative::Accept, Direction::Outgoing))
            .unwrap());

        assert_eq!(dialogue.outgoing_messages().len(), 2);
        assert_eq!(dialogue.incoming_messages().len(), 1);
        assert_eq!(
            dialogue.last_message().unwrap().map(|m| m.message_id()),
            Some(3)
        );
        assert_eq!(
            dialogue.get_message(2).map(|m| m.performative()),
            Some(FipaPerformative::Propose)
        );
        assert!(dialogue.get_message(9).is_none());
    }

    #[test]
    fn rejection_leaves_history_untouched() {
        let mut dialogue = dialogue();
        assert!(dialogue
            .safe_extend(message(1, 0, FipaPerformative::Cfp, Direction::Outgoing))
            .unwrap());
        // target must be exactly 1
        assert!(!dialogue
            .safe_extend(message(2, 5, FipaPerformative::Propose, Direction::Incoming))
            .unwrap());
        assert!(dialogue.incoming_messages().is_empty());
        assert_eq!(dialogue.outgoing_messages().len(), 1);
    }

    #[test]
    fn equal_ids_on_both_sides_is_an_inconsistency() {
        let mut dialogue = dialogue();
        dialogue.extend_outgoing(message(1, 0, FipaPerformative::Cfp, Direction::Outgoing));
        dialogue.extend_incoming(message(1, 0, FipaPerformative::Cfp, Direction::Incoming));
        assert!(matches!(
            dialogue.last_message(),
            Err(DialogueError::InconsistentState { .. })
        ));
    }

    #[test]
    fn update_rejects_foreign_counterparty() {
        let mut dialogue = dialogue();
        let mut foreign = message(1, 0, FipaPerformative::Cfp, Direction::Outgoing);
        foreign.set_counterparty("intruder");
        assert!(!dialogue.update(foreign).unwrap());
        assert!(dialogue.is_empty());
    }

    #[test]
    fn final_label_assignment_guards_its_preconditions() {
        let mut dialogue = dialogue();
        let unrelated = DialogueLabel::new(DialogueReference::new("9", "4"), "seller", "buyer");
        assert!(matches!(
            dialogue.assign_final_dialogue_label(unrelated),
            Err(DialogueError::InvalidPromotion { .. })
        ));

        let still_provisional =
            DialogueLabel::new(DialogueReference::starter_only("1"), "seller", "buyer");
        assert!(dialogue.assign_final_dialogue_label(still_provisional).is_err());

        let final_label = DialogueLabel::new(DialogueReference::new("1", "7"), "seller", "buyer");
        dialogue.assign_final_dialogue_label(final_label.clone()).unwrap();
        assert_eq!(dialogue.label(), &final_label);

        // a complete label can never change again
        let another = DialogueLabel::new(DialogueReference::new("1", "8"), "seller", "buyer");
        assert!(dialogue.assign_final_dialogue_label(another).is_err());
    }

    #[test]
    fn terminate_records_exactly_one_outcome() {
        let mut dialogue = dialogue();
        dialogue.terminate(NegotiationOutcome::Successful).unwrap();
        assert!(dialogue.is_terminated());
        assert_eq!(dialogue.end_state(), Some(NegotiationOutcome::Successful));
        assert!(dialogue.terminate(NegotiationOutcome::DeclinedCfp).is_err());
    }
}
