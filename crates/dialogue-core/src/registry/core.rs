//! Core dialogue registry implementation
//!
//! The [`DialogueRegistry`] owns every dialogue of one agent: the primary
//! index keyed by [`DialogueLabel`], the per-role label index, the
//! provisional-to-final label map, the statistics and the nonce used to
//! mint fresh dialogue references.
//!
//! ## Classification of inbound messages
//!
//! ```text
//! inbound message
//!      ↓ is_permitted_for_new_dialogue?  → create_opponent_initiated
//!      ↓ is_belonging_to_registered_dialogue?
//!          self label   (reference, sender, own address)
//!          other label  (reference, sender, sender)
//!          provisional self label ((starter_ref, ""), sender, own address)
//!              ↳ on match: promote provisional → final, then resolve
//!      ↓ otherwise → unidentified dialogue, caller decides
//! ```
//!
//! Label promotion is a compound remove-and-reinsert across the primary
//! and role indices and is only performed here; a dialogue is never
//! observable under both labels or under neither.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, trace};

use super::routes::{LabelSide, ResolutionStyle, RouteTable};
use crate::dialogue::{Dialogue, DialogueLabel, DialogueRules};
use crate::errors::{DialogueError, DialogueResult};
use crate::events::DialogueEvent;
use crate::message::{
    Address, DialogueMessage, DialogueReference, STARTING_MESSAGE_ID, STARTING_TARGET,
};
use crate::stats::DialogueStats;

/// The collection of all dialogues kept for one agent.
///
/// Generic over the host message type `M`, the role enum `R` and the
/// end-state enum `E`. All protocol-specific behavior (the reply
/// structure, the resolution style, the role classifier for
/// opponent-initiated dialogues) is injected at construction.
pub struct DialogueRegistry<M: DialogueMessage, R, E>
where
    R: Copy + Eq + Hash + fmt::Debug,
    E: Copy + Eq + Hash + fmt::Debug,
{
    own_address: Address,
    rules: Arc<DialogueRules<M::Performative>>,
    style: ResolutionStyle<M::Performative>,
    role_from_first_message: Box<dyn Fn(&M) -> R + Send + Sync>,
    dialogues: HashMap<DialogueLabel, Dialogue<M, R, E>>,
    role_index: HashMap<R, HashSet<DialogueLabel>>,
    incomplete_to_complete: HashMap<DialogueLabel, DialogueLabel>,
    end_states: Vec<E>,
    stats: DialogueStats<E>,
    dialogue_nonce: u64,
    events: Option<mpsc::UnboundedSender<DialogueEvent>>,
}

impl<M, R, E> DialogueRegistry<M, R, E>
where
    M: DialogueMessage,
    R: Copy + Eq + Hash + fmt::Debug,
    E: Copy + Eq + Hash + fmt::Debug,
{
    /// Create a registry for the agent at `own_address`.
    ///
    /// `end_states` is the closed outcome enumeration (statistics cells
    /// are zero-initialized from it); `role_from_first_message` classifies
    /// the agent's role when the counterparty opens a dialogue.
    pub fn new<F>(
        own_address: impl Into<Address>,
        rules: DialogueRules<M::Performative>,
        end_states: impl IntoIterator<Item = E>,
        style: ResolutionStyle<M::Performative>,
        role_from_first_message: F,
    ) -> Self
    where
        F: Fn(&M) -> R + Send + Sync + 'static,
    {
        let end_states: Vec<E> = end_states.into_iter().collect();
        let stats = DialogueStats::new(end_states.iter().copied());
        Self {
            own_address: own_address.into(),
            rules: Arc::new(rules),
            style,
            role_from_first_message: Box::new(role_from_first_message),
            dialogues: HashMap::new(),
            role_index: HashMap::new(),
            incomplete_to_complete: HashMap::new(),
            end_states,
            stats,
            dialogue_nonce: 0,
            events: None,
        }
    }

    /// Address of the agent this registry belongs to.
    pub fn own_address(&self) -> &str {
        &self.own_address
    }

    /// The primary index of all dialogues.
    pub fn dialogues(&self) -> &HashMap<DialogueLabel, Dialogue<M, R, E>> {
        &self.dialogues
    }

    /// Number of registered dialogues.
    pub fn len(&self) -> usize {
        self.dialogues.len()
    }

    /// Whether no dialogue is registered.
    pub fn is_empty(&self) -> bool {
        self.dialogues.is_empty()
    }

    /// The dialogue statistics.
    pub fn dialogue_stats(&self) -> &DialogueStats<E> {
        &self.stats
    }

    /// Mutable access to the statistics, for handlers recording
    /// end-states directly.
    pub fn dialogue_stats_mut(&mut self) -> &mut DialogueStats<E> {
        &mut self.stats
    }

    /// Labels of every dialogue in which the agent plays `role`.
    pub fn labels_with_role(&self, role: R) -> impl Iterator<Item = &DialogueLabel> {
        self.role_index.get(&role).into_iter().flatten()
    }

    /// Dialogues in which the agent plays `role`.
    pub fn dialogues_with_role(&self, role: R) -> impl Iterator<Item = &Dialogue<M, R, E>> {
        self.labels_with_role(role)
            .filter_map(|label| self.dialogues.get(label))
    }

    /// Wire in a lifecycle event sender.
    ///
    /// Emission is fire-and-forget; a dropped receiver is ignored.
    pub fn set_event_sender(&mut self, sender: mpsc::UnboundedSender<DialogueEvent>) {
        self.events = Some(sender);
    }

    fn emit(&self, event: DialogueEvent) {
        if let Some(sender) = &self.events {
            let _ = sender.send(event);
        }
    }

    fn next_dialogue_nonce(&mut self) -> u64 {
        self.dialogue_nonce += 1;
        self.dialogue_nonce
    }

    /// Mint the reference pair for a new self-initiated dialogue.
    pub fn new_self_initiated_reference(&mut self) -> DialogueReference {
        DialogueReference::starter_only(self.next_dialogue_nonce().to_string())
    }

    /// Open a dialogue from this agent's side.
    ///
    /// Mints a fresh reference, builds the provisional label and indexes
    /// the dialogue under `role`. A duplicate label cannot occur with a
    /// monotonic nonce, so one surfacing is an invariant violation.
    pub fn create_self_initiated(
        &mut self,
        opponent_addr: &str,
        starter_addr: &str,
        role: R,
    ) -> DialogueResult<&mut Dialogue<M, R, E>> {
        let reference = self.new_self_initiated_reference();
        let label = DialogueLabel::new(reference, opponent_addr, starter_addr);
        self.insert(label, role)
    }

    /// Register a dialogue the counterparty opened, deriving the agent's
    /// role from the opening message.
    pub fn create_opponent_initiated(
        &mut self,
        first_message: &M,
        sender: &str,
    ) -> DialogueResult<&mut Dialogue<M, R, E>> {
        let role = (self.role_from_first_message)(first_message);
        self.create_opponent_initiated_with_role(first_message, sender, role)
    }

    /// Register a dialogue the counterparty opened, with an explicit role.
    ///
    /// The label keeps the message's reference verbatim; starter and
    /// opponent addresses are both the sender.
    pub fn create_opponent_initiated_with_role(
        &mut self,
        first_message: &M,
        sender: &str,
        role: R,
    ) -> DialogueResult<&mut Dialogue<M, R, E>> {
        let reference = first_message.dialogue_reference();
        if reference.starter().is_empty() || reference.is_complete() {
            return Err(DialogueError::malformed_label(format!(
                "cannot register an opponent-initiated dialogue under reference {reference}"
            )));
        }
        let label = DialogueLabel::new(reference.clone(), sender, sender);
        self.insert(label, role)
    }

    /// Insert a freshly constructed dialogue into the primary and role
    /// indices as one unit.
    fn insert(&mut self, label: DialogueLabel, role: R) -> DialogueResult<&mut Dialogue<M, R, E>> {
        if self.dialogues.contains_key(&label) {
            return Err(DialogueError::duplicate_label(&label));
        }
        debug!(label = %label, role = ?role, "created dialogue");
        self.role_index.entry(role).or_default().insert(label.clone());
        let dialogue = Dialogue::new(label.clone(), role, Arc::clone(&self.rules));
        self.emit(DialogueEvent::Created {
            label: label.clone(),
            self_initiated: dialogue.is_self_initiated(),
        });
        Ok(self.dialogues.entry(label).or_insert(dialogue))
    }

    /// Whether `message` may open a new dialogue: exactly the starting
    /// id/target pair and an initial performative.
    ///
    /// This is the gate that keeps arbitrary traffic from spawning
    /// unbounded spurious dialogues.
    pub fn is_permitted_for_new_dialogue(&self, message: &M) -> bool {
        message.message_id() == STARTING_MESSAGE_ID
            && message.target() == STARTING_TARGET
            && self.rules.is_initial(message.performative())
    }

    /// Whether `message` continues a registered dialogue.
    ///
    /// Resolves both candidate labels (and, for a complete reference, the
    /// provisional self-initiated label) and delegates to that dialogue's
    /// validity check. A match on the provisional label promotes it to the
    /// final label before returning.
    ///
    /// Errors are invariant violations surfaced by the promotion.
    pub fn is_belonging_to_registered_dialogue(
        &mut self,
        message: &M,
        sender: &str,
    ) -> DialogueResult<bool> {
        Ok(self.resolve(message, sender)?.is_some())
    }

    /// Retrieve the dialogue `message` belongs to.
    ///
    /// Uses the same resolution (and promotion) as
    /// [`DialogueRegistry::is_belonging_to_registered_dialogue`], so the
    /// two can never disagree; a miss is reported as
    /// [`DialogueError::NotFound`].
    pub fn get_dialogue(
        &mut self,
        message: &M,
        sender: &str,
    ) -> DialogueResult<&mut Dialogue<M, R, E>> {
        let Some(label) = self.resolve(message, sender)? else {
            return Err(DialogueError::not_found(format!(
                "reference {} from {sender}",
                message.dialogue_reference()
            )));
        };
        self.dialogues
            .get_mut(&label)
            .ok_or_else(|| DialogueError::inconsistent_state("resolved label left the index"))
    }

    /// Retrieve a dialogue by its exact label.
    pub fn get_dialogue_from_label(&self, label: &DialogueLabel) -> Option<&Dialogue<M, R, E>> {
        self.dialogues.get(label)
    }

    /// Mutable variant of [`DialogueRegistry::get_dialogue_from_label`].
    pub fn get_dialogue_from_label_mut(
        &mut self,
        label: &DialogueLabel,
    ) -> Option<&mut Dialogue<M, R, E>> {
        self.dialogues.get_mut(label)
    }

    /// The final version of `label` if it was promoted, otherwise `label`
    /// itself.
    pub fn latest_label(&self, label: DialogueLabel) -> DialogueLabel {
        self.incomplete_to_complete
            .get(&label)
            .cloned()
            .unwrap_or(label)
    }

    fn resolve(&mut self, message: &M, sender: &str) -> DialogueResult<Option<DialogueLabel>> {
        if let ResolutionStyle::Routes(table) = &self.style {
            return Ok(self.resolve_routes(table, message, sender));
        }
        self.resolve_adjacency(message, sender)
    }

    /// Route-table resolution: the `(performative, target)` pair selects
    /// at most one label kind, then the expectation predicate runs.
    fn resolve_routes(
        &self,
        table: &RouteTable<M::Performative>,
        message: &M,
        sender: &str,
    ) -> Option<DialogueLabel> {
        let route = table.resolve(message.performative(), message.target())?;
        let reference = message.dialogue_reference().clone();
        let label = match route.side {
            LabelSide::SelfInitiated => {
                DialogueLabel::new(reference, sender, self.own_address.as_str())
            }
            LabelSide::OtherInitiated => DialogueLabel::new(reference, sender, sender),
        };
        let label = self.latest_label(label);
        let dialogue = self.dialogues.get(&label)?;
        if dialogue.is_expecting_reply_to(route.expects) {
            Some(label)
        } else {
            trace!(label = %label, expects = ?route.expects, "route expectation not met");
            None
        }
    }

    /// Dual-label adjacency resolution. A validity-checked self-initiated
    /// candidate wins over an other-initiated one.
    fn resolve_adjacency(
        &mut self,
        message: &M,
        sender: &str,
    ) -> DialogueResult<Option<DialogueLabel>> {
        let reference = message.dialogue_reference().clone();

        let self_label = self.latest_label(DialogueLabel::new(
            reference.clone(),
            sender,
            self.own_address.as_str(),
        ));
        if self.label_accepts(&self_label, message) {
            return Ok(Some(self_label));
        }

        let other_label = self.latest_label(DialogueLabel::new(reference.clone(), sender, sender));
        if self.label_accepts(&other_label, message) {
            return Ok(Some(other_label));
        }

        // A complete reference may close over a dialogue we opened before
        // the counterparty assigned its responder nonce.
        if reference.is_complete() {
            let provisional =
                DialogueLabel::new(reference.incomplete(), sender, self.own_address.as_str());
            if self.label_accepts(&provisional, message) {
                let final_label =
                    DialogueLabel::new(reference, sender, self.own_address.as_str());
                self.promote(&provisional, final_label.clone())?;
                return Ok(Some(final_label));
            }
        }

        Ok(None)
    }

    fn label_accepts(&self, label: &DialogueLabel, message: &M) -> bool {
        self.dialogues
            .get(label)
            .is_some_and(|dialogue| dialogue.is_valid_next_message(message))
    }

    /// Promote a provisional label to its final version.
    ///
    /// The only place a dialogue's label changes: removes the dialogue
    /// from the primary and role indices under the provisional label and
    /// reinserts it under the final one as a single unit, recording the
    /// provisional → final mapping. Every precondition failure is an
    /// invariant violation.
    pub fn promote(
        &mut self,
        provisional: &DialogueLabel,
        final_label: DialogueLabel,
    ) -> DialogueResult<()> {
        if self.dialogues.contains_key(&final_label) {
            return Err(DialogueError::duplicate_label(&final_label));
        }
        if self.incomplete_to_complete.contains_key(provisional) {
            return Err(DialogueError::invalid_promotion(format!(
                "label {provisional} was already promoted"
            )));
        }
        let mut dialogue = self.dialogues.remove(provisional).ok_or_else(|| {
            DialogueError::invalid_promotion(format!("label {provisional} is not registered"))
        })?;
        if let Err(error) = dialogue.assign_final_dialogue_label(final_label.clone()) {
            // restore the provisional entry so the failure leaves the
            // registry unchanged
            self.dialogues.insert(provisional.clone(), dialogue);
            return Err(error);
        }
        if let Some(labels) = self.role_index.get_mut(&dialogue.role()) {
            labels.remove(provisional);
            labels.insert(final_label.clone());
        }
        self.incomplete_to_complete
            .insert(provisional.clone(), final_label.clone());
        debug!(from = %provisional, to = %final_label, "promoted dialogue label");
        self.emit(DialogueEvent::LabelPromoted {
            provisional: provisional.clone(),
            label: final_label.clone(),
        });
        self.dialogues.insert(final_label, dialogue);
        Ok(())
    }

    /// Record the terminal outcome of the dialogue under `label` and bump
    /// the matching statistics cell.
    pub fn terminate_dialogue(&mut self, label: &DialogueLabel, end_state: E) -> DialogueResult<()> {
        let dialogue = self
            .dialogues
            .get_mut(label)
            .ok_or_else(|| DialogueError::not_found(format!("label {label}")))?;
        dialogue.terminate(end_state)?;
        let is_self_initiated = dialogue.is_self_initiated();
        self.stats.add_dialogue_endstate(end_state, is_self_initiated);
        self.emit(DialogueEvent::Terminated {
            label: label.clone(),
            outcome: format!("{end_state:?}"),
        });
        Ok(())
    }

    /// Drop every dialogue, role index entry, label mapping and
    /// statistic.
    ///
    /// The nonce is preserved so references stay unique across episodes.
    pub fn reset(&mut self) {
        debug!(dialogues = self.dialogues.len(), "reset dialogue registry");
        self.dialogues.clear();
        self.role_index.clear();
        self.incomplete_to_complete.clear();
        self.stats = DialogueStats::new(self.end_states.iter().copied());
    }
}

impl<M, R, E> fmt::Debug for DialogueRegistry<M, R, E>
where
    M: DialogueMessage,
    R: Copy + Eq + Hash + fmt::Debug,
    E: Copy + Eq + Hash + fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DialogueRegistry")
            .field("own_address", &self.own_address)
            .field("dialogues", &self.dialogues.len())
            .field("dialogue_nonce", &self.dialogue_nonce)
            .finish()
    }
}
