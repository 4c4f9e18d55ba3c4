//! Message seam between the dialogue engine and host protocol stacks
//!
//! The engine consumes messages, it never owns their wire format. Hosts
//! implement [`DialogueMessage`] for their decoded message type and the
//! engine reads only the sequencing fields it needs: message id, target,
//! performative, dialogue reference, counterparty and direction.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::Hash;

/// Identifier of a message within one dialogue.
///
/// Ids are assigned sequentially per dialogue starting at
/// [`STARTING_MESSAGE_ID`]; the `target` of a message is the id of the
/// message it responds to.
pub type MessageId = u32;

/// Address of an agent, as assigned by the host's identity layer.
pub type Address = String;

/// The id every opening message of a dialogue must carry.
pub const STARTING_MESSAGE_ID: MessageId = 1;

/// The target every opening message of a dialogue must carry.
pub const STARTING_TARGET: MessageId = 0;

/// Direction of a message relative to the agent that owns the dialogue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    /// Received from the counterparty.
    Incoming,
    /// Sent by this agent.
    Outgoing,
}

impl Direction {
    /// Whether the message was received from the counterparty.
    pub fn is_incoming(&self) -> bool {
        matches!(self, Direction::Incoming)
    }
}

/// Marker for the closed speech-act tag enum of a protocol.
///
/// Blanket-implemented; protocol modules only need the derives.
pub trait Performative: Copy + Eq + Hash + fmt::Debug + 'static {}

impl<T: Copy + Eq + Hash + fmt::Debug + 'static> Performative for T {}

/// The ordered reference pair identifying a dialogue on the wire.
///
/// The starter half is minted by whichever party opens the dialogue; the
/// responder half stays empty until (and unless) the counterparty assigns
/// its own nonce. A reference with an empty responder half is *provisional*.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DialogueReference {
    starter: String,
    responder: String,
}

impl DialogueReference {
    /// The value of a not-yet-assigned responder reference.
    pub const UNASSIGNED: &'static str = "";

    /// Build a reference from both halves.
    pub fn new(starter: impl Into<String>, responder: impl Into<String>) -> Self {
        Self {
            starter: starter.into(),
            responder: responder.into(),
        }
    }

    /// Build a provisional reference carrying only the starter half.
    pub fn starter_only(starter: impl Into<String>) -> Self {
        Self::new(starter, Self::UNASSIGNED)
    }

    /// The half assigned by the dialogue starter.
    pub fn starter(&self) -> &str {
        &self.starter
    }

    /// The half assigned by the responder, empty while provisional.
    pub fn responder(&self) -> &str {
        &self.responder
    }

    /// Whether the responder half has been assigned.
    pub fn is_complete(&self) -> bool {
        self.responder != Self::UNASSIGNED
    }

    /// The provisional version of this reference (responder half blanked).
    pub fn incomplete(&self) -> Self {
        Self::starter_only(self.starter.clone())
    }
}

impl fmt::Display for DialogueReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.starter, self.responder)
    }
}

/// What the engine needs to read off a decoded protocol message.
///
/// The sequencing fields drive classification and validity checks; any
/// performative-specific payload stays opaque to the engine.
pub trait DialogueMessage {
    /// The protocol's closed performative enum.
    type Performative: Performative;

    /// Sequential id of this message within its dialogue.
    fn message_id(&self) -> MessageId;

    /// Id of the message this one responds to, 0 for the opening message.
    fn target(&self) -> MessageId;

    /// The speech-act tag.
    fn performative(&self) -> Self::Performative;

    /// The dialogue reference pair declared on the wire.
    fn dialogue_reference(&self) -> &DialogueReference;

    /// Address of the other party of this message.
    fn counterparty(&self) -> &str;

    /// Whether the message was received or sent by this agent.
    fn direction(&self) -> Direction;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provisional_reference_completes() {
        let provisional = DialogueReference::starter_only("7");
        assert!(!provisional.is_complete());
        assert_eq!(provisional.responder(), DialogueReference::UNASSIGNED);

        let complete = DialogueReference::new("7", "12");
        assert!(complete.is_complete());
        assert_eq!(complete.incomplete(), provisional);
    }

    #[test]
    fn direction_flags() {
        assert!(Direction::Incoming.is_incoming());
        assert!(!Direction::Outgoing.is_incoming());
    }
}
