//! Dialogue labels
//!
//! A [`DialogueLabel`] is the compound key identifying one dialogue
//! instance: the wire-level reference pair plus the opponent and starter
//! addresses. Labels are immutable values with structural equality and
//! hashing, so two labels built from the same logical triple are
//! interchangeable as map keys across module boundaries.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::errors::{DialogueError, DialogueResult};
use crate::message::{Address, DialogueReference};

/// Identifier for one dialogue instance.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DialogueLabel {
    reference: DialogueReference,
    opponent_addr: Address,
    starter_addr: Address,
}

/// Flat serialization form with the fixed field names of the persisted
/// label contract.
#[derive(Serialize, Deserialize)]
struct LabelRecord {
    dialogue_starter_reference: String,
    dialogue_responder_reference: String,
    dialogue_opponent_addr: String,
    dialogue_starter_addr: String,
}

impl DialogueLabel {
    /// Build a label from its reference pair and the two party addresses.
    ///
    /// No validation beyond types: an empty responder reference marks a
    /// provisional label.
    pub fn new(
        reference: DialogueReference,
        opponent_addr: impl Into<Address>,
        starter_addr: impl Into<Address>,
    ) -> Self {
        Self {
            reference,
            opponent_addr: opponent_addr.into(),
            starter_addr: starter_addr.into(),
        }
    }

    /// The wire-level reference pair.
    pub fn reference(&self) -> &DialogueReference {
        &self.reference
    }

    /// The reference half assigned by the dialogue starter.
    pub fn starter_reference(&self) -> &str {
        self.reference.starter()
    }

    /// The reference half assigned by the responder, empty while
    /// provisional.
    pub fn responder_reference(&self) -> &str {
        self.reference.responder()
    }

    /// Address of the other party of this dialogue.
    pub fn opponent_addr(&self) -> &str {
        &self.opponent_addr
    }

    /// Address of whichever party sent the very first message.
    pub fn starter_addr(&self) -> &str {
        &self.starter_addr
    }

    /// Whether the responder reference has been assigned.
    ///
    /// A complete label is final and must never change.
    pub fn is_complete(&self) -> bool {
        self.reference.is_complete()
    }

    /// The provisional version of this label (responder reference blanked).
    pub fn incomplete_version(&self) -> Self {
        Self {
            reference: self.reference.incomplete(),
            opponent_addr: self.opponent_addr.clone(),
            starter_addr: self.starter_addr.clone(),
        }
    }

    /// The JSON representation: one map with the four named fields.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "dialogue_starter_reference": self.starter_reference(),
            "dialogue_responder_reference": self.responder_reference(),
            "dialogue_opponent_addr": self.opponent_addr(),
            "dialogue_starter_addr": self.starter_addr(),
        })
    }

    /// Rebuild a label from its JSON representation.
    pub fn from_json(value: &serde_json::Value) -> DialogueResult<Self> {
        serde_json::from_value(value.clone())
            .map_err(|e| DialogueError::malformed_label(e.to_string()))
    }
}

impl Serialize for DialogueLabel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        LabelRecord {
            dialogue_starter_reference: self.starter_reference().to_owned(),
            dialogue_responder_reference: self.responder_reference().to_owned(),
            dialogue_opponent_addr: self.opponent_addr.clone(),
            dialogue_starter_addr: self.starter_addr.clone(),
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for DialogueLabel {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let record = LabelRecord::deserialize(deserializer)?;
        Ok(Self::new(
            DialogueReference::new(
                record.dialogue_starter_reference,
                record.dialogue_responder_reference,
            ),
            record.dialogue_opponent_addr,
            record.dialogue_starter_addr,
        ))
    }
}

impl fmt::Display for DialogueLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}_{}_{}_{}",
            self.starter_reference(),
            self.responder_reference(),
            self.opponent_addr,
            self.starter_addr
        )
    }
}

impl FromStr for DialogueLabel {
    type Err = DialogueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split('_').collect();
        let [starter_ref, responder_ref, opponent, starter] = parts.as_slice() else {
            return Err(DialogueError::malformed_label(format!(
                "expected 4 underscore-separated fields, got {}",
                parts.len()
            )));
        };
        Ok(Self::new(
            DialogueReference::new(*starter_ref, *responder_ref),
            *opponent,
            *starter,
        ))
    }
}
