//! Dialogue-specific events
//!
//! Lifecycle notifications emitted by the registry for dialogue creation,
//! label promotion and termination.

use serde::{Deserialize, Serialize};

use crate::dialogue::DialogueLabel;

/// Registry lifecycle events
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum DialogueEvent {
    /// A dialogue was created and indexed
    Created {
        label: DialogueLabel,
        self_initiated: bool,
    },

    /// A provisional label was promoted to its final version
    LabelPromoted {
        provisional: DialogueLabel,
        label: DialogueLabel,
    },

    /// A dialogue recorded its terminal outcome
    Terminated {
        label: DialogueLabel,
        outcome: String,
    },
}
