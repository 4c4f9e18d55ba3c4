//! Service-delivery dialogues
//!
//! The dialogue a data provider keeps with its clients: the client opens
//! with a CFP for some data, the provider proposes terms, and on accept
//! the provider match-accepts and the client informs with the settlement
//! detail. The provider side is single-sided: it only ever resolves
//! inbound accepts, declines and informs against dialogues the client
//! opened, so it uses the route-table resolution style.

use crate::dialogue::Dialogue;
use crate::message::{Address, MessageId};
use crate::protocols::fipa::{
    self, FipaMessage, FipaPerformative, ACCEPT_TARGET, DECLINED_PROPOSE_TARGET,
    MATCH_ACCEPT_TARGET,
};
use crate::registry::{DialogueRegistry, LabelSide, ResolutionStyle, RouteTable};
use serde::{Deserialize, Serialize};

/// Target the client's settlement inform must carry.
pub const INFORM_TARGET: MessageId = MATCH_ACCEPT_TARGET + 1;

/// The agent's role in a service dialogue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ServiceRole {
    /// Sells data to clients.
    Provider,
    /// Buys data from a provider.
    Client,
}

/// Terminal classification of a service dialogue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ServiceOutcome {
    /// Data delivered and settled.
    Successful,
    /// Client declined the proposed terms.
    DeclinedPropose,
}

/// Every service outcome, for exhaustive statistics initialization.
pub const SERVICE_OUTCOMES: [ServiceOutcome; 2] =
    [ServiceOutcome::Successful, ServiceOutcome::DeclinedPropose];

/// One service dialogue.
pub type ServiceDialogue = Dialogue<FipaMessage, ServiceRole, ServiceOutcome>;

/// The registry of all service dialogues of one agent.
pub type ServiceDialogues = DialogueRegistry<FipaMessage, ServiceRole, ServiceOutcome>;

/// The inbound steps a provider accepts.
pub fn provider_route_table() -> RouteTable<FipaPerformative> {
    use FipaPerformative::*;
    RouteTable::new()
        .route(Accept, ACCEPT_TARGET, LabelSide::OtherInitiated, Propose)
        .route(Decline, DECLINED_PROPOSE_TARGET, LabelSide::OtherInitiated, Propose)
        .route(Inform, INFORM_TARGET, LabelSide::OtherInitiated, MatchAccept)
}

impl Dialogue<FipaMessage, ServiceRole, ServiceOutcome> {
    /// Whether an accept of our proposed terms is awaited.
    pub fn is_expecting_accept(&self) -> bool {
        self.is_expecting_reply_to(FipaPerformative::Propose)
    }

    /// Whether a decline of our proposed terms is a legal next inbound
    /// message.
    pub fn is_expecting_propose_decline(&self) -> bool {
        self.is_expecting_reply_to(FipaPerformative::Propose)
    }

    /// Whether the client's settlement inform is awaited.
    pub fn is_expecting_inform(&self) -> bool {
        self.is_expecting_reply_to(FipaPerformative::MatchAccept)
    }
}

/// A provider-side registry: every dialogue a client opens is kept with
/// this agent as the provider.
pub fn provider_registry(own_address: impl Into<Address>) -> ServiceDialogues {
    DialogueRegistry::new(
        own_address,
        fipa::negotiation_rules(),
        SERVICE_OUTCOMES,
        ResolutionStyle::Routes(provider_route_table()),
        |_first_message| ServiceRole::Provider,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_routes_are_all_other_initiated() {
        let table = provider_route_table();
        assert_eq!(table.len(), 3);
        for (performative, target) in [
            (FipaPerformative::Accept, ACCEPT_TARGET),
            (FipaPerformative::Decline, DECLINED_PROPOSE_TARGET),
            (FipaPerformative::Inform, INFORM_TARGET),
        ] {
            let route = table.resolve(performative, target).unwrap();
            assert_eq!(route.side, LabelSide::OtherInitiated);
        }
    }
}
