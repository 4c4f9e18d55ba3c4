//! FIPA negotiation protocol
//!
//! The bilateral negotiation protocol: a buyer (or seller) opens with a
//! call-for-proposal, the counterparty proposes, and the exchange closes
//! with an accept/match-accept pair or a decline at any of the three
//! stages. This module carries the protocol's closed enums, its reply
//! structure, the fixed reply targets of the single-sided variant and a
//! concrete message type for hosts that do not bring their own.

use serde::{Deserialize, Serialize};

use crate::dialogue::{Dialogue, DialogueRules};
use crate::message::{
    Address, DialogueMessage, DialogueReference, Direction, MessageId, STARTING_MESSAGE_ID,
};
use crate::registry::{DialogueRegistry, LabelSide, ResolutionStyle, RouteTable};

/// Data-model name marking a query as a demand (the sender wants to buy).
pub const DEMAND_DATAMODEL_NAME: &str = "demand";

/// Data-model name marking a query as a supply (the sender wants to sell).
pub const SUPPLY_DATAMODEL_NAME: &str = "supply";

/// Target a propose replying to the opening CFP must carry.
pub const PROPOSE_TARGET: MessageId = STARTING_MESSAGE_ID;
/// Target an initial accept must carry.
pub const ACCEPT_TARGET: MessageId = PROPOSE_TARGET + 1;
/// Target a matching accept must carry.
pub const MATCH_ACCEPT_TARGET: MessageId = ACCEPT_TARGET + 1;
/// Target of a decline answering the CFP.
pub const DECLINED_CFP_TARGET: MessageId = STARTING_MESSAGE_ID;
/// Target of a decline answering a propose.
pub const DECLINED_PROPOSE_TARGET: MessageId = PROPOSE_TARGET + 1;
/// Target of a decline answering an initial accept.
pub const DECLINED_ACCEPT_TARGET: MessageId = ACCEPT_TARGET + 1;

/// Speech-act tags of the FIPA negotiation protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FipaPerformative {
    /// Call for proposal, opens every dialogue.
    Cfp,
    /// Proposal answering a CFP.
    Propose,
    /// Initial accept of a proposal.
    Accept,
    /// Matching accept sealing the trade.
    MatchAccept,
    /// Decline at any stage.
    Decline,
    /// Follow-up information after a sealed trade.
    Inform,
}

/// The agent's role in a negotiation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NegotiationRole {
    Seller,
    Buyer,
}

/// Terminal classification of a finished negotiation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NegotiationOutcome {
    /// Trade sealed with a matching accept.
    Successful,
    /// Declined straight after the CFP.
    DeclinedCfp,
    /// Declined after a proposal.
    DeclinedPropose,
    /// Declined after an initial accept.
    DeclinedAccept,
}

/// Every negotiation outcome, for exhaustive statistics initialization.
pub const NEGOTIATION_OUTCOMES: [NegotiationOutcome; 4] = [
    NegotiationOutcome::Successful,
    NegotiationOutcome::DeclinedCfp,
    NegotiationOutcome::DeclinedPropose,
    NegotiationOutcome::DeclinedAccept,
];

/// The reply structure of the negotiation protocol.
pub fn negotiation_rules() -> DialogueRules<FipaPerformative> {
    use FipaPerformative::*;
    DialogueRules::new(
        [Cfp],
        [MatchAccept, Decline, Inform],
        [
            (Cfp, vec![]),
            (Propose, vec![Cfp]),
            (Accept, vec![Propose]),
            (MatchAccept, vec![Accept]),
            (Decline, vec![Cfp, Propose, Accept]),
            (Inform, vec![MatchAccept, Inform]),
        ],
    )
}

/// The fixed inbound steps of the single-sided negotiation variant.
///
/// A propose only ever resolves against a self-initiated dialogue (only
/// the CFP sender expects one back); accepts and declines alternate sides
/// with their stage.
pub fn negotiation_route_table() -> RouteTable<FipaPerformative> {
    use FipaPerformative::*;
    RouteTable::new()
        .route(Propose, PROPOSE_TARGET, LabelSide::SelfInitiated, Cfp)
        .route(Accept, ACCEPT_TARGET, LabelSide::OtherInitiated, Propose)
        .route(MatchAccept, MATCH_ACCEPT_TARGET, LabelSide::SelfInitiated, Accept)
        .route(Decline, DECLINED_CFP_TARGET, LabelSide::SelfInitiated, Cfp)
        .route(Decline, DECLINED_PROPOSE_TARGET, LabelSide::OtherInitiated, Propose)
        .route(Decline, DECLINED_ACCEPT_TARGET, LabelSide::SelfInitiated, Accept)
}

/// Performative-specific payload; the engine never interprets it beyond
/// presence checks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FipaBody {
    /// Service query of a CFP.
    Query { query: serde_json::Value },
    /// Proposal descriptions.
    Proposals { proposals: Vec<serde_json::Value> },
    /// Information map of an inform.
    Info { info: serde_json::Value },
    /// No payload (accepts, declines).
    Empty,
}

/// A decoded FIPA message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FipaMessage {
    message_id: MessageId,
    target: MessageId,
    performative: FipaPerformative,
    dialogue_reference: DialogueReference,
    counterparty: Address,
    direction: Direction,
    body: FipaBody,
}

impl FipaMessage {
    /// Build a message from its sequencing fields and payload.
    pub fn new(
        message_id: MessageId,
        target: MessageId,
        performative: FipaPerformative,
        dialogue_reference: DialogueReference,
        counterparty: impl Into<Address>,
        direction: Direction,
        body: FipaBody,
    ) -> Self {
        Self {
            message_id,
            target,
            performative,
            dialogue_reference,
            counterparty: counterparty.into(),
            direction,
            body,
        }
    }

    /// Build the opening CFP of a dialogue.
    pub fn cfp(
        dialogue_reference: DialogueReference,
        counterparty: impl Into<Address>,
        direction: Direction,
        query: serde_json::Value,
    ) -> Self {
        Self::new(
            STARTING_MESSAGE_ID,
            crate::message::STARTING_TARGET,
            FipaPerformative::Cfp,
            dialogue_reference,
            counterparty,
            direction,
            FipaBody::Query { query },
        )
    }

    /// The uninterpreted payload.
    pub fn body(&self) -> &FipaBody {
        &self.body
    }

    /// Whether the payload kind matches what the performative requires.
    pub fn has_expected_body(&self) -> bool {
        matches!(
            (self.performative, &self.body),
            (FipaPerformative::Cfp, FipaBody::Query { .. })
                | (FipaPerformative::Propose, FipaBody::Proposals { .. })
                | (FipaPerformative::Inform, FipaBody::Info { .. })
                | (FipaPerformative::Accept, FipaBody::Empty)
                | (FipaPerformative::MatchAccept, FipaBody::Empty)
                | (FipaPerformative::Decline, FipaBody::Empty)
        )
    }

    /// Override the counterparty address.
    pub fn set_counterparty(&mut self, counterparty: impl Into<Address>) {
        self.counterparty = counterparty.into();
    }
}

impl DialogueMessage for FipaMessage {
    type Performative = FipaPerformative;

    fn message_id(&self) -> MessageId {
        self.message_id
    }

    fn target(&self) -> MessageId {
        self.target
    }

    fn performative(&self) -> FipaPerformative {
        self.performative
    }

    fn dialogue_reference(&self) -> &DialogueReference {
        &self.dialogue_reference
    }

    fn counterparty(&self) -> &str {
        &self.counterparty
    }

    fn direction(&self) -> Direction {
        self.direction
    }
}

/// One negotiation dialogue.
pub type NegotiationDialogue = Dialogue<FipaMessage, NegotiationRole, NegotiationOutcome>;

/// The registry of all negotiation dialogues of one agent.
pub type NegotiationDialogues =
    DialogueRegistry<FipaMessage, NegotiationRole, NegotiationOutcome>;

impl Dialogue<FipaMessage, NegotiationRole, NegotiationOutcome> {
    /// Whether a propose replying to our CFP is awaited.
    pub fn is_expecting_propose(&self) -> bool {
        self.is_expecting_reply_to(FipaPerformative::Cfp)
    }

    /// Whether an initial accept replying to our propose is awaited.
    pub fn is_expecting_initial_accept(&self) -> bool {
        self.is_expecting_reply_to(FipaPerformative::Propose)
    }

    /// Whether a matching accept replying to our accept is awaited.
    pub fn is_expecting_matching_accept(&self) -> bool {
        self.is_expecting_reply_to(FipaPerformative::Accept)
    }

    /// Whether a decline of our CFP is a legal next inbound message.
    pub fn is_expecting_cfp_decline(&self) -> bool {
        self.is_expecting_reply_to(FipaPerformative::Cfp)
    }

    /// Whether a decline of our propose is a legal next inbound message.
    pub fn is_expecting_propose_decline(&self) -> bool {
        self.is_expecting_reply_to(FipaPerformative::Propose)
    }

    /// Whether a decline of our accept is a legal next inbound message.
    pub fn is_expecting_accept_decline(&self) -> bool {
        self.is_expecting_reply_to(FipaPerformative::Accept)
    }
}

/// Role classifier reading the opening CFP's query: a query against the
/// demand model means the sender wants to buy, so this agent sells.
///
/// The marker is injected rather than assumed; hosts with a different
/// query convention supply their own classifier to
/// [`DialogueRegistry::new`].
pub fn query_role_classifier(
    demand_marker: impl Into<String>,
) -> impl Fn(&FipaMessage) -> NegotiationRole + Send + Sync + 'static {
    let demand_marker = demand_marker.into();
    move |message| match message.body() {
        FipaBody::Query { query } => {
            let model_name = query.get("description").and_then(|v| v.as_str());
            if model_name == Some(demand_marker.as_str()) {
                NegotiationRole::Seller
            } else {
                NegotiationRole::Buyer
            }
        }
        _ => NegotiationRole::Buyer,
    }
}

/// A negotiation registry resolving messages with the full adjacency rule.
pub fn negotiation_registry(own_address: impl Into<Address>) -> NegotiationDialogues {
    DialogueRegistry::new(
        own_address,
        negotiation_rules(),
        NEGOTIATION_OUTCOMES,
        ResolutionStyle::Adjacency,
        query_role_classifier(DEMAND_DATAMODEL_NAME),
    )
}

/// A negotiation registry resolving messages through the fixed route
/// table of the single-sided variant.
pub fn routed_negotiation_registry(own_address: impl Into<Address>) -> NegotiationDialogues {
    DialogueRegistry::new(
        own_address,
        negotiation_rules(),
        NEGOTIATION_OUTCOMES,
        ResolutionStyle::Routes(negotiation_route_table()),
        query_role_classifier(DEMAND_DATAMODEL_NAME),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adjacency_table_matches_the_protocol() {
        use FipaPerformative::*;
        let rules = negotiation_rules();
        assert!(rules.is_initial(Cfp));
        assert!(rules.may_follow(Cfp, Propose));
        assert!(rules.may_follow(Propose, Accept));
        assert!(rules.may_follow(Accept, MatchAccept));
        assert!(rules.may_follow(Cfp, Decline));
        assert!(rules.may_follow(Propose, Decline));
        assert!(rules.may_follow(Accept, Decline));
        assert!(rules.may_follow(MatchAccept, Inform));
        assert!(rules.may_follow(Inform, Inform));

        assert!(!rules.may_follow(Cfp, Accept));
        assert!(!rules.may_follow(Cfp, MatchAccept));
        assert!(!rules.may_follow(Propose, MatchAccept));
        assert!(!rules.may_follow(MatchAccept, Decline));
        assert!(!rules.is_initial(Propose));

        assert!(rules.is_terminal(MatchAccept));
        assert!(rules.is_terminal(Decline));
        assert!(rules.is_terminal(Inform));
        assert!(!rules.is_terminal(Cfp));
    }

    #[test]
    fn body_presence_checks() {
        let cfp = FipaMessage::cfp(
            DialogueReference::starter_only("1"),
            "opponent",
            Direction::Outgoing,
            serde_json::json!({ "description": "demand" }),
        );
        assert!(cfp.has_expected_body());

        let bad_propose = FipaMessage::new(
            2,
            1,
            FipaPerformative::Propose,
            DialogueReference::starter_only("1"),
            "opponent",
            Direction::Incoming,
            FipaBody::Empty,
        );
        assert!(!bad_propose.has_expected_body());
    }

    #[test]
    fn query_classifier_reads_the_demand_marker() {
        let classify = query_role_classifier(DEMAND_DATAMODEL_NAME);

        let demand_cfp = FipaMessage::cfp(
            DialogueReference::starter_only("1"),
            "opponent",
            Direction::Incoming,
            serde_json::json!({ "description": DEMAND_DATAMODEL_NAME }),
        );
        assert_eq!(classify(&demand_cfp), NegotiationRole::Seller);

        let supply_cfp = FipaMessage::cfp(
            DialogueReference::starter_only("2"),
            "opponent",
            Direction::Incoming,
            serde_json::json!({ "description": SUPPLY_DATAMODEL_NAME }),
        );
        assert_eq!(classify(&supply_cfp), NegotiationRole::Buyer);
    }
}
