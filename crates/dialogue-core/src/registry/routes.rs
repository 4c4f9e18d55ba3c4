//! Message routing tables
//!
//! Single-sided dialogue variants do not run the full adjacency rule on
//! inbound traffic. Instead, each legal inbound `(performative, target)`
//! pair is declared once in a [`RouteTable`] together with the label kind
//! it may resolve against and the last-outgoing performative the matched
//! dialogue must be waiting on. The table is built at registration time;
//! resolution is a plain lookup, never a reflective dispatch.

use crate::message::{MessageId, Performative};

/// Which candidate label kind an inbound message may resolve against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelSide {
    /// The dialogue was opened by this agent.
    SelfInitiated,
    /// The dialogue was opened by the counterparty.
    OtherInitiated,
}

/// One legal inbound step of a routed protocol.
#[derive(Debug, Clone)]
pub struct Route<P: Performative> {
    /// Performative of the inbound message.
    pub performative: P,
    /// Exact target the inbound message must carry.
    pub target: MessageId,
    /// Label kind eligible for this step.
    pub side: LabelSide,
    /// Performative our last outgoing message must have, i.e. what the
    /// inbound message replies to.
    pub expects: P,
}

/// The closed set of inbound steps a routed protocol accepts.
#[derive(Debug, Clone)]
pub struct RouteTable<P: Performative> {
    routes: Vec<Route<P>>,
}

impl<P: Performative> RouteTable<P> {
    /// Create an empty table.
    pub fn new() -> Self {
        Self { routes: Vec::new() }
    }

    /// Declare a legal inbound step.
    pub fn route(mut self, performative: P, target: MessageId, side: LabelSide, expects: P) -> Self {
        self.routes.push(Route {
            performative,
            target,
            side,
            expects,
        });
        self
    }

    /// Find the step matching an inbound `(performative, target)` pair.
    pub fn resolve(&self, performative: P, target: MessageId) -> Option<&Route<P>> {
        self.routes
            .iter()
            .find(|r| r.performative == performative && r.target == target)
    }

    /// Number of declared steps.
    pub fn len(&self) -> usize {
        self.routes.len()
    }
}

/// How a registry decides which registered dialogue a message belongs to.
#[derive(Debug, Clone)]
pub enum ResolutionStyle<P: Performative> {
    /// Dual-label resolution with the per-dialogue adjacency check.
    Adjacency,
    /// Route-table narrowing followed by the expectation predicate.
    Routes(RouteTable<P>),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    enum Tag {
        Offer,
        Yes,
        No,
    }

    #[test]
    fn resolve_matches_on_performative_and_target() {
        let table = RouteTable::new()
            .route(Tag::Yes, 2, LabelSide::OtherInitiated, Tag::Offer)
            .route(Tag::No, 2, LabelSide::OtherInitiated, Tag::Offer);

        let route = table.resolve(Tag::Yes, 2).unwrap();
        assert_eq!(route.side, LabelSide::OtherInitiated);
        assert_eq!(route.expects, Tag::Offer);

        assert!(table.resolve(Tag::Yes, 3).is_none());
        assert!(table.resolve(Tag::Offer, 2).is_none());
        assert_eq!(table.len(), 2);
    }
}
