//! Protocol instantiations
//!
//! Concrete closed enums and protocol constants plugging the generic
//! engine into specific negotiation protocols:
//!
//! - [`fipa`]: the bilateral FIPA negotiation protocol
//!   (CFP → Propose → Accept → Match-Accept, declines at every stage)
//! - [`service`]: the single-sided service-delivery dialogue a data
//!   provider keeps with its clients

pub mod fipa;
pub mod service;
