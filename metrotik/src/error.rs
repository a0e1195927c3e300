//! Error types for the ticketing domain.
//!
//! Only invariant violations are errors. Expected business outcomes such as
//! insufficient funds or missing ticket coverage come back as `Ok(false)`
//! together with an [`AccountEvent`](crate::account::AccountEvent).

use crate::types::{Money, TicketId};
use metrotik_runtime::StoreError;
use thiserror::Error;

/// Why a ticket could not be issued
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssuanceFault {
    /// Neither a start time nor a zone count was primed
    NotPrimed,
    /// Both a start time and a zone count were primed
    BothPrimed,
}

impl std::fmt::Display for IssuanceFault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotPrimed => write!(f, "issuer has not been primed for a ticket"),
            Self::BothPrimed => {
                write!(f, "issuer cannot be primed for a timed and a zone ticket at once")
            },
        }
    }
}

/// Errors raised by the ticketing domain
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MetrotikError {
    /// A credit or debit was requested with a negative magnitude
    #[error("Invalid fund mutation: amount must never be negative, got {amount}")]
    InvalidFundMutation {
        /// The rejected amount
        amount: Money,
    },

    /// A ticket build was attempted with zero or two primed parameters
    #[error("Misconfigured ticket issuance: {0}")]
    MisconfiguredIssuance(IssuanceFault),

    /// Travel was attempted on a ticket whose allocation is exhausted
    #[error("Ticket {ticket_id} is invalid and was requested for travel")]
    InvalidTicketUse {
        /// The exhausted ticket
        ticket_id: TicketId,
    },

    /// A ticket with this identifier is already held
    #[error("Ticket {ticket_id} is already held")]
    DuplicateTicket {
        /// The clashing ticket
        ticket_id: TicketId,
    },

    /// A journey or zone ticket was requested for zero zones
    #[error("Zone count must be at least 1")]
    InvalidZoneCount,

    /// The account store rejected an action
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result alias for the ticketing domain
pub type Result<T> = std::result::Result<T, MetrotikError>;
