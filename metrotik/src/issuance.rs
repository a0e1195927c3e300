//! Ticket issuance.
//!
//! Issuing is two-phase: prime the issuer with either a start time or a zone
//! count, then [`TicketIssuer::issue`]. Callers charge the rider between the
//! two steps, so no ticket object exists until payment has gone through.

use crate::error::{IssuanceFault, MetrotikError, Result};
use crate::ticket::{Ticket, TicketInvalidated, TimedTicket, ZoneTicket};
use crate::types::{Money, Product, PurchaseRecord, TicketId, TicketKind};
use chrono::{DateTime, Utc};
use metrotik_core::environment::Clock;
use metrotik_core::listeners::SubscriberId;

/// A freshly built ticket of either kind
#[derive(Debug)]
pub enum IssuedTicket {
    /// A timed ticket
    Timed(TimedTicket),
    /// A zone ticket
    Zone(ZoneTicket),
}

impl IssuedTicket {
    /// The new ticket's identifier
    #[must_use]
    pub fn id(&self) -> TicketId {
        match self {
            Self::Timed(ticket) => ticket.id(),
            Self::Zone(ticket) => ticket.id(),
        }
    }

    /// The product kind
    #[must_use]
    pub const fn kind(&self) -> TicketKind {
        match self {
            Self::Timed(_) => TicketKind::Timed,
            Self::Zone(_) => TicketKind::Zone,
        }
    }

    /// Register an invalidation observer on the underlying ticket
    pub fn subscribe<F>(&mut self, observer: F) -> SubscriberId
    where
        F: FnMut(&TicketInvalidated) + 'static,
    {
        match self {
            Self::Timed(ticket) => ticket.subscribe(observer),
            Self::Zone(ticket) => ticket.subscribe(observer),
        }
    }

    /// Purchase-history snapshot of this ticket at the given price
    #[must_use]
    pub fn purchase_record(&self, price: Money) -> PurchaseRecord {
        match self {
            Self::Timed(ticket) => PurchaseRecord {
                ticket_id: ticket.id(),
                purchased_at: ticket.purchased_at(),
                product: Product::Timed {
                    valid_from: ticket.valid_from(),
                    valid_to: ticket.valid_to(),
                },
                price,
            },
            Self::Zone(ticket) => PurchaseRecord {
                ticket_id: ticket.id(),
                purchased_at: ticket.purchased_at(),
                product: Product::Zones {
                    allocation: ticket.zone_allocation(),
                },
                price,
            },
        }
    }
}

/// Builds tickets and hands out their identifiers
///
/// Identifiers start at 1 and are never reused for the issuer's lifetime.
#[derive(Debug, Default)]
pub struct TicketIssuer {
    last_id: u64,
    valid_from: Option<DateTime<Utc>>,
    zone_allocation: Option<u32>,
}

impl TicketIssuer {
    /// Creates an unprimed issuer
    #[must_use]
    pub const fn new() -> Self {
        Self {
            last_id: 0,
            valid_from: None,
            zone_allocation: None,
        }
    }

    /// Prime for a timed ticket starting at `valid_from`
    pub fn prime_timed(&mut self, valid_from: DateTime<Utc>) {
        tracing::debug!(%valid_from, "Issuer primed for a timed ticket");
        self.valid_from = Some(valid_from);
    }

    /// Prime for a zone ticket of `zones` zones
    ///
    /// Zero zones leaves the issuer unprimed for zone tickets.
    pub fn prime_zones(&mut self, zones: u32) {
        tracing::debug!(zones, "Issuer primed for a zone ticket");
        self.zone_allocation = (zones > 0).then_some(zones);
    }

    /// Build the primed ticket and reset the primed parameter
    ///
    /// # Errors
    ///
    /// Returns [`MetrotikError::MisconfiguredIssuance`] if the issuer is primed
    /// for nothing or for both kinds at once. Priming is left untouched.
    pub fn issue(&mut self, clock: &dyn Clock) -> Result<IssuedTicket> {
        match (self.valid_from, self.zone_allocation) {
            (Some(_), Some(_)) => {
                tracing::error!("Issuer primed for a timed and a zone ticket at once");
                Err(MetrotikError::MisconfiguredIssuance(IssuanceFault::BothPrimed))
            },
            (None, None) => {
                tracing::error!("Issuer asked to build without being primed");
                Err(MetrotikError::MisconfiguredIssuance(IssuanceFault::NotPrimed))
            },
            (Some(valid_from), None) => {
                self.valid_from = None;
                let ticket = TimedTicket::new(self.next_id(), clock.now(), valid_from);
                tracing::info!(ticket_id = %ticket.id(), "Timed ticket issued");
                Ok(IssuedTicket::Timed(ticket))
            },
            (None, Some(zones)) => {
                self.zone_allocation = None;
                let ticket = ZoneTicket::new(self.next_id(), clock.now(), zones);
                tracing::info!(ticket_id = %ticket.id(), zones, "Zone ticket issued");
                Ok(IssuedTicket::Zone(ticket))
            },
        }
    }

    /// The most recently issued identifier, if any
    #[must_use]
    pub const fn last_issued(&self) -> Option<TicketId> {
        if self.last_id == 0 {
            None
        } else {
            Some(TicketId::new(self.last_id))
        }
    }

    fn next_id(&mut self) -> TicketId {
        self.last_id += 1;
        TicketId::new(self.last_id)
    }
}
