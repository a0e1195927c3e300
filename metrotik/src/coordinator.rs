//! Routes travel requests across the two ticket chains.
//!
//! Timed tickets are always consulted before zone tickets, so a rider with a
//! live timed ticket never spends zone allocation.

use crate::account::Account;
use crate::chain::TicketChain;
use crate::error::{MetrotikError, Result};
use crate::issuance::IssuedTicket;
use crate::ticket::{TimedTicket, ZoneTicket};
use crate::types::{Money, TicketId};
use metrotik_core::environment::Clock;

/// Owns every live ticket of one rider
#[derive(Debug)]
pub struct TicketCoordinator {
    timed: TicketChain<TimedTicket>,
    zones: TicketChain<ZoneTicket>,
}

impl Default for TicketCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl TicketCoordinator {
    /// Creates a coordinator with no tickets
    #[must_use]
    pub fn new() -> Self {
        Self {
            timed: TicketChain::new("timed"),
            zones: TicketChain::new("zone"),
        }
    }

    /// Whether a single held ticket covers a journey of `zones` zones
    ///
    /// # Errors
    ///
    /// Returns [`MetrotikError::InvalidZoneCount`] for a zero-zone request.
    pub fn can_ride_for_requested_zones(&mut self, zones: u32, clock: &dyn Clock) -> Result<bool> {
        if zones == 0 {
            return Err(MetrotikError::InvalidZoneCount);
        }
        let covered =
            self.timed.can_travel_zones(zones, clock) || self.zones.can_travel_zones(zones, clock);
        tracing::debug!(zones, covered, "Checked journey coverage");
        Ok(covered)
    }

    /// Spend one zone, timed tickets first
    ///
    /// # Errors
    ///
    /// Propagates [`MetrotikError::InvalidTicketUse`] from a ticket chain.
    pub fn travel_one_zone(&mut self, clock: &dyn Clock) -> Result<bool> {
        if self.timed.travel_zone(clock)? {
            return Ok(true);
        }
        self.zones.travel_zone(clock)
    }

    /// Record a timed ticket against `account` and take ownership of it
    ///
    /// # Errors
    ///
    /// See [`TicketCoordinator::add_issued`].
    pub fn add_timed_ticket(
        &mut self,
        ticket: TimedTicket,
        price: Money,
        account: &mut Account,
    ) -> Result<()> {
        self.add_issued(IssuedTicket::Timed(ticket), price, account)
    }

    /// Record a zone ticket against `account` and take ownership of it
    ///
    /// # Errors
    ///
    /// See [`TicketCoordinator::add_issued`].
    pub fn add_zone_ticket(
        &mut self,
        ticket: ZoneTicket,
        price: Money,
        account: &mut Account,
    ) -> Result<()> {
        self.add_issued(IssuedTicket::Zone(ticket), price, account)
    }

    /// Record any freshly issued ticket and file it in the matching chain
    ///
    /// The purchase history and the chains change together or not at all.
    ///
    /// # Errors
    ///
    /// Returns [`MetrotikError::DuplicateTicket`] if a ticket with the same id
    /// is already held, and any error from recording the purchase. In both
    /// cases the ticket is discarded and nothing is recorded.
    pub fn add_issued(
        &mut self,
        ticket: IssuedTicket,
        price: Money,
        account: &mut Account,
    ) -> Result<()> {
        let id = ticket.id();
        if self.holds(id) {
            tracing::warn!(ticket_id = %id, "Ticket already held, purchase not recorded");
            return Err(MetrotikError::DuplicateTicket { ticket_id: id });
        }

        account.record_purchase(ticket.purchase_record(price))?;
        match ticket {
            IssuedTicket::Timed(ticket) => self.timed.add(ticket),
            IssuedTicket::Zone(ticket) => self.zones.add(ticket),
        };
        tracing::info!(ticket_id = %id, %price, "Ticket added to coordinator");
        Ok(())
    }

    /// Whether a ticket is still held
    #[must_use]
    pub fn holds(&self, id: TicketId) -> bool {
        self.timed.contains(id) || self.zones.contains(id)
    }

    /// Live timed tickets
    #[must_use]
    pub const fn timed_tickets(&self) -> &TicketChain<TimedTicket> {
        &self.timed
    }

    /// Live zone tickets
    #[must_use]
    pub const fn zone_tickets(&self) -> &TicketChain<ZoneTicket> {
        &self.zones
    }

    /// Total zones left across all zone tickets
    #[must_use]
    pub fn remaining_zones(&self) -> u32 {
        self.zones.iter().map(ZoneTicket::zone_allocation).sum()
    }
}
