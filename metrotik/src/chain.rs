//! Ticket containers.
//!
//! A [`TicketChain`] holds tickets of one kind and observes each of them.
//! When a ticket announces its invalidation the chain records the id, and
//! the ticket is dropped as soon as the call that triggered it returns.
//! Nothing else ever removes a ticket.

use crate::error::Result;
use crate::ticket::Ticket;
use crate::types::TicketId;
use metrotik_core::environment::Clock;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

/// Set-like holder of one ticket variant
#[derive(Debug)]
pub struct TicketChain<T> {
    name: &'static str,
    tickets: BTreeMap<TicketId, T>,
    invalidated: Rc<RefCell<Vec<TicketId>>>,
}

impl<T: Ticket> TicketChain<T> {
    /// Creates an empty chain; `name` only appears in logs
    #[must_use]
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            tickets: BTreeMap::new(),
            invalidated: Rc::new(RefCell::new(Vec::new())),
        }
    }

    /// Adds a ticket and subscribes the chain to its invalidation
    ///
    /// Returns false, leaving the chain unchanged, if a ticket with the same
    /// id is already held.
    pub fn add(&mut self, mut ticket: T) -> bool {
        let id = ticket.id();
        if self.tickets.contains_key(&id) {
            tracing::warn!(chain = self.name, ticket_id = %id, "Ticket already held");
            return false;
        }

        let invalidated = Rc::clone(&self.invalidated);
        ticket.subscribe(move |event| invalidated.borrow_mut().push(event.ticket_id));
        self.tickets.insert(id, ticket);
        tracing::debug!(chain = self.name, ticket_id = %id, "Ticket added to chain");
        true
    }

    /// Whether any single ticket covers all of `zones`
    ///
    /// Partial coverage is never combined across tickets.
    pub fn can_travel_zones(&mut self, zones: u32, clock: &dyn Clock) -> bool {
        let mut covered = false;
        for ticket in self.tickets.values_mut() {
            let remaining = ticket.check_zone_travel(zones, clock);
            tracing::trace!(chain = self.name, ticket_id = %ticket.id(), remaining, "Checked ticket");
            if remaining == 0 {
                covered = true;
                break;
            }
        }
        self.remove_invalidated();

        tracing::debug!(chain = self.name, zones, covered, "Checked coverage");
        covered
    }

    /// Spend one zone on the first ticket that accepts it
    ///
    /// # Errors
    ///
    /// Propagates [`MetrotikError::InvalidTicketUse`](crate::error::MetrotikError::InvalidTicketUse)
    /// from a ticket that should already have been removed.
    pub fn travel_zone(&mut self, clock: &dyn Clock) -> Result<bool> {
        let mut travelled = false;
        for ticket in self.tickets.values_mut() {
            if ticket.travel_zone(clock)? {
                travelled = true;
                break;
            }
        }
        self.remove_invalidated();

        if !travelled {
            tracing::debug!(chain = self.name, "No ticket could travel a zone");
        }
        Ok(travelled)
    }

    fn remove_invalidated(&mut self) {
        let ids: Vec<TicketId> = self.invalidated.borrow_mut().drain(..).collect();
        for id in ids {
            if self.tickets.remove(&id).is_some() {
                tracing::info!(chain = self.name, ticket_id = %id, "Invalid ticket removed from chain");
            }
        }
    }

    /// Number of live tickets
    #[must_use]
    pub fn len(&self) -> usize {
        self.tickets.len()
    }

    /// Whether the chain holds no tickets
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tickets.is_empty()
    }

    /// Whether a ticket is held
    #[must_use]
    pub fn contains(&self, id: TicketId) -> bool {
        self.tickets.contains_key(&id)
    }

    /// Look up a held ticket
    #[must_use]
    pub fn get(&self, id: TicketId) -> Option<&T> {
        self.tickets.get(&id)
    }

    /// Iterate over live tickets
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.tickets.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MetrotikError;
    use crate::ticket::{TimedTicket, ZoneTicket};
    use chrono::Duration;
    use metrotik_testing::{test_clock, ManualClock};

    fn zone_chain(allocations: &[u32]) -> TicketChain<ZoneTicket> {
        let now = test_clock().now();
        let mut chain = TicketChain::new("zone");
        for (n, allocation) in (1u64..).zip(allocations) {
            assert!(chain.add(ZoneTicket::new(TicketId::new(n), now, *allocation)));
        }
        chain
    }

    #[test]
    fn test_duplicate_ids_are_rejected() {
        let now = test_clock().now();
        let mut chain = TicketChain::new("zone");
        assert!(chain.add(ZoneTicket::new(TicketId::new(1), now, 2)));
        assert!(!chain.add(ZoneTicket::new(TicketId::new(1), now, 5)));
        assert_eq!(chain.len(), 1);
        assert_eq!(chain.get(TicketId::new(1)).map(ZoneTicket::zone_allocation), Some(2));
    }

    #[test]
    fn test_single_ticket_must_cover_request() {
        let clock = test_clock();
        let mut chain = zone_chain(&[2, 2]);

        // 4 zones are held in total but no single ticket covers them
        assert!(!chain.can_travel_zones(4, &clock));
        assert!(chain.can_travel_zones(2, &clock));
    }

    #[test]
    fn test_empty_chain_cannot_travel() {
        let clock = test_clock();
        let mut chain: TicketChain<ZoneTicket> = TicketChain::new("zone");
        assert!(!chain.can_travel_zones(1, &clock));
        assert_eq!(chain.travel_zone(&clock), Ok(false));
    }

    #[test]
    fn test_exhausted_ticket_is_removed() {
        let clock = test_clock();
        let mut chain = zone_chain(&[1, 3]);

        assert_eq!(chain.travel_zone(&clock), Ok(true));
        assert_eq!(chain.len(), 1);
        assert!(!chain.contains(TicketId::new(1)));

        for _ in 0..3 {
            assert_eq!(chain.travel_zone(&clock), Ok(true));
        }
        assert!(chain.is_empty());
        assert_eq!(chain.travel_zone(&clock), Ok(false));
    }

    #[test]
    fn test_expired_timed_ticket_removed_on_check() {
        let clock = ManualClock::new(test_clock().now());
        let start = clock.now();
        let mut chain = TicketChain::new("timed");
        chain.add(TimedTicket::new(TicketId::new(7), start, start));

        clock.advance(Duration::hours(1));
        assert!(chain.can_travel_zones(5, &clock));

        clock.advance(Duration::hours(24));
        assert!(!chain.can_travel_zones(5, &clock));
        assert!(chain.is_empty());
    }

    #[test]
    fn test_stale_ticket_error_propagates() {
        let clock = test_clock();
        let mut chain = zone_chain(&[0]);
        assert_eq!(
            chain.travel_zone(&clock),
            Err(MetrotikError::InvalidTicketUse {
                ticket_id: TicketId::new(1)
            })
        );
    }
}
