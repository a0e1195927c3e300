//! Ticket variants and their shared contract.
//!
//! Two products exist:
//!
//! - [`TimedTicket`]: unlimited zones while `valid_from < now < valid_to`,
//!   where `valid_to` is 24 hours after `valid_from`. It absorbs a whole
//!   journey or none of it.
//! - [`ZoneTicket`]: a quota of zones, spent one per zone travelled. It can
//!   partially cover a journey.
//!
//! A ticket that becomes invalid (expired or exhausted) tells each of its
//! observers exactly once through a [`TicketInvalidated`] event. Containers
//! use this to drop dead tickets; the notification bus uses it to tell the
//! rider.

use crate::error::{MetrotikError, Result};
use crate::types::{TicketId, TicketKind};
use chrono::{DateTime, Duration, Utc};
use metrotik_core::environment::Clock;
use metrotik_core::listeners::{Listeners, SubscriberId};

/// How long a timed ticket stays valid once it starts
pub const TIMED_TICKET_VALIDITY_HOURS: i64 = 24;

/// Broadcast when a ticket becomes permanently unusable
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TicketInvalidated {
    /// The ticket that died
    pub ticket_id: TicketId,
    /// Its product kind
    pub kind: TicketKind,
}

/// Capability contract shared by every ticket variant
pub trait Ticket {
    /// The ticket's identifier
    fn id(&self) -> TicketId;

    /// The product kind
    fn kind(&self) -> TicketKind;

    /// When the ticket was issued
    fn purchased_at(&self) -> DateTime<Utc>;

    /// Register an observer for the invalidation event
    fn subscribe<F>(&mut self, observer: F) -> SubscriberId
    where
        F: FnMut(&TicketInvalidated) + 'static;

    /// Spend this ticket on a single zone of travel
    ///
    /// Returns whether the zone was granted.
    ///
    /// # Errors
    ///
    /// Returns [`MetrotikError::InvalidTicketUse`] if the ticket is already
    /// exhausted; containers must never offer such a ticket for travel.
    fn travel_zone(&mut self, clock: &dyn Clock) -> Result<bool>;

    /// How many of `zones` would remain uncovered by this ticket
    ///
    /// Does not spend anything. A timed ticket found past its window
    /// still announces its invalidation here.
    fn check_zone_travel(&mut self, zones: u32, clock: &dyn Clock) -> u32;
}

/// Observer set plus the once-only guard for the invalidation broadcast
#[derive(Debug, Default)]
struct Invalidation {
    observers: Listeners<TicketInvalidated>,
    fired: bool,
}

impl Invalidation {
    fn subscribe<F>(&mut self, observer: F) -> SubscriberId
    where
        F: FnMut(&TicketInvalidated) + 'static,
    {
        self.observers.subscribe(observer)
    }

    fn fire(&mut self, event: TicketInvalidated) {
        if self.fired {
            return;
        }
        self.fired = true;
        tracing::info!(ticket_id = %event.ticket_id, kind = event.kind.as_str(), "Ticket invalidated");
        self.observers.notify(&event);
    }
}

/// Ticket granting unlimited zones inside a 24 hour window
#[derive(Debug)]
pub struct TimedTicket {
    id: TicketId,
    purchased_at: DateTime<Utc>,
    valid_from: DateTime<Utc>,
    valid_to: DateTime<Utc>,
    invalidation: Invalidation,
}

impl TimedTicket {
    /// Creates a timed ticket valid for 24 hours from `valid_from`
    #[must_use]
    pub fn new(id: TicketId, purchased_at: DateTime<Utc>, valid_from: DateTime<Utc>) -> Self {
        let valid_to = valid_from + Duration::hours(TIMED_TICKET_VALIDITY_HOURS);
        tracing::debug!(ticket_id = %id, %valid_from, %valid_to, "Timed ticket created");
        Self {
            id,
            purchased_at,
            valid_from,
            valid_to,
            invalidation: Invalidation::default(),
        }
    }

    /// Start of the validity window (exclusive)
    #[must_use]
    pub const fn valid_from(&self) -> DateTime<Utc> {
        self.valid_from
    }

    /// End of the validity window (exclusive)
    #[must_use]
    pub const fn valid_to(&self) -> DateTime<Utc> {
        self.valid_to
    }

    /// Whether the ticket may be used at `now`
    #[must_use]
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.valid_from < now && now < self.valid_to
    }

    fn expire_if_past(&mut self, now: DateTime<Utc>) {
        if now > self.valid_to {
            self.invalidation.fire(TicketInvalidated {
                ticket_id: self.id,
                kind: TicketKind::Timed,
            });
        }
    }
}

impl Ticket for TimedTicket {
    fn id(&self) -> TicketId {
        self.id
    }

    fn kind(&self) -> TicketKind {
        TicketKind::Timed
    }

    fn purchased_at(&self) -> DateTime<Utc> {
        self.purchased_at
    }

    fn subscribe<F>(&mut self, observer: F) -> SubscriberId
    where
        F: FnMut(&TicketInvalidated) + 'static,
    {
        self.invalidation.subscribe(observer)
    }

    fn travel_zone(&mut self, clock: &dyn Clock) -> Result<bool> {
        let now = clock.now();
        if self.is_valid_at(now) {
            tracing::debug!(ticket_id = %self.id, "Timed ticket used to travel a zone");
            return Ok(true);
        }

        tracing::debug!(ticket_id = %self.id, %now, "Timed ticket not valid for travel");
        self.expire_if_past(now);
        Ok(false)
    }

    fn check_zone_travel(&mut self, zones: u32, clock: &dyn Clock) -> u32 {
        let now = clock.now();
        if self.is_valid_at(now) {
            return 0;
        }

        self.expire_if_past(now);
        zones
    }
}

/// Ticket granting a fixed quota of zones
#[derive(Debug)]
pub struct ZoneTicket {
    id: TicketId,
    purchased_at: DateTime<Utc>,
    zone_allocation: u32,
    invalidation: Invalidation,
}

impl ZoneTicket {
    /// Creates a zone ticket with `zone_allocation` zones
    #[must_use]
    pub fn new(id: TicketId, purchased_at: DateTime<Utc>, zone_allocation: u32) -> Self {
        tracing::debug!(ticket_id = %id, zone_allocation, "Zone ticket created");
        Self {
            id,
            purchased_at,
            zone_allocation,
            invalidation: Invalidation::default(),
        }
    }

    /// Zones left on the ticket
    #[must_use]
    pub const fn zone_allocation(&self) -> u32 {
        self.zone_allocation
    }

    /// Whether any zones are left
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.zone_allocation > 0
    }
}

impl Ticket for ZoneTicket {
    fn id(&self) -> TicketId {
        self.id
    }

    fn kind(&self) -> TicketKind {
        TicketKind::Zone
    }

    fn purchased_at(&self) -> DateTime<Utc> {
        self.purchased_at
    }

    fn subscribe<F>(&mut self, observer: F) -> SubscriberId
    where
        F: FnMut(&TicketInvalidated) + 'static,
    {
        self.invalidation.subscribe(observer)
    }

    fn travel_zone(&mut self, _clock: &dyn Clock) -> Result<bool> {
        if self.zone_allocation == 0 {
            tracing::error!(ticket_id = %self.id, "Exhausted zone ticket offered for travel");
            return Err(MetrotikError::InvalidTicketUse { ticket_id: self.id });
        }

        self.zone_allocation -= 1;
        tracing::debug!(
            ticket_id = %self.id,
            remaining = self.zone_allocation,
            "Zone ticket used to travel a zone"
        );

        if self.zone_allocation == 0 {
            self.invalidation.fire(TicketInvalidated {
                ticket_id: self.id,
                kind: TicketKind::Zone,
            });
        }
        Ok(true)
    }

    fn check_zone_travel(&mut self, zones: u32, _clock: &dyn Clock) -> u32 {
        zones.saturating_sub(self.zone_allocation)
    }
}
