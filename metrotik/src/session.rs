//! Request-level facade over one rider's tickets, account and position.
//!
//! A session owns everything a single rider touches. The UI talks to the
//! session only: it issues requests, reads display strings, and drains the
//! notification queue once per refresh.

use crate::account::{Account, AccountEnvironment, Standing};
use crate::config::Config;
use crate::coordinator::TicketCoordinator;
use crate::error::{MetrotikError, Result};
use crate::issuance::{IssuedTicket, TicketIssuer};
use crate::line::MonorailLine;
use crate::notifications::NotificationBus;
use crate::types::{Money, PurchaseRecord};
use chrono::{DateTime, Utc};
use metrotik_core::environment::Clock;
use std::rc::Rc;

/// One rider's ticketing session
pub struct MetrotikSession {
    config: Config,
    clock: Rc<dyn Clock>,
    account: Account,
    issuer: TicketIssuer,
    coordinator: TicketCoordinator,
    line: MonorailLine,
    notifications: NotificationBus,
}

impl MetrotikSession {
    /// Opens the configured rider's account and places them on the line
    #[must_use]
    pub fn new(config: Config, clock: Rc<dyn Clock>) -> Self {
        let notifications = NotificationBus::new();
        let mut account = Account::open(
            config.rider.holder(),
            AccountEnvironment::new(Rc::clone(&clock)),
        );
        account.subscribe_transactions(notifications.account_observer());
        account.subscribe_state_changes(notifications.account_observer());

        let line = MonorailLine::from_config(&config.line);
        tracing::info!(zone = line.current_zone(), "Session started");

        Self {
            config,
            clock,
            account,
            issuer: TicketIssuer::new(),
            coordinator: TicketCoordinator::new(),
            line,
            notifications,
        }
    }

    /// Travel `zones` zones if a single held ticket covers the whole journey
    ///
    /// Zones are consumed one at a time, moving the rider along the line
    /// with each one.
    ///
    /// # Errors
    ///
    /// Returns [`MetrotikError::InvalidZoneCount`] for a zero-zone request and
    /// propagates [`MetrotikError::InvalidTicketUse`] from the ticket chains.
    #[tracing::instrument(skip(self))]
    pub fn request_zone_travel(&mut self, zones: u32) -> Result<bool> {
        let clock = self.clock.as_ref();
        if !self.coordinator.can_ride_for_requested_zones(zones, clock)? {
            tracing::info!("No valid ticket for the requested zones");
            return Ok(false);
        }

        for travelled in 1..=zones {
            if !self.coordinator.travel_one_zone(clock)? {
                tracing::warn!(travelled = travelled - 1, "Journey cut short: no ticket accepted the next zone");
                return Ok(false);
            }
            let zone = self.line.advance();
            metrics::counter!("metrotik.zones.travelled").increment(1);
            tracing::info!(zone, "Travelled zone {travelled} of {zones}");
        }

        tracing::info!("Requested zones travelled");
        Ok(true)
    }

    /// Buy a timed ticket valid for 24 hours from `valid_from`
    ///
    /// Returns false, with no ticket issued, if the account cannot pay.
    ///
    /// # Errors
    ///
    /// Returns an error only on an internal invariant violation.
    #[tracing::instrument(skip(self))]
    pub fn request_timed_ticket_purchase(&mut self, valid_from: DateTime<Utc>) -> Result<bool> {
        let price = self.config.pricing.timed_ticket_price();
        if !self.account.charge(price)? {
            tracing::info!(%price, "Timed ticket purchase failed");
            return Ok(false);
        }

        self.issuer.prime_timed(valid_from);
        let ticket = self.issuer.issue(self.clock.as_ref())?;
        self.file(ticket, price)?;
        Ok(true)
    }

    /// Buy a zone ticket for `zones` zones
    ///
    /// Returns false, with no ticket issued, if the account cannot pay.
    ///
    /// # Errors
    ///
    /// Returns [`MetrotikError::InvalidZoneCount`] for zero zones, before the
    /// account is charged.
    #[tracing::instrument(skip(self))]
    pub fn request_zone_ticket_purchase(&mut self, zones: u32) -> Result<bool> {
        if zones == 0 {
            return Err(MetrotikError::InvalidZoneCount);
        }

        let price = self.config.pricing.zone_ticket_price(zones);
        if !self.account.charge(price)? {
            tracing::info!(%price, "Zone ticket purchase failed");
            return Ok(false);
        }

        self.issuer.prime_zones(zones);
        let ticket = self.issuer.issue(self.clock.as_ref())?;
        self.file(ticket, price)?;
        Ok(true)
    }

    fn file(&mut self, mut ticket: IssuedTicket, price: Money) -> Result<()> {
        // the bus must observe the ticket before the coordinator takes it
        ticket.subscribe(self.notifications.ticket_observer());
        let kind = ticket.kind();
        self.coordinator.add_issued(ticket, price, &mut self.account)?;

        metrics::counter!("metrotik.tickets.purchased", "kind" => kind.as_str()).increment(1);
        tracing::info!(kind = kind.as_str(), %price, "Ticket purchased");
        Ok(())
    }

    /// Credit the account
    ///
    /// # Errors
    ///
    /// Returns [`MetrotikError::InvalidFundMutation`] for a negative amount.
    pub fn add_funds(&mut self, amount: Money) -> Result<()> {
        self.account.credit_funds(amount)
    }

    /// Ask the account to deactivate
    ///
    /// # Errors
    ///
    /// Returns an error only if the account store rejects the action.
    pub fn deactivate_account(&mut self) -> Result<()> {
        self.account.deactivate()
    }

    /// Balance for display, e.g. `$10.00`
    #[must_use]
    pub fn account_balance(&self) -> String {
        self.account.funds().to_string()
    }

    /// Standing label for display, e.g. `Good Standing`
    #[must_use]
    pub fn account_status(&self) -> String {
        self.account.standing().label().to_string()
    }

    /// Current zone number for display
    #[must_use]
    pub fn current_zone(&self) -> String {
        self.line.current_zone().to_string()
    }

    /// Everything that happened since the last drain, oldest first
    #[must_use]
    pub fn drain_notifications(&self) -> Vec<String> {
        self.notifications.drain()
    }

    /// Current balance
    #[must_use]
    pub fn funds(&self) -> Money {
        self.account.funds()
    }

    /// Current standing
    #[must_use]
    pub fn standing(&self) -> Standing {
        self.account.standing()
    }

    /// Every ticket bought, oldest first
    #[must_use]
    pub fn purchase_history(&self) -> Vec<PurchaseRecord> {
        self.account.purchase_history()
    }

    /// The rider's live tickets
    #[must_use]
    pub const fn coordinator(&self) -> &TicketCoordinator {
        &self.coordinator
    }

    /// The rider's account
    #[must_use]
    pub const fn account(&self) -> &Account {
        &self.account
    }

    /// Active configuration
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }
}

impl std::fmt::Debug for MetrotikSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetrotikSession")
            .field("account", &self.account)
            .field("coordinator", &self.coordinator)
            .field("line", &self.line)
            .field("pending_notifications", &self.notifications.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use metrotik_testing::test_clock;

    fn session() -> MetrotikSession {
        MetrotikSession::new(Config::default(), Rc::new(test_clock()))
    }

    #[test]
    fn test_new_session_display() {
        let session = session();
        assert_eq!(session.account_balance(), "$0.00");
        assert_eq!(session.account_status(), "Good Standing");
        assert_eq!(session.current_zone(), "1");
        assert!(session.drain_notifications().is_empty());
    }

    #[test]
    fn test_zero_zone_requests_are_rejected() {
        let mut session = session();
        session.add_funds(Money::from_dollars(20)).unwrap();
        let _ = session.drain_notifications();

        assert_eq!(session.request_zone_ticket_purchase(0), Err(MetrotikError::InvalidZoneCount));
        assert_eq!(session.request_zone_travel(0), Err(MetrotikError::InvalidZoneCount));
        assert_eq!(session.funds(), Money::from_dollars(20));
        assert!(session.drain_notifications().is_empty());
    }

    #[test]
    fn test_travel_without_ticket_fails_quietly() {
        let mut session = session();
        assert_eq!(session.request_zone_travel(1), Ok(false));
        assert_eq!(session.current_zone(), "1");
    }

    #[test]
    fn test_negative_funds_rejected() {
        let mut session = session();
        assert_eq!(
            session.add_funds(Money::from_cents(-500)),
            Err(MetrotikError::InvalidFundMutation {
                amount: Money::from_cents(-500)
            })
        );
        assert!(session.drain_notifications().is_empty());
    }
}
