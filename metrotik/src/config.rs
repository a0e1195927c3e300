//! Configuration management for the ticketing session.
//!
//! Loads configuration from environment variables with sensible defaults.

use crate::types::{AccountHolder, Money};
use serde::{Deserialize, Serialize};
use std::env;

/// Session configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Ticket prices
    pub pricing: PricingConfig,
    /// Monorail layout
    pub line: LineConfig,
    /// Identity of the rider whose account is opened
    pub rider: RiderConfig,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
}

/// Ticket prices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingConfig {
    /// Flat price of a timed ticket, in cents
    pub timed_ticket_cents: i64,
    /// Price of each zone on a zone ticket, in cents
    pub zone_cents: i64,
}

/// Monorail layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineConfig {
    /// Zones on the circular line
    pub zone_count: u32,
    /// Zone the rider starts in
    pub starting_zone: u32,
}

/// Rider identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiderConfig {
    /// Account number
    pub account_id: u32,
    /// Given name
    pub first_name: String,
    /// Family name
    pub last_name: String,
    /// Contact email
    pub email: String,
}

const DEFAULT_TIMED_TICKET_CENTS: i64 = 1000;
const DEFAULT_ZONE_CENTS: i64 = 500;
const DEFAULT_ZONE_COUNT: u32 = 10;
const DEFAULT_STARTING_ZONE: u32 = 1;

impl Default for Config {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

impl Config {
    /// Load configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from any key/value source, falling back to defaults
    /// for missing or unparsable values.
    #[must_use]
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let zone_count = lookup("METROTIK_ZONE_COUNT")
            .and_then(|s| s.parse().ok())
            .filter(|&n: &u32| n > 0)
            .unwrap_or(DEFAULT_ZONE_COUNT);
        let starting_zone = lookup("METROTIK_STARTING_ZONE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_STARTING_ZONE)
            .clamp(1, zone_count);

        Self {
            pricing: PricingConfig {
                timed_ticket_cents: lookup("METROTIK_TIMED_TICKET_CENTS")
                    .and_then(|s| s.parse().ok())
                    .filter(|&c: &i64| c >= 0)
                    .unwrap_or(DEFAULT_TIMED_TICKET_CENTS),
                zone_cents: lookup("METROTIK_ZONE_CENTS")
                    .and_then(|s| s.parse().ok())
                    .filter(|&c: &i64| c >= 0)
                    .unwrap_or(DEFAULT_ZONE_CENTS),
            },
            line: LineConfig {
                zone_count,
                starting_zone,
            },
            rider: RiderConfig {
                account_id: lookup("METROTIK_ACCOUNT_ID")
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(18490),
                first_name: lookup("METROTIK_FIRST_NAME").unwrap_or_else(|| "Jimmy".to_string()),
                last_name: lookup("METROTIK_LAST_NAME").unwrap_or_else(|| "Barnes".to_string()),
                email: lookup("METROTIK_EMAIL")
                    .unwrap_or_else(|| "jimmy.barnes@yahoo.com".to_string()),
            },
            log_level: lookup("RUST_LOG").unwrap_or_else(|| "info".to_string()),
        }
    }
}

impl PricingConfig {
    /// Price of one timed ticket
    #[must_use]
    pub const fn timed_ticket_price(&self) -> Money {
        Money::from_cents(self.timed_ticket_cents)
    }

    /// Price of a zone ticket covering `zones` zones
    #[must_use]
    pub fn zone_ticket_price(&self, zones: u32) -> Money {
        Money::from_cents(self.zone_cents) * zones
    }
}

impl RiderConfig {
    /// The account holder this configuration describes
    #[must_use]
    pub fn holder(&self) -> AccountHolder {
        AccountHolder::new(
            self.account_id,
            self.first_name.clone(),
            self.last_name.clone(),
            self.email.clone(),
        )
    }
}
