//! Domain types shared across the ticketing system.

use crate::error::{MetrotikError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Mul, Sub};

/// Money amount in cents (avoids floating point issues)
///
/// Signed: an account in debt carries a negative balance.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Money(i64);

impl Money {
    /// Zero dollars
    pub const ZERO: Self = Self(0);

    /// Creates a new `Money` amount from cents
    #[must_use]
    pub const fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    /// Returns the amount in cents
    #[must_use]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Creates a `Money` amount from whole dollars, saturating at the `i64` bounds
    #[must_use]
    pub const fn from_dollars(dollars: i64) -> Self {
        Self(dollars.saturating_mul(100))
    }

    /// Checks if this amount is below zero
    #[must_use]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Checks if this amount is above zero
    #[must_use]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }
}

impl Add for Money {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }
}

impl Sub for Money {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self(self.0.saturating_sub(rhs.0))
    }
}

impl Mul<u32> for Money {
    type Output = Self;

    fn mul(self, rhs: u32) -> Self {
        Self(self.0.saturating_mul(i64::from(rhs)))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}${}.{:02}", abs / 100, abs % 100)
    }
}

/// A validated, non-negative amount used to credit or debit an account
///
/// Constructing one is the only way to request a fund mutation, so every
/// account state sees amounts that already passed validation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundMutation(Money);

impl FundMutation {
    /// Validates a mutation amount
    ///
    /// # Errors
    ///
    /// Returns [`MetrotikError::InvalidFundMutation`] if `amount` is negative.
    pub fn new(amount: Money) -> Result<Self> {
        if amount.is_negative() {
            tracing::warn!(%amount, "Rejected negative fund mutation");
            return Err(MetrotikError::InvalidFundMutation { amount });
        }
        Ok(Self(amount))
    }

    /// The validated amount
    #[must_use]
    pub const fn amount(&self) -> Money {
        self.0
    }
}

impl fmt::Display for FundMutation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Unique ticket identifier, assigned sequentially by the issuer
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TicketId(u64);

impl TicketId {
    /// Creates a `TicketId` from its raw value
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw value
    #[must_use]
    pub const fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for TicketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The two ticket products
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TicketKind {
    /// Unlimited travel inside a 24 hour window
    Timed,
    /// A fixed quota of zones
    Zone,
}

impl TicketKind {
    /// Lowercase label used in logs and metrics
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Timed => "timed",
            Self::Zone => "zone",
        }
    }
}

/// Immutable identity of the rider owning an account
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountHolder {
    /// Account number
    pub account_id: u32,
    /// Given name
    pub first_name: String,
    /// Family name
    pub last_name: String,
    /// Contact email
    pub email: String,
}

impl AccountHolder {
    /// Creates a new account holder
    #[must_use]
    pub fn new(
        account_id: u32,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            account_id,
            first_name: first_name.into(),
            last_name: last_name.into(),
            email: email.into(),
        }
    }

    /// "First Last"
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// What a purchase bought, as it stood at purchase time
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Product {
    /// A timed ticket and its validity window
    Timed {
        /// Start of validity
        valid_from: DateTime<Utc>,
        /// End of validity
        valid_to: DateTime<Utc>,
    },
    /// A zone ticket and its initial allocation
    Zones {
        /// Zones purchased
        allocation: u32,
    },
}

/// Entry in an account's purchase history
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseRecord {
    /// The issued ticket
    pub ticket_id: TicketId,
    /// When the ticket was issued
    pub purchased_at: DateTime<Utc>,
    /// What was bought
    pub product: Product,
    /// What was paid
    pub price: Money,
}

impl PurchaseRecord {
    /// The product kind of this purchase
    #[must_use]
    pub const fn kind(&self) -> TicketKind {
        match self.product {
            Product::Timed { .. } => TicketKind::Timed,
            Product::Zones { .. } => TicketKind::Zone,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_money_display() {
        assert_eq!(Money::from_cents(1000).to_string(), "$10.00");
        assert_eq!(Money::from_cents(5).to_string(), "$0.05");
        assert_eq!(Money::from_cents(-1050).to_string(), "-$10.50");
        assert_eq!(Money::ZERO.to_string(), "$0.00");
    }

    #[test]
    fn test_money_arithmetic() {
        let five = Money::from_dollars(5);
        assert_eq!(five * 3, Money::from_dollars(15));
        assert_eq!(five - Money::from_dollars(8), Money::from_dollars(-3));
        assert_eq!(five + five, Money::from_dollars(10));
    }

    #[test]
    fn test_from_dollars_saturates() {
        assert_eq!(Money::from_dollars(i64::MAX), Money::from_cents(i64::MAX));
        assert_eq!(Money::from_dollars(i64::MIN), Money::from_cents(i64::MIN));
        assert_eq!(Money::from_dollars(-3), Money::from_cents(-300));
    }

    #[test]
    fn test_fund_mutation_rejects_negative() {
        assert_eq!(
            FundMutation::new(Money::from_cents(-1)),
            Err(MetrotikError::InvalidFundMutation {
                amount: Money::from_cents(-1)
            })
        );
        assert!(FundMutation::new(Money::ZERO).is_ok());
    }
}
