//! # Metrotik
//!
//! Monorail ticketing simulation: one rider, their account, and the tickets
//! that authorize travel around a circular line.
//!
//! - [`ticket`]: timed and zone tickets, their validity and invalidation
//! - [`issuance`]: two-phase ticket construction with sequential ids
//! - [`chain`] / [`coordinator`]: which ticket pays for each zone travelled
//! - [`account`]: the Good Standing / In Debt / Deactivated state machine,
//!   driven through a reducer and store
//! - [`notifications`]: the FIFO queue the UI drains each refresh
//! - [`session`]: the request-level facade tying it all together
//!
//! ## Example
//!
//! ```
//! use metrotik::{Config, MetrotikSession, Money};
//! use metrotik_core::environment::SystemClock;
//! use std::rc::Rc;
//!
//! # fn main() -> metrotik::Result<()> {
//! let mut session = MetrotikSession::new(Config::default(), Rc::new(SystemClock));
//! assert!(!session.request_zone_ticket_purchase(2)?);
//!
//! session.add_funds(Money::from_dollars(10))?;
//! assert!(session.request_zone_ticket_purchase(2)?);
//! assert!(session.request_zone_travel(2)?);
//! assert_eq!(session.current_zone(), "3");
//! # Ok(())
//! # }
//! ```

pub mod account;
pub mod chain;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod issuance;
pub mod line;
pub mod notifications;
pub mod session;
pub mod ticket;
pub mod types;

pub use account::{Account, AccountAction, AccountEvent, AccountReducer, AccountState, Standing};
pub use config::Config;
pub use coordinator::TicketCoordinator;
pub use error::{MetrotikError, Result};
pub use notifications::NotificationBus;
pub use session::MetrotikSession;
pub use ticket::{Ticket, TimedTicket, ZoneTicket};
pub use types::{AccountHolder, FundMutation, Money, PurchaseRecord, TicketId, TicketKind};
