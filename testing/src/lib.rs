//! # Metrotik Testing
//!
//! Testing utilities and helpers for Metrotik reducers.
//!
//! This crate provides:
//! - Deterministic [`Clock`] implementations (fixed and manually advanced)
//! - A Given-When-Then harness for reducers ([`ReducerTest`])
//! - Assertion helpers for effects
//! - proptest strategies shared by property tests
//!
//! ## Example
//!
//! ```
//! use metrotik_testing::{test_clock, ManualClock};
//! use metrotik_core::environment::Clock;
//! use chrono::Duration;
//!
//! let clock = ManualClock::new(test_clock().now());
//! let start = clock.now();
//! clock.advance(Duration::hours(25));
//! assert_eq!(clock.now() - start, Duration::hours(25));
//! ```

use chrono::{DateTime, Utc};
use metrotik_core::environment::Clock;

/// Ergonomic testing utilities for reducers
pub mod reducer_test;

pub use reducer_test::{assertions, ReducerTest};

/// Mock implementations of Environment traits
pub mod mocks {
    use super::{Clock, DateTime, Utc};
    use chrono::Duration;
    use std::cell::Cell;
    use std::rc::Rc;

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making tests reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use metrotik_testing::mocks::FixedClock;
    /// use metrotik_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// assert_eq!(clock.now(), clock.now());
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Clock that only moves when a test tells it to
    ///
    /// Clones share the same instant, so a test can keep one handle and
    /// hand another to the code under test.
    #[derive(Debug, Clone)]
    pub struct ManualClock {
        time: Rc<Cell<DateTime<Utc>>>,
    }

    impl ManualClock {
        /// Create a manual clock starting at `time`
        #[must_use]
        pub fn new(time: DateTime<Utc>) -> Self {
            Self {
                time: Rc::new(Cell::new(time)),
            }
        }

        /// Move the clock forward (or backward, for a negative duration)
        pub fn advance(&self, by: Duration) {
            self.time.set(self.time.get() + by);
        }

        /// Jump to an absolute instant
        pub fn set(&self, time: DateTime<Utc>) {
            self.time.set(time);
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> DateTime<Utc> {
            self.time.get()
        }
    }

    /// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
    ///
    /// # Panics
    ///
    /// This function will panic if the hardcoded timestamp fails to parse,
    /// which should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(
            DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
                .expect("hardcoded timestamp should always parse")
                .with_timezone(&Utc),
        )
    }
}

/// Test helpers and utilities
pub mod helpers {
    /// Route `tracing` output through the test harness
    ///
    /// Safe to call from every test; only the first call installs a subscriber.
    pub fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_test_writer()
            .with_max_level(tracing_subscriber::filter::LevelFilter::DEBUG)
            .try_init();
    }
}

/// Property-based testing utilities using proptest
pub mod properties {
    use proptest::prelude::*;

    /// Non-negative amounts in cents, up to $10,000.00
    pub fn amount_cents() -> impl Strategy<Value = i64> {
        0i64..=1_000_000
    }

    /// Journey lengths in zones
    pub fn zone_counts() -> impl Strategy<Value = u32> {
        1u32..=20
    }
}

// Re-export commonly used items
pub use mocks::{test_clock, FixedClock, ManualClock};
