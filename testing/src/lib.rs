//! # Event Horizon Testing
//!
//! Testing utilities for reducers and stores:
//! - Deterministic [`Clock`] implementations
//! - [`ReducerTest`], a Given-When-Then harness for reducers
//! - Effect assertion helpers
//!
//! ## Example
//!
//! ```ignore
//! use horizon_testing::{ReducerTest, assertions, test_clock};
//!
//! ReducerTest::new(PurchaseReducer::new())
//!     .with_env(test_environment(test_clock()))
//!     .given_state(PurchaseState::new(event, tiers))
//!     .when_action(PurchaseAction::SetQuantity { requested: 15 })
//!     .then_state(|state| assert_eq!(state.quantity.get(), 10))
//!     .then_effects(assertions::assert_no_effects)
//!     .run();
//! ```

use chrono::{DateTime, Duration, Utc};
use horizon_core::environment::Clock;

mod reducer_test;

pub use reducer_test::{ReducerTest, assertions};

/// Mock implementations of environment traits
pub mod mocks {
    use super::{Clock, DateTime, Duration, Utc};
    use std::sync::Mutex;

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time.
    ///
    /// # Example
    ///
    /// ```
    /// use horizon_testing::mocks::FixedClock;
    /// use horizon_core::environment::Clock;
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

    /// Clock that only moves when told to
    ///
    /// Useful when a test needs distinct, predictable timestamps for
    /// consecutive events (e.g. two confirmations of the same flow).
    #[derive(Debug)]
    pub struct ManualClock {
        time: Mutex<DateTime<Utc>>,
    }

    impl ManualClock {
        /// Create a clock starting at `start`
        #[must_use]
        pub const fn new(start: DateTime<Utc>) -> Self {
            Self {
                time: Mutex::new(start),
            }
        }

        /// Move the clock forward
        pub fn advance(&self, by: Duration) {
            let mut time = match self.time.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            *time += by;
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> DateTime<Utc> {
            match self.time.lock() {
                Ok(guard) => *guard,
                Err(poisoned) => *poisoned.into_inner(),
            }
        }
    }

    /// Fixed reference instant used across tests (2025-01-01 00:00:00 UTC)
    #[must_use]
    pub fn reference_instant() -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp(1_735_689_600, 0).unwrap_or_default()
    }

    /// Create a default fixed clock for tests
    #[must_use]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(reference_instant())
    }
}

// Re-export commonly used items
pub use mocks::{FixedClock, ManualClock, test_clock};
