//! # Wedding Testing
//!
//! Testing utilities for the wedding site workspace.
//!
//! This crate provides:
//! - Deterministic [`Clock`] implementations
//! - In-memory and failing [`DocumentStore`](wedding_core::document::DocumentStore) doubles
//! - Scriptable card and wallet gateway doubles
//! - A Given-When-Then harness for reducers, plus [`collect_actions`] for
//!   running their effects without a Store
//!
//! ## Example
//!
//! ```ignore
//! use wedding_testing::{test_clock, InMemoryDocumentStore, MockCardGateway};
//!
//! #[tokio::test]
//! async fn card_checkout_creates_an_order() {
//!     let docs = Arc::new(InMemoryDocumentStore::new());
//!     let card = Arc::new(MockCardGateway::new());
//!     let env = ShopEnvironment::new(docs.clone(), card.clone(), wallet, Arc::new(test_clock()));
//!     // ...
//!     assert_eq!(docs.len(Collection::Orders), 1);
//! }
//! ```

use chrono::{DateTime, Utc};
use wedding_core::environment::Clock;

pub mod document_mocks;
pub mod gateway_mocks;
pub mod reducer_test;

/// Mock implementations of Environment traits
pub mod mocks {
    use super::{Clock, DateTime, Utc};

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making tests reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use wedding_testing::mocks::FixedClock;
    /// use wedding_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// let time1 = clock.now();
    /// let time2 = clock.now();
    /// assert_eq!(time1, time2); // Always the same!
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

    /// Create a default fixed clock for tests (2025-06-14 12:00:00 UTC)
    ///
    /// # Panics
    ///
    /// This function will panic if the hardcoded timestamp fails to parse,
    /// which should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(
            DateTime::parse_from_rfc3339("2025-06-14T12:00:00Z")
                .expect("hardcoded timestamp should always parse")
                .with_timezone(&Utc),
        )
    }
}

// Re-export commonly used items
pub use document_mocks::{FailingDocumentStore, InMemoryDocumentStore};
pub use gateway_mocks::{CardCall, MockCardGateway, MockWalletGateway, WalletCall};
pub use mocks::{test_clock, FixedClock};
pub use reducer_test::{assertions, collect_actions, ReducerTest};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_clock() {
        let clock = test_clock();
        let time1 = clock.now();
        let time2 = clock.now();
        assert_eq!(time1, time2);
    }
}
