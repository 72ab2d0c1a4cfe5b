//! # Class Booking Testing
//!
//! Testing utilities and helpers for the class booking engine.
//!
//! This crate provides:
//! - [`InMemoryBookingStore`]: every store trait over in-memory tables, with real
//!   per-class locking so concurrency tests exercise the same contract as Postgres
//! - [`FixedClock`] and [`test_clock`]: deterministic time
//! - [`fixtures`]: ready-made class and review inputs relative to the test clock
//! - [`properties`]: proptest strategies for booking/cancellation sequences
//!
//! ## Example
//!
//! ```ignore
//! use class_booking_testing::{InMemoryBookingStore, fixtures, test_service};
//!
//! #[tokio::test]
//! async fn test_booking_flow() {
//!     let (service, store) = test_service();
//!     let class = service.create_class(fixtures::new_class(1)).await.unwrap();
//!
//!     service.book_class(class.id, "u-1".into(), "Lin".into()).await.unwrap();
//!
//!     store.assert_invariants();
//! }
//! ```

use chrono::{DateTime, Utc};
use class_booking_core::environment::Clock;
use class_booking_core::service::BookingService;
use std::sync::Arc;

pub mod fixtures;
pub mod properties;
pub mod store;

/// Mock implementations of environment traits.
pub mod mocks {
    use super::{Clock, DateTime, Utc};

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making tests reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use class_booking_testing::mocks::FixedClock;
    /// use class_booking_core::environment::Clock;
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

// Re-export commonly used items
pub use mocks::{FixedClock, test_clock};
pub use store::{InMemoryBookingStore, InMemoryUnitOfWork};

/// A service over a fresh in-memory store at [`test_clock`] time.
///
/// Returns the store too, for direct inspection.
#[must_use]
pub fn test_service() -> (BookingService<InMemoryBookingStore>, InMemoryBookingStore) {
    let store = InMemoryBookingStore::new();
    let service = BookingService::new(Arc::new(store.clone()), Arc::new(test_clock()));
    (service, store)
}

/// A service over `store` whose clock reads `now`.
///
/// Build several over one store to simulate time passing.
#[must_use]
pub fn service_at(
    store: &InMemoryBookingStore,
    now: DateTime<Utc>,
) -> BookingService<InMemoryBookingStore> {
    BookingService::new(Arc::new(store.clone()), Arc::new(FixedClock::new(now)))
}

/// Install a test tracing subscriber once; later calls are no-ops.
///
/// Honours `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

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
