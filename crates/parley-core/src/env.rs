//! Environment abstraction for deterministic testing.
//!
//! Decouples protocol logic from the system clock. Every timer in Parley (who
//! collection, echo window, reconnect delay) is evaluated against an instant
//! supplied by the environment, which lets tests drive a virtual clock and
//! production use the monotonic system clock.

use std::{ops::Sub, time::Duration};

/// Point in time usable by the Parley state machines.
///
/// Subtracting an earlier instant from a later one yields the elapsed
/// duration. Implementations must saturate to zero when the right-hand side is
/// later, as `std::time::Instant` does.
pub trait Timestamp: Copy + Ord + Send + Sync + Sub<Output = Duration> {}

impl<T> Timestamp for T where T: Copy + Ord + Send + Sync + Sub<Output = Duration> {}

/// Abstract environment providing time and async sleeping.
///
/// # Invariants
///
/// - `now()` never goes backwards within a single execution context
pub trait Environment: Clone + Send + Sync + 'static {
    /// The specific instant type used by this environment.
    ///
    /// Production uses `std::time::Instant`; simulation uses a virtual clock.
    type Instant: Timestamp;

    /// Current time (monotonic).
    fn now(&self) -> Self::Instant;

    /// Sleeps for the specified duration.
    ///
    /// Only driver code sleeps. State machines never call this.
    fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send;
}

/// Manual clock for unit tests.
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils {
    use std::{
        ops::Sub,
        sync::{
            Arc,
            atomic::{AtomicU64, Ordering},
        },
        time::Duration,
    };

    use super::Environment;

    /// Instant on the manual clock, as elapsed time since the clock was made.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
    pub struct MockInstant(Duration);

    impl MockInstant {
        /// Instant `millis` after the epoch of the clock.
        pub fn from_millis(millis: u64) -> Self {
            Self(Duration::from_millis(millis))
        }

        /// Elapsed time since the epoch of the clock.
        pub fn since_start(self) -> Duration {
            self.0
        }
    }

    impl Sub for MockInstant {
        type Output = Duration;

        fn sub(self, rhs: Self) -> Duration {
            self.0.saturating_sub(rhs.0)
        }
    }

    /// Environment whose clock only moves when told to.
    ///
    /// Clones share the clock.
    #[derive(Debug, Clone, Default)]
    pub struct MockEnv {
        millis: Arc<AtomicU64>,
    }

    impl MockEnv {
        /// Clock at zero.
        pub fn new() -> Self {
            Self::default()
        }

        /// Move the clock forward.
        pub fn advance(&self, by: Duration) {
            let by = u64::try_from(by.as_millis()).unwrap_or(u64::MAX);
            self.millis.fetch_add(by, Ordering::SeqCst);
        }
    }

    impl Environment for MockEnv {
        type Instant = MockInstant;

        fn now(&self) -> MockInstant {
            MockInstant::from_millis(self.millis.load(Ordering::SeqCst))
        }

        async fn sleep(&self, duration: Duration) {
            self.advance(duration);
        }
    }

}
