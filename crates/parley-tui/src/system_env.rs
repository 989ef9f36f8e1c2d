//! Production environment backed by the system clock.
//!
//! `SystemEnv` drives the client timers with `std::time::Instant` and sleeps
//! on the tokio timer. Behavior is wall-clock dependent, so tests use the
//! virtual clocks in `parley-harness` instead.

use std::time::Duration;

use parley_core::Environment;

/// Production environment using the monotonic system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemEnv;

impl SystemEnv {
    /// Create a new system environment.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Environment for SystemEnv {
    type Instant = std::time::Instant;

    #[allow(clippy::disallowed_methods)]
    fn now(&self) -> Self::Instant {
        std::time::Instant::now()
    }

    fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send {
        tokio::time::sleep(duration)
    }
}
