//! Virtual-time environment backed by tokio's clock.
//!
//! Under turmoil, or a tokio runtime started with the clock paused, time only
//! moves when the simulation advances it, so every client timer fires at a
//! reproducible instant.

use std::time::Duration;

use parley_core::Environment;

/// Environment reading tokio's (possibly paused) clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimEnv;

impl SimEnv {
    /// Create a simulation environment.
    pub fn new() -> Self {
        Self
    }
}

impl Environment for SimEnv {
    type Instant = tokio::time::Instant;

    fn now(&self) -> Self::Instant {
        tokio::time::Instant::now()
    }

    fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send {
        tokio::time::sleep(duration)
    }
}
