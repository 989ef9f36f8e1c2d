//! Driver trait for abstracting I/O operations.
//!
//! The [`Driver`] trait decouples the application runtime from specific I/O
//! implementations. Each frontend implements the trait to provide
//! platform-specific I/O, while the generic [`crate::Runtime`] handles all
//! orchestration.

use std::future::Future;

use parley_core::Timestamp;

use crate::{App, AppAction};

/// Something that arrived from the server side of the driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    /// One line, without its terminator.
    Line(String),
    /// The connection is gone. Reported once per lost connection.
    Closed,
}

/// Abstracts I/O operations for the application runtime.
///
/// Implementations provide platform-specific I/O while the generic
/// [`Runtime`](crate::Runtime) handles orchestration logic. This ensures
/// the same orchestration code runs in the terminal frontend and in
/// simulation.
///
/// # Implementations
///
/// - **TUI**: crossterm for terminal events, tokio TCP for the line transport
/// - **Simulation**: in-memory queues wired to a scripted server
pub trait Driver: Send {
    /// Platform-specific error type.
    type Error: std::error::Error + Send + 'static;

    /// Time instant type. Enables virtual time in simulation.
    type Instant: Timestamp;

    /// Wait briefly for user input and turn it into App actions.
    ///
    /// Returns an empty list when nothing happened before the driver's tick
    /// interval elapsed.
    fn poll_event(
        &mut self,
        app: &mut App,
    ) -> impl Future<Output = Result<Vec<AppAction>, Self::Error>> + Send;

    /// Write one line to the server.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection is closed or the write fails.
    fn send_line(&mut self, line: String) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Take the next pending inbound item without waiting.
    ///
    /// Returns `None` when nothing is pending.
    fn recv_line(&mut self) -> impl Future<Output = Option<Inbound>> + Send;

    /// Open a connection to the server.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established.
    fn connect(&mut self, addr: &str) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Current time instant.
    fn now(&self) -> Self::Instant;

    /// Render the application state.
    ///
    /// # Errors
    ///
    /// Returns an error if rendering fails.
    fn render(&mut self, app: &App) -> Result<(), Self::Error>;

    /// Stop the connection and clean up resources.
    fn stop(&mut self);
}
