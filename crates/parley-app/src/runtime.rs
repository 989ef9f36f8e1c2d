//! Generic runtime for application orchestration.
//!
//! The Runtime drives the application event loop, coordinating between:
//! - [`App`]: UI state machine
//! - [`Bridge`]: Protocol bridge to Client
//! - [`Driver`]: Platform-specific I/O

use parley_client::{ClientConfig, Environment};

use crate::{App, AppAction, AppEvent, Bridge, Driver, Inbound};

/// Generic runtime that orchestrates App, Bridge, and Driver.
///
/// # Type Parameters
///
/// - `D`: Platform-specific I/O driver
/// - `E`: Environment for timing
pub struct Runtime<D, E>
where
    D: Driver,
    E: Environment,
{
    driver: D,
    app: App,
    bridge: Bridge<E>,
    server_addr: String,
}

impl<D, E> Runtime<D, E>
where
    D: Driver<Instant = E::Instant>,
    E: Environment,
{
    /// Create a new runtime with the given driver and environment.
    pub fn new(driver: D, env: E, config: ClientConfig, server_addr: String) -> Self {
        let app = App::new(server_addr.clone());
        let bridge = Bridge::new(env, config);
        Self { driver, app, bridge, server_addr }
    }

    /// Run the main event loop until the user quits.
    ///
    /// # Errors
    ///
    /// Returns an error if the driver encounters an I/O error. Connection
    /// failures are not errors; they feed the reconnect cycle.
    pub async fn run(mut self) -> Result<(), D::Error> {
        self.start().await?;

        loop {
            if self.step().await? {
                break;
            }
        }

        self.driver.stop();
        Ok(())
    }

    /// Draw the first frame and open the first connection.
    ///
    /// # Errors
    ///
    /// Returns an error if rendering fails.
    pub async fn start(&mut self) -> Result<(), D::Error> {
        self.driver.render(&self.app)?;
        self.connect().await
    }

    /// Process one cycle of the event loop.
    ///
    /// 1. Polls for input from the driver
    /// 2. Drains lines received from the server
    /// 3. Advances client timers
    /// 4. Reconnects if the client asked for it
    ///
    /// Returns `true` if the application should quit.
    ///
    /// # Errors
    ///
    /// Returns an error if the driver encounters an I/O error.
    pub async fn step(&mut self) -> Result<bool, D::Error> {
        let actions = self.driver.poll_event(&mut self.app).await?;
        if !actions.is_empty() && self.process_actions(actions).await? {
            return Ok(true);
        }

        while let Some(inbound) = self.driver.recv_line().await {
            let events = match inbound {
                Inbound::Line(line) => self.bridge.handle_line(line),
                Inbound::Closed => self.bridge.handle_closed(),
            };
            self.send_outgoing_lines().await;
            if self.process_bridge_events(events).await? {
                return Ok(true);
            }
        }

        let now = self.driver.now();
        let events = self.bridge.handle_tick(now);
        self.send_outgoing_lines().await;
        if self.process_bridge_events(events).await? {
            return Ok(true);
        }

        if self.bridge.take_reconnect() {
            self.connect().await?;
        }

        Ok(false)
    }

    /// Process actions returned by the App.
    ///
    /// Returns `true` if should quit.
    async fn process_actions(&mut self, initial_actions: Vec<AppAction>) -> Result<bool, D::Error> {
        let mut pending_actions = initial_actions;

        while !pending_actions.is_empty() {
            let actions = std::mem::take(&mut pending_actions);

            for action in actions {
                match action {
                    AppAction::Render => self.driver.render(&self.app)?,
                    AppAction::Quit => return Ok(true),
                    AppAction::Connect { server_addr: _ } => {
                        self.connect().await?;
                    },

                    // Session operations go through the bridge
                    AppAction::SendText { .. }
                    | AppAction::Rename { .. }
                    | AppAction::RefreshPresence
                    | AppAction::SelectTarget { .. }
                    | AppAction::SwitchPublic
                    | AppAction::SwitchPrivate => {
                        let events = self.bridge.process_app_action(action);
                        for event in events {
                            let new_actions = self.app.handle(event);
                            pending_actions.extend(new_actions);
                        }
                        self.send_outgoing_lines().await;
                    },
                }
            }
        }
        Ok(false)
    }

    /// Process actions synchronously (for use in sync contexts).
    fn process_actions_sync(&mut self, actions: Vec<AppAction>) {
        for action in actions {
            match action {
                AppAction::Render => {
                    if let Err(e) = self.driver.render(&self.app) {
                        tracing::warn!("Failed to render: {:?}", e);
                    }
                },
                AppAction::Quit => {},

                // Session actions shouldn't happen in sync contexts
                AppAction::Connect { .. }
                | AppAction::SendText { .. }
                | AppAction::Rename { .. }
                | AppAction::RefreshPresence
                | AppAction::SelectTarget { .. }
                | AppAction::SwitchPublic
                | AppAction::SwitchPrivate => {
                    tracing::warn!("Unexpected session action in sync context: {:?}", action);
                },
            }
        }
    }

    /// Process events from Bridge back to App.
    async fn process_bridge_events(&mut self, events: Vec<AppEvent>) -> Result<bool, D::Error> {
        for event in events {
            let actions = self.app.handle(event);
            if self.process_actions(actions).await? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Open a connection and report the outcome to the client.
    ///
    /// A failed attempt is fed back as a close so the client arms the next
    /// retry.
    async fn connect(&mut self) -> Result<(), D::Error> {
        let events = self.bridge.handle_connecting();
        self.apply_events_sync(events);

        let events = match self.driver.connect(&self.server_addr).await {
            Ok(()) => self.bridge.handle_opened(),
            Err(e) => {
                tracing::warn!(error = %e, addr = %self.server_addr, "connect failed");
                self.bridge.handle_closed()
            },
        };
        self.apply_events_sync(events);

        Ok(())
    }

    fn apply_events_sync(&mut self, events: Vec<AppEvent>) {
        for event in events {
            let actions = self.app.handle(event);
            self.process_actions_sync(actions);
        }
    }

    /// Write all pending outgoing lines to the server.
    ///
    /// A failed write means the connection is gone; the driver reports the
    /// close through [`Driver::recv_line`], so the line is only logged here.
    async fn send_outgoing_lines(&mut self) {
        for line in self.bridge.take_outgoing() {
            if let Err(e) = self.driver.send_line(line).await {
                tracing::warn!(error = %e, "failed to send line");
                break;
            }
        }
    }

    /// Get a reference to the App
    pub fn app(&self) -> &App {
        &self.app
    }
}
