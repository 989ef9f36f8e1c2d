//! Simulation driver implementing the Driver trait.
//!
//! `SimDriver` provides the same interface as the terminal driver but for
//! deterministic testing. It implements [`Driver`] so the same
//! [`parley_app::Runtime`] orchestration code runs in both production and
//! simulation.
//!
//! Without a hub the driver only records what the runtime writes and replays
//! injected lines. Wired to a [`SharedHub`] it talks to the scripted server,
//! so several runtimes can chat with each other.

#![allow(clippy::disallowed_types, reason = "Synchronous locking operations only")]

use std::{
    collections::VecDeque,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use parley_app::{App, AppAction, AppEvent, Driver, Inbound, InputState, KeyInput};

use crate::{
    invariants::{ClientSnapshot, InvariantRegistry, SystemSnapshot},
    scripted_server::{SessionId, SharedHub},
};

/// Error type for simulation driver.
#[derive(Debug, Clone)]
pub struct SimDriverError(pub String);

impl std::fmt::Display for SimDriverError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SimDriverError: {}", self.0)
    }
}

impl std::error::Error for SimDriverError {}

/// User input waiting to be applied to the App.
#[derive(Debug)]
enum SimInput {
    Event(AppEvent),
    Submit(String),
    Key(KeyInput),
    CycleTarget,
}

/// Shared state for input injection.
///
/// This allows injection from outside async contexts.
#[derive(Default)]
struct SharedState {
    pending_inputs: VecDeque<SimInput>,
    input: InputState,
    incoming: VecDeque<Inbound>,
    outgoing_lines: Vec<String>,
    connected: bool,
    refuse_connections: bool,
    connect_attempts: usize,
    renders: usize,
    session: Option<SessionId>,
}

/// Simulation driver for deterministic testing.
///
/// Clones share state, so a test can keep a handle for injection while the
/// runtime owns the driver.
#[derive(Clone)]
pub struct SimDriver {
    state: Arc<Mutex<SharedState>>,
    hub: Option<SharedHub>,
    /// Peer address reported to the hub.
    addr: String,
    /// Idle wait in `poll_event`. `None` returns immediately.
    tick: Option<Duration>,
    invariants: Option<Arc<InvariantRegistry>>,
}

impl Default for SimDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl SimDriver {
    /// Create a standalone simulation driver.
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(SharedState::default())),
            hub: None,
            addr: "127.0.0.1:50000".to_owned(),
            tick: None,
            invariants: None,
        }
    }

    /// Create a driver connected through a scripted server hub.
    pub fn with_hub(hub: SharedHub, addr: impl Into<String>) -> Self {
        Self { hub: Some(hub), addr: addr.into(), ..Self::new() }
    }

    /// Sleep for `tick` when no input is pending, like a terminal poll.
    #[must_use]
    pub fn with_tick(mut self, tick: Duration) -> Self {
        self.tick = Some(tick);
        self
    }

    /// Enable invariant checking.
    #[must_use]
    pub fn with_invariants(mut self, registry: InvariantRegistry) -> Self {
        self.invariants = Some(Arc::new(registry));
        self
    }

    fn lock(&self) -> MutexGuard<'_, SharedState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Inject an `AppEvent` for processing.
    pub fn inject_event(&self, event: AppEvent) {
        self.lock().pending_inputs.push_back(SimInput::Event(event));
    }

    /// Inject a submitted input line, as if typed and confirmed with Enter.
    pub fn inject_submit(&self, input: impl Into<String>) {
        self.lock().pending_inputs.push_back(SimInput::Submit(input.into()));
    }

    /// Inject a key press, edited the same way the terminal edits it.
    pub fn inject_key(&self, key: KeyInput) {
        self.lock().pending_inputs.push_back(SimInput::Key(key));
    }

    /// Type `text` and press Enter.
    pub fn inject_typed(&self, text: &str) {
        let mut state = self.lock();
        state.pending_inputs.extend(text.chars().map(|c| SimInput::Key(KeyInput::Char(c))));
        state.pending_inputs.push_back(SimInput::Key(KeyInput::Enter));
    }

    /// Current contents of the simulated input line.
    pub fn input_buffer(&self) -> String {
        self.lock().input.buffer().to_owned()
    }

    /// Inject a private target cycle, as if Tab was pressed.
    pub fn inject_cycle_target(&self) {
        self.lock().pending_inputs.push_back(SimInput::CycleTarget);
    }

    /// Inject a line from the server.
    pub fn inject_line(&self, line: impl Into<String>) {
        self.lock().incoming.push_back(Inbound::Line(line.into()));
    }

    /// Inject a tick event.
    pub fn inject_tick(&self) {
        self.inject_event(AppEvent::Tick);
    }

    /// Refuse (or accept again) connection attempts.
    pub fn refuse_connections(&self, refuse: bool) {
        self.lock().refuse_connections = refuse;
    }

    /// Drop the connection as if the server went away.
    pub fn drop_connection(&self) {
        let session = {
            let mut state = self.lock();
            if !state.connected {
                return;
            }
            state.connected = false;
            state.incoming.push_back(Inbound::Closed);
            state.session.take()
        };
        if let (Some(hub), Some(session)) = (&self.hub, session) {
            hub.lock().disconnect(session);
        }
    }

    /// Take all captured outgoing lines.
    pub fn take_outgoing(&self) -> Vec<String> {
        std::mem::take(&mut self.lock().outgoing_lines)
    }

    /// Number of connection attempts so far.
    pub fn connect_attempts(&self) -> usize {
        self.lock().connect_attempts
    }

    /// Number of frames rendered so far.
    pub fn renders(&self) -> usize {
        self.lock().renders
    }

    /// Hub session of the current connection.
    pub fn session(&self) -> Option<SessionId> {
        self.lock().session
    }

    /// Check if there are pending inputs or lines to process.
    pub fn has_pending(&self) -> bool {
        let (session, busy) = {
            let state = self.lock();
            (state.session, !state.pending_inputs.is_empty() || !state.incoming.is_empty())
        };
        busy || match (&self.hub, session) {
            (Some(hub), Some(session)) => hub.lock().has_lines(session),
            _ => false,
        }
    }

    /// Create a snapshot from App state for invariant checking.
    pub fn snapshot_from_app(&self, app: &App) -> SystemSnapshot {
        SystemSnapshot::single(ClientSnapshot::from_app(0, app))
    }

    /// Check invariants against App state.
    pub fn check_invariants(&self, app: &App, context: &str) {
        if let Some(registry) = &self.invariants {
            let snapshot = self.snapshot_from_app(app);
            registry.assert_all(&snapshot, context);
        }
    }
}

impl Driver for SimDriver {
    type Error = SimDriverError;
    type Instant = tokio::time::Instant;

    async fn poll_event(&mut self, app: &mut App) -> Result<Vec<AppAction>, Self::Error> {
        let actions = {
            let mut state = self.lock();
            let SharedState { pending_inputs, input, .. } = &mut *state;
            match pending_inputs.pop_front() {
                Some(SimInput::Event(event)) => Some(app.handle(event)),
                Some(SimInput::Submit(line)) => Some(app.submit(&line)),
                Some(SimInput::Key(key)) => Some(input.handle_key(key, app)),
                Some(SimInput::CycleTarget) => Some(app.cycle_target()),
                None => None,
            }
        };

        let Some(actions) = actions else {
            if let Some(tick) = self.tick {
                tokio::time::sleep(tick).await;
            }
            return Ok(vec![]);
        };
        Ok(actions)
    }

    async fn send_line(&mut self, line: String) -> Result<(), Self::Error> {
        let session = {
            let mut state = self.lock();
            if !state.connected {
                return Err(SimDriverError("not connected".into()));
            }
            state.outgoing_lines.push(line.clone());
            state.session
        };
        if let (Some(hub), Some(session)) = (&self.hub, session) {
            hub.lock().send(session, &line);
        }
        Ok(())
    }

    async fn recv_line(&mut self) -> Option<Inbound> {
        let (injected, session) = {
            let mut state = self.lock();
            (state.incoming.pop_front(), state.session)
        };
        if injected.is_some() {
            return injected;
        }

        let hub = self.hub.as_ref()?;
        hub.lock().take_line(session?).map(Inbound::Line)
    }

    async fn connect(&mut self, _addr: &str) -> Result<(), Self::Error> {
        {
            let mut state = self.lock();
            state.connect_attempts += 1;
            if state.refuse_connections {
                return Err(SimDriverError("connection refused".into()));
            }
            state.connected = true;
        }

        if let Some(hub) = &self.hub {
            let session = hub.lock().connect(self.addr.clone());
            self.lock().session = Some(session);
        }
        Ok(())
    }

    fn now(&self) -> Self::Instant {
        tokio::time::Instant::now()
    }

    fn render(&mut self, app: &App) -> Result<(), Self::Error> {
        self.lock().renders += 1;
        self.check_invariants(app, "after render");
        Ok(())
    }

    fn stop(&mut self) {
        let session = {
            let mut state = self.lock();
            state.connected = false;
            state.session.take()
        };
        if let (Some(hub), Some(session)) = (&self.hub, session) {
            hub.lock().disconnect(session);
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::create_shared_hub;

    #[test]
    fn inject_line_queues_line() {
        let driver = SimDriver::new();
        driver.inject_line("hello");

        assert!(driver.has_pending());
    }

    #[tokio::test]
    async fn poll_event_applies_submit() {
        let mut driver = SimDriver::new();
        let mut app = App::new("localhost:8888".to_string());
        driver.inject_submit("/who");

        let actions = driver.poll_event(&mut app).await.unwrap();
        assert_eq!(actions, vec![AppAction::RefreshPresence, AppAction::Render]);
    }

    #[tokio::test]
    async fn typed_keys_reach_the_app() {
        let mut driver = SimDriver::new();
        let mut app = App::new("localhost:8888".to_string());
        driver.inject_typed("/who");

        let mut last = vec![];
        while driver.has_pending() {
            last = driver.poll_event(&mut app).await.unwrap();
        }

        assert_eq!(last, vec![AppAction::RefreshPresence, AppAction::Render]);
        assert!(driver.input_buffer().is_empty());
    }

    #[tokio::test]
    async fn send_requires_connection() {
        let mut driver = SimDriver::new();
        assert!(driver.send_line("hi".into()).await.is_err());

        driver.connect("server:8888").await.unwrap();
        driver.send_line("hi".into()).await.unwrap();
        assert_eq!(driver.take_outgoing(), vec!["hi".to_owned()]);
    }

    #[tokio::test]
    async fn hub_delivers_greeting() {
        let hub = create_shared_hub();
        let mut driver = SimDriver::with_hub(hub.clone(), "10.0.0.7:4000");
        driver.connect("server:8888").await.unwrap();

        assert_eq!(
            driver.recv_line().await,
            Some(Inbound::Line("[10.0.0.7:4000]User1:已上线".into()))
        );
        assert_eq!(driver.recv_line().await, Some(Inbound::Line("您已分配用户名:User1".into())));
        assert_eq!(driver.recv_line().await, None);

        driver.drop_connection();
        assert_eq!(driver.recv_line().await, Some(Inbound::Closed));
        assert_eq!(hub.lock().server().session_count(), 0);
    }

    #[tokio::test]
    async fn refused_connection_is_an_error() {
        let mut driver = SimDriver::new();
        driver.refuse_connections(true);

        assert!(driver.connect("server:8888").await.is_err());
        assert_eq!(driver.connect_attempts(), 1);
        assert!(driver.send_line("who".into()).await.is_err());
        assert!(driver.take_outgoing().is_empty());
    }
}
