//! Fuzz target for the client session state machine
//!
//! Feeds one client an arbitrary mix of server lines, user intents, time and
//! connection churn.
//!
//! # Invariants
//!
//! - Standard harness invariants hold after every step
//! - Nothing is sent while disconnected
//! - NEVER panic, whatever the server says

#![no_main]

use std::time::Duration;

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use parley_client::{Client, ClientAction, ClientConfig, ClientEvent, Environment};
use parley_core::env::test_utils::MockEnv;
use parley_harness::{ClientSnapshot, InvariantRegistry, SystemSnapshot};

#[derive(Debug, Arbitrary)]
enum Step {
    Line(String),
    Advance(u16),
    Send(String),
    Rename(String),
    Select(String),
    Refresh,
    Public,
    Private,
    Close,
    Open,
}

fuzz_target!(|steps: Vec<Step>| {
    let env = MockEnv::new();
    let mut client = Client::new(env.clone(), ClientConfig::default());
    let registry = InvariantRegistry::standard();
    let mut connected = false;

    for step in steps.into_iter().take(256) {
        let events = match step {
            Step::Line(line) => vec![ClientEvent::LineReceived(line)],
            Step::Advance(ms) => {
                env.advance(Duration::from_millis(u64::from(ms)));
                vec![ClientEvent::Tick { now: env.now() }]
            },
            Step::Send(text) => vec![ClientEvent::SendText { text }],
            Step::Rename(name) => vec![ClientEvent::Rename { name }],
            Step::Select(name) => vec![ClientEvent::SelectTarget { name }],
            Step::Refresh => vec![ClientEvent::RefreshPresence],
            Step::Public => vec![ClientEvent::SwitchPublic],
            Step::Private => vec![ClientEvent::SwitchPrivate],
            Step::Close => {
                connected = false;
                vec![ClientEvent::Closed]
            },
            Step::Open => {
                connected = true;
                vec![ClientEvent::Connecting, ClientEvent::Opened]
            },
        };

        for event in events {
            let Ok(actions) = client.handle(event) else {
                continue;
            };
            if !connected {
                assert!(!actions.iter().any(|a| matches!(a, ClientAction::Send(_))));
            }
        }

        let snapshot = SystemSnapshot::single(ClientSnapshot::from_client(0, &client));
        registry.assert_all(&snapshot, "client_lines_fuzzer");
    }
});
