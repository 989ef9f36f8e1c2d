//! Parley core
//!
//! Sans-IO building blocks for the Parley line protocol: a client endpoint for
//! a plain-text chat server that mixes notifications, presence listings and
//! chat content on one connection with no framing or schema.
//!
//! # Components
//!
//! - [`classify`]: Total, priority-ordered classifier from wire line to
//!   [`ClassifiedMessage`]
//! - [`PresenceCollector`]: Converges a `who` listing to a [`Roster`] by idle
//!   timeout, since the server never marks the end of the list
//! - [`EchoTracker`]: Matches locally sent public messages against the server
//!   rebroadcast
//! - [`Link`]: Reconnect scheduling for the transport lifecycle
//! - [`Environment`]: Time abstraction so every timer can run on virtual time
//!
//! None of these types perform I/O. Time enters as a parameter and outputs are
//! returned as values for the caller to execute.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod classify;
pub mod config;
pub mod echo;
pub mod env;
pub mod link;
pub mod presence;
pub mod roster;
pub mod wire;

pub use classify::{ClassifiedMessage, Rule, classify};
pub use config::{ClientConfig, EchoConfig, PresenceConfig, RefreshDelays};
pub use echo::{EchoTracker, PendingEcho};
pub use env::{Environment, Timestamp};
pub use link::{Link, LinkAction, LinkState};
pub use presence::{PresenceAction, PresenceCollector, RefreshTrigger};
pub use roster::Roster;
pub use wire::{Command, normalize_line};
