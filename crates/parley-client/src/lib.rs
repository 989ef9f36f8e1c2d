//! Client
//!
//! Action-based session state machine for the Parley line protocol. Holds the
//! local identity, conversation mode and online roster, and routes every
//! inbound line through the classifier, presence collector and echo tracker
//! from [`parley_core`].
//!
//! # Architecture
//!
//! The client is Sans-IO. It receives events ([`ClientEvent`]), processes them
//! through pure state machine logic, and returns actions ([`ClientAction`]) for
//! the caller to execute. Time comes from an [`Environment`] and from
//! [`ClientEvent::Tick`].
//!
//! # Components
//!
//! - [`Client`]: Session state machine
//! - [`ClientEvent`]: Events fed into the client
//! - [`ClientAction`]: Actions produced by the client
//! - [`ClientError`]: Advisory failures of user intents
//!
//! # Transport (optional)
//!
//! With the `transport` feature enabled, this crate also provides:
//! - [`transport::ConnectedClient`]: Line channels backed by a TCP connection
//! - [`transport::connect`]: Connect to a server

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod client;
mod error;
mod event;

#[cfg(feature = "transport")]
pub mod transport;

pub use client::{Client, ConversationMode};
pub use error::ClientError;
pub use event::{ChatMessage, ChatMode, ClientAction, ClientEvent, Origin};
pub use parley_core::{ClientConfig, Command, Environment, LinkState, Roster, Timestamp};
