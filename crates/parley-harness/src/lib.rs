//! Deterministic simulation harness for Parley client testing.
//!
//! Virtual-time environments, a scripted model of the chat server, and a
//! simulation [`parley_app::Driver`] so the production runtime can be driven
//! step by step. [`SimServer`] hosts the scripted server on turmoil's
//! simulated TCP for end-to-end tests of the line transport.
//!
//! # Model-Based Testing
//!
//! The `model` module runs several real [`parley_client::Client`]s against one
//! [`ScriptedServer`] under generated [`Operation`] sequences.
//!
//! # Invariant Testing
//!
//! The `invariants` module provides behavioral testing through invariant
//! checks. Invariants verify WHAT must be true across all execution paths, not
//! specific scenarios. Use [`InvariantRegistry::standard()`] for the
//! single-client invariants.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod invariants;
pub mod model;
pub mod scripted_server;
pub mod sim_driver;
pub mod sim_env;
pub mod sim_server;

pub use invariants::{
    ClientSnapshot, CollectorBounded, Invariant, InvariantRegistry, InvariantResult,
    RosterUnique, RostersAgree, SelfFirstInRoster, SystemSnapshot, TargetInRoster,
    TranscriptBounded, Violation,
};
pub use model::{ClientId, Operation, SmallText, World};
pub use scripted_server::{
    Hub, Outgoing, ScriptedServer, SessionId, SharedHub, create_shared_hub,
};
pub use sim_driver::{SimDriver, SimDriverError};
pub use sim_env::SimEnv;
pub use sim_server::SimServer;
