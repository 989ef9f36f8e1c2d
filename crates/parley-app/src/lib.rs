//! Application layer for Parley
//!
//! Pure state machines and generic runtime for the chat frontend, enabling
//! deterministic simulation testing with the same code that runs in
//! production.
//!
//! # Components
//!
//! - [`App`]: View state machine (transcript, roster, mode, commands)
//! - [`Bridge`]: Protocol bridge (translates App actions to Client events)
//! - [`Driver`]: Trait for platform-specific I/O abstraction
//! - [`Runtime`]: Generic orchestration loop using Driver

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod action;
mod app;
mod bridge;
pub mod commands;
mod driver;
mod event;
mod input;
mod runtime;
mod state;

pub use action::AppAction;
pub use app::App;
pub use bridge::Bridge;
pub use driver::{Driver, Inbound};
pub use event::AppEvent;
pub use input::{InputState, KeyInput};
pub use parley_client::{ChatMessage, ChatMode, ConversationMode, Origin};
pub use runtime::Runtime;
pub use state::{ConnectionState, TRANSCRIPT_CAP, Transcript};
