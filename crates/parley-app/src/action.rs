//! Application side-effects and intents.
//!
//! This module defines the [`AppAction`] enum, which represents instructions
//! produced by the [`crate::App`] state machine for the runtime to execute.

/// Actions produced by the App state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppAction {
    /// Render the UI.
    Render,

    /// Quit the application.
    Quit,

    /// Connect to server.
    Connect {
        /// Server address (host:port).
        server_addr: String,
    },

    /// Send chat text in the current mode.
    SendText {
        /// Text as typed.
        text: String,
    },

    /// Ask the server for a new name.
    Rename {
        /// Requested name.
        name: String,
    },

    /// Re-fetch the online list.
    RefreshPresence,

    /// Pick a private chat target.
    SelectTarget {
        /// Peer name.
        name: String,
    },

    /// Switch to public chat.
    SwitchPublic,

    /// Switch to private chat.
    SwitchPrivate,
}
