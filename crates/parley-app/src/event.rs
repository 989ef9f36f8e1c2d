//! Application input events.
//!
//! This module defines [`AppEvent`], the inputs that drive the [`crate::App`]
//! state machine.
//!
//! Events originate from two distinct sources:
//! - The frontend (resize) and system ticks.
//! - Protocol notifications translated from the underlying client.

use parley_client::{ChatMessage, ConversationMode, Roster};

/// Events processed by the App state machine.
#[derive(Debug, Clone)]
pub enum AppEvent {
    /// Periodic tick.
    Tick,

    /// Terminal resize (columns, rows).
    Resize(u16, u16),

    /// Connection in progress.
    Connecting,

    /// Connected to server.
    Connected,

    /// Connection lost.
    Disconnected,

    /// Line for the transcript.
    Message(ChatMessage),

    /// Online roster replaced.
    RosterUpdated(Roster),

    /// Server assigned or confirmed our name.
    IdentityChanged {
        /// New name.
        name: String,
    },

    /// Conversation mode or private target changed.
    ModeChanged(ConversationMode),

    /// Frontend or transport error.
    Error {
        /// Error description.
        message: String,
    },
}
