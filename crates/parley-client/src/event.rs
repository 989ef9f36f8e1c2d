//! Client events and actions.

use std::fmt;

use parley_core::{Command, LinkState, Roster};

use crate::client::ConversationMode;

/// Events the caller feeds into the client.
///
/// The caller is responsible for:
/// - Reporting transport lifecycle (connecting, opened, closed)
/// - Forwarding each inbound line exactly once, in arrival order
/// - Driving time forward via ticks
/// - Forwarding user intents (send, rename, select target, ...)
///
/// Generic over `I` (Instant type) to support both production
/// (`std::time::Instant`) and simulation (virtual clock) environments.
#[derive(Debug, Clone)]
pub enum ClientEvent<I = std::time::Instant> {
    /// A connection attempt started.
    Connecting,

    /// Transport opened.
    Opened,

    /// Transport closed or the attempt failed.
    Closed,

    /// One line received from the server, without its terminator.
    LineReceived(String),

    /// Time tick for timer processing.
    ///
    /// The caller should tick often enough to resolve the shortest settle
    /// delay; 100 ms is plenty.
    Tick {
        /// Current time from the environment.
        now: I,
    },

    /// User wants to send chat text in the current mode.
    SendText {
        /// Text as typed.
        text: String,
    },

    /// User wants a new name.
    Rename {
        /// Requested name.
        name: String,
    },

    /// User asked for a fresh online list.
    RefreshPresence,

    /// User picked a private chat target.
    SelectTarget {
        /// Peer name.
        name: String,
    },

    /// User switched to public chat.
    SwitchPublic,

    /// User switched to private chat, keeping any selected target.
    SwitchPrivate,
}

/// Who produced a displayed message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// Sent by the local user.
    SelfAuthored,
    /// Sent by another peer.
    Peer,
    /// Server or client notice.
    System,
}

/// Channel a displayed message belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatMode {
    /// Visible to everyone.
    Public,
    /// Between us and one peer.
    Private,
}

/// A message for the rendering boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    /// Who produced it.
    pub origin: Origin,
    /// Which channel it belongs to.
    pub mode: ChatMode,
    /// Sender name for chat content. `None` for notices.
    pub sender: Option<String>,
    /// Display text.
    pub text: String,
}

impl ChatMessage {
    /// Client or server notice.
    pub fn system(text: impl Into<String>) -> Self {
        Self { origin: Origin::System, mode: ChatMode::Public, sender: None, text: text.into() }
    }

    /// Chat content from another peer.
    pub fn peer(mode: ChatMode, sender: impl Into<String>, text: impl Into<String>) -> Self {
        Self { origin: Origin::Peer, mode, sender: Some(sender.into()), text: text.into() }
    }

    /// Chat content from the local user.
    pub fn own(mode: ChatMode, sender: Option<String>, text: impl Into<String>) -> Self {
        Self { origin: Origin::SelfAuthored, mode, sender, text: text.into() }
    }
}

impl fmt::Display for ChatMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.sender {
            Some(sender) if !sender.is_empty() => write!(f, "{sender}: {}", self.text),
            _ => f.write_str(&self.text),
        }
    }
}

/// Actions the client produces for the caller to execute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientAction {
    /// Write a command to the server.
    Send(Command),

    /// Show a message.
    Deliver(ChatMessage),

    /// The online roster changed.
    RosterUpdated(Roster),

    /// The connection state changed.
    Status(LinkState),

    /// The server assigned or confirmed our name.
    IdentityChanged {
        /// New name.
        name: String,
    },

    /// The conversation mode or private target changed.
    ModeChanged(ConversationMode),

    /// Open a new connection now.
    ///
    /// The caller should connect and feed back `Connecting`, then `Opened` or
    /// `Closed`.
    Reconnect,
}
