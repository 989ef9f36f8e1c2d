//! Wire vocabulary of the chat server.
//!
//! The server speaks plain UTF-8 lines. Inbound markers are matched by prefix
//! or substring and must stay byte-identical to what the deployed server
//! sends, which is why they are kept in their original language.

use std::fmt;

/// Prefix of the line granting this connection its initial name.
pub const NAME_ASSIGNED_PREFIX: &str = "您已分配用户名:";

/// Prefix of the line confirming our own rename.
pub const NAME_UPDATED_PREFIX: &str = "您已更新用户名:";

/// Substring of the broadcast sent when another peer renames.
pub const PEER_RENAMED_MARKER: &str = "改名为:";

/// Substring of the broadcast sent when a peer comes online.
pub const ONLINE_MARKER: &str = "已上线";

/// Substring of the broadcast sent when a peer goes offline.
pub const OFFLINE_MARKER: &str = "已下线";

/// Marker carried by each line of a `who` listing.
pub const WHO_ENTRY_MARKER: &str = "在线";

/// Alternative spelling of the listing marker accepted by some servers.
pub const WHO_ENTRY_MARKER_ASCII: &str = "online";

/// Substring separating sender and content of a private message.
pub const DIRECT_MESSAGE_MARKER: &str = "对您说:";

/// Outbound command understood by the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Request the list of online peers.
    Who,
    /// Request an identity change.
    Rename {
        /// Requested name.
        name: String,
    },
    /// Broadcast chat to every peer.
    Public {
        /// Message text, sent verbatim.
        text: String,
    },
    /// Private chat to one peer.
    Private {
        /// Recipient name.
        target: String,
        /// Message text.
        text: String,
    },
}

impl Command {
    /// Encode as a single wire line (without terminator).
    pub fn encode(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Who => f.write_str("who"),
            Self::Rename { name } => write!(f, "rename|{name}"),
            Self::Public { text } => f.write_str(text),
            Self::Private { target, text } => write!(f, "to|{target}|{text}"),
        }
    }
}

/// Normalize a raw transport frame into a protocol line.
///
/// Strips every carriage return and newline, then trims surrounding
/// whitespace. Returns `None` for lines that end up empty; those are dropped
/// before classification.
pub fn normalize_line(raw: &str) -> Option<String> {
    let stripped: String = raw.chars().filter(|c| !matches!(c, '\r' | '\n')).collect();
    let trimmed = stripped.trim();
    if trimmed.is_empty() { None } else { Some(trimmed.to_owned()) }
}
