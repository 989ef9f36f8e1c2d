//! Operations for model-based testing.
//!
//! Operations represent everything users and the network can do. They are
//! generated by proptest (or `arbitrary` in fuzzing) and applied to a
//! [`super::World`].

use arbitrary::Arbitrary;

/// Client identifier (0-indexed, taken modulo the world size).
pub type ClientId = u8;

/// Operations that can be applied to the world.
#[derive(Debug, Clone, Arbitrary)]
pub enum Operation {
    /// Open a connection if the client has none.
    Connect {
        /// Client connecting.
        client_id: ClientId,
    },

    /// Drop the client's connection.
    Disconnect {
        /// Client disconnecting.
        client_id: ClientId,
    },

    /// Send chat text in the current mode.
    SendText {
        /// Client sending.
        client_id: ClientId,
        /// Message content.
        text: SmallText,
    },

    /// Ask the server for a new name.
    Rename {
        /// Client renaming.
        client_id: ClientId,
        /// Picks one of a few shared names so collisions happen.
        name_seed: u8,
    },

    /// Re-fetch the online list.
    Refresh {
        /// Client refreshing.
        client_id: ClientId,
    },

    /// Pick another client as private target by its current server name.
    SelectTarget {
        /// Client selecting.
        client_id: ClientId,
        /// Client to select.
        peer_id: ClientId,
    },

    /// Switch to public chat.
    SwitchPublic {
        /// Client switching.
        client_id: ClientId,
    },

    /// Switch to private chat.
    SwitchPrivate {
        /// Client switching.
        client_id: ClientId,
    },

    /// Advance simulation time in tick-sized steps, delivering lines as it
    /// goes.
    AdvanceTime {
        /// Milliseconds to advance.
        millis: u16,
    },

    /// Deliver every queued server line without moving time.
    DeliverPending,
}

/// Small chat text for testing.
///
/// Expands to letters that cannot spell any protocol marker, so generated
/// chat never collides with server notices.
#[derive(Debug, Clone, Arbitrary)]
pub struct SmallText {
    /// Content seed.
    pub seed: u8,
    /// Length hint.
    pub len: u8,
}

impl SmallText {
    const ALPHABET: &'static [u8] = b"abcdfghjkmpqrstuvwxyz";

    /// Expand to message text (1 to 12 characters).
    pub fn to_text(&self) -> String {
        let len = usize::from(self.len % 12) + 1;
        (0..len)
            .map(|i| {
                let idx = (usize::from(self.seed) + i * 7) % Self::ALPHABET.len();
                char::from(Self::ALPHABET[idx])
            })
            .collect()
    }
}

/// Shared name pool for renames.
pub(crate) fn rename_target(seed: u8) -> String {
    format!("n{}", seed % 6)
}
