//! Client errors.
//!
//! Every variant is a rejected user intent. The session stays valid after any
//! of them; callers surface the message as an advisory notice.

use thiserror::Error;

/// Errors returned by [`crate::Client::handle`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// Private target cannot be selected.
    #[error("{reason} ({name})")]
    InvalidTarget {
        /// Requested target.
        name: String,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// Private send without a target.
    #[error("select a private chat target first")]
    NoTargetSelected,

    /// Private target left the roster. A presence refresh has been scheduled.
    #[error("{name} is no longer online, refreshing the user list")]
    TargetOffline {
        /// Target that went missing.
        name: String,
    },

    /// Rename to the name we already have.
    #[error("name is already {name}")]
    NameUnchanged {
        /// Current name.
        name: String,
    },

    /// Message or name was blank.
    #[error("nothing to send")]
    EmptyInput,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_peer() {
        let err = ClientError::InvalidTarget { name: "bob".into(), reason: "user is not online" };
        assert_eq!(err.to_string(), "user is not online (bob)");

        let err = ClientError::TargetOffline { name: "bob".into() };
        assert!(err.to_string().starts_with("bob "));
    }
}
