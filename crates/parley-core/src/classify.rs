//! Line classification.
//!
//! Maps one normalized wire line to exactly one [`ClassifiedMessage`]. The
//! server's phrasing overlaps (a `who` entry also looks like public chat), so
//! the rules are an explicit ordered list and the first match wins:
//!
//! | Priority | Rule                  | Shape                                   |
//! |----------|-----------------------|-----------------------------------------|
//! | 1        | [`Rule::NameAssigned`]  | starts with `您已分配用户名:`           |
//! | 2        | [`Rule::NameUpdated`]   | starts with `您已更新用户名:`           |
//! | 3        | [`Rule::PeerRenamed`]   | contains `改名为:`                      |
//! | 4        | [`Rule::PresenceChange`]| contains `已上线` or `已下线`           |
//! | 5        | [`Rule::WhoEntry`]      | collecting, contains `在线` or `online` |
//! | 6        | [`Rule::DirectMessage`] | contains `对您说:`                      |
//! | 7        | [`Rule::PublicMessage`] | starts with `[`, then `]`, then `:`     |
//!
//! Anything else is a [`ClassifiedMessage::SystemNotice`], so classification
//! never fails.

use crate::wire::{
    DIRECT_MESSAGE_MARKER, NAME_ASSIGNED_PREFIX, NAME_UPDATED_PREFIX, OFFLINE_MARKER,
    ONLINE_MARKER, PEER_RENAMED_MARKER, WHO_ENTRY_MARKER, WHO_ENTRY_MARKER_ASCII,
};

/// A wire line tagged with its meaning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassifiedMessage {
    /// Server granted this connection an identity.
    NameAssigned {
        /// Assigned name. Empty if the server sent none.
        name: String,
    },
    /// Server confirmed our rename.
    NameUpdated {
        /// New name.
        name: String,
    },
    /// Another peer renamed. Carries nothing usable; the roster is refetched.
    PeerRenamed,
    /// A peer went online or offline.
    PresenceChange {
        /// Original line, shown to the user.
        text: String,
    },
    /// One fragment of a `who` listing.
    WhoEntry {
        /// Online peer name.
        name: String,
    },
    /// Private message addressed to us.
    DirectMessage {
        /// Sender. Empty if the line could not be split.
        from: String,
        /// Message body, or the whole line if it could not be split.
        content: String,
    },
    /// Broadcast chat.
    PublicMessage {
        /// Sender name.
        from: String,
        /// Message body.
        content: String,
    },
    /// Anything else.
    SystemNotice {
        /// Original line.
        text: String,
    },
}

/// Classification rules, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rule {
    /// Identity assignment prefix.
    NameAssigned,
    /// Identity update prefix.
    NameUpdated,
    /// Rename broadcast substring.
    PeerRenamed,
    /// Online/offline broadcast substring.
    PresenceChange,
    /// `who` listing entry, only while a collection is active.
    WhoEntry,
    /// Private message substring.
    DirectMessage,
    /// Bracketed-origin public chat.
    PublicMessage,
}

impl Rule {
    /// All rules, highest priority first.
    pub const PRIORITY: [Rule; 7] = [
        Rule::NameAssigned,
        Rule::NameUpdated,
        Rule::PeerRenamed,
        Rule::PresenceChange,
        Rule::WhoEntry,
        Rule::DirectMessage,
        Rule::PublicMessage,
    ];

    /// Try this rule against a line. `None` means fall through to the next.
    pub fn apply(self, line: &str, collecting: bool) -> Option<ClassifiedMessage> {
        match self {
            Rule::NameAssigned => line
                .strip_prefix(NAME_ASSIGNED_PREFIX)
                .map(|rest| ClassifiedMessage::NameAssigned { name: leading_field(rest) }),
            Rule::NameUpdated => line
                .strip_prefix(NAME_UPDATED_PREFIX)
                .map(|rest| ClassifiedMessage::NameUpdated { name: leading_field(rest) }),
            Rule::PeerRenamed => {
                line.contains(PEER_RENAMED_MARKER).then_some(ClassifiedMessage::PeerRenamed)
            },
            Rule::PresenceChange => {
                let changed = line.contains(ONLINE_MARKER) || line.contains(OFFLINE_MARKER);
                changed.then(|| ClassifiedMessage::PresenceChange { text: line.to_owned() })
            },
            Rule::WhoEntry => who_entry(line, collecting),
            Rule::DirectMessage => direct_message(line),
            Rule::PublicMessage => public_message(line),
        }
    }
}

/// Classify a normalized line.
///
/// `collecting` tells whether a presence collection is in progress; `who`
/// entries are only recognized while it is.
pub fn classify(line: &str, collecting: bool) -> ClassifiedMessage {
    Rule::PRIORITY
        .iter()
        .find_map(|rule| rule.apply(line, collecting))
        .unwrap_or_else(|| ClassifiedMessage::SystemNotice { text: line.to_owned() })
}

/// The rule that claims a line. `None` means it falls back to a notice.
pub fn matching_rule(line: &str, collecting: bool) -> Option<Rule> {
    Rule::PRIORITY.into_iter().find(|rule| rule.apply(line, collecting).is_some())
}

/// Text up to the next `:`, trimmed.
fn leading_field(rest: &str) -> String {
    rest.split_once(':').map_or(rest, |(field, _)| field).trim().to_owned()
}

fn non_empty(name: &str) -> Option<String> {
    let name = name.trim();
    (!name.is_empty()).then(|| name.to_owned())
}

fn who_entry(line: &str, collecting: bool) -> Option<ClassifiedMessage> {
    if !collecting || !(line.contains(WHO_ENTRY_MARKER) || line.contains(WHO_ENTRY_MARKER_ASCII))
    {
        return None;
    }

    // Strictest shape first so a loose match never steals a substring.
    let patterns: [fn(&str) -> Option<String>; 3] = [bracketed_entry, bare_entry, loose_entry];
    patterns
        .iter()
        .find_map(|pattern| pattern(line))
        .map(|name| ClassifiedMessage::WhoEntry { name })
}

/// `[origin]name:在线`, anywhere in the line.
fn bracketed_entry(line: &str) -> Option<String> {
    line.match_indices('[').find_map(|(open, _)| {
        let after_open = &line[open + 1..];
        let close = after_open.find(']')?;
        let (name, rest) = after_open[close + 1..].split_once(':')?;
        if rest.starts_with(WHO_ENTRY_MARKER) { non_empty(name) } else { None }
    })
}

/// `name:在线` at line start, where the name holds no `:` or `[`.
fn bare_entry(line: &str) -> Option<String> {
    let end = line.find(|c: char| c == ':' || c == '[')?;
    let rest = line[end..].strip_prefix(':')?;
    if rest.starts_with(WHO_ENTRY_MARKER) { non_empty(&line[..end]) } else { None }
}

/// `name` then `:` or whitespace then `在线`, name free of `[`, `]` and `:`.
fn loose_entry(line: &str) -> Option<String> {
    line.match_indices(WHO_ENTRY_MARKER).find_map(|(at, _)| {
        let before = &line[..at];
        let head = match before.strip_suffix(':') {
            Some(head) => head,
            None if before.ends_with(char::is_whitespace) => before,
            None => return None,
        };
        let start = head.rfind(|c: char| matches!(c, '[' | ']' | ':')).map_or(0, |i| i + 1);
        non_empty(&head[start..])
    })
}

fn direct_message(line: &str) -> Option<ClassifiedMessage> {
    if !line.contains(DIRECT_MESSAGE_MARKER) {
        return None;
    }

    let split = line.match_indices(DIRECT_MESSAGE_MARKER).find_map(|(at, marker)| {
        let content = &line[at + marker.len()..];
        (at > 0 && !content.is_empty()).then(|| (&line[..at], content))
    });

    Some(match split {
        Some((from, content)) => {
            ClassifiedMessage::DirectMessage { from: from.to_owned(), content: content.to_owned() }
        },
        None => ClassifiedMessage::DirectMessage { from: String::new(), content: line.to_owned() },
    })
}

fn public_message(line: &str) -> Option<ClassifiedMessage> {
    if !line.starts_with('[') {
        return None;
    }

    let (_, rest) = line.split_once(']')?;
    let (from, content) = rest.split_once(':')?;
    Some(ClassifiedMessage::PublicMessage {
        from: from.trim().to_owned(),
        content: content.to_owned(),
    })
}
