//! Fuzz target for line normalization and classification
//!
//! # Strategy
//!
//! - Raw bytes: arbitrary transport frames, decoded lossily like the socket
//! - Marker splices: protocol markers stitched between arbitrary fragments so
//!   overlapping rules are exercised far more often than random text would
//!
//! # Invariants
//!
//! - Normalization is idempotent and never yields blank lines
//! - Classification agrees with the first matching rule
//! - `who` entries appear only while collecting
//! - Extracted names are trimmed and hold no `:`
//! - NEVER panic on any input

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use parley_core::{ClassifiedMessage, Rule, classify, classify::matching_rule, normalize_line};

const MARKERS: &[&str] = &[
    "您已分配用户名:",
    "您已更新用户名:",
    "改名为:",
    "已上线",
    "已下线",
    "在线",
    "online",
    "对您说:",
    "[",
    "]",
    ":",
    "\r\n",
];

#[derive(Debug, Arbitrary)]
enum Input {
    RawBytes(Vec<u8>),
    Spliced(Vec<(u8, String)>),
}

fuzz_target!(|input: Input| {
    let raw = match input {
        Input::RawBytes(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        Input::Spliced(parts) => parts
            .into_iter()
            .take(16)
            .map(|(marker, text)| format!("{}{text}", MARKERS[usize::from(marker) % MARKERS.len()]))
            .collect(),
    };

    let Some(line) = normalize_line(&raw) else {
        assert!(raw.chars().all(|c| c.is_whitespace()));
        return;
    };
    assert!(!line.contains(['\r', '\n']));
    assert_eq!(normalize_line(&line).as_deref(), Some(line.as_str()));

    for collecting in [false, true] {
        let message = classify(&line, collecting);
        check(&line, collecting, &message);
    }
});

fn check(line: &str, collecting: bool, message: &ClassifiedMessage) {
    match matching_rule(line, collecting) {
        Some(rule) => assert_eq!(rule.apply(line, collecting).as_ref(), Some(message)),
        None => assert_eq!(message, &ClassifiedMessage::SystemNotice { text: line.to_owned() }),
    }

    match message {
        ClassifiedMessage::WhoEntry { name } => {
            assert!(collecting);
            assert!(!name.is_empty());
            assert_eq!(name.trim(), name);
        },
        ClassifiedMessage::NameAssigned { name } | ClassifiedMessage::NameUpdated { name } => {
            assert!(!name.contains(':'));
            assert_eq!(name.trim(), name);
        },
        ClassifiedMessage::PresenceChange { text } | ClassifiedMessage::SystemNotice { text } => {
            assert_eq!(text, line);
        },
        ClassifiedMessage::PeerRenamed
        | ClassifiedMessage::DirectMessage { .. }
        | ClassifiedMessage::PublicMessage { .. } => {},
    }

    if !collecting {
        assert_ne!(matching_rule(line, collecting), Some(Rule::WhoEntry));
    }
}
