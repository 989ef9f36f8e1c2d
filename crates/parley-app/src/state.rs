//! Observable application state types.
//!
//! These structures serve as the "View Model" for the application. They hold
//! what the frontend needs to draw without exposing the session machinery of
//! the underlying client.

use std::collections::VecDeque;

use parley_client::ChatMessage;

/// Most transcript lines kept; older lines are dropped first.
pub const TRANSCRIPT_CAP: usize = 500;

/// Connection state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Not connected to server.
    Disconnected,
    /// Connection in progress.
    Connecting,
    /// Connected.
    Connected,
}

/// Bounded, ordered chat transcript.
#[derive(Debug, Clone)]
pub struct Transcript {
    lines: VecDeque<ChatMessage>,
    cap: usize,
}

impl Default for Transcript {
    fn default() -> Self {
        Self::with_cap(TRANSCRIPT_CAP)
    }
}

impl Transcript {
    /// Empty transcript holding at most `cap` lines.
    pub fn with_cap(cap: usize) -> Self {
        Self { lines: VecDeque::with_capacity(cap.min(TRANSCRIPT_CAP)), cap }
    }

    /// Append a line, dropping the oldest past the cap.
    pub fn push(&mut self, message: ChatMessage) {
        if self.cap == 0 {
            return;
        }
        while self.lines.len() >= self.cap {
            self.lines.pop_front();
        }
        self.lines.push_back(message);
    }

    /// Lines, oldest first.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &ChatMessage> + ExactSizeIterator {
        self.lines.iter()
    }

    /// Most recent line.
    pub fn last(&self) -> Option<&ChatMessage> {
        self.lines.back()
    }

    /// Number of lines held.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Whether no lines are held.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Maximum number of lines held.
    pub fn cap(&self) -> usize {
        self.cap
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn oldest_lines_drop_at_cap() {
        let mut transcript = Transcript::with_cap(3);
        for n in 0..5 {
            transcript.push(ChatMessage::system(format!("line {n}")));
        }

        let texts: Vec<_> = transcript.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, ["line 2", "line 3", "line 4"]);
    }

    #[test]
    fn default_cap() {
        let mut transcript = Transcript::default();
        for n in 0..(TRANSCRIPT_CAP + 10) {
            transcript.push(ChatMessage::system(n.to_string()));
        }

        assert_eq!(transcript.len(), TRANSCRIPT_CAP);
        assert_eq!(transcript.iter().next().map(|m| m.text.as_str()), Some("10"));
    }
}
