//! Scripted model of the chat server.
//!
//! [`ScriptedServer`] reproduces the observable behavior of the deployed line
//! server: name assignment on connect, online/offline broadcasts, `who`
//! listings, renames and private messages, each with the exact wire text the
//! client classifies. It is a pure state machine; callers route the returned
//! [`Outgoing`] lines themselves.
//!
//! [`SharedHub`] wraps it with one mailbox per session so several simulated
//! clients can talk through the same server without any sockets.

#![allow(clippy::disallowed_types, reason = "Synchronous locking operations only")]

use std::{
    collections::{BTreeMap, VecDeque},
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use parley_core::wire::{
    DIRECT_MESSAGE_MARKER, NAME_ASSIGNED_PREFIX, NAME_UPDATED_PREFIX, OFFLINE_MARKER,
    ONLINE_MARKER, PEER_RENAMED_MARKER, WHO_ENTRY_MARKER,
};

/// Server-side connection identifier.
pub type SessionId = u64;

/// Reply for the rename command with a blank name.
pub const EMPTY_NAME_REPLY: &str = "用户名不能为空";

/// Reply for the rename command with a name that is taken.
pub const NAME_TAKEN_REPLY: &str = "当前用户名已被使用";

/// Reply for a malformed private message.
pub const BAD_FORMAT_REPLY: &str = "消息格式不正确，请使用\"to|张三|消息内容\"";

/// Reply for a private message to an unknown user.
pub const UNKNOWN_USER_REPLY: &str = "该用户名不存在";

/// Reply for a private message without content.
pub const EMPTY_CONTENT_REPLY: &str = "无消息内容，请重发";

/// One line the server writes to one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outgoing {
    /// Recipient.
    pub session: SessionId,
    /// Line without terminator.
    pub line: String,
}

#[derive(Debug, Clone)]
struct Session {
    addr: String,
    name: String,
}

/// Pure model of the chat server.
#[derive(Debug, Default)]
pub struct ScriptedServer {
    sessions: BTreeMap<SessionId, Session>,
    next_session: SessionId,
    next_name: u64,
}

impl ScriptedServer {
    /// Create a server with nobody online.
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept a connection from `addr`.
    ///
    /// The new user is announced to everyone (itself included) before it is
    /// told its name, matching the live server's ordering.
    pub fn connect(&mut self, addr: impl Into<String>) -> (SessionId, Vec<Outgoing>) {
        self.next_session += 1;
        let id = self.next_session;
        let name = self.unique_name("User");
        self.sessions.insert(id, Session { addr: addr.into(), name: name.clone() });
        tracing::debug!(session = id, %name, "user online");

        let mut out = self.broadcast(id, ONLINE_MARKER);
        out.push(Outgoing { session: id, line: format!("{NAME_ASSIGNED_PREFIX}{name}") });
        (id, out)
    }

    /// Drop a connection and tell the remaining users.
    pub fn disconnect(&mut self, id: SessionId) -> Vec<Outgoing> {
        let Some(session) = self.sessions.remove(&id) else {
            return vec![];
        };
        tracing::debug!(session = id, name = %session.name, "user offline");

        let line = format!("[{}]{}:{OFFLINE_MARKER}", session.addr, session.name);
        self.sessions.keys().map(|&to| Outgoing { session: to, line: line.clone() }).collect()
    }

    /// Handle one line received from `id`.
    pub fn receive(&mut self, id: SessionId, line: &str) -> Vec<Outgoing> {
        let line = line.trim_end_matches(['\r', '\n']);
        if !self.sessions.contains_key(&id) {
            return vec![];
        }

        if line == "who" {
            return self
                .sessions
                .values()
                .map(|s| Outgoing {
                    session: id,
                    line: format!("[{}]{}:{WHO_ENTRY_MARKER}...", s.addr, s.name),
                })
                .collect();
        }

        if line.len() > 7
            && let Some(requested) = line.strip_prefix("rename|")
        {
            return self.rename(id, requested.trim());
        }

        if line.len() > 4
            && let Some(rest) = line.strip_prefix("to|")
        {
            return self.private(id, rest);
        }

        self.broadcast(id, line)
    }

    /// Names of everyone online, in session order.
    pub fn online_names(&self) -> Vec<String> {
        self.sessions.values().map(|s| s.name.clone()).collect()
    }

    /// Current name of a session.
    pub fn name_of(&self, id: SessionId) -> Option<&str> {
        self.sessions.get(&id).map(|s| s.name.as_str())
    }

    /// Number of connected sessions.
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    fn rename(&mut self, id: SessionId, requested: &str) -> Vec<Outgoing> {
        if requested.is_empty() {
            return vec![reply(id, EMPTY_NAME_REPLY)];
        }
        if self.name_taken(requested) {
            return vec![reply(id, NAME_TAKEN_REPLY)];
        }

        if let Some(session) = self.sessions.get_mut(&id) {
            requested.clone_into(&mut session.name);
        }

        let mut out = vec![reply(id, format!("{NAME_UPDATED_PREFIX}{requested}"))];
        out.extend(self.broadcast(id, &format!("{PEER_RENAMED_MARKER}{requested}")));
        out
    }

    fn private(&self, id: SessionId, rest: &str) -> Vec<Outgoing> {
        let Some((target, content)) = rest.split_once('|') else {
            return vec![reply(id, BAD_FORMAT_REPLY)];
        };
        let target = target.trim();
        if target.is_empty() {
            return vec![reply(id, BAD_FORMAT_REPLY)];
        }

        let Some((&to, _)) = self.sessions.iter().find(|(_, s)| s.name == target) else {
            return vec![reply(id, UNKNOWN_USER_REPLY)];
        };
        if content.trim().is_empty() {
            return vec![reply(id, EMPTY_CONTENT_REPLY)];
        }

        let from = self.name_of(id).unwrap_or_default();
        vec![reply(to, format!("{from}{DIRECT_MESSAGE_MARKER}{content}"))]
    }

    /// `[addr]name:text` to every session, the sender included.
    fn broadcast(&self, from: SessionId, text: &str) -> Vec<Outgoing> {
        let Some(sender) = self.sessions.get(&from) else {
            return vec![];
        };
        let line = format!("[{}]{}:{text}", sender.addr, sender.name);
        self.sessions.keys().map(|&to| Outgoing { session: to, line: line.clone() }).collect()
    }

    fn name_taken(&self, name: &str) -> bool {
        self.sessions.values().any(|s| s.name == name)
    }

    fn unique_name(&mut self, prefix: &str) -> String {
        loop {
            self.next_name += 1;
            let name = format!("{prefix}{}", self.next_name);
            if !self.name_taken(&name) {
                return name;
            }
        }
    }
}

fn reply(session: SessionId, line: impl Into<String>) -> Outgoing {
    Outgoing { session, line: line.into() }
}

/// Scripted server plus per-session mailboxes.
#[derive(Debug, Default)]
pub struct Hub {
    server: ScriptedServer,
    mailboxes: BTreeMap<SessionId, VecDeque<String>>,
}

impl Hub {
    /// Connect a new session and queue its greeting lines.
    pub fn connect(&mut self, addr: impl Into<String>) -> SessionId {
        let (id, out) = self.server.connect(addr);
        self.mailboxes.insert(id, VecDeque::new());
        self.deliver(out);
        id
    }

    /// Disconnect a session, discarding its undelivered lines.
    pub fn disconnect(&mut self, id: SessionId) {
        self.mailboxes.remove(&id);
        let out = self.server.disconnect(id);
        self.deliver(out);
    }

    /// Feed one client line to the server.
    pub fn send(&mut self, id: SessionId, line: &str) {
        let out = self.server.receive(id, line);
        self.deliver(out);
    }

    /// Next line waiting for `id`.
    pub fn take_line(&mut self, id: SessionId) -> Option<String> {
        self.mailboxes.get_mut(&id).and_then(VecDeque::pop_front)
    }

    /// Whether `id` has lines waiting.
    pub fn has_lines(&self, id: SessionId) -> bool {
        self.mailboxes.get(&id).is_some_and(|m| !m.is_empty())
    }

    /// Underlying server for assertions.
    pub fn server(&self) -> &ScriptedServer {
        &self.server
    }

    fn deliver(&mut self, out: Vec<Outgoing>) {
        for Outgoing { session, line } in out {
            if let Some(mailbox) = self.mailboxes.get_mut(&session) {
                mailbox.push_back(line);
            }
        }
    }
}

/// Hub shared between simulated drivers.
#[derive(Debug, Clone, Default)]
pub struct SharedHub(Arc<Mutex<Hub>>);

impl SharedHub {
    /// Lock the hub. A poisoned lock is recovered; the hub has no invariant a
    /// panicking test could break halfway.
    pub fn lock(&self) -> MutexGuard<'_, Hub> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Create an empty shared hub.
pub fn create_shared_hub() -> SharedHub {
    SharedHub::default()
}
