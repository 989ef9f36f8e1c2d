//! Presence collection state machine.
//!
//! The server answers `who` with one line per online peer and no terminator,
//! so the collector decides the listing is complete once the line goes quiet.
//!
//! # State Machine
//!
//! ```text
//!            request / scheduled refresh due
//! ┌──────┐ ────────────────────────────────> ┌────────────┐
//! │ Idle │                                   │ Collecting │──┐ WhoEntry:
//! └──────┘ <──────────────────────────────── └────────────┘<─┘ insert, re-arm
//!            idle wait or ceiling elapsed:                      entry wait
//!            emit Finalized(roster)
//! ```
//!
//! A request while `Collecting` restarts the collection from scratch. Entries
//! that arrive while `Idle` are stale and dropped.
//!
//! Timers are stored as the instant they were armed; [`PresenceCollector::poll`]
//! and [`PresenceCollector::expire`] compare them against the caller's clock.
//! Re-arming overwrites the stored instant, so a superseded timer can never
//! fire.

use std::{collections::BTreeSet, time::Duration};

use crate::{
    config::{PresenceConfig, RefreshDelays},
    env::Timestamp,
    roster::Roster,
    wire::Command,
};

/// Events that warrant re-fetching the online list.
///
/// This is the complete set; nothing else triggers a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RefreshTrigger {
    /// User asked for a refresh.
    Manual,
    /// Server assigned our identity.
    IdentityAssigned,
    /// Server confirmed our rename.
    IdentityUpdated,
    /// Another peer renamed.
    PeerRenamed,
    /// A peer went online or offline.
    PresenceChange,
    /// User switched to private mode, where target validity needs fresh data.
    PrivateMode,
    /// A private send found its target missing from the roster.
    TargetOffline,
}

/// Output of the collector for the caller to execute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PresenceAction {
    /// Send this command to the server.
    Send(Command),
    /// Collection finished with this roster.
    Finalized(Roster),
}

#[derive(Debug, Clone)]
enum Phase<I> {
    Idle,
    Collecting {
        /// When `who` was sent. The ceiling counts from here.
        requested_at: I,
        /// Latest request or entry. The idle wait counts from here.
        last_activity: I,
        /// Idle wait currently armed.
        wait: Duration,
        collected: BTreeSet<String>,
    },
}

#[derive(Debug, Clone, Copy)]
struct Scheduled<I> {
    trigger: RefreshTrigger,
    requested_at: I,
    delay: Duration,
}

/// Presence collector.
///
/// Sole owner of the collection timers. Pure state machine: no I/O, time is
/// passed in.
#[derive(Debug, Clone)]
pub struct PresenceCollector<I> {
    config: PresenceConfig,
    delays: RefreshDelays,
    phase: Phase<I>,
    scheduled: Option<Scheduled<I>>,
}

impl<I: Timestamp> PresenceCollector<I> {
    /// Create an idle collector.
    pub fn new(config: PresenceConfig, delays: RefreshDelays) -> Self {
        Self { config, delays, phase: Phase::Idle, scheduled: None }
    }

    /// Whether a collection is in progress.
    pub fn is_collecting(&self) -> bool {
        matches!(self.phase, Phase::Collecting { .. })
    }

    /// When the current collection was requested. `None` while idle.
    pub fn collecting_since(&self) -> Option<I> {
        match &self.phase {
            Phase::Idle => None,
            Phase::Collecting { requested_at, .. } => Some(*requested_at),
        }
    }

    /// Trigger of the refresh waiting out its settle delay, if any.
    pub fn scheduled(&self) -> Option<RefreshTrigger> {
        self.scheduled.map(|s| s.trigger)
    }

    /// Timing configuration.
    pub fn config(&self) -> &PresenceConfig {
        &self.config
    }

    /// Ask for a refresh.
    ///
    /// Triggers with no settle delay start collecting now; the rest are
    /// scheduled and started by [`poll`](Self::poll). A newer request replaces
    /// any scheduled one.
    pub fn request(
        &mut self,
        trigger: RefreshTrigger,
        now: I,
        self_name: Option<&str>,
    ) -> Vec<PresenceAction> {
        if self.delays.delay(trigger).is_zero() {
            self.scheduled = None;
            vec![self.begin(now, self_name)]
        } else {
            self.schedule(trigger, now);
            vec![]
        }
    }

    /// Defer a refresh to the next [`poll`](Self::poll) at or after its settle
    /// delay, replacing any scheduled one.
    pub fn schedule(&mut self, trigger: RefreshTrigger, now: I) {
        let delay = self.delays.delay(trigger);
        tracing::trace!(?trigger, ?delay, "presence refresh scheduled");
        self.scheduled = Some(Scheduled { trigger, requested_at: now, delay });
    }

    /// Start (or restart) a collection and return the `who` command.
    ///
    /// The collected set is seeded with our own name so we never vanish from
    /// our own view if the server omits us.
    pub fn begin(&mut self, now: I, self_name: Option<&str>) -> PresenceAction {
        if self.is_collecting() {
            tracing::debug!("presence collection restarted");
        }

        let mut collected = BTreeSet::new();
        if let Some(me) = self_name.filter(|name| !name.is_empty()) {
            collected.insert(me.to_owned());
        }

        self.phase = Phase::Collecting {
            requested_at: now,
            last_activity: now,
            wait: self.config.initial_wait,
            collected,
        };
        tracing::debug!("presence collection started");
        PresenceAction::Send(Command::Who)
    }

    /// Record one listing entry.
    ///
    /// Returns `false` (and changes nothing) if no collection is active.
    pub fn record(&mut self, name: String, now: I) -> bool {
        let entry_wait = self.config.entry_wait;
        match &mut self.phase {
            Phase::Idle => {
                tracing::debug!(%name, "stale who entry dropped");
                false
            },
            Phase::Collecting { last_activity, wait, collected, .. } => {
                tracing::trace!(%name, "who entry collected");
                collected.insert(name);
                *last_activity = now;
                *wait = entry_wait;
                true
            },
        }
    }

    /// Advance timers.
    ///
    /// Finalizes the collection once the idle wait or the ceiling has elapsed,
    /// then starts any scheduled refresh that is due.
    pub fn poll(&mut self, now: I, self_name: Option<&str>) -> Vec<PresenceAction> {
        let mut actions = Vec::new();

        if let Some(roster) = self.expire(now, self_name) {
            actions.push(PresenceAction::Finalized(roster));
        }

        if let Some(scheduled) = self.scheduled
            && now - scheduled.requested_at >= scheduled.delay
        {
            self.scheduled = None;
            actions.push(self.begin(now, self_name));
        }

        actions
    }

    /// Abandon any collection and scheduled refresh without emitting a roster.
    pub fn cancel(&mut self) {
        if self.is_collecting() {
            tracing::debug!("presence collection cancelled");
        }
        self.phase = Phase::Idle;
        self.scheduled = None;
    }

    /// Finalize the collection if its idle wait or ceiling has elapsed.
    ///
    /// Unlike [`poll`](Self::poll) this never starts a scheduled refresh. Call
    /// it before routing an incoming line so an entry that arrives past the
    /// deadline is not collected.
    pub fn expire(&mut self, now: I, self_name: Option<&str>) -> Option<Roster> {
        let Phase::Collecting { requested_at, last_activity, wait, .. } = &self.phase else {
            return None;
        };

        let quiet = now - *last_activity >= *wait;
        let ceiling = now - *requested_at >= self.config.ceiling;
        if !quiet && !ceiling {
            return None;
        }

        let Phase::Collecting { collected, .. } = std::mem::replace(&mut self.phase, Phase::Idle)
        else {
            return None;
        };

        let roster = Roster::from_collected(collected, self_name);
        tracing::debug!(peers = roster.len(), forced = !quiet, "presence collection finalized");
        Some(roster)
    }
}
