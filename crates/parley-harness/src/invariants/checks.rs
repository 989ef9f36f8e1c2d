//! Standard invariant checks.
//!
//! These invariants capture behavioral properties that must always hold.
//! They verify WHAT must be true, not specific test scenarios.

use std::collections::{BTreeSet, HashSet};

use super::{Invariant, InvariantResult, SystemSnapshot, Violation};

/// Our own name leads the roster.
///
/// If the identity is known and the roster is non-empty, the first entry is
/// the identity.
pub struct SelfFirstInRoster;

impl Invariant for SelfFirstInRoster {
    fn name(&self) -> &'static str {
        "self_first_in_roster"
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        for client in &state.clients {
            let (Some(me), Some(first)) = (&client.identity, client.roster.first()) else {
                continue;
            };
            if me != first {
                return Err(Violation {
                    invariant: self.name(),
                    message: format!(
                        "client {}: identity {me} but roster starts with {first} ({:?})",
                        client.id, client.roster
                    ),
                });
            }
        }
        Ok(())
    }
}

/// Every roster name appears once.
pub struct RosterUnique;

impl Invariant for RosterUnique {
    fn name(&self) -> &'static str {
        "roster_unique"
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        for client in &state.clients {
            let mut seen = HashSet::new();
            if let Some(dup) = client.roster.iter().find(|name| !seen.insert(name.as_str())) {
                return Err(Violation {
                    invariant: self.name(),
                    message: format!("client {}: {dup} listed twice", client.id),
                });
            }
        }
        Ok(())
    }
}

/// A selected private target is online and is not ourselves.
///
/// Only checked against settled rosters; provisional rosters are patched
/// before the next collection lands.
pub struct TargetInRoster;

impl Invariant for TargetInRoster {
    fn name(&self) -> &'static str {
        "target_in_roster"
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        for client in &state.clients {
            let Some(target) = &client.target else {
                continue;
            };
            if client.identity.as_ref() == Some(target) {
                return Err(Violation {
                    invariant: self.name(),
                    message: format!("client {}: private target is ourselves ({target})", client.id),
                });
            }
            if client.roster_settled && !client.roster.contains(target) {
                return Err(Violation {
                    invariant: self.name(),
                    message: format!(
                        "client {}: target {target} not in settled roster {:?}",
                        client.id, client.roster
                    ),
                });
            }
        }
        Ok(())
    }
}

/// A presence collection never outlives its ceiling.
pub struct CollectorBounded;

impl Invariant for CollectorBounded {
    fn name(&self) -> &'static str {
        "collector_bounded"
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        for client in &state.clients {
            if let Some(age) = client.collecting_for
                && age >= client.collect_ceiling
            {
                return Err(Violation {
                    invariant: self.name(),
                    message: format!(
                        "client {}: collecting for {age:?}, ceiling {:?}",
                        client.id, client.collect_ceiling
                    ),
                });
            }
        }
        Ok(())
    }
}

/// The transcript never exceeds its capacity.
pub struct TranscriptBounded;

impl Invariant for TranscriptBounded {
    fn name(&self) -> &'static str {
        "transcript_bounded"
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        for client in &state.clients {
            if client.transcript_len > client.transcript_cap {
                return Err(Violation {
                    invariant: self.name(),
                    message: format!(
                        "client {}: {} lines, cap {}",
                        client.id, client.transcript_len, client.transcript_cap
                    ),
                });
            }
        }
        Ok(())
    }
}

/// Connected clients with settled rosters see the same people online.
///
/// Only holds once the system is quiescent: every broadcast delivered and
/// every triggered collection finished.
pub struct RostersAgree;

impl Invariant for RostersAgree {
    fn name(&self) -> &'static str {
        "rosters_agree"
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        let mut settled = state.clients.iter().filter(|c| c.connected && c.roster_settled);
        let Some(first) = settled.next() else {
            return Ok(());
        };
        let expected: BTreeSet<&String> = first.roster.iter().collect();

        for client in settled {
            let seen: BTreeSet<&String> = client.roster.iter().collect();
            if seen != expected {
                return Err(Violation {
                    invariant: self.name(),
                    message: format!(
                        "client {} sees {:?}, client {} sees {:?}",
                        first.id, expected, client.id, seen
                    ),
                });
            }
        }
        Ok(())
    }
}
