//! Ordered view of online peers.

use std::collections::BTreeSet;

use icu_collator::{Collator, CollatorOptions};
use icu_locid::locale;

/// Finalized, ordered list of online peer names.
///
/// The local identity (when known) is always first; remaining names follow in
/// zh collation order, so case does not split the list. A roster is a
/// snapshot: it stays valid until the next presence collection finalizes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Roster {
    names: Vec<String>,
}

impl Roster {
    /// Empty roster (disconnected or never collected).
    pub fn empty() -> Self {
        Self::default()
    }

    /// Roster holding only the local identity.
    pub fn only(self_name: &str) -> Self {
        Self { names: vec![self_name.to_owned()] }
    }

    /// Build a roster from collected names.
    ///
    /// Inserts `self_name` if it is missing, then orders self first and the
    /// rest by locale-aware collation. Names the collator ranks equal keep
    /// Unicode scalar order.
    pub fn from_collected(mut collected: BTreeSet<String>, self_name: Option<&str>) -> Self {
        let mut names = Vec::with_capacity(collected.len() + 1);
        if let Some(me) = self_name.filter(|name| !name.is_empty()) {
            collected.remove(me);
            names.push(me.to_owned());
        }

        let mut others: Vec<String> = collected.into_iter().collect();
        match Collator::try_new(&locale!("zh").into(), CollatorOptions::new()) {
            Ok(collator) => others.sort_by(|a, b| collator.compare(a, b)),
            Err(e) => tracing::warn!(error = %e, "collator unavailable, using code point order"),
        }
        names.extend(others);
        Self { names }
    }

    /// Whether `name` is online.
    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    /// Names in display order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Number of online peers.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether no peer is known to be online.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
