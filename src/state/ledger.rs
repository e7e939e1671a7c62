//! Dedup ledger: the single source of truth for "has this URL been scheduled"
//!
//! A ledger maps absolute URLs to their [`EntryState`]. All access goes
//! through the methods below, each of which takes the lock exactly once, so
//! no caller can split a check and an update across two critical sections.

use crate::state::EntryState;
use crate::LedgerError;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Counts of ledger entries by state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LedgerSnapshot {
    pub pending: usize,
    pub done: usize,
    pub failed: usize,
}

impl LedgerSnapshot {
    /// Total number of URLs ever claimed
    pub fn total(&self) -> usize {
        self.pending + self.done + self.failed
    }
}

/// A concurrent URL → state map with atomic claim semantics
#[derive(Debug, Default)]
pub struct Ledger {
    entries: RwLock<HashMap<String, EntryState>>,
    /// Bumped on every successful claim or transition
    version: AtomicU64,
}

impl Ledger {
    /// Creates an empty ledger
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomically inserts `key` as Pending if it has never been seen
    ///
    /// Returns true only for the single caller that performed the insert;
    /// every other caller, concurrent or later, gets false regardless of the
    /// state the key is in.
    pub fn try_claim(&self, key: &str) -> bool {
        let mut entries = self.write();
        match entries.entry(key.to_string()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(EntryState::Pending);
                self.version.fetch_add(1, Ordering::SeqCst);
                true
            }
        }
    }

    /// Transitions a Pending entry to Done
    pub fn mark_done(&self, key: &str) -> Result<(), LedgerError> {
        self.transition(key, EntryState::Done)
    }

    /// Transitions a Pending entry to Failed
    pub fn mark_failed(&self, key: &str) -> Result<(), LedgerError> {
        self.transition(key, EntryState::Failed)
    }

    /// Returns the current state of `key`, if it was ever claimed
    pub fn state(&self, key: &str) -> Option<EntryState> {
        self.read().get(key).copied()
    }

    /// Returns true if `key` has reached Done
    pub fn is_done(&self, key: &str) -> bool {
        self.state(key) == Some(EntryState::Done)
    }

    /// Counts entries by state
    pub fn snapshot(&self) -> LedgerSnapshot {
        self.read()
            .values()
            .fold(LedgerSnapshot::default(), |mut acc, state| {
                match state {
                    EntryState::Pending => acc.pending += 1,
                    EntryState::Done => acc.done += 1,
                    EntryState::Failed => acc.failed += 1,
                }
                acc
            })
    }

    /// Monotonic change counter
    ///
    /// Two equal readings mean no claim or transition happened in between,
    /// which lets a reader check several values for mutual consistency.
    pub fn version(&self) -> u64 {
        self.version.load(Ordering::SeqCst)
    }

    /// Number of URLs ever claimed
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Returns true if nothing has been claimed yet
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    fn transition(&self, key: &str, to: EntryState) -> Result<(), LedgerError> {
        let mut entries = self.write();
        let state = entries
            .get_mut(key)
            .ok_or_else(|| LedgerError::Unknown(key.to_string()))?;

        if !state.can_transition_to(to) {
            return Err(LedgerError::InvalidTransition {
                key: key.to_string(),
                from: *state,
                to,
            });
        }

        *state = to;
        self.version.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    // A panic while holding the lock cannot leave the map half-updated, so a
    // poisoned lock is still safe to use.
    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, EntryState>> {
        self.entries.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, EntryState>> {
        self.entries.write().unwrap_or_else(|e| e.into_inner())
    }
}
