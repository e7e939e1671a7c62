/// Ledger entry state definitions
///
/// Every URL the crawler schedules is tracked by exactly one of these states.
use std::fmt;

/// Represents the scheduling state of a page or image URL
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryState {
    /// URL has been claimed and is queued, in flight, or awaiting retry
    Pending,

    /// URL was fetched (page) or saved to disk (image)
    Done,

    /// Retries were exhausted or the result could not be stored
    Failed,
}

impl EntryState {
    /// Returns true if no further transition is allowed out of this state
    pub fn is_terminal(&self) -> bool {
        match self {
            Self::Pending => false,
            Self::Done | Self::Failed => true,
        }
    }

    /// Returns true if the transition `self -> next` is allowed
    ///
    /// Only `Pending -> Done` and `Pending -> Failed` are legal.
    pub fn can_transition_to(&self, next: EntryState) -> bool {
        match (self, next) {
            (Self::Pending, Self::Done) | (Self::Pending, Self::Failed) => true,
            (Self::Pending, Self::Pending) => false,
            (Self::Done, _) | (Self::Failed, _) => false,
        }
    }

    /// Returns the lowercase name used in log output
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for EntryState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
