//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `EntryState`: Pending / Done / Failed state of a scheduled URL
//! - `Ledger`: concurrent URL → state map with an atomic claim operation
//! - `LedgerSnapshot`: per-state counts used for reporting and termination

mod entry_state;
mod ledger;

// Re-export main types
pub use entry_state::EntryState;
pub use ledger::{Ledger, LedgerSnapshot};
