//! Bounded retry policy shared by the fetch and download pools

use crate::crawler::queue::WorkQueue;
use crate::crawler::task::RetryTask;
use crate::state::Ledger;

/// What the retry policy did with a failed task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryOutcome {
    /// Another attempt already succeeded; the task was dropped
    AlreadyDone,

    /// The task went back to its queue after this many failures
    Requeued { attempt: u32 },

    /// Retries ran out; the ledger entry is now Failed
    Exhausted,
}

/// Applies the retry policy to a task whose attempt just failed
///
/// The re-enqueue is detached: the calling worker also drains `queue`, and
/// waiting for room there could stall the whole pool.
///
/// # Arguments
///
/// * `task` - The failed task
/// * `ledger` - The ledger the task's key lives in
/// * `queue` - The queue the task came from
/// * `max_retry` - Attempts allowed before the task is marked Failed
pub fn retry_or_fail<T>(
    mut task: T,
    ledger: &Ledger,
    queue: &WorkQueue<T>,
    max_retry: u32,
) -> RetryOutcome
where
    T: RetryTask + Send + 'static,
{
    if ledger.is_done(task.key()) {
        return RetryOutcome::AlreadyDone;
    }

    let attempt = task.record_failure();
    if attempt < max_retry {
        queue.push_detached(task);
        return RetryOutcome::Requeued { attempt };
    }

    if let Err(e) = ledger.mark_failed(task.key()) {
        tracing::warn!("{}", e);
    }
    RetryOutcome::Exhausted
}

/// Logs a retry decision for a page or image
pub(crate) fn log_outcome(kind: &str, url: &str, outcome: RetryOutcome) {
    match outcome {
        RetryOutcome::AlreadyDone => {
            tracing::debug!("{} {} already done, dropping retry", kind, url)
        }
        RetryOutcome::Requeued { attempt } => {
            tracing::debug!("Retrying {} {} (attempt {})", kind, url, attempt + 1)
        }
        RetryOutcome::Exhausted => tracing::warn!("Giving up on {} {}", kind, url),
    }
}
