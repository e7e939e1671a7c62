//! Progress reporting and termination detection

use crate::crawler::context::CrawlContext;
use crate::state::LedgerSnapshot;
use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

/// Items waiting in each queue
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueDepths {
    pub page: usize,
    pub image: usize,
    pub parse: usize,
}

impl QueueDepths {
    pub fn is_empty(&self) -> bool {
        self.page == 0 && self.image == 0 && self.parse == 0
    }
}

/// One reading of the crawl's progress
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrawlStatus {
    pub queues: QueueDepths,
    pub pages: LedgerSnapshot,
    pub images: LedgerSnapshot,
    pub extracting: usize,
}

impl CrawlStatus {
    /// Reads every counter once
    ///
    /// The readings are not taken atomically; see [`watch`] for how a
    /// consistent idle state is detected.
    pub fn sample(ctx: &CrawlContext) -> Self {
        Self {
            queues: QueueDepths {
                page: ctx.page_queue.len(),
                image: ctx.image_queue.len(),
                parse: ctx.parse_queue.len(),
            },
            pages: ctx.pages.snapshot(),
            images: ctx.images.snapshot(),
            extracting: ctx.pending_extractions(),
        }
    }

    /// No queued, in-flight or pending work anywhere
    pub fn is_idle(&self) -> bool {
        self.queues.is_empty()
            && self.extracting == 0
            && self.pages.pending == 0
            && self.images.pending == 0
    }
}

/// Final result of a crawl
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlSummary {
    pub started_at: DateTime<Utc>,
    pub elapsed: Duration,
    pub pages: LedgerSnapshot,
    pub images: LedgerSnapshot,
    /// Images written to disk, as reported over the saved-image channel
    pub images_saved: usize,
}

impl fmt::Display for CrawlSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "pages: {} fetched, {} failed | images: {} found, {} saved, {} failed | started {} ({:.1}s)",
            self.pages.done,
            self.pages.failed,
            self.images.total(),
            self.images_saved,
            self.images.failed,
            self.started_at.format("%Y-%m-%d %H:%M:%S"),
            self.elapsed.as_secs_f64()
        )
    }
}

/// Reports progress until the crawl has no work left, then summarizes it
///
/// After the grace period every tick logs a status line. A tick declares the
/// crawl complete only if the sample is idle and the context's activity
/// version did not move while the sample was taken, so a claim or state
/// change racing with the reading postpones completion to a later tick.
pub async fn watch(
    ctx: Arc<CrawlContext>,
    mut saved_rx: mpsc::UnboundedReceiver<usize>,
    started_at: DateTime<Utc>,
) -> CrawlSummary {
    let started = Instant::now();
    let period = ctx.config.crawler.status_interval();
    let mut saved = 0usize;

    tokio::time::sleep(ctx.config.crawler.grace_period()).await;

    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            Some(count) = saved_rx.recv() => saved += count,
            _ = ticker.tick() => {
                while let Ok(count) = saved_rx.try_recv() {
                    saved += count;
                }

                let before = ctx.activity_version();
                let status = CrawlStatus::sample(&ctx);
                let after = ctx.activity_version();

                tracing::info!(
                    "queue: page({}) image({}) parse({}) | image: found({}) done({})",
                    status.queues.page,
                    status.queues.image,
                    status.queues.parse,
                    status.images.total(),
                    saved
                );

                if before == after && status.is_idle() {
                    return CrawlSummary {
                        started_at,
                        elapsed: started.elapsed(),
                        pages: status.pages,
                        images: status.images,
                        images_saved: saved,
                    };
                }
            }
        }
    }
}
