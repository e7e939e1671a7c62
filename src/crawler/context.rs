//! Shared crawl state
//!
//! One [`CrawlContext`] is created per crawl and shared by every worker
//! through an `Arc`. The ledgers are the only mutable state in it that more
//! than one stage writes.

use crate::config::Config;
use crate::crawler::parser::HtmlQuery;
use crate::crawler::queue::WorkQueue;
use crate::crawler::task::{ImageTask, PageTask};
use crate::state::Ledger;
use reqwest::Client;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Capacity of the page fetch queue
pub const PAGE_QUEUE_CAPACITY: usize = 100;

/// Capacity of the image download queue
pub const IMAGE_QUEUE_CAPACITY: usize = 200;

/// Capacity of the extraction dispatch queue
pub const PARSE_QUEUE_CAPACITY: usize = 10;

/// Process-wide state shared by all crawl stages
pub struct CrawlContext {
    pub config: Config,
    pub client: Client,
    pub query: Arc<dyn HtmlQuery>,

    /// Page URL ledger
    pub pages: Ledger,

    /// Image URL ledger
    pub images: Ledger,

    /// Pages waiting to be fetched
    pub page_queue: WorkQueue<PageTask>,

    /// Images waiting to be downloaded
    pub image_queue: WorkQueue<ImageTask>,

    /// Fetched pages waiting for extraction
    pub parse_queue: WorkQueue<PageTask>,

    /// Receives `+1` for every image written to disk
    saved_tx: mpsc::UnboundedSender<usize>,

    /// Fetched pages whose extraction has not finished yet
    pending_extractions: AtomicUsize,

    /// Bumped whenever `pending_extractions` changes
    extraction_events: AtomicU64,
}

impl CrawlContext {
    /// Creates the context and the receiving end of the saved-image counter
    pub fn new(
        config: Config,
        client: Client,
        query: Arc<dyn HtmlQuery>,
    ) -> (Arc<Self>, mpsc::UnboundedReceiver<usize>) {
        let (saved_tx, saved_rx) = mpsc::unbounded_channel();
        let ctx = Self {
            config,
            client,
            query,
            pages: Ledger::new(),
            images: Ledger::new(),
            page_queue: WorkQueue::new("page", PAGE_QUEUE_CAPACITY),
            image_queue: WorkQueue::new("image", IMAGE_QUEUE_CAPACITY),
            parse_queue: WorkQueue::new("parse", PARSE_QUEUE_CAPACITY),
            saved_tx,
            pending_extractions: AtomicUsize::new(0),
            extraction_events: AtomicU64::new(0),
        };
        (Arc::new(ctx), saved_rx)
    }

    /// Reports one more image saved to disk
    pub fn record_saved_image(&self) {
        if self.saved_tx.send(1).is_err() {
            tracing::debug!("Saved-image counter closed");
        }
    }

    /// Counts a fetched page as awaiting extraction
    ///
    /// Must be called before the page leaves Pending in the page ledger, and
    /// matched by [`finish_extraction`](Self::finish_extraction) only after
    /// the page's discoveries are claimed, so outstanding work is always
    /// visible in at least one counter.
    pub fn begin_extraction(&self) {
        self.pending_extractions.fetch_add(1, Ordering::SeqCst);
        self.extraction_events.fetch_add(1, Ordering::SeqCst);
    }

    /// Marks one page's extraction as complete
    pub fn finish_extraction(&self) {
        self.pending_extractions.fetch_sub(1, Ordering::SeqCst);
        self.extraction_events.fetch_add(1, Ordering::SeqCst);
    }

    /// Fetched pages whose discoveries are not yet enqueued
    pub fn pending_extractions(&self) -> usize {
        self.pending_extractions.load(Ordering::SeqCst)
    }

    /// Sum of all monotonic change counters
    ///
    /// Unchanged between two readings only if no ledger entry and no
    /// extraction changed state in between.
    pub fn activity_version(&self) -> u64 {
        self.pages.version()
            + self.images.version()
            + self.extraction_events.load(Ordering::SeqCst)
    }
}
