//! Crawler module: the concurrent crawl pipeline
//!
//! This module contains the core crawling logic, including:
//! - The fetch and download worker pools with bounded retry
//! - HTML querying, image and link extraction, folder naming
//! - Bounded work queues and the shared crawl context
//! - Progress reporting, termination detection and overall coordination

mod charset;
mod context;
mod coordinator;
mod downloader;
mod extractor;
mod fetcher;
mod folder;
mod monitor;
mod parser;
mod queue;
mod retry;
mod task;

pub use charset::Charset;
pub use context::{
    CrawlContext, IMAGE_QUEUE_CAPACITY, PAGE_QUEUE_CAPACITY, PARSE_QUEUE_CAPACITY,
};
pub use coordinator::{run_crawl, Coordinator};
pub use downloader::{run_download_worker, save_response, WRITE_BUFFER_SIZE};
pub use extractor::{extract, run_extractor, Discoveries};
pub use fetcher::{build_http_client, fetch_page_body, http_get, run_fetch_worker};
pub use folder::{image_file_name, resolve_folder, sanitize_name};
pub use monitor::{watch, CrawlStatus, CrawlSummary, QueueDepths};
pub use parser::{HtmlQuery, ScraperQuery};
pub use queue::WorkQueue;
pub use retry::{retry_or_fail, RetryOutcome};
pub use task::{ImageTask, PageTask, RetryTask};

use crate::config::Config;
use crate::RipperError;

/// Runs a complete crawl operation
///
/// This is the main entry point for starting a crawl. It will:
/// 1. Build the HTTP client and shared context
/// 2. Seed the page queue with the root URL
/// 3. Fetch pages and extract images and links
/// 4. Download images into the save root
/// 5. Return a summary once no work is left
pub async fn crawl(config: Config) -> Result<CrawlSummary, RipperError> {
    run_crawl(config).await
}
