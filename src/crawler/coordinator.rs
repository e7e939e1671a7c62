//! Crawler coordinator - main crawl orchestration logic
//!
//! This module wires the stages together for one crawl:
//! - Building the shared context (client, ledgers, queues)
//! - Seeding the page queue with the root URL
//! - Spawning the fetch pool, download pool and extraction worker
//! - Waiting for the monitor to declare completion and tearing down

use crate::config::Config;
use crate::crawler::context::CrawlContext;
use crate::crawler::downloader::run_download_worker;
use crate::crawler::extractor::run_extractor;
use crate::crawler::fetcher::{build_http_client, run_fetch_worker};
use crate::crawler::monitor::{watch, CrawlSummary};
use crate::crawler::parser::{HtmlQuery, ScraperQuery};
use crate::crawler::task::PageTask;
use crate::RipperError;
use chrono::Utc;
use reqwest::Client;
use std::sync::Arc;
use tokio::task::JoinSet;

/// Main crawler coordinator structure
pub struct Coordinator {
    config: Config,
    client: Client,
    query: Arc<dyn HtmlQuery>,
}

impl Coordinator {
    /// Creates a new coordinator with the default HTML query backend
    ///
    /// # Arguments
    ///
    /// * `config` - The validated crawl configuration
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Ready to run
    /// * `Err(RipperError)` - The HTTP client could not be built
    pub fn new(config: Config) -> Result<Self, RipperError> {
        let client = build_http_client(&config)?;
        Ok(Self::with_parts(config, client, Arc::new(ScraperQuery)))
    }

    /// Creates a coordinator from an existing client and query backend
    pub fn with_parts(config: Config, client: Client, query: Arc<dyn HtmlQuery>) -> Self {
        Self {
            config,
            client,
            query,
        }
    }

    /// Runs the crawl to completion
    ///
    /// Returns once no page or image is queued, in flight or pending. Workers
    /// are aborted at that point; per-URL failures never end the crawl.
    pub async fn run(self) -> Result<CrawlSummary, RipperError> {
        let started_at = Utc::now();
        let save_root = self.config.save_root.clone();
        std::fs::create_dir_all(&save_root)?;

        let fetch_workers = self.config.crawler.fetch_workers;
        let download_workers = self.config.crawler.download_workers;
        let root = self.config.root.to_string();

        tracing::info!("Starting crawl of {}", root);
        tracing::info!(
            "Saving images under {} ({} fetch workers, {} download workers, charset {})",
            save_root.display(),
            fetch_workers,
            download_workers,
            self.config.charset.name()
        );

        let (ctx, saved_rx) = CrawlContext::new(self.config, self.client, self.query);

        if ctx.pages.try_claim(&root) {
            ctx.page_queue.push(PageTask::seed(root)).await;
        }

        let mut workers = JoinSet::new();
        for id in 0..fetch_workers {
            workers.spawn(run_fetch_worker(Arc::clone(&ctx), id));
        }
        for id in 0..download_workers {
            workers.spawn(run_download_worker(Arc::clone(&ctx), id));
        }
        workers.spawn(run_extractor(Arc::clone(&ctx)));

        let summary = watch(Arc::clone(&ctx), saved_rx, started_at).await;

        workers.abort_all();
        while workers.join_next().await.is_some() {}

        tracing::info!("Crawl complete: {}", summary);
        Ok(summary)
    }
}

/// Runs a complete crawl with the given configuration
///
/// # Arguments
///
/// * `config` - The validated crawl configuration
///
/// # Returns
///
/// * `Ok(CrawlSummary)` - Crawl completed
/// * `Err(RipperError)` - Startup failed (HTTP client, save root)
pub async fn run_crawl(config: Config) -> Result<CrawlSummary, RipperError> {
    Coordinator::new(config)?.run().await
}
