//! HTTP fetching and the page fetch worker pool
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building the shared HTTP client (headers, timeouts, SOCKS5 proxy)
//! - GET requests with status checking
//! - The page fetch workers, which hand bodies to the extraction stage

use crate::config::{Config, ProxySettings};
use crate::crawler::context::CrawlContext;
use crate::crawler::retry::{log_outcome, retry_or_fail};
use crate::crawler::task::PageTask;
use crate::crawler::Charset;
use crate::{ConfigError, FetchError, RipperError};
use reqwest::{Client, Proxy, Response};
use std::sync::Arc;
use url::Url;

/// Builds the HTTP client shared by every worker
///
/// Configured headers become default headers, so every page and image
/// request carries them.
///
/// # Arguments
///
/// * `config` - The crawl configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(RipperError)` - Failed to build client
///
/// # Example
///
/// ```no_run
/// use image_ripper::config::Config;
/// use image_ripper::crawler::build_http_client;
/// use url::Url;
///
/// let config = Config::new(Url::parse("http://example.com/").unwrap(), "./example.com");
/// let client = build_http_client(&config).unwrap();
/// ```
pub fn build_http_client(config: &Config) -> Result<Client, RipperError> {
    let mut builder = Client::builder()
        .default_headers(config.headers.clone())
        .timeout(config.crawler.request_timeout())
        .connect_timeout(config.crawler.connect_timeout())
        .gzip(true)
        .brotli(true);

    if let Some(proxy) = &config.proxy {
        builder = builder.proxy(Proxy::all(proxy_url(proxy)?)?);
        tracing::info!("Using proxy server: {}", proxy.server);
    }

    Ok(builder.build()?)
}

/// `socks5h://[user:password@]host:port`; names are resolved by the proxy
fn proxy_url(proxy: &ProxySettings) -> Result<Url, RipperError> {
    let invalid = || RipperError::Config(ConfigError::InvalidProxy(proxy.server.clone()));

    let mut url = Url::parse(&format!("socks5h://{}", proxy.server)).map_err(|_| invalid())?;
    if let Some(username) = &proxy.username {
        url.set_username(username).map_err(|_| invalid())?;
        url.set_password(proxy.password.as_deref())
            .map_err(|_| invalid())?;
    }
    Ok(url)
}

/// Sends a GET request and rejects non-success statuses
pub async fn http_get(client: &Client, url: &str) -> Result<Response, FetchError> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|source| FetchError::Transport {
            url: url.to_string(),
            source,
        })?;

    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    Ok(response)
}

/// Fetches a page and returns its body transcoded to UTF-8
pub async fn fetch_page_body(
    client: &Client,
    url: &str,
    charset: Charset,
) -> Result<Vec<u8>, FetchError> {
    let response = http_get(client, url).await?;
    let body = response.bytes().await.map_err(|source| FetchError::Body {
        url: url.to_string(),
        source,
    })?;
    Ok(charset.decode(body.to_vec()))
}

/// Page fetch worker: runs until the crawl is torn down
pub async fn run_fetch_worker(ctx: Arc<CrawlContext>, id: usize) {
    tracing::debug!("Fetch worker {} started", id);
    while let Some(task) = ctx.page_queue.pop().await {
        process_page(&ctx, task).await;
    }
}

/// Fetches one page and hands it to the extraction stage
pub(crate) async fn process_page(ctx: &CrawlContext, mut task: PageTask) {
    if ctx.pages.is_done(&task.url) {
        tracing::debug!("Page {} already fetched, skipping", task.url);
        return;
    }

    match fetch_page_body(&ctx.client, &task.url, ctx.config.charset).await {
        Ok(body) => {
            tracing::debug!("Fetched page {} ({} bytes)", task.url, body.len());
            ctx.begin_extraction();
            if let Err(e) = ctx.pages.mark_done(&task.url) {
                tracing::warn!("{}", e);
            }
            task.body = Some(body);
            ctx.parse_queue.push(task).await;
        }
        Err(e) => {
            tracing::warn!("Failed to fetch page: {}", e);
            let url = task.url.clone();
            let outcome = retry_or_fail(
                task,
                &ctx.pages,
                &ctx.page_queue,
                ctx.config.crawler.max_retry,
            );
            log_outcome("page", &url, outcome);
        }
    }
}
