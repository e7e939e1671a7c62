//! Image download worker pool

use crate::crawler::context::CrawlContext;
use crate::crawler::fetcher::http_get;
use crate::crawler::retry::{log_outcome, retry_or_fail};
use crate::crawler::task::ImageTask;
use crate::{DownloadError, FetchError};
use reqwest::Response;
use std::path::Path;
use std::sync::Arc;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};

/// Size of the write buffer between the response stream and the file
pub const WRITE_BUFFER_SIZE: usize = 64 * 1024;

/// Image download worker: runs until the crawl is torn down
pub async fn run_download_worker(ctx: Arc<CrawlContext>, id: usize) {
    tracing::debug!("Download worker {} started", id);
    while let Some(task) = ctx.image_queue.pop().await {
        process_image(&ctx, task).await;
    }
}

/// Downloads one image to its target path
///
/// Network failures (request, status, body stream) go through the retry
/// policy. Local write failures mark the image Failed straight away: the
/// bytes were already fetched once and retrying cannot fix a disk problem.
pub(crate) async fn process_image(ctx: &CrawlContext, task: ImageTask) {
    if ctx.images.is_done(&task.image_url) {
        tracing::debug!("Image {} already saved, skipping", task.image_url);
        return;
    }

    let result = match http_get(&ctx.client, &task.image_url).await {
        Ok(response) => save_response(response, &task.image_url, &task.target_path()).await,
        Err(e) => Err(DownloadError::Fetch(e)),
    };

    match result {
        Ok(bytes) => {
            tracing::debug!(
                "Saved {} -> {} ({} bytes)",
                task.image_url,
                task.target_path().display(),
                bytes
            );
            if let Err(e) = ctx.images.mark_done(&task.image_url) {
                tracing::warn!("{}", e);
            }
            ctx.record_saved_image();
        }
        Err(DownloadError::Fetch(e)) => {
            tracing::warn!("Failed to download image: {}", e);
            let url = task.image_url.clone();
            let outcome = retry_or_fail(
                task,
                &ctx.images,
                &ctx.image_queue,
                ctx.config.crawler.max_retry,
            );
            log_outcome("image", &url, outcome);
        }
        Err(e @ DownloadError::Write { .. }) => {
            tracing::warn!("Abandoning image {}: {}", task.image_url, e);
            if let Err(e) = ctx.images.mark_failed(&task.image_url) {
                tracing::warn!("{}", e);
            }
        }
    }
}

/// Streams a response body into `path` and returns the number of bytes
pub async fn save_response(
    mut response: Response,
    url: &str,
    path: &Path,
) -> Result<u64, DownloadError> {
    let write_error = |source: std::io::Error| DownloadError::Write {
        path: path.to_path_buf(),
        source,
    };

    let file = File::create(path).await.map_err(write_error)?;
    let mut writer = BufWriter::with_capacity(WRITE_BUFFER_SIZE, file);
    let mut written = 0u64;

    loop {
        let chunk = response.chunk().await.map_err(|source| FetchError::Body {
            url: url.to_string(),
            source,
        })?;
        let Some(chunk) = chunk else {
            break;
        };
        writer.write_all(&chunk).await.map_err(write_error)?;
        written += chunk.len() as u64;
    }

    writer.flush().await.map_err(write_error)?;
    Ok(written)
}
