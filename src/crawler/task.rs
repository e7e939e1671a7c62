//! Units of work moved between the crawl stages

use std::path::PathBuf;

/// A page to fetch, and after fetching, to extract
#[derive(Debug, Clone)]
pub struct PageTask {
    /// Absolute, fragment-free page URL
    pub url: String,

    /// UTF-8 body, attached by the fetch worker
    pub body: Option<Vec<u8>>,

    /// Failed attempts so far
    pub retry_count: u32,

    /// Follow links even if the URL matches no crawlable-page pattern
    pub force_parse: bool,
}

impl PageTask {
    /// A page discovered through a link
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            body: None,
            retry_count: 0,
            force_parse: false,
        }
    }

    /// The start page; its links are always followed
    pub fn seed(url: impl Into<String>) -> Self {
        Self {
            force_parse: true,
            ..Self::new(url)
        }
    }
}

/// An image to download
#[derive(Debug, Clone)]
pub struct ImageTask {
    /// Absolute, fragment-free image URL
    pub image_url: String,

    /// File name inside `target_folder`
    pub file_name: String,

    /// Failed attempts so far
    pub retry_count: u32,

    /// Folder resolved by the extraction stage
    pub target_folder: PathBuf,
}

impl ImageTask {
    pub fn new(
        image_url: impl Into<String>,
        file_name: impl Into<String>,
        target_folder: impl Into<PathBuf>,
    ) -> Self {
        Self {
            image_url: image_url.into(),
            file_name: file_name.into(),
            retry_count: 0,
            target_folder: target_folder.into(),
        }
    }

    /// Full path the image is written to
    pub fn target_path(&self) -> PathBuf {
        self.target_folder.join(&self.file_name)
    }
}

/// A task the retry policy can re-enqueue
pub trait RetryTask {
    /// Ledger key of the task
    fn key(&self) -> &str;

    /// Records one more failed attempt and returns the new count
    fn record_failure(&mut self) -> u32;
}

impl RetryTask for PageTask {
    fn key(&self) -> &str {
        &self.url
    }

    fn record_failure(&mut self) -> u32 {
        self.retry_count += 1;
        self.retry_count
    }
}

impl RetryTask for ImageTask {
    fn key(&self) -> &str {
        &self.image_url
    }

    fn record_failure(&mut self) -> u32 {
        self.retry_count += 1;
        self.retry_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_forces_parse() {
        let seed = PageTask::seed("http://example.com/");
        assert!(seed.force_parse);
        assert!(seed.body.is_none());
        assert!(!PageTask::new("http://example.com/a").force_parse);
    }

    #[test]
    fn test_image_target_path() {
        let image = ImageTask::new("http://example.com/a.jpg", "post_0.jpg", "/tmp/site/Album");
        assert_eq!(image.target_path(), PathBuf::from("/tmp/site/Album/post_0.jpg"));
    }

    #[test]
    fn test_record_failure_counts_up() {
        let mut page = PageTask::new("http://example.com/");
        assert_eq!(page.record_failure(), 1);
        assert_eq!(page.record_failure(), 2);
        assert_eq!(page.key(), "http://example.com/");
    }
}
