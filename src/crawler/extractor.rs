//! Extraction stage
//!
//! A single worker drains the dispatch queue. For every fetched page it
//! applies the image rules and the link rules, claims each discovered URL in
//! its ledger, and enqueues only the URLs it won.

use crate::config::Config;
use crate::crawler::context::CrawlContext;
use crate::crawler::folder::{image_file_name, resolve_folder};
use crate::crawler::parser::HtmlQuery;
use crate::crawler::task::{ImageTask, PageTask};
use crate::state::Ledger;
use crate::url::{matches_any, resolve_href, same_host};
use std::path::PathBuf;
use std::sync::Arc;
use url::Url;

/// Newly claimed work found on one page
#[derive(Debug, Default)]
pub struct Discoveries {
    pub images: Vec<ImageTask>,
    pub pages: Vec<PageTask>,
}

impl Discoveries {
    pub fn is_empty(&self) -> bool {
        self.images.is_empty() && self.pages.is_empty()
    }
}

/// Extraction worker: runs until the crawl is torn down
pub async fn run_extractor(ctx: Arc<CrawlContext>) {
    tracing::debug!("Extraction worker started");
    while let Some(task) = ctx.parse_queue.pop().await {
        let discoveries = extract(&ctx.config, ctx.query.as_ref(), &ctx.pages, &ctx.images, &task);
        tracing::debug!(
            "Extracted {} images and {} pages from {}",
            discoveries.images.len(),
            discoveries.pages.len(),
            task.url
        );

        for image in discoveries.images {
            ctx.image_queue.push(image).await;
        }
        for page in discoveries.pages {
            ctx.page_queue.push_detached(page);
        }
        ctx.finish_extraction();
    }
}

/// Applies the image and link rules to a fetched page
///
/// Every returned task has already been claimed in its ledger, so each URL
/// is handed out at most once across the whole crawl.
pub fn extract(
    config: &Config,
    query: &dyn HtmlQuery,
    pages: &Ledger,
    images: &Ledger,
    task: &PageTask,
) -> Discoveries {
    let mut discoveries = Discoveries::default();

    let page_url = match Url::parse(&task.url) {
        Ok(url) => url,
        Err(e) => {
            tracing::warn!("Cannot extract from {}: {}", task.url, e);
            return discoveries;
        }
    };
    let body = task.body.as_deref().unwrap_or_default();

    if matches_any(&task.url, &config.image_page_patterns) {
        for rule in &config.image_rules {
            let values = match query.select_attr(body, &rule.selector, &rule.attribute) {
                Ok(values) => values,
                Err(e) => {
                    tracing::warn!("Skipping image rule on {}: {}", task.url, e);
                    continue;
                }
            };

            // Resolved on the first claimed image so unused folders are never created
            let mut folder: Option<PathBuf> = None;
            // Ordinals count every matched element, valued or not
            for (ordinal, value) in values.iter().enumerate() {
                let Some(value) = value else {
                    continue;
                };
                let image_url = match resolve_href(&page_url, value) {
                    Ok(url) => url,
                    Err(e) => {
                        tracing::debug!("Ignoring image reference on {}: {}", task.url, e);
                        continue;
                    }
                };
                if !images.try_claim(image_url.as_str()) {
                    continue;
                }

                let target_folder = folder
                    .get_or_insert_with(|| {
                        resolve_folder(&rule.folder, &page_url, body, &config.save_root)
                    })
                    .clone();
                let file_name = image_file_name(&page_url, &image_url, ordinal);
                discoveries
                    .images
                    .push(ImageTask::new(image_url.as_str(), file_name, target_folder));
            }
        }
    }

    if task.force_parse || matches_any(&task.url, &config.page_patterns) {
        for rule in &config.link_rules {
            let values = match query.select_attr(body, &rule.selector, &rule.attribute) {
                Ok(values) => values,
                Err(e) => {
                    tracing::warn!("Skipping link rule on {}: {}", task.url, e);
                    continue;
                }
            };

            for value in values.iter().flatten() {
                let link = match resolve_href(&page_url, value) {
                    Ok(url) => url,
                    Err(e) => {
                        tracing::debug!("Ignoring link on {}: {}", task.url, e);
                        continue;
                    }
                };
                if !same_host(&link, &config.root) {
                    continue;
                }
                if pages.try_claim(link.as_str()) {
                    discoveries.pages.push(PageTask::new(link.as_str()));
                }
            }
        }
    }

    discoveries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ExtractionRule, FolderPolicy, LinkRule};
    use crate::crawler::parser::ScraperQuery;
    use crate::EntryState;
    use regex::Regex;
    use tempfile::TempDir;

    const PAGE: &str = r#"
        <html><head><title>Cats</title></head><body>
            <img class="photo" src="/img/a.jpg">
            <img class="photo" src="b.png#zoom">
            <img class="photo" src="">
            <img class="icon" src="/img/icon.gif">
            <a href="/gallery/2">next</a>
            <a href="http://other.com/page">elsewhere</a>
            <a href="http://example.com:8080/page">other port</a>
            <a href="mailto:someone@example.com">mail</a>
            <a href="/gallery/2#top">next again</a>
        </body></html>
    "#;

    fn config(root: &TempDir) -> Config {
        let mut config = Config::new(
            Url::parse("http://example.com/").unwrap(),
            root.path(),
        );
        config.image_rules.push(ExtractionRule {
            selector: "img.photo".to_string(),
            attribute: "src".to_string(),
            folder: FolderPolicy::None,
        });
        config.link_rules.push(LinkRule {
            selector: "a".to_string(),
            attribute: "href".to_string(),
        });
        config
    }

    fn page(url: &str) -> PageTask {
        let mut task = PageTask::new(url);
        task.body = Some(PAGE.as_bytes().to_vec());
        task
    }

    fn run(config: &Config, task: &PageTask) -> (Discoveries, Ledger, Ledger) {
        let pages = Ledger::new();
        let images = Ledger::new();
        let found = extract(config, &ScraperQuery, &pages, &images, task);
        (found, pages, images)
    }

    #[test]
    fn test_extracts_images_in_order() {
        let root = TempDir::new().unwrap();
        let config = config(&root);
        let (found, _, images) = run(&config, &page("http://example.com/gallery/1"));

        let urls: Vec<&str> = found.images.iter().map(|t| t.image_url.as_str()).collect();
        assert_eq!(
            urls,
            vec![
                "http://example.com/img/a.jpg",
                "http://example.com/gallery/b.png"
            ]
        );
        assert_eq!(found.images[0].file_name, "1_0.jpg");
        assert_eq!(found.images[1].file_name, "1_1.png");
        assert_eq!(found.images[0].target_folder, root.path());
        assert_eq!(
            images.state("http://example.com/img/a.jpg"),
            Some(EntryState::Pending)
        );
    }

    #[test]
    fn test_links_stay_on_root_host() {
        let root = TempDir::new().unwrap();
        let config = config(&root);
        let (found, pages, _) = run(&config, &page("http://example.com/gallery/1"));

        let urls: Vec<&str> = found.pages.iter().map(|t| t.url.as_str()).collect();
        assert_eq!(urls, vec!["http://example.com/gallery/2"]);
        assert!(pages.state("http://other.com/page").is_none());
        assert!(pages.state("http://example.com:8080/page").is_none());
    }

    #[test]
    fn test_already_claimed_urls_are_not_returned() {
        let root = TempDir::new().unwrap();
        let config = config(&root);
        let pages = Ledger::new();
        let images = Ledger::new();
        pages.try_claim("http://example.com/gallery/2");
        images.try_claim("http://example.com/img/a.jpg");

        let found = extract(
            &config,
            &ScraperQuery,
            &pages,
            &images,
            &page("http://example.com/gallery/1"),
        );
        assert!(found.pages.is_empty());
        assert_eq!(found.images.len(), 1);
        assert_eq!(found.images[0].file_name, "1_1.png");
    }

    #[test]
    fn test_page_patterns_gate_links() {
        let root = TempDir::new().unwrap();
        let mut config = config(&root);
        config.page_patterns = vec![Regex::new("/index/").unwrap()];

        let (found, _, _) = run(&config, &page("http://example.com/gallery/1"));
        assert!(found.pages.is_empty());
        assert_eq!(found.images.len(), 2);
    }

    #[test]
    fn test_force_parse_overrides_page_patterns() {
        let root = TempDir::new().unwrap();
        let mut config = config(&root);
        config.page_patterns = vec![Regex::new("/index/").unwrap()];

        let mut task = page("http://example.com/");
        task.force_parse = true;
        let (found, _, _) = run(&config, &task);
        assert_eq!(found.pages.len(), 1);
    }

    #[test]
    fn test_image_page_patterns_gate_images() {
        let root = TempDir::new().unwrap();
        let mut config = config(&root);
        config.image_page_patterns = vec![Regex::new("/photos/").unwrap()];

        let (found, _, images) = run(&config, &page("http://example.com/gallery/1"));
        assert!(found.images.is_empty());
        assert!(images.is_empty());
        assert_eq!(found.pages.len(), 1);
    }

    #[test]
    fn test_folder_resolved_once_per_rule() {
        let root = TempDir::new().unwrap();
        let mut config = config(&root);
        config.image_rules[0].folder = FolderPolicy::UseTitle;

        let (found, _, _) = run(&config, &page("http://example.com/gallery/1"));
        assert_eq!(found.images.len(), 2);
        for image in &found.images {
            assert_eq!(image.target_folder, root.path().join("Cats"));
        }
        assert!(root.path().join("Cats").is_dir());
    }

    #[test]
    fn test_invalid_selector_skips_rule() {
        let root = TempDir::new().unwrap();
        let mut config = config(&root);
        config.image_rules.insert(
            0,
            ExtractionRule {
                selector: "img[".to_string(),
                attribute: "src".to_string(),
                folder: FolderPolicy::None,
            },
        );

        let (found, _, _) = run(&config, &page("http://example.com/gallery/1"));
        assert_eq!(found.images.len(), 2);
    }

    #[test]
    fn test_ordinal_counts_elements_without_value() {
        let root = TempDir::new().unwrap();
        let mut config = config(&root);
        config.image_rules[0].attribute = "data-src".to_string();

        let mut task = PageTask::new("http://example.com/post/9");
        task.body = Some(
            br#"<img class="photo" src="/thumb.jpg">
                <img class="photo" data-src="/full/1.jpg">
                <img class="photo" data-src="">
                <img class="photo" data-src="/full/3.jpg">"#
                .to_vec(),
        );
        let (found, _, _) = run(&config, &task);

        let names: Vec<&str> = found.images.iter().map(|t| t.file_name.as_str()).collect();
        assert_eq!(names, vec!["9_1.jpg", "9_3.jpg"]);
    }

    #[test]
    fn test_empty_body() {
        let root = TempDir::new().unwrap();
        let config = config(&root);
        let (found, _, _) = run(&config, &PageTask::new("http://example.com/"));
        assert!(found.is_empty());
    }
}
