//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and run the full
//! fetch, extract and download cycle end-to-end.

use image_ripper::config::{load_config, Config, ExtractionRule, FolderPolicy, LinkRule};
use image_ripper::crawler::{run_crawl, Charset};
use image_ripper::EntryState;
use regex::Regex;
use std::path::Path;
use tempfile::TempDir;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const JPEG: &[u8] = &[0xff, 0xd8, 0xff, 0xe0, 0x00, 0x10, b'J', b'F', b'I', b'F'];
const PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];

/// Creates a test configuration crawling `base_url` into `save_root`
fn create_test_config(base_url: &str, save_root: &Path) -> Config {
    let root = Url::parse(&format!("{}/", base_url)).expect("Failed to parse base URL");
    let mut config = Config::new(root, save_root);
    config.image_rules.push(ExtractionRule {
        selector: "img".to_string(),
        attribute: "src".to_string(),
        folder: FolderPolicy::None,
    });
    config.link_rules.push(LinkRule {
        selector: "a".to_string(),
        attribute: "href".to_string(),
    });
    config.crawler.fetch_workers = 2;
    config.crawler.download_workers = 2;
    config.crawler.grace_period_ms = 0;
    config.crawler.status_interval_ms = 20;
    config
}

async fn mount_html(server: &MockServer, route: &str, html: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(html)
                .insert_header("content-type", "text/html"),
        )
        .mount(server)
        .await;
}

async fn mount_bytes(server: &MockServer, route: &str, bytes: &[u8], expected_hits: u64) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(bytes.to_vec()))
        .expect(expected_hits)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_full_crawl_downloads_images() {
    let mock_server = MockServer::start().await;
    let save_root = TempDir::new().expect("Failed to create temp dir");

    mount_html(
        &mock_server,
        "/",
        r#"<html><head><title>Home</title></head><body>
            <img src="/img/a.jpg">
            <a href="/gallery/2">Next</a>
            <a href="http://other.invalid/elsewhere">Elsewhere</a>
        </body></html>"#,
    )
    .await;
    mount_html(
        &mock_server,
        "/gallery/2",
        r#"<html><body>
            <img src="/img/b.png">
            <img src="/img/a.jpg">
            <a href="/">Home</a>
        </body></html>"#,
    )
    .await;
    // Shared by both pages, downloaded once
    mount_bytes(&mock_server, "/img/a.jpg", JPEG, 1).await;
    mount_bytes(&mock_server, "/img/b.png", PNG, 1).await;

    let config = create_test_config(&mock_server.uri(), save_root.path());
    let summary = run_crawl(config).await.expect("Crawl failed");

    assert_eq!(summary.pages.done, 2);
    assert_eq!(summary.pages.failed, 0);
    assert_eq!(summary.images.done, 2);
    assert_eq!(summary.images_saved, 2);

    assert_eq!(std::fs::read(save_root.path().join("root_0.jpg")).unwrap(), JPEG);
    assert_eq!(std::fs::read(save_root.path().join("2_0.png")).unwrap(), PNG);
}

#[tokio::test]
async fn test_failing_page_does_not_block_completion() {
    let mock_server = MockServer::start().await;
    let save_root = TempDir::new().expect("Failed to create temp dir");

    mount_html(
        &mock_server,
        "/",
        r#"<html><body><a href="/broken">Broken</a><img src="/ok.jpg"></body></html>"#,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(500))
        .expect(2)
        .mount(&mock_server)
        .await;
    mount_bytes(&mock_server, "/ok.jpg", JPEG, 1).await;

    let config = create_test_config(&mock_server.uri(), save_root.path());
    let summary = run_crawl(config).await.expect("Crawl failed");

    assert_eq!(summary.pages.done, 1);
    assert_eq!(summary.pages.failed, 1);
    assert_eq!(summary.images_saved, 1);
}

#[tokio::test]
async fn test_failing_image_is_marked_failed() {
    let mock_server = MockServer::start().await;
    let save_root = TempDir::new().expect("Failed to create temp dir");

    mount_html(
        &mock_server,
        "/",
        r#"<html><body><img src="/missing.jpg"><img src="/ok.jpg"></body></html>"#,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/missing.jpg"))
        .respond_with(ResponseTemplate::new(404))
        .expect(3)
        .mount(&mock_server)
        .await;
    mount_bytes(&mock_server, "/ok.jpg", JPEG, 1).await;

    let mut config = create_test_config(&mock_server.uri(), save_root.path());
    config.crawler.max_retry = 3;
    let summary = run_crawl(config).await.expect("Crawl failed");

    assert_eq!(summary.images.failed, 1);
    assert_eq!(summary.images.done, 1);
    assert_eq!(summary.images_saved, 1);
    assert!(!save_root.path().join("root_0.jpg").exists());
    assert!(save_root.path().join("root_1.jpg").exists());
}

#[tokio::test]
async fn test_page_patterns_limit_link_following() {
    let mock_server = MockServer::start().await;
    let save_root = TempDir::new().expect("Failed to create temp dir");

    mount_html(
        &mock_server,
        "/",
        r#"<html><body><a href="/list/1">List</a></body></html>"#,
    )
    .await;
    mount_html(
        &mock_server,
        "/list/1",
        r#"<html><body><a href="/post/7">Post</a></body></html>"#,
    )
    .await;
    mount_html(
        &mock_server,
        "/post/7",
        r#"<html><body><img src="/img/cat.jpg"><a href="/post/8">Next post</a></body></html>"#,
    )
    .await;
    mount_bytes(&mock_server, "/img/cat.jpg", JPEG, 1).await;
    Mock::given(method("GET"))
        .and(path("/post/8"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
        .expect(0)
        .mount(&mock_server)
        .await;

    let mut config = create_test_config(&mock_server.uri(), save_root.path());
    config.page_patterns = vec![Regex::new("/list/").unwrap()];
    config.image_page_patterns = vec![Regex::new(r"/post/\d+").unwrap()];
    config.image_rules[0].folder = FolderPolicy::UseUrl;
    let summary = run_crawl(config).await.expect("Crawl failed");

    assert_eq!(summary.pages.done, 3);
    assert_eq!(summary.images_saved, 1);
    assert!(save_root.path().join("7").join("7_0.jpg").exists());
}

#[tokio::test]
async fn test_charset_transcoding_feeds_title_folder() {
    let mock_server = MockServer::start().await;
    let save_root = TempDir::new().expect("Failed to create temp dir");

    // "<title>图片</title>" encoded as GBK
    let mut body = b"<html><head><title>".to_vec();
    body.extend_from_slice(&[0xcd, 0xbc, 0xc6, 0xac]);
    body.extend_from_slice(b"</title></head><body><img src=\"/a.jpg\"></body></html>");
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body))
        .mount(&mock_server)
        .await;
    mount_bytes(&mock_server, "/a.jpg", JPEG, 1).await;

    let mut config = create_test_config(&mock_server.uri(), save_root.path());
    config.charset = Charset::for_label("gbk").expect("gbk is a known label");
    config.image_rules[0].folder = FolderPolicy::UseTitle;
    let summary = run_crawl(config).await.expect("Crawl failed");

    assert_eq!(summary.images_saved, 1);
    assert!(save_root.path().join("图片").join("root_0.jpg").exists());
}

#[tokio::test]
async fn test_crawl_from_config_file() {
    let mock_server = MockServer::start().await;
    let save_root = TempDir::new().expect("Failed to create temp dir");

    Mock::given(method("GET"))
        .and(path("/"))
        .and(wiremock::matchers::header("x-ripper-test", "yes"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(r#"<html><body><img class="photo" data-src="/a.jpg"></body></html>"#),
        )
        .expect(1)
        .mount(&mock_server)
        .await;
    mount_bytes(&mock_server, "/a.jpg", JPEG, 1).await;

    let json = format!(
        r#"{{
    /* crawl the mock server */
    "root": "{root}/",
    "header": {{ "X-Ripper-Test": "yes" }},
    "crawler": {{ "fetch-workers": 1, "download-workers": 1, "grace-period-ms": 0, "status-interval-ms": 20 }},
    "output": {{ "save-root": "{save_root}" }},
    "regex": {{
        "image": [ {{ "query": "img.photo", "attr": "data-src", "folder": "none" }} ],
        "page": [],
        "imgInPage": [],
        "href": [ {{ "query": "a", "attr": "href" }} ]
    }}
}}"#,
        root = mock_server.uri(),
        save_root = save_root.path().display()
    );
    let config_file = tempfile::Builder::new()
        .suffix(".json")
        .tempfile()
        .expect("Failed to create config file");
    std::fs::write(config_file.path(), json).expect("Failed to write config file");

    let config = load_config(config_file.path()).expect("Config should load");
    let summary = run_crawl(config).await.expect("Crawl failed");

    assert_eq!(summary.images_saved, 1);
    assert!(save_root.path().join("root_0.jpg").exists());
}

#[test]
fn test_entry_state_is_exported() {
    assert!(EntryState::Done.is_terminal());
    assert!(!EntryState::Pending.is_terminal());
}
