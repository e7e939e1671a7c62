use crate::crawler::Charset;
use regex::Regex;
use reqwest::header::HeaderMap;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

/// Configuration file as written by the user, before validation
#[derive(Debug, Clone, Deserialize)]
pub struct RawConfig {
    /// Start page; `http://` is assumed when no scheme is given
    pub root: String,

    #[serde(default)]
    pub proxy: Option<ProxyConfig>,

    /// Extra request headers sent with every page and image request
    #[serde(default, alias = "headers")]
    pub header: BTreeMap<String, String>,

    /// Response character set; empty means no transcoding
    #[serde(default)]
    pub charset: String,

    #[serde(default)]
    pub crawler: CrawlerConfig,

    #[serde(default)]
    pub output: OutputConfig,

    pub regex: RuleGroups,
}

/// SOCKS5 proxy settings
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProxyConfig {
    /// `host:port` of the SOCKS5 server; empty disables the proxy
    #[serde(default)]
    pub server: String,

    #[serde(default)]
    pub username: String,

    #[serde(default)]
    pub password: String,
}

/// Worker pool sizes, retry bound and timings
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct CrawlerConfig {
    /// Number of concurrent page fetchers
    pub fetch_workers: usize,

    /// Number of concurrent image downloaders
    pub download_workers: usize,

    /// Attempts per page or image before it is marked failed
    pub max_retry: u32,

    /// Interval between status reports / completion checks (milliseconds)
    pub status_interval_ms: u64,

    /// Delay before the first completion check (milliseconds)
    pub grace_period_ms: u64,

    /// Whole-request timeout (seconds)
    pub request_timeout_secs: u64,

    /// TCP / proxy dial timeout (seconds)
    pub connect_timeout_secs: u64,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            fetch_workers: 10,
            download_workers: 10,
            max_retry: 2,
            status_interval_ms: 15_000,
            grace_period_ms: 10_000,
            request_timeout_secs: 30,
            connect_timeout_secs: 30,
        }
    }
}

impl CrawlerConfig {
    pub fn status_interval(&self) -> Duration {
        Duration::from_millis(self.status_interval_ms)
    }

    pub fn grace_period(&self) -> Duration {
        Duration::from_millis(self.grace_period_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

/// Output configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct OutputConfig {
    /// Where images are saved; defaults to `./<root-host>/`
    pub save_root: Option<PathBuf>,
}

/// The four rule groups of the `regex` section
#[derive(Debug, Clone, Deserialize)]
pub struct RuleGroups {
    /// Image extraction rules
    pub image: Vec<RawImageRule>,

    /// Patterns for pages whose links are followed
    pub page: Vec<String>,

    /// Patterns for pages whose images are extracted
    #[serde(rename = "imgInPage", alias = "img-in-page")]
    pub img_in_page: Vec<String>,

    /// Link extraction rules
    pub href: Vec<RawLinkRule>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawImageRule {
    /// CSS selector
    pub query: String,

    /// Attribute holding the image URL
    pub attr: String,

    /// `none`, `url`, `title`, or a regular expression over the page body
    #[serde(default)]
    pub folder: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawLinkRule {
    /// CSS selector
    pub query: String,

    /// Attribute holding the link
    #[serde(default = "default_link_attr")]
    pub attr: String,
}

fn default_link_attr() -> String {
    "href".to_string()
}

/// Where the images of one rule on one page are saved
#[derive(Debug, Clone)]
pub enum FolderPolicy {
    /// Directly in the save root
    None,
    /// A folder named after the last path segment of the page URL
    UseUrl,
    /// A folder named after the page `<title>`
    UseTitle,
    /// A folder named after the first match of this pattern in the page body
    Pattern(regex::bytes::Regex),
}

/// A selector/attribute pair yielding image URLs, plus its folder policy
#[derive(Debug, Clone)]
pub struct ExtractionRule {
    pub selector: String,
    pub attribute: String,
    pub folder: FolderPolicy,
}

/// A selector/attribute pair yielding links to follow
#[derive(Debug, Clone)]
pub struct LinkRule {
    pub selector: String,
    pub attribute: String,
}

/// Validated proxy settings
#[derive(Clone)]
pub struct ProxySettings {
    pub server: String,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl std::fmt::Debug for ProxySettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProxySettings")
            .field("server", &self.server)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .finish()
    }
}

/// Main configuration structure for Image-Ripper
///
/// Produced by validating a [`RawConfig`]; everything is parsed and compiled
/// once and then shared read-only by all workers.
#[derive(Debug, Clone)]
pub struct Config {
    pub root: Url,
    pub proxy: Option<ProxySettings>,
    pub headers: HeaderMap,
    pub charset: Charset,
    pub image_rules: Vec<ExtractionRule>,
    pub link_rules: Vec<LinkRule>,
    /// Pages whose links are followed (empty = all)
    pub page_patterns: Vec<Regex>,
    /// Pages whose images are extracted (empty = all)
    pub image_page_patterns: Vec<Regex>,
    pub crawler: CrawlerConfig,
    pub save_root: PathBuf,
}

impl Config {
    /// Creates a configuration with no rules, no proxy and default settings
    ///
    /// Images are saved under `save_root`. Mostly useful for embedding and
    /// tests; files are loaded with [`crate::config::load_config`].
    pub fn new(root: Url, save_root: impl Into<PathBuf>) -> Self {
        Self {
            root,
            proxy: None,
            headers: HeaderMap::new(),
            charset: Charset::default(),
            image_rules: Vec::new(),
            link_rules: Vec::new(),
            page_patterns: Vec::new(),
            image_page_patterns: Vec::new(),
            crawler: CrawlerConfig::default(),
            save_root: save_root.into(),
        }
    }
}
