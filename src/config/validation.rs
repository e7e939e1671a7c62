use crate::config::types::{
    Config, CrawlerConfig, ExtractionRule, FolderPolicy, LinkRule, ProxyConfig, ProxySettings,
    RawConfig, RawImageRule, RawLinkRule,
};
use crate::crawler::Charset;
use crate::ConfigError;
use regex::Regex;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use scraper::Selector;
use std::collections::BTreeMap;
use std::path::PathBuf;
use url::Url;

/// Validates a raw configuration and compiles it into a [`Config`]
pub fn validate(raw: RawConfig) -> Result<Config, ConfigError> {
    let root = validate_root(&raw.root)?;
    let proxy = validate_proxy(raw.proxy.as_ref())?;
    let headers = validate_headers(&raw.header)?;
    let charset = Charset::for_label(&raw.charset)
        .ok_or_else(|| ConfigError::UnknownCharset(raw.charset.clone()))?;
    validate_crawler_config(&raw.crawler)?;

    let image_rules = raw
        .regex
        .image
        .iter()
        .map(validate_image_rule)
        .collect::<Result<Vec<_>, _>>()?;
    let link_rules = raw
        .regex
        .href
        .iter()
        .map(validate_link_rule)
        .collect::<Result<Vec<_>, _>>()?;
    let page_patterns = compile_patterns("page", &raw.regex.page)?;
    let image_page_patterns = compile_patterns("imgInPage", &raw.regex.img_in_page)?;

    let save_root = raw
        .output
        .save_root
        .clone()
        .unwrap_or_else(|| default_save_root(&root));

    Ok(Config {
        root,
        proxy,
        headers,
        charset,
        image_rules,
        link_rules,
        page_patterns,
        image_page_patterns,
        crawler: raw.crawler,
        save_root,
    })
}

/// Parses the root URL, assuming `http://` when the scheme is missing
fn validate_root(root: &str) -> Result<Url, ConfigError> {
    let trimmed = root.trim();
    let lower = trimmed.to_ascii_lowercase();
    let with_scheme = if lower.starts_with("http://") || lower.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("http://{}", trimmed)
    };

    let url = Url::parse(&with_scheme).map_err(|e| ConfigError::InvalidRoot {
        url: root.to_string(),
        reason: e.to_string(),
    })?;

    if url.host_str().map_or(true, str::is_empty) {
        return Err(ConfigError::InvalidRoot {
            url: root.to_string(),
            reason: "missing host".to_string(),
        });
    }

    Ok(url)
}

/// An empty proxy server means no proxy at all
fn validate_proxy(proxy: Option<&ProxyConfig>) -> Result<Option<ProxySettings>, ConfigError> {
    let Some(proxy) = proxy else {
        return Ok(None);
    };

    let server = proxy.server.trim();
    if server.is_empty() {
        return Ok(None);
    }

    let parsed = Url::parse(&format!("socks5://{}", server))
        .map_err(|_| ConfigError::InvalidProxy(server.to_string()))?;
    let has_path = !parsed.path().is_empty() && parsed.path() != "/";
    if parsed.host_str().is_none() || parsed.port().is_none() || has_path {
        return Err(ConfigError::InvalidProxy(server.to_string()));
    }

    let username = Some(proxy.username.trim())
        .filter(|u| !u.is_empty())
        .map(str::to_string);
    let password = username.as_ref().map(|_| proxy.password.clone());

    Ok(Some(ProxySettings {
        server: server.to_string(),
        username,
        password,
    }))
}

fn validate_headers(headers: &BTreeMap<String, String>) -> Result<HeaderMap, ConfigError> {
    let mut map = HeaderMap::new();
    for (name, value) in headers {
        let header_name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| ConfigError::InvalidHeaderName(name.clone()))?;
        let header_value = HeaderValue::from_str(value)
            .map_err(|_| ConfigError::InvalidHeaderValue(name.clone()))?;
        map.append(header_name, header_value);
    }
    Ok(map)
}

fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.fetch_workers < 1 {
        return Err(ConfigError::Validation(format!(
            "fetch-workers must be >= 1, got {}",
            config.fetch_workers
        )));
    }

    if config.download_workers < 1 {
        return Err(ConfigError::Validation(format!(
            "download-workers must be >= 1, got {}",
            config.download_workers
        )));
    }

    if config.max_retry < 1 {
        return Err(ConfigError::Validation(format!(
            "max-retry must be >= 1, got {}",
            config.max_retry
        )));
    }

    if config.status_interval_ms < 1 {
        return Err(ConfigError::Validation(
            "status-interval-ms must be >= 1".to_string(),
        ));
    }

    if config.request_timeout_secs < 1 || config.connect_timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "request and connect timeouts must be >= 1s".to_string(),
        ));
    }

    Ok(())
}

fn validate_image_rule(rule: &RawImageRule) -> Result<ExtractionRule, ConfigError> {
    validate_selector("image", &rule.query)?;
    Ok(ExtractionRule {
        selector: rule.query.clone(),
        attribute: rule.attr.clone(),
        folder: parse_folder_policy(&rule.folder)?,
    })
}

fn validate_link_rule(rule: &RawLinkRule) -> Result<LinkRule, ConfigError> {
    validate_selector("href", &rule.query)?;
    Ok(LinkRule {
        selector: rule.query.clone(),
        attribute: rule.attr.clone(),
    })
}

fn validate_selector(group: &'static str, selector: &str) -> Result<(), ConfigError> {
    Selector::parse(selector)
        .map(|_| ())
        .map_err(|_| ConfigError::InvalidSelector {
            group,
            selector: selector.to_string(),
        })
}

/// `none`/`url`/`title` (any case) are keywords; an empty value means `none`;
/// anything else is compiled as a pattern over the page body.
pub(crate) fn parse_folder_policy(folder: &str) -> Result<FolderPolicy, ConfigError> {
    let keyword = folder.trim().to_ascii_lowercase();
    match keyword.as_str() {
        "" | "none" => Ok(FolderPolicy::None),
        "url" => Ok(FolderPolicy::UseUrl),
        "title" => Ok(FolderPolicy::UseTitle),
        _ => regex::bytes::Regex::new(folder)
            .map(FolderPolicy::Pattern)
            .map_err(|source| ConfigError::InvalidFolderPattern {
                pattern: folder.to_string(),
                source,
            }),
    }
}

fn compile_patterns(group: &'static str, sources: &[String]) -> Result<Vec<Regex>, ConfigError> {
    sources
        .iter()
        .map(|pattern| {
            Regex::new(pattern).map_err(|source| ConfigError::InvalidPattern {
                group,
                pattern: pattern.clone(),
                source,
            })
        })
        .collect()
}

/// `./<root-host>/`, with a non-default port appended as `_<port>`
fn default_save_root(root: &Url) -> PathBuf {
    let host = root.host_str().unwrap_or("root");
    let dir = match root.port() {
        Some(port) => format!("{}_{}", host, port),
        None => host.to_string(),
    };
    PathBuf::from(".").join(dir)
}
