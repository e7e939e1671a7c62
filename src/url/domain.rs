use url::Url;

/// Checks whether a URL lives on the same host as the crawl root
///
/// Host and explicit port are compared; a port equal to the scheme default
/// counts as no port, so `http://example.com` and `https://example.com` are
/// the same site while `http://example.com:8080` is not.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use image_ripper::url::same_host;
///
/// let root = Url::parse("http://example.com/").unwrap();
/// assert!(same_host(&Url::parse("https://EXAMPLE.com/a").unwrap(), &root));
/// assert!(!same_host(&Url::parse("http://cdn.example.com/a").unwrap(), &root));
/// ```
pub fn same_host(url: &Url, root: &Url) -> bool {
    url.host_str() == root.host_str() && url.port() == root.port()
}

/// Returns the last non-empty path segment of a URL
///
/// `http://example.com/a/b/` yields `b`; the site root yields `None`.
pub fn last_path_segment(url: &Url) -> Option<&str> {
    url.path_segments()?.filter(|s| !s.is_empty()).last()
}
