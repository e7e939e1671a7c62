use crate::{UrlError, UrlResult};
use url::Url;

/// Resolves a link found on a page into an absolute, fragment-free URL
///
/// # Resolution Rules
///
/// 1. Trim surrounding whitespace; reject empty links
/// 2. `http://` / `https://` links are taken as-is
/// 3. `?query` replaces the query of the current page path
/// 4. `/path` is an absolute path on the page's host
/// 5. Anything else is relative to the page's directory, with `.` and `..`
///    segments collapsed
/// 6. Remove the fragment (everything after #)
/// 7. Reject anything that did not end up as HTTP or HTTPS
///    (`javascript:`, `mailto:`, `data:` ...)
///
/// # Arguments
///
/// * `base` - The URL of the page the link was found on
/// * `href` - The raw attribute value
///
/// # Returns
///
/// * `Ok(Url)` - The absolute URL
/// * `Err(UrlError)` - The link is empty, malformed, or not HTTP(S)
///
/// # Examples
///
/// ```
/// use image_ripper::url::resolve_href;
/// use url::Url;
///
/// let base = Url::parse("http://example.com/a/b").unwrap();
/// assert_eq!(resolve_href(&base, "c.jpg").unwrap().as_str(), "http://example.com/a/c.jpg");
/// assert_eq!(resolve_href(&base, "../f.jpg").unwrap().as_str(), "http://example.com/f.jpg");
/// ```
pub fn resolve_href(base: &Url, href: &str) -> UrlResult<Url> {
    let href = href.trim();
    if href.is_empty() {
        return Err(UrlError::Empty);
    }

    let mut resolved = base.join(href).map_err(|source| UrlError::Resolve {
        href: href.to_string(),
        source,
    })?;

    if resolved.scheme() != "http" && resolved.scheme() != "https" {
        return Err(UrlError::InvalidScheme(resolved.scheme().to_string()));
    }

    resolved.set_fragment(None);
    Ok(resolved)
}
