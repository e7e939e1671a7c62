use regex::Regex;

/// Checks whether a URL satisfies a set of URL patterns
///
/// An empty pattern list is permissive and matches every URL. Otherwise the
/// URL matches when any pattern matches; evaluation stops at the first hit.
///
/// # Examples
///
/// ```
/// use image_ripper::url::matches_any;
/// use regex::Regex;
///
/// assert!(matches_any("http://example.com/post/1", &[]));
///
/// let patterns = vec![Regex::new("/post/").unwrap()];
/// assert!(matches_any("http://example.com/post/1", &patterns));
/// assert!(!matches_any("http://example.com/tag/1", &patterns));
/// ```
pub fn matches_any(url: &str, patterns: &[Regex]) -> bool {
    patterns.is_empty() || patterns.iter().any(|pattern| pattern.is_match(url))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn patterns(sources: &[&str]) -> Vec<Regex> {
        sources.iter().map(|s| Regex::new(s).unwrap()).collect()
    }

    #[test]
    fn test_empty_matches_everything() {
        assert!(matches_any("http://example.com/", &[]));
        assert!(matches_any("", &[]));
    }

    #[test]
    fn test_single_pattern() {
        let list = patterns(&[r"/post/\d+$"]);
        assert!(matches_any("http://example.com/post/42", &list));
        assert!(!matches_any("http://example.com/post/abc", &list));
    }

    #[test]
    fn test_any_pattern_matches() {
        let list = patterns(&["/gallery/", "/album/"]);
        assert!(matches_any("http://example.com/album/3", &list));
        assert!(matches_any("http://example.com/gallery/x", &list));
        assert!(!matches_any("http://example.com/about", &list));
    }

    #[test]
    fn test_unanchored_by_default() {
        let list = patterns(&["example"]);
        assert!(matches_any("http://www.example.com/", &list));
    }
}
