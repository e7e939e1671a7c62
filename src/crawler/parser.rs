//! HTML query capability
//!
//! The extraction stage only needs one thing from an HTML library: given a
//! document, a CSS selector and an attribute name, list the attribute values
//! of the matching elements. [`HtmlQuery`] is that seam; [`ScraperQuery`] is
//! the default implementation backed by `scraper`.

use crate::QueryError;
use scraper::{Html, Selector};

/// Selects attribute values out of an HTML document
pub trait HtmlQuery: Send + Sync {
    /// Returns one entry per element matching `selector`, in document order
    ///
    /// The entry is the trimmed value of `attr`, or `None` when the element
    /// lacks the attribute or its value is blank. Elements without a value
    /// still occupy their position, so indexes match the selection.
    fn select_attr(
        &self,
        body: &[u8],
        selector: &str,
        attr: &str,
    ) -> Result<Vec<Option<String>>, QueryError>;
}

/// [`HtmlQuery`] implemented with `scraper`
///
/// The body is decoded lossily as UTF-8; transcoding from other charsets
/// happens before extraction.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScraperQuery;

impl HtmlQuery for ScraperQuery {
    fn select_attr(
        &self,
        body: &[u8],
        selector: &str,
        attr: &str,
    ) -> Result<Vec<Option<String>>, QueryError> {
        let selector =
            Selector::parse(selector).map_err(|_| QueryError::InvalidSelector(selector.to_string()))?;
        let html = String::from_utf8_lossy(body);
        let document = Html::parse_document(&html);

        let values = document
            .select(&selector)
            .map(|element| {
                element
                    .value()
                    .attr(attr)
                    .map(str::trim)
                    .filter(|value| !value.is_empty())
                    .map(str::to_string)
            })
            .collect();

        Ok(values)
    }
}
