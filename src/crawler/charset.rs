//! Response charset transcoding
//!
//! Pages are handed to the extraction stage as UTF-8 bytes. When the site
//! serves another encoding (GBK, Shift_JIS, ...) the configured charset
//! transcodes the raw body first.

use encoding_rs::{Encoding, UTF_8};
use std::borrow::Cow;

/// A decode step keyed by a WHATWG encoding label
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Charset {
    /// `None` means the body is already UTF-8 and passes through untouched
    encoding: Option<&'static Encoding>,
}

impl Charset {
    /// Looks up a charset by label (`gbk`, `shift_jis`, `utf-8`, ...)
    ///
    /// An empty label and every UTF-8 label mean pass-through. Returns `None`
    /// for labels that name no known encoding.
    ///
    /// # Examples
    ///
    /// ```
    /// use image_ripper::crawler::Charset;
    ///
    /// assert!(Charset::for_label("").unwrap().is_passthrough());
    /// assert!(Charset::for_label("UTF-8").unwrap().is_passthrough());
    /// assert_eq!(Charset::for_label("gbk").unwrap().name(), "GBK");
    /// assert!(Charset::for_label("klingon").is_none());
    /// ```
    pub fn for_label(label: &str) -> Option<Self> {
        let label = label.trim();
        if label.is_empty() {
            return Some(Self::default());
        }

        let encoding = Encoding::for_label(label.as_bytes())?;
        if encoding == UTF_8 {
            Some(Self::default())
        } else {
            Some(Self {
                encoding: Some(encoding),
            })
        }
    }

    /// Returns true if bodies are used as fetched
    pub fn is_passthrough(&self) -> bool {
        self.encoding.is_none()
    }

    /// Canonical name of the encoding
    pub fn name(&self) -> &'static str {
        self.encoding.unwrap_or(UTF_8).name()
    }

    /// Transcodes a body to UTF-8
    ///
    /// Malformed sequences are replaced with U+FFFD rather than failing the
    /// whole page.
    pub fn decode(&self, body: Vec<u8>) -> Vec<u8> {
        let Some(encoding) = self.encoding else {
            return body;
        };

        let (text, had_errors) = encoding.decode_without_bom_handling(&body);
        if had_errors {
            tracing::debug!("Replaced malformed {} sequences in body", encoding.name());
        }

        match text {
            Cow::Borrowed(text) => text.as_bytes().to_vec(),
            Cow::Owned(text) => text.into_bytes(),
        }
    }
}
