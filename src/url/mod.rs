//! URL handling module for Image-Ripper
//!
//! This module provides link resolution, URL pattern matching, and the
//! single-host scope check.

mod domain;
mod matcher;
mod resolve;

// Re-export main functions
pub use domain::{last_path_segment, same_host};
pub use matcher::matches_any;
pub use resolve::resolve_href;
