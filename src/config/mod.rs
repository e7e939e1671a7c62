//! Configuration module for Image-Ripper
//!
//! This module handles loading, parsing, and validating the rule file. JSON
//! (with `/* */` comments) and TOML are accepted; both deserialize into the
//! same [`RawConfig`] shape, which is then validated and compiled into a
//! [`Config`].
//!
//! # Example
//!
//! ```no_run
//! use image_ripper::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("conf/config.json")).unwrap();
//! println!("Saving images under {}", config.save_root.display());
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, CrawlerConfig, ExtractionRule, FolderPolicy, LinkRule, OutputConfig, ProxyConfig,
    ProxySettings, RawConfig, RawImageRule, RawLinkRule, RuleGroups,
};

// Re-export parser functions
pub use parser::{
    compute_config_hash, load_config, load_config_with_hash, parse_config, ConfigFormat,
};
pub use validation::validate;
