//! Target folder and file naming for downloaded images

use crate::config::FolderPolicy;
use crate::url::last_path_segment;
use regex::bytes::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use url::Url;

/// Characters that cannot appear in a folder or file name
const INVALID_NAME_CHARS: &[char] = &['\\', '/', '*', '?', ':', '>', '<', '|'];

fn title_pattern() -> &'static Regex {
    static TITLE: OnceLock<Regex> = OnceLock::new();
    TITLE.get_or_init(|| {
        Regex::new(r"(?i)<title[^>]*>([^<>]+)</title>").expect("title pattern is valid")
    })
}

/// Removes filesystem-invalid characters and surrounding whitespace
pub fn sanitize_name(name: &str) -> String {
    name.chars()
        .filter(|c| !INVALID_NAME_CHARS.contains(c) && !c.is_control())
        .collect::<String>()
        .trim()
        .to_string()
}

/// Resolves the folder the images of one rule on one page are saved in
///
/// The folder is created if needed. Every fallback (no title, no pattern
/// match, a name that sanitizes to nothing, a directory that cannot be
/// created) lands in `save_root`.
pub fn resolve_folder(
    policy: &FolderPolicy,
    page_url: &Url,
    body: &[u8],
    save_root: &Path,
) -> PathBuf {
    let name = match policy {
        FolderPolicy::None => return save_root.to_path_buf(),
        FolderPolicy::UseUrl => Some(last_path_segment(page_url).unwrap_or("root").to_string()),
        FolderPolicy::UseTitle => title_pattern()
            .captures(body)
            .and_then(|caps| caps.get(1))
            .map(|m| String::from_utf8_lossy(m.as_bytes()).into_owned()),
        FolderPolicy::Pattern(pattern) => pattern
            .find(body)
            .map(|m| String::from_utf8_lossy(m.as_bytes()).into_owned()),
    };

    let Some(name) = name.map(|n| sanitize_name(&n)) else {
        tracing::debug!("No folder name found on {}, using save root", page_url);
        return save_root.to_path_buf();
    };
    if name.is_empty() || name == "." || name == ".." {
        return save_root.to_path_buf();
    }

    let folder = save_root.join(&name);
    match std::fs::create_dir_all(&folder) {
        Ok(()) => folder,
        Err(e) => {
            tracing::warn!("Failed to create folder {}: {}", folder.display(), e);
            save_root.to_path_buf()
        }
    }
}

/// Builds the deterministic file name of an image
///
/// `<page-stem>_<ordinal><ext>`: the page's last path segment (`root` for the
/// site root), the index of the value in the selection result, and the
/// extension of the image URL's last path segment.
pub fn image_file_name(page_url: &Url, image_url: &Url, ordinal: usize) -> String {
    let stem = last_path_segment(page_url)
        .map(sanitize_name)
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "root".to_string());

    let ext = last_path_segment(image_url)
        .and_then(|segment| segment.rfind('.').map(|i| &segment[i..]))
        .filter(|ext| ext.len() > 1)
        .map(sanitize_name)
        .unwrap_or_default();

    format!("{}_{}{}", stem, ordinal, ext)
}
