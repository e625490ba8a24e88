//! Utility functions for string formatting and file system operations.
//!
//! This module provides helper functions used throughout the application:
//! - String truncation for logging model output
//! - Humanizing slugs back into display titles for the index
//! - File system validation and atomic writes

use crate::error::{GeneratorError, Result};
use std::path::Path;
use tokio::fs;
use tracing::{debug, info, instrument};

/// Truncate a string for logging purposes.
///
/// Long strings are cut to at most `max` bytes (on a character boundary) with
/// an ellipsis and a count of the dropped bytes appended.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// assert_eq!(truncate_for_log(&"a".repeat(500), 10), "aaaaaaaaaa…(+490 bytes)");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}…(+{} bytes)", &s[..end], s.len() - end)
}

/// Turn a slug or directory name back into a display title.
///
/// Underscores become spaces; a letter is upper-cased when it does not follow
/// another letter and lower-cased otherwise.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(humanize_slug("kmp_algorithm_1"), "Kmp Algorithm 1");
/// assert_eq!(humanize_slug("day_001"), "Day 001");
/// ```
pub fn humanize_slug(slug: &str) -> String {
    let mut out = String::with_capacity(slug.len());
    let mut prev_is_letter = false;
    for c in slug.chars() {
        let c = if c == '_' { ' ' } else { c };
        if c.is_alphabetic() {
            if prev_is_letter {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_is_letter = true;
        } else {
            out.push(c);
            prev_is_letter = false;
        }
    }
    out
}

/// Ensure a directory exists and is writable.
///
/// Creates the directory if needed, then creates and removes a probe file.
///
/// # Errors
///
/// [`GeneratorError::Io`] if the directory cannot be created or written to.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn ensure_writable_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path)
        .await
        .map_err(|e| GeneratorError::io(path, e))?;

    let probe_path = path.join("..__probe_write__");
    fs::write(&probe_path, b"")
        .await
        .map_err(|e| GeneratorError::io(&probe_path, e))?;
    let _ = fs::remove_file(&probe_path).await;
    info!("Output directory is writable");
    Ok(())
}

/// Write `contents` to `path` by writing a sibling temp file and renaming it
/// over the target. Parent directories are created as needed. The temp file
/// is removed if the rename fails.
pub async fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .await
            .map_err(|e| GeneratorError::io(parent, e))?;
    }

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let temp = path.with_file_name(format!(".{file_name}.tmp"));

    fs::write(&temp, contents)
        .await
        .map_err(|e| GeneratorError::io(&temp, e))?;
    if let Err(e) = fs::rename(&temp, path).await {
        let _ = fs::remove_file(&temp).await;
        return Err(GeneratorError::io(path, e));
    }

    debug!(path = %path.display(), size = contents.len(), "Wrote file");
    Ok(())
}
