//! Dotted change-path utilities.
//!
//! Change descriptions produced by an overlay address values with dotted
//! paths such as `"b.items.0.name"`. Segments are joined with `.`; a segment
//! made only of digits stands for a sequence index, but the path itself
//! carries no type tag.
//!
//! # Example
//!
//! ```
//! use json_overlay_path::{format_path, get, parse_path, split_head};
//!
//! let path = parse_path("a.b.0").unwrap();
//! assert_eq!(path, vec!["a", "b", "0"]);
//! assert_eq!(format_path(&path), "a.b.0");
//!
//! assert_eq!(split_head("a.b.0"), Some(("a", "b.0")));
//! assert_eq!(split_head("a"), None);
//!
//! let doc = serde_json::json!({"a": {"b": [42]}});
//! assert_eq!(get(&doc, &path), Some(&serde_json::json!(42)));
//! ```

use thiserror::Error;

pub mod get;
pub mod types;
pub mod util;

pub use get::{get, get_key, get_key_mut, has_key, own_keys};
pub use types::{Path, Segment};
pub use util::{child_prefix, is_index, join, parse_index, split_head};

/// Separator between the segments of a dotted path.
pub const SEPARATOR: char = '.';

/// Errors produced while parsing dotted paths.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PathError {
    #[error("EMPTY_PATH")]
    EmptyPath,
    #[error("EMPTY_SEGMENT: {0}")]
    EmptySegment(String),
}

/// Parse a dotted path into its segments.
///
/// Unlike JSON Pointer there is no escaping: a key containing `.` cannot be
/// addressed by a dotted path.
///
/// # Errors
///
/// - `PathError::EmptyPath` for `""`
/// - `PathError::EmptySegment` for paths like `"a..b"`, `".a"` or `"a."`
///
/// # Example
///
/// ```
/// use json_overlay_path::{parse_path, PathError};
///
/// assert_eq!(parse_path("x").unwrap(), vec!["x"]);
/// assert_eq!(parse_path("a..b"), Err(PathError::EmptySegment("a..b".to_string())));
/// ```
pub fn parse_path(path: &str) -> Result<Path, PathError> {
    if path.is_empty() {
        return Err(PathError::EmptyPath);
    }
    let segments: Path = path.split(SEPARATOR).map(str::to_string).collect();
    if segments.iter().any(String::is_empty) {
        return Err(PathError::EmptySegment(path.to_string()));
    }
    Ok(segments)
}

/// Format segments back into a dotted path.
///
/// Returns an empty string for the root path.
pub fn format_path(path: &[Segment]) -> String {
    path.join(".")
}
