use crate::SEPARATOR;

/// Split a dotted path into its first segment and the remaining path.
///
/// Returns `None` when the path has no separator, i.e. it addresses a
/// top-level key.
pub fn split_head(path: &str) -> Option<(&str, &str)> {
    path.split_once(SEPARATOR)
}

/// Append `key` to an already dot-terminated `prefix`.
pub fn join(prefix: &str, key: &str) -> String {
    let mut out = String::with_capacity(prefix.len() + key.len());
    out.push_str(prefix);
    out.push_str(key);
    out
}

/// The prefix used for entries nested under `key`: `prefix + key + "."`.
pub fn child_prefix(prefix: &str, key: &str) -> String {
    let mut out = join(prefix, key);
    out.push(SEPARATOR);
    out
}

/// Check if a segment looks like a sequence index (digits only).
///
/// Leading zeros are accepted, which is how containers get reconstructed
/// from change paths.
pub fn is_index(segment: &str) -> bool {
    !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit())
}

/// Parse a segment as a canonical sequence index.
///
/// Only the form an array index is printed in is accepted: digits without
/// leading zeros, except `"0"` itself. `"01"` names no element.
pub fn parse_index(segment: &str) -> Option<usize> {
    if !is_index(segment) || (segment.len() > 1 && segment.starts_with('0')) {
        return None;
    }
    segment.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_head_on_first_separator() {
        assert_eq!(split_head("a.b.c"), Some(("a", "b.c")));
        assert_eq!(split_head("a"), None);
    }

    #[test]
    fn child_prefix_is_dot_terminated() {
        assert_eq!(child_prefix("", "a"), "a.");
        assert_eq!(child_prefix("a.", "b"), "a.b.");
        assert_eq!(join("a.b.", "c"), "a.b.c");
    }

    #[test]
    fn index_detection() {
        assert!(is_index("0"));
        assert!(is_index("007"));
        assert!(!is_index(""));
        assert!(!is_index("-1"));
        assert!(!is_index("1a"));
    }

    #[test]
    fn canonical_index_parsing() {
        assert_eq!(parse_index("0"), Some(0));
        assert_eq!(parse_index("12"), Some(12));
        assert_eq!(parse_index("01"), None);
        assert_eq!(parse_index("00"), None);
        assert_eq!(parse_index("+1"), None);
        assert_eq!(parse_index("99999999999999999999999"), None);
    }
}
