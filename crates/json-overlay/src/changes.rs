//! Flattened change descriptions.
//!
//! A [`Changes`] value is the wire form of an overlay's diff: assignments and
//! removals keyed by dotted paths, shaped like a MongoDB update document:
//!
//! ```json
//! { "$set": { "a": 2, "b.z": 3 }, "$unset": { "b.y": true } }
//! ```
//!
//! Both groups are omitted when empty.

use indexmap::{IndexMap, IndexSet};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::OverlayError;

/// Assignments and removals keyed by dotted paths.
///
/// Equality ignores entry order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Changes {
    #[serde(rename = "$set", default, skip_serializing_if = "IndexMap::is_empty")]
    pub assign: IndexMap<String, Value>,
    #[serde(
        rename = "$unset",
        default,
        skip_serializing_if = "IndexSet::is_empty",
        with = "unset_flags"
    )]
    pub remove: IndexSet<String>,
}

impl Changes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an assignment, replacing a previous one for the same path.
    pub fn with_assign(mut self, path: impl Into<String>, value: Value) -> Self {
        self.assign.insert(path.into(), value);
        self
    }

    /// Adds a removal.
    pub fn with_remove(mut self, path: impl Into<String>) -> Self {
        self.remove.insert(path.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.assign.is_empty() && self.remove.is_empty()
    }

    /// Moves all entries of `other` into `self`. Later entries win.
    pub fn extend(&mut self, other: Changes) {
        self.assign.extend(other.assign);
        self.remove.extend(other.remove);
    }

    /// Keeps only the entries whose path matches `pattern`.
    pub fn filter(&self, pattern: &PathPattern) -> Changes {
        filter_changes(self, pattern)
    }

    /// Decodes the `{"$set": ..., "$unset": ...}` wire form.
    pub fn from_json(value: &Value) -> Result<Changes, OverlayError> {
        Changes::deserialize(value).map_err(|e| OverlayError::InvalidChanges(e.to_string()))
    }

    /// Encodes into the `{"$set": ..., "$unset": ...}` wire form.
    pub fn to_json(&self) -> Value {
        let mut out = serde_json::Map::new();
        if !self.assign.is_empty() {
            let set = self
                .assign
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect();
            out.insert("$set".to_string(), Value::Object(set));
        }
        if !self.remove.is_empty() {
            let unset = self
                .remove
                .iter()
                .map(|k| (k.clone(), Value::Bool(true)))
                .collect();
            out.insert("$unset".to_string(), Value::Object(unset));
        }
        Value::Object(out)
    }
}

/// Selects change paths, either by substring or by regular expression.
#[derive(Debug, Clone)]
pub enum PathPattern {
    /// Matches paths containing the string.
    Literal(String),
    /// Matches paths the expression finds a match in.
    Regex(Regex),
}

impl PathPattern {
    /// Compiles a regular-expression pattern.
    pub fn regex(source: &str) -> Result<Self, regex::Error> {
        Regex::new(source).map(PathPattern::Regex)
    }

    pub fn matches(&self, path: &str) -> bool {
        match self {
            PathPattern::Literal(needle) => path.contains(needle.as_str()),
            PathPattern::Regex(re) => re.is_match(path),
        }
    }
}

impl From<&str> for PathPattern {
    fn from(literal: &str) -> Self {
        PathPattern::Literal(literal.to_string())
    }
}

impl From<String> for PathPattern {
    fn from(literal: String) -> Self {
        PathPattern::Literal(literal)
    }
}

impl From<Regex> for PathPattern {
    fn from(re: Regex) -> Self {
        PathPattern::Regex(re)
    }
}

/// Returns the entries of `changes` whose path matches `pattern`.
///
/// Groups left without entries are omitted, like everywhere else.
pub fn filter_changes(changes: &Changes, pattern: &PathPattern) -> Changes {
    Changes {
        assign: changes
            .assign
            .iter()
            .filter(|(path, _)| pattern.matches(path))
            .map(|(path, value)| (path.clone(), value.clone()))
            .collect(),
        remove: changes
            .remove
            .iter()
            .filter(|path| pattern.matches(path))
            .cloned()
            .collect(),
    }
}

/// `$unset` is a map of `path -> true` on the wire and a set in memory.
mod unset_flags {
    use indexmap::{IndexMap, IndexSet};
    use serde::{Deserialize, Deserializer, Serializer};
    use serde_json::Value;

    pub(super) fn serialize<S: Serializer>(paths: &IndexSet<String>, s: S) -> Result<S::Ok, S::Error> {
        s.collect_map(paths.iter().map(|path| (path, true)))
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<IndexSet<String>, D::Error> {
        // Stores accept any flag value here (`true`, `1`, `""`), only keys matter.
        let flags = IndexMap::<String, Value>::deserialize(d)?;
        Ok(flags.into_keys().collect())
    }
}
