//! Replaying [`Changes`] onto an overlay tree.
//!
//! Top-level paths are written into the node's diff directly. Dotted paths
//! are grouped by their first segment into buckets, and each bucket goes to
//! the first place that can hold it:
//!
//! 1. a container value already assigned at that key, edited in place;
//! 2. a nested object of the target, merged recursively into its node;
//! 3. a brand-new object built from the bucket's plain keys.
//!
//! Anything else is an [`OverlayError::InvalidModifier`].

use indexmap::IndexMap;
use json_overlay_path::{child_prefix, get_key, has_key, join, parse_path, split_head, Path};
use json_overlay_util::{deep_equal, deep_remove, deep_set, is_container};
use serde_json::{Map, Value};

use crate::changes::Changes;
use crate::error::OverlayError;
use crate::overlay::Overlay;
use crate::tree::{Layer, NodeId};

/// Nesting below an assigned container that a bucket may reach.
const MAX_IN_PLACE_DEPTH: usize = 2;

impl Overlay {
    /// Merges `changes` into the node, then marks it changed, whether or not
    /// every bucket could be applied. Empty changes leave the node alone.
    pub(crate) fn merge_node(&mut self, id: NodeId, changes: &Changes, ignore_errors: bool) -> Result<(), OverlayError> {
        if changes.is_empty() {
            return Ok(());
        }
        let result = self.merge_entries(id, changes, ignore_errors);
        self.mark_changed(id);
        result
    }

    fn merge_entries(&mut self, id: NodeId, changes: &Changes, ignore_errors: bool) -> Result<(), OverlayError> {
        let mut buckets: IndexMap<&str, Changes> = IndexMap::new();
        for (path, value) in &changes.assign {
            match split_head(path) {
                Some((head, rest)) => {
                    buckets
                        .entry(head)
                        .or_default()
                        .assign
                        .insert(rest.to_string(), value.clone());
                }
                None => self.merge_assign(id, path, value.clone()),
            }
        }
        for path in &changes.remove {
            match split_head(path) {
                Some((head, rest)) => {
                    buckets.entry(head).or_default().remove.insert(rest.to_string());
                }
                None => self.merge_remove(id, path),
            }
        }
        for (head, bucket) in &buckets {
            match self.merge_bucket(id, head, bucket, ignore_errors) {
                Ok(()) => {}
                Err(err) if ignore_errors => {
                    log::debug!("dropping unmergeable changes under {head:?}: {err}");
                }
                Err(err) => return Err(err),
            }
        }
        Ok(())
    }

    fn merge_assign(&mut self, id: NodeId, key: &str, value: Value) {
        self.node_mut(id).clear_untracked(key);
        self.drop_child(id, key);
        let original = get_key(self.target_of(id), key).is_some_and(|orig| deep_equal(orig, &value));
        if original {
            if let Some(diff) = self.node_mut(id).diff.as_mut() {
                diff.clear(key);
            }
            return;
        }
        self.diff_mut(id, Layer::Tracked).assign(key, value);
    }

    fn merge_remove(&mut self, id: NodeId, key: &str) {
        self.node_mut(id).clear_untracked(key);
        self.drop_child(id, key);
        let in_target = has_key(self.target_of(id), key);
        let diff = self.diff_mut(id, Layer::Tracked);
        if in_target {
            diff.mark_removed(key);
        } else {
            diff.assigned.shift_remove(key);
        }
    }

    fn merge_bucket(&mut self, id: NodeId, head: &str, bucket: &Changes, ignore_errors: bool) -> Result<(), OverlayError> {
        let diff = self.node(id).diff.as_ref();
        let assigned_container = diff
            .and_then(|diff| diff.assigned.get(head))
            .is_some_and(is_container);
        let pending = diff.is_some_and(|diff| diff.assigned.contains_key(head) || diff.removed.contains(head));
        let nested = get_key(self.target_of(id), head).is_some_and(is_container);

        if assigned_container {
            return self.merge_into_assigned(id, head, bucket);
        }
        if nested && !pending {
            let child = self.child_for(id, head);
            return self.merge_node(child, bucket, ignore_errors);
        }

        log::warn!(
            "no object to merge into at {:?}, building one from {} change(s)",
            head,
            bucket.assign.len() + bucket.remove.len()
        );
        let literal = bucket.remove.is_empty()
            && !bucket.assign.is_empty()
            && bucket.assign.keys().all(|key| split_head(key).is_none());
        if !literal {
            return Err(OverlayError::invalid_modifier(
                head,
                "nested changes have no object to apply to",
            ));
        }
        let object: Map<String, Value> = bucket
            .assign
            .iter()
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        self.merge_assign(id, head, Value::Object(object));
        Ok(())
    }

    /// Edits a container that is itself a pending assignment.
    ///
    /// The edits go to a copy, so a rejected bucket leaves the assigned
    /// value untouched.
    fn merge_into_assigned(&mut self, id: NodeId, head: &str, bucket: &Changes) -> Result<(), OverlayError> {
        let full = |rest: &str| join(&child_prefix("", head), rest);
        let segments = |rest: &str| -> Result<Path, OverlayError> {
            let path = parse_path(rest).map_err(|err| OverlayError::invalid_modifier(full(rest), err.to_string()))?;
            if path.len() > MAX_IN_PLACE_DEPTH {
                return Err(OverlayError::invalid_modifier(
                    full(rest),
                    "too deep below an assigned value",
                ));
            }
            Ok(path)
        };
        let assigns = bucket
            .assign
            .iter()
            .map(|(rest, value)| Ok((rest.as_str(), segments(rest.as_str())?, value)))
            .collect::<Result<Vec<_>, OverlayError>>()?;
        let removes = bucket
            .remove
            .iter()
            .map(|rest| segments(rest.as_str()))
            .collect::<Result<Vec<_>, OverlayError>>()?;

        let Some(mut edited) = self
            .node(id)
            .diff
            .as_ref()
            .and_then(|diff| diff.assigned.get(head))
            .cloned()
        else {
            return Ok(());
        };
        for (rest, path, value) in assigns {
            if !deep_set(&mut edited, &path, value.clone()) {
                return Err(OverlayError::invalid_modifier(
                    full(rest),
                    "path does not fit the assigned value",
                ));
            }
        }
        for path in removes {
            deep_remove(&mut edited, &path);
        }
        self.diff_mut(id, Layer::Tracked).assign(head, edited);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn buckets_group_by_head_key() {
        let mut overlay = Overlay::new(json!({"a": {"x": 1, "y": 2}, "b": 1}));
        let changes = Changes::new()
            .with_assign("a.x", json!(5))
            .with_assign("b", json!(2))
            .with_remove("a.y");
        overlay.merge_changes(&changes, false).unwrap();
        assert_eq!(overlay.get_changes(), changes);
        assert_eq!(overlay.unwrap(), json!({"a": {"x": 5}, "b": 2}));
    }

    #[test]
    fn rejected_in_place_bucket_leaves_the_value_alone() {
        let mut overlay = Overlay::new(json!({}));
        overlay.set("a", json!({"b": {}}));
        let changes = Changes::new()
            .with_assign("a.b.c", json!(1))
            .with_assign("a.b.c.d", json!(2));
        let err = overlay.merge_changes(&changes, false).unwrap_err();
        assert_eq!(
            err,
            OverlayError::invalid_modifier("a.b.c.d", "too deep below an assigned value")
        );
        assert_eq!(overlay.get_value("a"), Some(json!({"b": {}})));
    }

    #[test]
    fn literal_object_needs_plain_assignments() {
        let mut overlay = Overlay::new(json!({}));
        overlay
            .merge_changes(&Changes::new().with_assign("n.a", json!(1)).with_assign("n.b", json!(2)), false)
            .unwrap();
        assert_eq!(overlay.get_value("n"), Some(json!({"a": 1, "b": 2})));

        let nested = Changes::new().with_assign("m.a.b", json!(1));
        assert!(matches!(
            overlay.merge_changes(&nested, false),
            Err(OverlayError::InvalidModifier { .. })
        ));
        let removal = Changes::new().with_remove("m.a");
        assert!(overlay.merge_changes(&removal, false).is_err());
        assert!(overlay.merge_changes(&removal, true).is_ok());
    }
}
