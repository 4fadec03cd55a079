//! Flattening node diffs into [`Changes`].

use json_overlay_path::{child_prefix, join};

use crate::changes::Changes;
use crate::overlay::Overlay;
use crate::tree::NodeId;

impl Overlay {
    /// Changes recorded at and below `id`, every path prefixed by `prefix`.
    ///
    /// Results are cached per prefix until the node or a descendant changes.
    pub(crate) fn changes_with_prefix(&mut self, id: NodeId, prefix: &str) -> Changes {
        if let Some(cached) = self.node(id).change_cache.get(prefix) {
            return cached.clone();
        }
        let mut changes = Changes::new();
        let node = self.node(id);
        if let Some(diff) = &node.diff {
            for (key, value) in &diff.assigned {
                changes.assign.insert(join(prefix, key), value.clone());
            }
            for key in &diff.removed {
                changes.remove.insert(join(prefix, key));
            }
        }
        let children: Vec<(String, NodeId)> = node
            .children
            .iter()
            .map(|(key, &child)| (key.clone(), child))
            .collect();
        for (key, child) in children {
            let nested = self.changes_with_prefix(child, &child_prefix(prefix, &key));
            changes.extend(nested);
        }
        self.node_mut(id)
            .change_cache
            .insert(prefix.to_string(), changes.clone());
        changes
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::{Changes, Overlay};

    #[test]
    fn nested_changes_use_dotted_paths() {
        let mut overlay = Overlay::new(json!({"a": {"b": {"c": 1, "d": 2}}, "e": [1, {"f": 1}]}));
        overlay.at(&["a", "b"]).unwrap().set("c", json!(10));
        overlay.at(&["a", "b"]).unwrap().remove("d");
        overlay.at(&["e", "1"]).unwrap().set("f", json!(2));
        assert_eq!(
            overlay.get_changes(),
            Changes::new()
                .with_assign("a.b.c", json!(10))
                .with_assign("e.1.f", json!(2))
                .with_remove("a.b.d")
        );
        assert_eq!(
            overlay.at(&["a"]).unwrap().get_changes(),
            Changes::new().with_assign("b.c", json!(10)).with_remove("b.d")
        );
    }

    #[test]
    fn prefixed_changes_are_cached_separately() {
        let mut overlay = Overlay::new(json!({"a": 1}));
        overlay.set("a", json!(2));
        let plain = overlay.get_changes();
        let prefixed = overlay.root().get_changes_prefixed("x.");
        assert_eq!(plain, Changes::new().with_assign("a", json!(2)));
        assert_eq!(prefixed, Changes::new().with_assign("x.a", json!(2)));
        assert_eq!(overlay.node(overlay.root_id()).change_cache.len(), 2);
    }

    #[test]
    fn writes_below_invalidate_cached_changes_above() {
        let mut overlay = Overlay::new(json!({"a": {"b": 1}}));
        assert!(overlay.get_changes().is_empty());
        overlay.at(&["a"]).unwrap().set("b", json!(2));
        assert_eq!(overlay.get_changes(), Changes::new().with_assign("a.b", json!(2)));
        overlay.at(&["a"]).unwrap().set("b", json!(1));
        assert!(overlay.get_changes().is_empty());
    }
}
