//! The overlay tree: an arena of nodes owned by their parents.
//!
//! A parent owns its children through a keyed map of ids; the `parent` id
//! stored on every node is only used to walk upwards when a change has to be
//! propagated. Discarded subtrees give their slots back to a free list, and
//! slot generations keep stale [`NodeId`]s from aliasing recycled slots.

use std::collections::HashMap;
use std::slice;

use indexmap::{IndexMap, IndexSet};
use json_overlay_path::get;
use serde_json::Value;

use crate::accessor::Resolved;
use crate::changes::Changes;
use crate::overlay::Overlay;

static MISSING: Value = Value::Null;

/// Identifies a node of one overlay tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId {
    index: usize,
    generation: u32,
}

pub(crate) const ROOT: NodeId = NodeId {
    index: 0,
    generation: 0,
};

/// Pending writes of one node.
///
/// A key is in at most one of `assigned` and `removed`.
#[derive(Debug, Clone, Default)]
pub(crate) struct Diff {
    pub(crate) assigned: IndexMap<String, Value>,
    pub(crate) removed: IndexSet<String>,
}

impl Diff {
    pub(crate) fn assign(&mut self, key: &str, value: Value) {
        self.removed.shift_remove(key);
        self.assigned.insert(key.to_string(), value);
    }

    pub(crate) fn mark_removed(&mut self, key: &str) {
        self.assigned.shift_remove(key);
        self.removed.insert(key.to_string());
    }

    /// Forgets any pending entry for `key`. Returns whether there was one.
    pub(crate) fn clear(&mut self, key: &str) -> bool {
        let assigned = self.assigned.shift_remove(key).is_some();
        let removed = self.removed.shift_remove(key);
        assigned || removed
    }
}

/// Which diff of a node a pending entry lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Layer {
    Tracked,
    Untracked,
}

/// The pending state of a key, if it does not fall through to the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Pending {
    Removed,
    Assigned(Layer),
}

#[derive(Debug, Default)]
pub(crate) struct Node {
    /// Keys leading from the root target to this node's target.
    pub(crate) path: Vec<String>,
    pub(crate) parent: Option<NodeId>,
    pub(crate) diff: Option<Diff>,
    pub(crate) untracked: Option<Diff>,
    pub(crate) untracked_scope: bool,
    pub(crate) children: IndexMap<String, NodeId>,
    pub(crate) changed: bool,
    pub(crate) change_cache: HashMap<String, Changes>,
}

impl Node {
    pub(crate) fn layer(&self, layer: Layer) -> Option<&Diff> {
        match layer {
            Layer::Tracked => self.diff.as_ref(),
            Layer::Untracked => self.untracked.as_ref(),
        }
    }

    /// Untracked entries shadow tracked ones; a tracked write clears the
    /// untracked entry for its key, so the latest write always wins.
    pub(crate) fn pending(&self, key: &str) -> Option<Pending> {
        [Layer::Untracked, Layer::Tracked].into_iter().find_map(|layer| {
            let diff = self.layer(layer)?;
            if diff.removed.contains(key) {
                Some(Pending::Removed)
            } else if diff.assigned.contains_key(key) {
                Some(Pending::Assigned(layer))
            } else {
                None
            }
        })
    }

    pub(crate) fn pending_value(&self, key: &str, layer: Layer) -> Option<&Value> {
        self.layer(layer)?.assigned.get(key)
    }

    pub(crate) fn clear_untracked(&mut self, key: &str) {
        if let Some(diff) = self.untracked.as_mut() {
            diff.clear(key);
        }
    }
}

#[derive(Debug, Default)]
struct Slot {
    generation: u32,
    live: bool,
    node: Node,
}

#[derive(Debug)]
pub(crate) struct Arena {
    slots: Vec<Slot>,
    free: Vec<usize>,
}

impl Arena {
    pub(crate) fn with_root() -> Self {
        Self {
            slots: vec![Slot {
                generation: ROOT.generation,
                live: true,
                node: Node::default(),
            }],
            free: Vec::new(),
        }
    }

    pub(crate) fn is_live(&self, id: NodeId) -> bool {
        self.slots
            .get(id.index)
            .is_some_and(|slot| slot.live && slot.generation == id.generation)
    }

    pub(crate) fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    fn alloc(&mut self, node: Node) -> NodeId {
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index];
            slot.generation = slot.generation.wrapping_add(1);
            slot.live = true;
            slot.node = node;
            return NodeId {
                index,
                generation: slot.generation,
            };
        }
        self.slots.push(Slot {
            generation: 0,
            live: true,
            node,
        });
        NodeId {
            index: self.slots.len() - 1,
            generation: 0,
        }
    }

    fn release(&mut self, id: NodeId) -> Node {
        let slot = &mut self.slots[id.index];
        slot.live = false;
        self.free.push(id.index);
        std::mem::take(&mut slot.node)
    }
}

impl Overlay {
    pub(crate) fn node(&self, id: NodeId) -> &Node {
        &self.nodes.slots[id.index].node
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes.slots[id.index].node
    }

    /// The part of the original value a node overlays.
    pub(crate) fn target_of(&self, id: NodeId) -> &Value {
        get(&self.target, &self.node(id).path).unwrap_or(&MISSING)
    }

    pub(crate) fn diff_mut(&mut self, id: NodeId, layer: Layer) -> &mut Diff {
        let node = self.node_mut(id);
        match layer {
            Layer::Tracked => node.diff.get_or_insert_with(Diff::default),
            Layer::Untracked => node.untracked.get_or_insert_with(Diff::default),
        }
    }

    /// Returns the cached child for `key`, creating it on first traversal.
    ///
    /// Callers make sure the target holds a container at `key`.
    pub(crate) fn child_for(&mut self, id: NodeId, key: &str) -> NodeId {
        if let Some(&child) = self.node(id).children.get(key) {
            return child;
        }
        let mut path = self.node(id).path.clone();
        path.push(key.to_string());
        let child = self.nodes.alloc(Node {
            path,
            parent: Some(id),
            ..Node::default()
        });
        self.node_mut(id).children.insert(key.to_string(), child);
        child
    }

    /// Discards the child for `key` and its whole subtree.
    pub(crate) fn drop_child(&mut self, id: NodeId, key: &str) -> bool {
        match self.node_mut(id).children.shift_remove(key) {
            Some(child) => {
                self.release_subtree(child);
                true
            }
            None => false,
        }
    }

    pub(crate) fn drop_children(&mut self, id: NodeId) {
        let children = std::mem::take(&mut self.node_mut(id).children);
        for child in children.into_values() {
            self.release_subtree(child);
        }
    }

    fn release_subtree(&mut self, id: NodeId) {
        let node = self.nodes.release(id);
        for child in node.children.into_values() {
            self.release_subtree(child);
        }
    }

    /// Whether writes at `id` are recorded, i.e. no node on the way to the
    /// root is inside an untracked scope.
    pub(crate) fn is_tracked(&self, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(id) = current {
            let node = self.node(id);
            if node.untracked_scope {
                return false;
            }
            current = node.parent;
        }
        true
    }

    /// Marks `id` and every ancestor changed and drops their cached change
    /// descriptions.
    pub(crate) fn mark_changed(&mut self, id: NodeId) {
        let mut current = Some(id);
        while let Some(id) = current {
            let node = self.node_mut(id);
            node.changed = true;
            node.change_cache.clear();
            current = node.parent;
        }
    }

    /// Drops the cached change descriptions of `id` and every ancestor
    /// without marking anything changed.
    pub(crate) fn invalidate_changes(&mut self, id: NodeId) {
        let mut current = Some(id);
        while let Some(id) = current {
            let node = self.node_mut(id);
            node.change_cache.clear();
            current = node.parent;
        }
    }

    /// Prototype name of the node's target, if any.
    pub(crate) fn class_of(&self, id: NodeId) -> Option<String> {
        self.target_of(id)
            .get(&self.config.type_key)
            .and_then(Value::as_str)
            .map(str::to_string)
    }

    /// Accessors for `key` on the node's prototype chain.
    ///
    /// A key the target owns as plain data shadows any accessor.
    pub(crate) fn accessor(&mut self, id: NodeId, key: &str) -> Resolved {
        if !self.config.accessors || self.prototypes.is_empty() {
            return Resolved::default();
        }
        if json_overlay_path::has_key(self.target_of(id), key) {
            return Resolved::default();
        }
        let Some(class) = self.class_of(id) else {
            return Resolved::default();
        };
        self.accessors.resolve(&self.prototypes, &class, key)
    }

    /// Writes the node's recorded state onto `base`, a copy of (or the very)
    /// target of the node: children first, then tracked entries, then
    /// untracked entries, matching read precedence.
    pub(crate) fn apply_node(&self, id: NodeId, base: &mut Value) {
        let node = self.node(id);
        for (key, &child) in &node.children {
            if let Some(slot) = json_overlay_path::get_key_mut(base, key) {
                self.apply_node(child, slot);
            }
        }
        for diff in [node.diff.as_ref(), node.untracked.as_ref()].into_iter().flatten() {
            for (key, value) in &diff.assigned {
                json_overlay_util::deep_set(base, slice::from_ref(key), value.clone());
            }
            for key in &diff.removed {
                json_overlay_util::deep_remove(base, slice::from_ref(key));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn diff_keeps_keys_in_one_group() {
        let mut diff = Diff::default();
        diff.assign("a", json!(1));
        diff.mark_removed("a");
        assert!(!diff.assigned.contains_key("a"));
        assert!(diff.removed.contains("a"));
        diff.assign("a", json!(2));
        assert!(!diff.removed.contains("a"));
        assert!(diff.clear("a"));
        assert!(!diff.clear("a"));
    }

    #[test]
    fn untracked_entries_shadow_tracked_ones() {
        let mut node = Node::default();
        node.diff.get_or_insert_with(Diff::default).mark_removed("k");
        assert_eq!(node.pending("k"), Some(Pending::Removed));
        node.untracked.get_or_insert_with(Diff::default).assign("k", json!(1));
        assert_eq!(node.pending("k"), Some(Pending::Assigned(Layer::Untracked)));
        node.clear_untracked("k");
        assert_eq!(node.pending("k"), Some(Pending::Removed));
        assert_eq!(node.pending("other"), None);
    }

    #[test]
    fn recycled_slots_get_new_generations() {
        let mut arena = Arena::with_root();
        let first = arena.alloc(Node::default());
        arena.release(first);
        let second = arena.alloc(Node::default());
        assert_eq!(first.index, second.index);
        assert!(!arena.is_live(first));
        assert!(arena.is_live(second));
        assert!(arena.is_live(ROOT));
        assert_eq!(arena.len(), 2);
    }

    #[test]
    fn dropping_a_child_releases_its_subtree() {
        let mut overlay = Overlay::new(json!({"a": {"b": {"c": 1}}}));
        let a = overlay.child_for(ROOT, "a");
        let b = overlay.child_for(a, "b");
        assert_eq!(overlay.nodes.len(), 3);
        assert!(overlay.drop_child(ROOT, "a"));
        assert_eq!(overlay.nodes.len(), 1);
        assert!(!overlay.nodes.is_live(b));
        assert!(!overlay.drop_child(ROOT, "a"));
    }

    #[test]
    fn child_targets_follow_the_path() {
        let mut overlay = Overlay::new(json!({"a": [{"b": 1}]}));
        let a = overlay.child_for(ROOT, "a");
        let first = overlay.child_for(a, "0");
        assert_eq!(overlay.target_of(first), &json!({"b": 1}));
        assert_eq!(overlay.child_for(a, "0"), first);
    }
}
