//! Handles on overlay nodes.
//!
//! Every read and write on an overlaid object goes through a [`NodeMut`]:
//! it routes the access to the node's diff, its prototype accessors, or the
//! untouched target, in that order.

use std::borrow::Cow;

use json_overlay_path::{get_key, has_key, own_keys};
use json_overlay_util::{deep_equal, is_container};
use serde_json::Value;

use crate::changes::{Changes, PathPattern};
use crate::error::OverlayError;
use crate::overlay::Overlay;
use crate::tree::{Diff, Layer, NodeId, Pending};

/// The result of reading a key.
#[derive(Debug, Clone, PartialEq)]
pub enum Read<'a> {
    /// A primitive, a value stored by a write, or a computed value.
    Value(Cow<'a, Value>),
    /// A nested object of the target, served by its own node.
    Node(NodeId),
}

impl Read<'_> {
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Read::Value(value) => Some(value),
            Read::Node(_) => None,
        }
    }

    pub fn node(&self) -> Option<NodeId> {
        match self {
            Read::Node(id) => Some(*id),
            Read::Value(_) => None,
        }
    }
}

/// Reflection data for one key, consistent with [`NodeMut::get`] and
/// [`NodeMut::has`].
#[derive(Debug, Clone, PartialEq)]
pub struct Descriptor {
    pub value: Value,
    /// False for values computed by a getter, which are not own keys.
    pub enumerable: bool,
}

/// Mutable access to one node of an [`Overlay`].
pub struct NodeMut<'a> {
    pub(crate) overlay: &'a mut Overlay,
    pub(crate) id: NodeId,
}

impl<'a> NodeMut<'a> {
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Keys leading from the root target to this node.
    pub fn path(&self) -> &[String] {
        &self.overlay.node(self.id).path
    }

    /// The original value this node overlays.
    pub fn target(&self) -> &Value {
        self.overlay.target_of(self.id)
    }

    /// Reads `key`.
    ///
    /// Removed keys read as `None`; assigned keys return the stored value.
    /// Otherwise a getter on the prototype chain is invoked against this
    /// node, so it observes overlay state, and plain target values are
    /// returned as-is, with nested objects wrapped in a child node.
    pub fn get(&mut self, key: &str) -> Option<Read<'_>> {
        match self.overlay.node(self.id).pending(key) {
            Some(Pending::Removed) => return None,
            Some(Pending::Assigned(layer)) => {
                return self
                    .overlay
                    .node(self.id)
                    .pending_value(key, layer)
                    .map(|value| Read::Value(Cow::Borrowed(value)));
            }
            None => {}
        }
        if let Some(getter) = self.overlay.accessor(self.id, key).getter {
            return getter(self).map(|value| Read::Value(Cow::Owned(value)));
        }
        let nested = get_key(self.overlay.target_of(self.id), key).map(is_container)?;
        if nested {
            return Some(Read::Node(self.overlay.child_for(self.id, key)));
        }
        get_key(self.overlay.target_of(self.id), key).map(|value| Read::Value(Cow::Borrowed(value)))
    }

    /// Reads `key` as a plain value, materializing nested nodes.
    pub fn get_value(&mut self, key: &str) -> Option<Value> {
        let id = match self.get(key)? {
            Read::Value(value) => return Some(value.into_owned()),
            Read::Node(id) => id,
        };
        Some(self.overlay.unwrap_node(id))
    }

    /// The child node for `key`, if `key` reads as a nested target object.
    pub fn child(&mut self, key: &str) -> Option<NodeMut<'_>> {
        let id = self.get(key)?.node()?;
        Some(NodeMut {
            overlay: &mut *self.overlay,
            id,
        })
    }

    /// Like [`child`](Self::child), consuming the handle.
    pub fn into_child(mut self, key: &str) -> Option<NodeMut<'a>> {
        let id = self.get(key)?.node()?;
        Some(NodeMut {
            overlay: self.overlay,
            id,
        })
    }

    /// Writes `key`.
    ///
    /// Rewriting a nested object with its current value is a no-op. A setter
    /// on the prototype chain takes over the write entirely. Writing the
    /// target's original value cancels whatever was pending for `key`.
    pub fn set(&mut self, key: &str, value: Value) {
        let id = self.id;
        if let Some(child) = self.overlay.node(id).children.get(key).copied() {
            if deep_equal(&self.overlay.unwrap_node(child), &value) {
                return;
            }
        }
        if let Some(setter) = self.overlay.accessor(id, key).setter {
            setter(self, value);
            return;
        }

        let overlay = &mut *self.overlay;
        if !overlay.is_tracked(id) {
            // The dropped subtree may have held recorded changes.
            if overlay.drop_child(id, key) {
                overlay.invalidate_changes(id);
            }
            overlay.diff_mut(id, Layer::Untracked).assign(key, value);
            return;
        }
        overlay.node_mut(id).clear_untracked(key);
        let original = get_key(overlay.target_of(id), key).is_some_and(|orig| deep_equal(orig, &value));
        if original {
            let cleared = overlay
                .node_mut(id)
                .diff
                .as_mut()
                .is_some_and(|diff| diff.clear(key));
            let dropped = overlay.drop_child(id, key);
            if cleared || dropped {
                overlay.mark_changed(id);
            }
            return;
        }
        overlay.drop_child(id, key);
        overlay.diff_mut(id, Layer::Tracked).assign(key, value);
        overlay.mark_changed(id);
    }

    /// Writes the current value of another overlay into `key`.
    ///
    /// Ownership of such a value is ambiguous, so this is flagged with a
    /// warning outside production mode; the value is stored as it reads now.
    pub fn set_overlay(&mut self, key: &str, other: &Overlay) {
        if !self.overlay.config.production {
            let mut path = self.path().to_vec();
            path.push(key.to_string());
            log::warn!(
                "assigning an overlay of another value to {:?}; storing its current value",
                json_overlay_path::format_path(&path)
            );
        }
        self.set(key, other.unwrap());
    }

    /// Removes `key`.
    ///
    /// Removing a key that neither the target nor a pending write has is a
    /// no-op. Removing a key only a pending write introduced just forgets
    /// the write.
    pub fn remove(&mut self, key: &str) {
        let id = self.id;
        let overlay = &mut *self.overlay;
        let in_target = has_key(overlay.target_of(id), key);
        let node = overlay.node(id);
        let assigned_in = |layer| {
            node.layer(layer)
                .is_some_and(|diff: &Diff| diff.assigned.contains_key(key))
        };
        let (tracked_write, untracked_write) = (assigned_in(Layer::Tracked), assigned_in(Layer::Untracked));
        if !in_target && !tracked_write && !untracked_write {
            return;
        }
        let dropped = overlay.drop_child(id, key);
        if !overlay.is_tracked(id) {
            if dropped {
                overlay.invalidate_changes(id);
            }
            // A tracked write underneath must stay recorded, so it is masked.
            let diff = overlay.diff_mut(id, Layer::Untracked);
            if in_target || tracked_write {
                diff.mark_removed(key);
            } else {
                diff.assigned.shift_remove(key);
            }
            return;
        }
        overlay.node_mut(id).clear_untracked(key);
        let diff = overlay.diff_mut(id, Layer::Tracked);
        if in_target {
            diff.mark_removed(key);
        } else {
            diff.assigned.shift_remove(key);
        }
        overlay.mark_changed(id);
    }

    /// Whether `key` reads as present.
    pub fn has(&mut self, key: &str) -> bool {
        match self.overlay.node(self.id).pending(key) {
            Some(Pending::Removed) => false,
            Some(Pending::Assigned(_)) => true,
            None => {
                if has_key(self.target(), key) {
                    return true;
                }
                let accessor = self.overlay.accessor(self.id, key);
                accessor.getter.is_some() || accessor.setter.is_some()
            }
        }
    }

    /// Own keys as they read now: the target's keys, then keys introduced
    /// by writes, without removed keys.
    pub fn keys(&self) -> Vec<String> {
        self.overlay.keys_of(self.id)
    }

    pub fn describe(&mut self, key: &str) -> Option<Descriptor> {
        match self.overlay.node(self.id).pending(key) {
            Some(Pending::Removed) => None,
            Some(Pending::Assigned(layer)) => {
                let value = self.overlay.node(self.id).pending_value(key, layer)?.clone();
                Some(Descriptor {
                    value,
                    enumerable: true,
                })
            }
            None => {
                if let Some(value) = get_key(self.target(), key) {
                    return Some(Descriptor {
                        value: value.clone(),
                        enumerable: true,
                    });
                }
                let getter = self.overlay.accessor(self.id, key).getter?;
                getter(self).map(|value| Descriptor {
                    value,
                    enumerable: false,
                })
            }
        }
    }

    /// Drops pending writes: for `key` only, or everything below this node.
    ///
    /// The node still counts as dirty afterwards.
    pub fn reset(&mut self, key: Option<&str>) {
        let id = self.id;
        let overlay = &mut *self.overlay;
        match key {
            Some(key) => {
                let node = overlay.node_mut(id);
                for diff in [node.diff.as_mut(), node.untracked.as_mut()].into_iter().flatten() {
                    diff.clear(key);
                }
                overlay.drop_child(id, key);
            }
            None => {
                let node = overlay.node_mut(id);
                node.diff = None;
                node.untracked = None;
                overlay.drop_children(id);
            }
        }
        overlay.mark_changed(id);
    }

    /// Runs `f` with change recording switched off for this node and
    /// everything below it.
    ///
    /// Writes made meanwhile are visible to reads and to unwrap but never
    /// show up in [`get_changes`](Self::get_changes), and they do not make
    /// anything dirty.
    pub fn untracked<R>(&mut self, f: impl FnOnce(&mut NodeMut<'_>) -> R) -> R {
        let previous = std::mem::replace(&mut self.overlay.node_mut(self.id).untracked_scope, true);
        let out = f(self);
        self.overlay.node_mut(self.id).untracked_scope = previous;
        out
    }

    /// The recorded changes of this node and its descendants, with paths
    /// relative to this node.
    pub fn get_changes(&mut self) -> Changes {
        self.overlay.changes_with_prefix(self.id, "")
    }

    /// Like [`get_changes`](Self::get_changes), with every path prefixed.
    pub fn get_changes_prefixed(&mut self, prefix: &str) -> Changes {
        self.overlay.changes_with_prefix(self.id, prefix)
    }

    pub fn get_changes_matching(&mut self, pattern: &PathPattern) -> Changes {
        self.get_changes().filter(pattern)
    }

    /// Whether any recorded change (matching `pattern`, if given) remains.
    pub fn has_changes(&mut self, pattern: Option<&PathPattern>) -> bool {
        match pattern {
            Some(pattern) => !self.get_changes_matching(pattern).is_empty(),
            None => !self.get_changes().is_empty(),
        }
    }

    /// Whether anything at or below this node was ever written, even if the
    /// writes were reverted since.
    pub fn is_dirty(&self) -> bool {
        self.overlay.node(self.id).changed
    }

    /// Replays `changes` onto this node as if the writes were made here.
    pub fn merge_changes(&mut self, changes: &Changes, ignore_errors: bool) -> Result<(), OverlayError> {
        self.overlay.merge_node(self.id, changes, ignore_errors)
    }

    /// The current value of this node as a fresh value.
    pub fn unwrap(&self) -> Value {
        self.overlay.unwrap_node(self.id)
    }

    /// A new overlay over this node's target, with nothing recorded.
    pub fn clone_overlay(&self) -> Overlay {
        self.overlay.clone_node(self.id)
    }
}

impl std::fmt::Debug for NodeMut<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeMut")
            .field("id", &self.id)
            .field("path", &self.path())
            .finish()
    }
}

impl Overlay {
    pub(crate) fn keys_of(&self, id: NodeId) -> Vec<String> {
        let node = self.node(id);
        let mut keys = own_keys(self.target_of(id));
        for diff in [node.diff.as_ref(), node.untracked.as_ref()].into_iter().flatten() {
            for key in diff.assigned.keys() {
                if !keys.contains(key) {
                    keys.push(key.clone());
                }
            }
            keys.retain(|key| !diff.removed.contains(key));
        }
        keys
    }
}
