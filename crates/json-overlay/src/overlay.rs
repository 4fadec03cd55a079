//! The overlay itself: construction, navigation, and unwrap.

use std::fmt;
use std::rc::Rc;

use serde_json::Value;

use crate::accessor::{AccessorCache, Prototype, Prototypes};
use crate::changes::{Changes, PathPattern};
use crate::config::OverlayConfig;
use crate::error::OverlayError;
use crate::node::NodeMut;
use crate::tree::{Arena, NodeId, ROOT};

/// A read/write view of a JSON value that records writes instead of
/// applying them.
///
/// The target is shared, never mutated: all writes land in per-node diffs
/// that can be read back as a [`Changes`] description, merged with
/// descriptions from elsewhere, or applied with [`unwrap`](Self::unwrap)
/// and [`unwrap_in_place`](Self::unwrap_in_place).
///
/// # Example
///
/// ```
/// use json_overlay::{Changes, Overlay};
/// use serde_json::json;
///
/// let mut overlay = Overlay::new(json!({"a": 1, "b": {"x": 1, "y": 2}}));
/// overlay.set("a", json!(2));
/// let mut b = overlay.at(&["b"]).unwrap();
/// b.remove("y");
/// b.set("z", json!(3));
///
/// assert_eq!(
///     overlay.get_changes(),
///     Changes::new()
///         .with_assign("a", json!(2))
///         .with_assign("b.z", json!(3))
///         .with_remove("b.y")
/// );
/// assert_eq!(overlay.unwrap(), json!({"a": 2, "b": {"x": 1, "z": 3}}));
/// assert_eq!(**overlay.target(), json!({"a": 1, "b": {"x": 1, "y": 2}}));
/// ```
pub struct Overlay {
    pub(crate) target: Rc<Value>,
    pub(crate) nodes: Arena,
    pub(crate) config: OverlayConfig,
    pub(crate) prototypes: Rc<Prototypes>,
    pub(crate) accessors: AccessorCache,
}

impl Overlay {
    pub fn new(target: impl Into<Rc<Value>>) -> Self {
        Self::builder(target).build()
    }

    pub fn with_config(target: impl Into<Rc<Value>>, config: OverlayConfig) -> Self {
        Self::builder(target).config(config).build()
    }

    pub fn builder(target: impl Into<Rc<Value>>) -> OverlayBuilder {
        OverlayBuilder {
            target: target.into(),
            config: OverlayConfig::default(),
            prototypes: Prototypes::new(),
        }
    }

    fn from_parts(target: Rc<Value>, config: OverlayConfig, prototypes: Rc<Prototypes>) -> Self {
        Self {
            target,
            nodes: Arena::with_root(),
            config,
            prototypes,
            accessors: AccessorCache::default(),
        }
    }

    pub fn root(&mut self) -> NodeMut<'_> {
        NodeMut {
            overlay: self,
            id: ROOT,
        }
    }

    pub fn root_id(&self) -> NodeId {
        ROOT
    }

    /// The node `id`, unless it was discarded by a write to its parent.
    pub fn handle(&mut self, id: NodeId) -> Option<NodeMut<'_>> {
        if !self.nodes.is_live(id) {
            return None;
        }
        Some(NodeMut { overlay: self, id })
    }

    /// Walks down `path` from the root, through nested target objects only.
    pub fn at<S: AsRef<str>>(&mut self, path: &[S]) -> Option<NodeMut<'_>> {
        let mut node = self.root();
        for key in path {
            node = node.into_child(key.as_ref())?;
        }
        Some(node)
    }

    /// The original value, exactly as it was handed in.
    pub fn target(&self) -> &Rc<Value> {
        &self.target
    }

    pub fn config(&self) -> &OverlayConfig {
        &self.config
    }

    pub fn prototypes(&self) -> &Prototypes {
        &self.prototypes
    }

    pub fn get_value(&mut self, key: &str) -> Option<Value> {
        self.root().get_value(key)
    }

    pub fn set(&mut self, key: &str, value: Value) {
        self.root().set(key, value);
    }

    pub fn remove(&mut self, key: &str) {
        self.root().remove(key);
    }

    pub fn has(&mut self, key: &str) -> bool {
        self.root().has(key)
    }

    /// Own keys of the root as they read now.
    pub fn keys(&self) -> Vec<String> {
        self.keys_of(ROOT)
    }

    pub fn reset(&mut self, key: Option<&str>) {
        self.root().reset(key);
    }

    pub fn get_changes(&mut self) -> Changes {
        self.root().get_changes()
    }

    pub fn get_changes_matching(&mut self, pattern: &PathPattern) -> Changes {
        self.root().get_changes_matching(pattern)
    }

    pub fn has_changes(&mut self, pattern: Option<&PathPattern>) -> bool {
        self.root().has_changes(pattern)
    }

    pub fn is_dirty(&self) -> bool {
        self.node(ROOT).changed
    }

    pub fn merge_changes(&mut self, changes: &Changes, ignore_errors: bool) -> Result<(), OverlayError> {
        self.merge_node(ROOT, changes, ignore_errors)
    }

    /// The current value as a fresh value; the target is left alone.
    pub fn unwrap(&self) -> Value {
        self.unwrap_node(ROOT)
    }

    /// Applies the recorded changes onto the target itself.
    ///
    /// If this overlay holds the only reference to the target, the returned
    /// `Rc` is the target allocation, updated in place. A target still
    /// shared with others is copied first, so their view never changes.
    pub fn unwrap_in_place(mut self) -> Rc<Value> {
        let mut target = std::mem::replace(&mut self.target, Rc::new(Value::Null));
        self.apply_node(ROOT, Rc::make_mut(&mut target));
        target
    }

    /// Like [`unwrap_in_place`](Self::unwrap_in_place), returning the value.
    pub fn into_value(self) -> Value {
        Rc::try_unwrap(self.unwrap_in_place()).unwrap_or_else(|shared| (*shared).clone())
    }

    /// A fresh overlay over the same target with nothing recorded.
    pub fn clone_overlay(&self) -> Overlay {
        self.clone_node(ROOT)
    }

    pub(crate) fn clone_node(&self, id: NodeId) -> Overlay {
        let target = if id == ROOT {
            Rc::clone(&self.target)
        } else {
            Rc::new(self.target_of(id).clone())
        };
        Self::from_parts(target, self.config.clone(), Rc::clone(&self.prototypes))
    }

    pub(crate) fn unwrap_node(&self, id: NodeId) -> Value {
        let mut base = self.target_of(id).clone();
        self.apply_node(id, &mut base);
        base
    }
}

impl fmt::Debug for Overlay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Overlay")
            .field("target", &self.target)
            .field("nodes", &self.nodes.len())
            .field("config", &self.config)
            .field("prototypes", &self.prototypes)
            .finish()
    }
}

/// Configures an [`Overlay`] before it is created.
#[derive(Debug)]
pub struct OverlayBuilder {
    target: Rc<Value>,
    config: OverlayConfig,
    prototypes: Prototypes,
}

impl OverlayBuilder {
    pub fn config(mut self, config: OverlayConfig) -> Self {
        self.config = config;
        self
    }

    pub fn prototype(mut self, prototype: Prototype) -> Self {
        self.prototypes.register(prototype);
        self
    }

    pub fn prototypes(mut self, prototypes: Prototypes) -> Self {
        self.prototypes = prototypes;
        self
    }

    pub fn build(self) -> Overlay {
        Overlay::from_parts(self.target, self.config, Rc::new(self.prototypes))
    }
}
