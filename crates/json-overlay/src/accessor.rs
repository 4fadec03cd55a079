//! Prototype accessors and their resolution cache.
//!
//! JSON values have no methods, so computed properties live in named
//! [`Prototype`]s. An object value selects its prototype through the
//! configured type field (`"__type"` by default); prototypes may extend
//! other prototypes, and a property is resolved along that chain the first
//! time it is looked up.

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;
use serde_json::Value;

use crate::node::NodeMut;

/// Computes a property from the overlay state of the object it is read on.
pub type Getter = Rc<dyn Fn(&mut NodeMut<'_>) -> Option<Value>>;

/// Handles a write to a property, usually by writing other properties.
pub type Setter = Rc<dyn Fn(&mut NodeMut<'_>, Value)>;

/// A named set of getters and setters.
#[derive(Clone)]
pub struct Prototype {
    name: String,
    extends: Option<String>,
    getters: IndexMap<String, Getter>,
    setters: IndexMap<String, Setter>,
}

impl Prototype {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            extends: None,
            getters: IndexMap::new(),
            setters: IndexMap::new(),
        }
    }

    /// Inherit the accessors of the prototype registered as `parent`.
    pub fn extends(mut self, parent: impl Into<String>) -> Self {
        self.extends = Some(parent.into());
        self
    }

    pub fn getter<F>(mut self, key: impl Into<String>, getter: F) -> Self
    where
        F: Fn(&mut NodeMut<'_>) -> Option<Value> + 'static,
    {
        self.getters.insert(key.into(), Rc::new(getter));
        self
    }

    pub fn setter<F>(mut self, key: impl Into<String>, setter: F) -> Self
    where
        F: Fn(&mut NodeMut<'_>, Value) + 'static,
    {
        self.setters.insert(key.into(), Rc::new(setter));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn defines(&self, key: &str) -> bool {
        self.getters.contains_key(key) || self.setters.contains_key(key)
    }
}

impl fmt::Debug for Prototype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Prototype")
            .field("name", &self.name)
            .field("extends", &self.extends)
            .field("getters", &self.getters.keys().collect::<Vec<_>>())
            .field("setters", &self.setters.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Registry of prototypes by name.
#[derive(Debug, Clone, Default)]
pub struct Prototypes {
    by_name: IndexMap<String, Rc<Prototype>>,
}

impl Prototypes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `prototype`, replacing one with the same name.
    pub fn register(&mut self, prototype: Prototype) {
        self.by_name.insert(prototype.name.clone(), Rc::new(prototype));
    }

    pub fn get(&self, name: &str) -> Option<&Rc<Prototype>> {
        self.by_name.get(name)
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }
}

/// The accessor pair found for one property.
#[derive(Clone, Default)]
pub(crate) struct Resolved {
    pub(crate) getter: Option<Getter>,
    pub(crate) setter: Option<Setter>,
}

/// Memoizes accessor lookups per (prototype name, property).
///
/// Entries are keyed by name rather than by the prototype itself, so the
/// cache never keeps a prototype alive or adds fields to it. Misses are
/// cached too.
#[derive(Default)]
pub(crate) struct AccessorCache {
    resolved: HashMap<String, HashMap<String, Resolved>>,
}

impl AccessorCache {
    pub(crate) fn resolve(&mut self, prototypes: &Prototypes, class: &str, key: &str) -> Resolved {
        if let Some(hit) = self.resolved.get(class).and_then(|by_key| by_key.get(key)) {
            return hit.clone();
        }
        let resolved = resolve_chain(prototypes, class, key);
        self.resolved
            .entry(class.to_string())
            .or_default()
            .insert(key.to_string(), resolved.clone());
        resolved
    }
}

/// Walks the `extends` chain from `class`; the first prototype defining
/// `key` supplies both accessors, like a property descriptor would.
fn resolve_chain(prototypes: &Prototypes, class: &str, key: &str) -> Resolved {
    let mut current = prototypes.get(class);
    // A chain longer than the registry has a cycle.
    for _ in 0..prototypes.len() {
        let Some(proto) = current else { break };
        if proto.defines(key) {
            return Resolved {
                getter: proto.getters.get(key).cloned(),
                setter: proto.setters.get(key).cloned(),
            };
        }
        current = proto.extends.as_deref().and_then(|parent| prototypes.get(parent));
    }
    Resolved::default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn registry() -> Prototypes {
        let mut prototypes = Prototypes::new();
        prototypes.register(Prototype::new("Shape").getter("kind", |_| Some(json!("shape"))));
        prototypes.register(
            Prototype::new("Point")
                .extends("Shape")
                .getter("d", |_| Some(json!(0)))
                .setter("p", |_, _| {}),
        );
        prototypes.register(Prototype::new("Loop").extends("Loop"));
        prototypes
    }

    #[test]
    fn resolves_own_and_inherited_accessors() {
        let prototypes = registry();
        let own = resolve_chain(&prototypes, "Point", "d");
        assert!(own.getter.is_some() && own.setter.is_none());
        let setter = resolve_chain(&prototypes, "Point", "p");
        assert!(setter.getter.is_none() && setter.setter.is_some());
        assert!(resolve_chain(&prototypes, "Point", "kind").getter.is_some());
        assert!(resolve_chain(&prototypes, "Shape", "d").getter.is_none());
    }

    #[test]
    fn unknown_classes_and_cycles_resolve_to_nothing() {
        let prototypes = registry();
        assert!(resolve_chain(&prototypes, "Nope", "d").getter.is_none());
        let looped = resolve_chain(&prototypes, "Loop", "x");
        assert!(looped.getter.is_none() && looped.setter.is_none());
    }

    #[test]
    fn cache_remembers_hits_and_misses() {
        let prototypes = registry();
        let mut cache = AccessorCache::default();
        assert!(cache.resolve(&prototypes, "Point", "kind").getter.is_some());
        assert!(cache.resolve(&prototypes, "Point", "x").getter.is_none());
        assert_eq!(cache.resolved["Point"].len(), 2);
        // A different registry does not matter once the answer is cached.
        assert!(cache.resolve(&Prototypes::new(), "Point", "kind").getter.is_some());
    }
}
