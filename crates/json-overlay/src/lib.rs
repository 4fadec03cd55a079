//! Copy-on-write overlays over JSON documents.
//!
//! An [`Overlay`] wraps a shared [`serde_json::Value`] and behaves like a
//! mutable view of it, but every write is recorded in a diff instead of
//! touching the original. The recorded writes can be:
//!
//! - read back as a flat [`Changes`] description keyed by dotted paths,
//!   filtered with a [`PathPattern`];
//! - extended with changes produced elsewhere through
//!   [`Overlay::merge_changes`];
//! - applied, either to a fresh copy ([`Overlay::unwrap`]) or onto the
//!   original itself ([`Overlay::unwrap_in_place`]).
//!
//! Nested objects are served by child nodes created lazily on first read,
//! so sibling edits stay independent and change paths stay short.
//!
//! # Example
//!
//! ```
//! use json_overlay::{Overlay, PathPattern};
//! use serde_json::json;
//!
//! let mut overlay = Overlay::new(json!({"user": {"name": "ann", "age": 30}}));
//! overlay.at(&["user"]).unwrap().set("age", json!(31));
//!
//! let changes = overlay.get_changes();
//! assert_eq!(changes.to_json(), json!({"$set": {"user.age": 31}}));
//! assert!(overlay.has_changes(Some(&PathPattern::from("age"))));
//! assert!(!overlay.has_changes(Some(&PathPattern::from("name"))));
//!
//! // Replaying the description elsewhere reproduces the edit.
//! let mut replica = overlay.clone_overlay();
//! replica.merge_changes(&changes, false).unwrap();
//! assert_eq!(replica.unwrap(), overlay.unwrap());
//! ```

mod aggregate;
mod merge;
mod tree;

pub mod accessor;
pub mod changes;
pub mod config;
pub mod error;
pub mod node;
pub mod overlay;

pub use accessor::{Getter, Prototype, Prototypes, Setter};
pub use changes::{filter_changes, Changes, PathPattern};
pub use config::{OverlayConfig, DEFAULT_TYPE_KEY};
pub use error::OverlayError;
pub use node::{Descriptor, NodeMut, Read};
pub use overlay::{Overlay, OverlayBuilder};
pub use tree::NodeId;
