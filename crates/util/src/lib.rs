//! json-overlay-util - Utility functions for json-overlay
//!
//! The overlay engine leans on two collaborators that are not part of the
//! engine itself: a structural equality predicate, used to tell whether a
//! write is a no-op against the original value, and a deep path-set helper
//! that rebuilds nested containers from dotted change paths.

pub mod container;
pub mod deep_set;
pub mod json_equal;

// Re-exports for convenience
pub use container::is_container;
pub use deep_set::{deep_remove, deep_set, MAX_ARRAY_PADDING};
pub use json_equal::deep_equal;
