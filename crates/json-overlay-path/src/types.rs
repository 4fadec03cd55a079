//! Type definitions for dotted paths.

/// A single path segment: an object key, or a digits-only sequence index.
pub type Segment = String;

/// A dotted path split into segments.
pub type Path = Vec<Segment>;
