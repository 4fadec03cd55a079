use thiserror::Error;

/// Errors raised by overlay operations.
///
/// Reads, writes, removals and key enumeration never fail; only replaying a
/// change description can.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OverlayError {
    /// A merge bucket could not be resolved against the overlay tree.
    #[error("INVALID_MODIFIER: {path}: {reason}")]
    InvalidModifier { path: String, reason: String },

    /// A change description could not be decoded from its wire form.
    #[error("INVALID_CHANGES: {0}")]
    InvalidChanges(String),
}

impl OverlayError {
    pub(crate) fn invalid_modifier(path: impl Into<String>, reason: impl Into<String>) -> Self {
        OverlayError::InvalidModifier {
            path: path.into(),
            reason: reason.into(),
        }
    }
}
