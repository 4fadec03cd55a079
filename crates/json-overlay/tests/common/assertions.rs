#![allow(dead_code)]

use json_overlay::{Changes, Overlay};
use serde_json::Value;

/// Compares the overlay's changes against their wire form.
pub fn assert_changes(overlay: &mut Overlay, expected: Value) {
    let changes = overlay.get_changes();
    assert_eq!(
        changes,
        Changes::from_json(&expected).unwrap_or_else(|e| panic!("bad expected changes {expected}: {e}")),
        "wire form: {}",
        changes.to_json()
    );
}

/// Applies `edit` to a fresh overlay and returns the overlay.
pub fn edited(target: &Value, edit: impl FnOnce(&mut Overlay)) -> Overlay {
    let mut overlay = Overlay::new(target.clone());
    edit(&mut overlay);
    overlay
}
