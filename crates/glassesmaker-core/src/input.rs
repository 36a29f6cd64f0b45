//! Pointer modifier state.

use serde::{Deserialize, Serialize};

/// Modifier keys held during a pointer gesture.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifiers {
    /// Snaps rotation to 15° steps.
    pub shift: bool,
}

impl Modifiers {
    pub fn shift() -> Self {
        Self { shift: true }
    }
}
