//! Keyboard shortcut resolution.
//!
//! `resolve` maps a key press to an editor command. "Primary" is Ctrl or
//! Meta so the same table serves macOS and everything else. Nothing resolves
//! while a text input has focus; the keystroke belongs to that input.

#[cfg(test)]
#[path = "shortcuts_test.rs"]
mod shortcuts_test;

use crate::consts::{NUDGE_STEP, NUDGE_STEP_LARGE};
use crate::input::{Key, Modifiers};

/// An editor command bound to a key chord.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shortcut {
    /// Move the selection by a canvas-space offset.
    Nudge { dx: f64, dy: f64 },
    Delete,
    Undo,
    Redo,
    SelectAll,
    Copy,
    Cut,
    Paste,
    Duplicate,
    Group,
    Ungroup,
    Save,
    ClearSelection,
}

/// Resolve a key press into a shortcut, if one is bound.
#[must_use]
pub fn resolve(key: &Key, modifiers: Modifiers, text_input_focused: bool) -> Option<Shortcut> {
    if text_input_focused {
        return None;
    }

    let step = if modifiers.shift { NUDGE_STEP_LARGE } else { NUDGE_STEP };
    match key.as_str() {
        "ArrowLeft" => return Some(Shortcut::Nudge { dx: -step, dy: 0.0 }),
        "ArrowRight" => return Some(Shortcut::Nudge { dx: step, dy: 0.0 }),
        "ArrowUp" => return Some(Shortcut::Nudge { dx: 0.0, dy: -step }),
        "ArrowDown" => return Some(Shortcut::Nudge { dx: 0.0, dy: step }),
        "Delete" | "Backspace" => return Some(Shortcut::Delete),
        "Escape" => return Some(Shortcut::ClearSelection),
        _ => {}
    }

    if !modifiers.primary() {
        return None;
    }

    // Shift turns letters upper-case in browser key events.
    let letter = key.as_str().to_ascii_lowercase();
    match (letter.as_str(), modifiers.shift) {
        ("z", false) => Some(Shortcut::Undo),
        ("z", true) | ("y", _) => Some(Shortcut::Redo),
        ("g", false) => Some(Shortcut::Group),
        ("g", true) => Some(Shortcut::Ungroup),
        ("a", _) => Some(Shortcut::SelectAll),
        ("c", _) => Some(Shortcut::Copy),
        ("x", _) => Some(Shortcut::Cut),
        ("v", _) => Some(Shortcut::Paste),
        ("d", _) => Some(Shortcut::Duplicate),
        ("s", _) => Some(Shortcut::Save),
        _ => None,
    }
}
