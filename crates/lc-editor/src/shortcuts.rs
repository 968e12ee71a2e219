//! Keyboard shortcut mapping.
//!
//! Maps key + modifier combos to semantic `ShortcutAction`s so every host
//! shares one keymap. `⌘` below means `meta` on macOS and `ctrl` elsewhere.
//!
//! | Keys            | Action            |
//! |-----------------|-------------------|
//! | ⌘Z / ⇧⌘Z / ⌘Y   | undo / redo       |
//! | ⌘] / ⌘[         | forward / back    |
//! | ⇧⌘] / ⇧⌘[       | front / bottom    |
//! | ⇧⌘H / ⇧⌘L       | hide / lock       |
//! | ⌘E              | export            |
//! | Delete          | remove selected   |
//! | C / Enter       | crop on / done    |
//! | T               | add text          |
//! | Escape          | leave crop, then deselect |

use serde::Serialize;

/// Actions that keyboard shortcuts can trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ShortcutAction {
    // ── Edit ──
    Undo,
    Redo,
    Delete,
    AddText,

    // ── Z-order ──
    SendBackward,
    BringForward,
    SendToBack,
    BringToFront,

    // ── Layer flags ──
    ToggleVisibility,
    ToggleLock,

    // ── Crop ──
    ToggleCrop,
    FinishCrop,

    // ── Other ──
    Export,
    /// Leave crop mode if active, otherwise clear the selection.
    Escape,
}

pub struct ShortcutMap;

impl ShortcutMap {
    /// Resolve a key event to an action.
    ///
    /// `key` is the `KeyboardEvent.key` value (e.g. `"z"`, `"Delete"`).
    pub fn resolve(key: &str, ctrl: bool, shift: bool, alt: bool, meta: bool) -> Option<ShortcutAction> {
        let cmd = ctrl || meta;
        if alt {
            return None;
        }

        if cmd && shift {
            return match key {
                "z" | "Z" => Some(ShortcutAction::Redo),
                // Shift turns `[`/`]` into braces on most layouts.
                "[" | "{" => Some(ShortcutAction::SendToBack),
                "]" | "}" => Some(ShortcutAction::BringToFront),
                "h" | "H" => Some(ShortcutAction::ToggleVisibility),
                "l" | "L" => Some(ShortcutAction::ToggleLock),
                _ => None,
            };
        }

        if cmd {
            return match key {
                "z" | "Z" => Some(ShortcutAction::Undo),
                "y" | "Y" => Some(ShortcutAction::Redo),
                "[" => Some(ShortcutAction::SendBackward),
                "]" => Some(ShortcutAction::BringForward),
                "e" | "E" => Some(ShortcutAction::Export),
                _ => None,
            };
        }

        if shift {
            return None;
        }

        match key {
            "Delete" | "Backspace" => Some(ShortcutAction::Delete),
            "Escape" => Some(ShortcutAction::Escape),
            "Enter" => Some(ShortcutAction::FinishCrop),
            "c" | "C" => Some(ShortcutAction::ToggleCrop),
            "t" | "T" => Some(ShortcutAction::AddText),
            _ => None,
        }
    }
}
