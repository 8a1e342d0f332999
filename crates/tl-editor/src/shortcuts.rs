//! Keyboard shortcut mapping.
//!
//! Maps key + modifier combos to semantic `ShortcutAction`s. The map lives in
//! Rust so every host (WASM, native tests) agrees on the bindings.

/// Actions that keyboard shortcuts can trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortcutAction {
    // ── View ──
    ZoomIn,
    ZoomOut,
    ResetView,
    FitView,
    ToggleLock,

    // ── Edit ──
    DeleteSelected,
    /// Abort an in-progress connection and clear the selection.
    Cancel,
}

/// Resolves key events into shortcut actions.
///
/// `cmd` is ⌘ on macOS and Ctrl elsewhere; both are accepted everywhere.
pub struct ShortcutMap;

impl ShortcutMap {
    /// Resolve a key event to an action.
    ///
    /// `key` is the `KeyboardEvent.key` value (e.g. `"="`, `"Delete"`).
    /// Returns `None` if the key combo has no binding.
    pub fn resolve(
        key: &str,
        ctrl: bool,
        shift: bool,
        _alt: bool,
        meta: bool,
    ) -> Option<ShortcutAction> {
        let cmd = ctrl || meta;

        if cmd {
            return match key {
                "=" | "+" => Some(ShortcutAction::ZoomIn),
                "-" => Some(ShortcutAction::ZoomOut),
                "0" => Some(ShortcutAction::ResetView),
                _ => None,
            };
        }

        if shift {
            // Shift+1 reports "!" on US layouts and "1" on some others.
            return match key {
                "1" | "!" => Some(ShortcutAction::FitView),
                "+" => Some(ShortcutAction::ZoomIn),
                "Escape" => Some(ShortcutAction::Cancel),
                _ => None,
            };
        }

        match key {
            "=" | "+" => Some(ShortcutAction::ZoomIn),
            "-" => Some(ShortcutAction::ZoomOut),
            "0" => Some(ShortcutAction::ResetView),
            "1" => Some(ShortcutAction::FitView),
            "l" | "L" => Some(ShortcutAction::ToggleLock),
            "Delete" | "Backspace" => Some(ShortcutAction::DeleteSelected),
            "Escape" => Some(ShortcutAction::Cancel),
            _ => None,
        }
    }
}
