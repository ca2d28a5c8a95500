//! Keyboard shortcut registry.

use groundplane_core::ToolMode;

/// What a shortcut does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortcutAction {
    SelectTool(ToolMode),
    ToggleDebugger,
}

/// A keyboard shortcut definition.
#[derive(Debug, Clone)]
pub struct Shortcut {
    pub key: &'static str,
    pub description: &'static str,
    pub action: ShortcutAction,
}

impl Shortcut {
    pub const fn new(key: &'static str, description: &'static str, action: ShortcutAction) -> Self {
        Self {
            key,
            description,
            action,
        }
    }
}

/// Registry of all keyboard shortcuts.
pub struct ShortcutRegistry;

impl ShortcutRegistry {
    /// Get all registered shortcuts.
    pub fn all() -> Vec<Shortcut> {
        vec![
            Shortcut::new("V", "Pointer tool", ShortcutAction::SelectTool(ToolMode::Pointer)),
            Shortcut::new("H", "Hand tool", ShortcutAction::SelectTool(ToolMode::Hand)),
            Shortcut::new("A", "Add tool", ShortcutAction::SelectTool(ToolMode::Add)),
            Shortcut::new("F12", "Toggle debug overlay", ShortcutAction::ToggleDebugger),
        ]
    }

    /// Find the action bound to a key name. Letters match either case.
    pub fn lookup(key: &str) -> Option<ShortcutAction> {
        Self::all()
            .into_iter()
            .find(|shortcut| shortcut.key.eq_ignore_ascii_case(key))
            .map(|shortcut| shortcut.action)
    }

    /// One line per shortcut, for help output.
    pub fn describe() -> String {
        Self::all()
            .iter()
            .map(|shortcut| format!("  {:6} {}", shortcut.key, shortcut.description))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
