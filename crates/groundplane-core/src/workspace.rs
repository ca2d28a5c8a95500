//! Persisted editor state.
//!
//! The workspace is a flat, versionless JSON document:
//!
//! ```json
//! {
//!   "tools": { "selected": "pointer" },
//!   "ground": {
//!     "size": { "width": 1024, "height": 2048 },
//!     "position": { "top": 307, "left": 512 },
//!     "scale": 100
//!   },
//!   "settings": { "debugger": { "enabled": true, "mouseTracker": true } }
//! }
//! ```

use crate::tool::ToolMode;
use crate::viewport::{GroundPosition, GroundSize, Viewport, ViewportPatch, DEFAULT_SCALE};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Workspace parsing errors.
#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error("Invalid workspace JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Workspace is not a JSON object")]
    NotAnObject,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ToolsState {
    pub selected: ToolMode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DebuggerSettings {
    /// Show the diagnostic overlay.
    pub enabled: bool,
    /// Publish cursor position and hover target.
    pub mouse_tracker: bool,
}

impl Default for DebuggerSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            mouse_tracker: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Settings {
    pub debugger: DebuggerSettings,
}

/// Everything the editor restores on the next launch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workspace {
    pub tools: ToolsState,
    pub ground: Viewport,
    pub settings: Settings,
}

impl Workspace {
    /// A fresh workspace for a screen of the given height.
    pub fn new(screen_height: f64) -> Self {
        let top = screen_height / 2.0 - screen_height / 5.0;
        Self {
            tools: ToolsState::default(),
            ground: Viewport {
                size: GroundSize { width: 1024, height: 2048 },
                position: GroundPosition::new(top.round() as i32, 512),
                scale: DEFAULT_SCALE,
            },
            settings: Settings::default(),
        }
    }

    /// Restore a stored workspace on top of `defaults`.
    ///
    /// Fields that are missing or of the wrong type keep their default.
    pub fn restore(json: &str, defaults: Workspace) -> Result<Self, WorkspaceError> {
        let value: Value = serde_json::from_str(json)?;
        if !value.is_object() {
            return Err(WorkspaceError::NotAnObject);
        }

        let mut workspace = defaults;
        if let Some(selected) = value.pointer("/tools/selected") {
            match selected.as_str().map(str::parse::<ToolMode>) {
                Some(Ok(tool)) => workspace.tools.selected = tool,
                _ => log::warn!("Ignoring invalid stored tool: {}", selected),
            }
        }
        if let Some(ground) = value.get("ground") {
            workspace.ground.apply(&ViewportPatch::from_value(ground));
        }
        let debugger = value.pointer("/settings/debugger/enabled");
        if let Some(enabled) = debugger.and_then(Value::as_bool) {
            workspace.settings.debugger.enabled = enabled;
        }
        if let Some(tracker) = value
            .pointer("/settings/debugger/mouseTracker")
            .and_then(Value::as_bool)
        {
            workspace.settings.debugger.mouse_tracker = tracker;
        }
        Ok(workspace)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_workspace_defaults() {
        let workspace = Workspace::new(1080.0);
        assert_eq!(workspace.tools.selected, ToolMode::Pointer);
        assert_eq!(workspace.ground.position, GroundPosition::new(324, 512));
        assert_eq!(workspace.ground.size, GroundSize { width: 1024, height: 2048 });
        assert_eq!(workspace.ground.scale, 100);
        assert!(workspace.settings.debugger.enabled);
        assert!(workspace.settings.debugger.mouse_tracker);
    }

    #[test]
    fn test_json_layout() {
        let json = Workspace::new(1000.0).to_json().unwrap();
        let value: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value.pointer("/tools/selected"), Some(&Value::from("pointer")));
        assert_eq!(value.pointer("/ground/position/top"), Some(&Value::from(300)));
        assert_eq!(value.pointer("/settings/debugger/mouseTracker"), Some(&Value::from(true)));
    }

    #[test]
    fn test_restore_roundtrip() {
        let mut workspace = Workspace::new(800.0);
        workspace.tools.selected = ToolMode::Hand;
        workspace.ground.scale = 70;
        workspace.settings.debugger.enabled = false;

        let json = workspace.to_json().unwrap();
        let restored = Workspace::restore(&json, Workspace::new(0.0)).unwrap();
        assert_eq!(restored, workspace);
    }

    #[test]
    fn test_restore_is_lenient_per_field() {
        let defaults = Workspace::new(1000.0);
        let json = r#"{
            "tools": { "selected": "lasso" },
            "ground": { "position": { "top": "bad", "left": 20 }, "scale": "big" },
            "settings": { "debugger": { "enabled": false, "mouseTracker": "yes" } }
        }"#;
        let restored = Workspace::restore(json, defaults).unwrap();

        assert_eq!(restored.tools.selected, ToolMode::Pointer);
        assert_eq!(restored.ground.position, GroundPosition::new(300, 20));
        assert_eq!(restored.ground.scale, 100);
        assert!(!restored.settings.debugger.enabled);
        assert!(restored.settings.debugger.mouse_tracker);
    }

    #[test]
    fn test_restore_rejects_garbage() {
        let defaults = Workspace::new(0.0);
        assert!(matches!(Workspace::restore("{not json", defaults), Err(WorkspaceError::Json(_))));
        assert!(matches!(Workspace::restore("[1, 2]", defaults), Err(WorkspaceError::NotAnObject)));
    }
}
