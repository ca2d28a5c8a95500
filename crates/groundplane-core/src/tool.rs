//! Tool modes.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// The exclusive interaction mode governing gestures and wheel input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ToolMode {
    /// Rectangular selection; wheel pans.
    #[default]
    Pointer,
    /// Drag pans the ground; wheel zooms.
    Hand,
    /// Object placement (no behavior yet).
    Add,
}

/// Cursor shown over the scene for a tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorStyle {
    Default,
    Grab,
}

impl ToolMode {
    pub const ALL: [ToolMode; 3] = [ToolMode::Pointer, ToolMode::Hand, ToolMode::Add];

    /// Name used in persisted workspaces and diagnostics.
    pub fn name(self) -> &'static str {
        match self {
            Self::Pointer => "pointer",
            Self::Hand => "hand",
            Self::Add => "add",
        }
    }

    pub fn cursor(self) -> CursorStyle {
        match self {
            Self::Hand => CursorStyle::Grab,
            Self::Pointer | Self::Add => CursorStyle::Default,
        }
    }
}

impl fmt::Display for ToolMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Unknown tool name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown tool: {0}")]
pub struct ParseToolError(pub String);

impl FromStr for ToolMode {
    type Err = ParseToolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ToolMode::ALL
            .into_iter()
            .find(|tool| tool.name() == s)
            .ok_or_else(|| ParseToolError(s.to_string()))
    }
}
