//! Groundplane Core Library
//!
//! Platform-agnostic gesture normalization and viewport interaction for the
//! Groundplane canvas editor.

pub mod binding;
pub mod controller;
pub mod diagnostics;
pub mod pointer;
pub mod selection;
pub mod storage;
pub mod tool;
pub mod tracker;
pub mod viewport;
pub mod workspace;

pub use binding::{InputBinding, InputProtocol, NullBinding, Subscription};
pub use controller::{
    DeltaMode, GesturePhase, GroundEvents, HitTarget, NoopEvents, ViewportController, WheelEvent,
};
pub use diagnostics::{CursorTracker, DebugOverlay, DiagnosticSink, NullDiagnostics};
pub use pointer::{Pointer, PointerId, MOUSE_POINTER_ID};
pub use selection::SelectionRect;
pub use tool::{CursorStyle, ToolMode};
pub use tracker::{InputEvent, Phase, PointerHandler, PointerSet, PointerTracker};
pub use viewport::{GroundPosition, GroundSize, Viewport, ViewportPatch, ViewportTransform};
pub use workspace::Workspace;
