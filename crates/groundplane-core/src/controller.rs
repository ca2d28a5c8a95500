//! Tool-dependent interpretation of gestures and wheel input.
//!
//! [`ViewportController`] receives contact callbacks from the
//! [`PointerTracker`](crate::tracker::PointerTracker) and wheel events from
//! the host, and turns them into selection geometry or viewport changes
//! depending on the active [`ToolMode`].
//!
//! # Gestures
//!
//! A gesture starts with the first accepted contact and ends when the last
//! contact is released. The tool is pinned when the gesture starts: calling
//! [`select_tool`](ViewportController::select_tool) mid-gesture only affects
//! the next one. At most [`MAX_CONTACTS`] contacts take part; further ones
//! are rejected. Wheel input is ignored while a gesture is active.

use crate::diagnostics::DiagnosticSink;
use crate::pointer::Pointer;
use crate::selection::{Selection, SelectionRect};
use crate::tool::ToolMode;
use crate::tracker::{InputEvent, PointerHandler, PointerSet};
use crate::viewport::{GroundPosition, Viewport, ViewportPatch, ViewportTransform};
use kurbo::{Point, Rect, Size};
use serde::{Deserialize, Serialize};

/// Concurrent contacts a gesture may use (two leaves room for pinch).
pub const MAX_CONTACTS: usize = 2;

/// Wheel pan amplification for line-based deltas.
pub const LINE_SCROLL_FACTOR: f64 = 15.0;

/// Wheel pan amplification for pixel- and page-based deltas.
pub const PIXEL_SCROLL_FACTOR: f64 = 0.0;

/// Scale change per wheel tick in hand mode, in percent.
pub const SCALE_STEP: i32 = 10;

/// Unit of a wheel delta.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DeltaMode {
    /// Fine-grained deltas (trackpads, smooth wheels).
    #[default]
    Pixel,
    /// Coarse, notched wheel deltas.
    Line,
    Page,
}

impl DeltaMode {
    pub fn pan_factor(self) -> f64 {
        match self {
            Self::Line => LINE_SCROLL_FACTOR,
            Self::Pixel | Self::Page => PIXEL_SCROLL_FACTOR,
        }
    }
}

/// A wheel or trackpad scroll. Positive `delta_y` scrolls down.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WheelEvent {
    pub delta_x: f64,
    pub delta_y: f64,
    pub mode: DeltaMode,
}

/// What lies under a client position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitTarget {
    Selection,
    Ground,
    Scene,
    Outside,
}

impl HitTarget {
    /// Identifier of the topmost element.
    pub fn name(self) -> &'static str {
        match self {
            Self::Selection => "sceneSelection",
            Self::Ground => "ground",
            Self::Scene => "scene",
            Self::Outside => "?",
        }
    }

    /// Coarse region: the ground, the bare scene, or elsewhere.
    pub fn region(self) -> &'static str {
        match self {
            Self::Selection | Self::Ground => "ground",
            Self::Scene => "scene",
            Self::Outside => "other",
        }
    }
}

/// Observer for controller output.
pub trait GroundEvents {
    /// The active tool changed; update cursor and tool indicators.
    fn tool_changed(&mut self, _tool: ToolMode) {}

    /// Selection geometry changed; `None` once the selection is gone.
    fn selection_changed(&mut self, _rect: Option<SelectionRect>) {}

    /// Viewport state changed; re-place the ground with `transform`.
    fn viewport_changed(&mut self, _transform: ViewportTransform) {}

    /// Tool or viewport state should be persisted.
    fn save_requested(&mut self, _tool: ToolMode, _viewport: &Viewport) {}
}

/// Observer that ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopEvents;

impl GroundEvents for NoopEvents {}

/// Whether a gesture is in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GesturePhase {
    Idle,
    Active,
}

/// Drag state of a hand-tool pan.
#[derive(Debug, Clone, Copy, PartialEq)]
struct GroundMove {
    from: Point,
    to: Point,
    initial: GroundPosition,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Gesture {
    Idle,
    Selecting(Selection),
    Panning(GroundMove),
    /// Contacts under a tool without gesture behavior.
    Inert,
}

/// Owns tool selection and viewport state.
pub struct ViewportController {
    tool: ToolMode,
    viewport: Viewport,
    gesture: Gesture,
    events: Box<dyn GroundEvents>,
    diagnostics: Box<dyn DiagnosticSink>,
}

impl ViewportController {
    pub fn new(
        viewport: Viewport,
        events: Box<dyn GroundEvents>,
        diagnostics: Box<dyn DiagnosticSink>,
    ) -> Self {
        Self {
            tool: ToolMode::default(),
            viewport,
            gesture: Gesture::Idle,
            events,
            diagnostics,
        }
    }

    pub fn tool(&self) -> ToolMode {
        self.tool
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn phase(&self) -> GesturePhase {
        match self.gesture {
            Gesture::Idle => GesturePhase::Idle,
            _ => GesturePhase::Active,
        }
    }

    /// Tool the in-flight gesture was started with.
    pub fn gesture_tool(&self) -> Option<ToolMode> {
        match self.gesture {
            Gesture::Idle => None,
            Gesture::Selecting(_) => Some(ToolMode::Pointer),
            Gesture::Panning(_) => Some(ToolMode::Hand),
            Gesture::Inert => Some(ToolMode::Add),
        }
    }

    /// Current selection geometry, if a selection gesture is active.
    pub fn selection_rect(&self) -> Option<SelectionRect> {
        match &self.gesture {
            Gesture::Selecting(selection) => Some(selection.rect()),
            _ => None,
        }
    }

    /// Switch the active tool. An in-flight gesture keeps its tool.
    pub fn select_tool(&mut self, tool: ToolMode) {
        self.tool = tool;
        log::info!("Tool switched to {}", tool);
        self.diagnostics.publish("tool", tool.name().to_string());
        self.events.tool_changed(tool);
        self.events.save_requested(tool, &self.viewport);
    }

    /// Apply restored viewport state; unusable fields are left unchanged.
    pub fn restore(&mut self, patch: &ViewportPatch) {
        if self.viewport.apply(patch) {
            self.events.viewport_changed(self.viewport.transform());
        }
    }

    /// Handle a wheel or trackpad scroll.
    pub fn wheel(&mut self, wheel: &WheelEvent) {
        if self.phase() == GesturePhase::Active {
            log::trace!("Ignoring wheel during gesture");
            return;
        }

        match self.tool {
            ToolMode::Pointer => {
                let factor = wheel.mode.pan_factor();
                let position = GroundPosition::new(
                    self.viewport.position.top.saturating_add(to_units(wheel.delta_y * factor)),
                    self.viewport.position.left.saturating_add(to_units(wheel.delta_x * factor)),
                );
                if position != self.viewport.position {
                    log::debug!("Wheel pan to top {} left {}", position.top, position.left);
                    self.viewport.position = position;
                    self.viewport_mutated();
                }
            }
            ToolMode::Hand => {
                let step = if wheel.delta_y < 0.0 { SCALE_STEP } else { -SCALE_STEP };
                self.viewport.scale = self.viewport.scale.saturating_add(step);
                log::debug!("Wheel zoom to {}%", self.viewport.scale);
                self.viewport_mutated();
            }
            ToolMode::Add => {}
        }
    }

    /// Find what lies under `client` in a scene of the given size.
    pub fn hit_test(&self, client: Point, scene: Size) -> HitTarget {
        if self.selection_rect().is_some_and(|rect| rect.contains(client)) {
            HitTarget::Selection
        } else if self.viewport.client_rect().contains(client) {
            HitTarget::Ground
        } else if Rect::from_origin_size(Point::ZERO, scene).contains(client) {
            HitTarget::Scene
        } else {
            HitTarget::Outside
        }
    }

    fn viewport_mutated(&mut self) {
        self.events.viewport_changed(self.viewport.transform());
        self.events.save_requested(self.tool, &self.viewport);
    }

    fn publish_selection(&mut self, selection: &Selection) {
        let rect = selection.rect();
        self.diagnostics.publish(
            "selectionFrom",
            format!("x: {} / y: {}", selection.from.x, selection.from.y),
        );
        self.diagnostics.publish(
            "selectionTo",
            format!("x: {} / y: {}", selection.to.x, selection.to.y),
        );
        self.diagnostics.publish(
            "selectionPos",
            format!("top: {} / left: {}", rect.top, rect.left),
        );
        self.diagnostics.publish(
            "selectionSize",
            format!("width: {} / height: {}", rect.width, rect.height),
        );
    }
}

impl PointerHandler for ViewportController {
    fn on_start(&mut self, pointer: &Pointer, pointers: &PointerSet, _event: &InputEvent) -> bool {
        if pointers.len() >= MAX_CONTACTS {
            log::debug!("Rejecting contact {}: {} already active", pointer.id, pointers.len());
            return false;
        }
        // Additional contacts join the running gesture.
        if self.gesture != Gesture::Idle {
            return true;
        }

        log::debug!("Gesture started with {} tool", self.tool);
        self.diagnostics.publish("grabStatus", "started".to_string());
        self.gesture = match self.tool {
            ToolMode::Pointer => {
                let selection = Selection::begin(pointer.page);
                self.events.selection_changed(Some(selection.rect()));
                self.diagnostics.publish(
                    "selectionFrom",
                    format!("x: {} / y: {}", selection.from.x, selection.from.y),
                );
                Gesture::Selecting(selection)
            }
            ToolMode::Hand => {
                let initial = self.viewport.position;
                self.diagnostics.publish(
                    "groundPosBefore",
                    format!("top: {} / left: {}", initial.top, initial.left),
                );
                Gesture::Panning(GroundMove {
                    from: pointer.page,
                    to: pointer.page,
                    initial,
                })
            }
            ToolMode::Add => Gesture::Inert,
        };
        true
    }

    fn on_move(&mut self, _previous: &[Pointer], pointers: &PointerSet, _event: &InputEvent) {
        let Some(primary) = pointers.primary().copied() else {
            return;
        };
        if self.gesture == Gesture::Idle {
            return;
        }
        self.diagnostics.publish("grabStatus", "moving".to_string());

        match &mut self.gesture {
            Gesture::Idle | Gesture::Inert => {}
            Gesture::Selecting(selection) => {
                selection.update(primary.page);
                let selection = *selection;
                self.events.selection_changed(Some(selection.rect()));
                self.publish_selection(&selection);
            }
            Gesture::Panning(ground_move) => {
                ground_move.to = primary.page;
                let delta = ground_move.to - ground_move.from;
                let (dx, dy) = (to_units(delta.x), to_units(delta.y));
                self.viewport.position = GroundPosition::new(
                    ground_move.initial.top.saturating_sub(dy),
                    ground_move.initial.left.saturating_sub(dx),
                );
                self.diagnostics.publish("moveChange", format!("x: {} / y: {}", dx, dy));
                self.diagnostics.publish(
                    "groundPosAfter",
                    format!(
                        "top: {} / left: {}",
                        self.viewport.position.top, self.viewport.position.left
                    ),
                );
                self.viewport_mutated();
            }
        }
    }

    fn on_end(&mut self, _pointer: &Pointer, pointers: &PointerSet, _event: &InputEvent) {
        if let Some(primary) = pointers.primary() {
            // Re-anchor so the remaining contact continues the pan without a jump.
            if let Gesture::Panning(ground_move) = &mut self.gesture {
                ground_move.from = primary.page;
                ground_move.to = primary.page;
                ground_move.initial = self.viewport.position;
            }
            return;
        }

        let gesture = std::mem::replace(&mut self.gesture, Gesture::Idle);
        log::debug!("Gesture ended");
        self.diagnostics.clear("grabStatus");
        match gesture {
            Gesture::Idle | Gesture::Inert => {}
            Gesture::Selecting(_) => {
                self.events.selection_changed(None);
                for key in ["selectionFrom", "selectionTo", "selectionSize", "selectionPos"] {
                    self.diagnostics.clear(key);
                }
            }
            Gesture::Panning(_) => {
                for key in ["moveChange", "groundPosBefore", "groundPosAfter"] {
                    self.diagnostics.clear(key);
                }
            }
        }
    }
}

fn to_units(value: f64) -> i32 {
    value.round() as i32
}
