//! Editor bootstrap and event routing.

use groundplane_core::storage::{AutoSaveManager, Storage, StorageResult};
use groundplane_core::{
    CursorStyle, CursorTracker, DebugOverlay, GroundEvents, InputBinding, InputEvent, Pointer,
    PointerTracker, ToolMode, Viewport, ViewportController, ViewportPatch, ViewportTransform,
    WheelEvent, Workspace,
};
use kurbo::Size;
use std::cell::{Ref, RefCell};
use std::rc::Rc;
use std::time::{Duration, Instant};

use crate::input::Translated;

/// Host window surface the editor reflects its state on.
pub trait WindowView {
    fn set_cursor(&mut self, cursor: CursorStyle);
    fn set_title(&mut self, title: &str);
}

/// Tool and viewport waiting to be written back to the workspace.
type PendingSave = Rc<RefCell<Option<(ToolMode, Viewport)>>>;

/// Controller observer that updates the window and queues saves.
struct EditorEvents {
    view: Box<dyn WindowView>,
    title: String,
    tool: ToolMode,
    scale: i32,
    pending: PendingSave,
}

impl EditorEvents {
    fn refresh_title(&mut self) {
        let title = format!("{} - {} - {}%", self.title, self.tool, self.scale);
        self.view.set_title(&title);
    }
}

impl GroundEvents for EditorEvents {
    fn tool_changed(&mut self, tool: ToolMode) {
        self.tool = tool;
        self.view.set_cursor(tool.cursor());
        self.refresh_title();
    }

    fn viewport_changed(&mut self, transform: ViewportTransform) {
        if transform.scale != self.scale {
            self.scale = transform.scale;
            self.refresh_title();
        }
    }

    fn save_requested(&mut self, tool: ToolMode, viewport: &Viewport) {
        *self.pending.borrow_mut() = Some((tool, *viewport));
    }
}

/// Owns the tracker, the controller and the persisted workspace.
pub struct Editor<S: Storage> {
    tracker: PointerTracker,
    controller: ViewportController,
    overlay: Rc<RefCell<DebugOverlay>>,
    cursor: CursorTracker,
    workspace: Workspace,
    pending: PendingSave,
    autosave: AutoSaveManager<S>,
    scene: Size,
}

impl<S: Storage> Editor<S> {
    /// Bring up the editor for a loaded workspace.
    pub fn new(
        workspace: Workspace,
        autosave: AutoSaveManager<S>,
        binding: Box<dyn InputBinding>,
        view: Box<dyn WindowView>,
        title: &str,
    ) -> Self {
        let overlay = Rc::new(RefCell::new(DebugOverlay::new()));
        let pending = PendingSave::default();
        let events = EditorEvents {
            view,
            title: title.to_string(),
            tool: workspace.tools.selected,
            scale: workspace.ground.scale,
            pending: pending.clone(),
        };

        let mut editor = Self {
            tracker: PointerTracker::new(binding),
            controller: ViewportController::new(
                Viewport::default(),
                Box::new(events),
                Box::new(overlay.clone()),
            ),
            cursor: CursorTracker::new(Box::new(overlay.clone())),
            overlay,
            workspace,
            pending,
            autosave,
            scene: Size::ZERO,
        };

        let settings = editor.workspace.settings.debugger;
        if settings.enabled {
            editor.overlay.borrow_mut().start();
        }
        if settings.mouse_tracker {
            editor.cursor.start();
        }
        editor
            .controller
            .restore(&ViewportPatch::from(editor.workspace.ground));
        editor.controller.select_tool(editor.workspace.tools.selected);
        editor.sync_workspace();
        editor
    }

    pub fn controller(&self) -> &ViewportController {
        &self.controller
    }

    pub fn tracker(&self) -> &PointerTracker {
        &self.tracker
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    pub fn overlay(&self) -> Ref<'_, DebugOverlay> {
        self.overlay.borrow()
    }

    /// Whether the workspace has changes not yet written to storage.
    pub fn is_dirty(&self) -> bool {
        self.autosave.is_dirty()
    }

    /// Route one translated window event.
    pub fn apply(&mut self, translated: &Translated) {
        match translated {
            Translated::Input(input) => self.handle_input(input),
            Translated::Wheel(wheel) => self.handle_wheel(wheel),
            Translated::Hover(pointer) => self.cursor_moved(pointer),
        }
    }

    pub fn handle_input(&mut self, event: &InputEvent) {
        self.tracker.handle(event, &mut self.controller);
        self.sync_workspace();
    }

    pub fn handle_wheel(&mut self, wheel: &WheelEvent) {
        self.cursor.wheel(wheel);
        self.controller.wheel(wheel);
        self.sync_workspace();
    }

    pub fn cursor_moved(&mut self, pointer: &Pointer) {
        let hit = self.controller.hit_test(pointer.client, self.scene);
        self.cursor.cursor_moved(pointer, hit);
    }

    pub fn select_tool(&mut self, tool: ToolMode) {
        self.controller.select_tool(tool);
        self.sync_workspace();
    }

    /// Show or hide the debug overlay and remember the choice.
    pub fn toggle_debugger(&mut self) {
        let enabled = {
            let mut overlay = self.overlay.borrow_mut();
            if overlay.is_visible() {
                overlay.stop();
            } else {
                overlay.start();
            }
            overlay.is_visible()
        };
        self.workspace.settings.debugger.enabled = enabled;
        self.autosave.mark_dirty();
    }

    /// Size of the window content, in logical pixels.
    pub fn set_scene_size(&mut self, size: Size) {
        self.scene = size;
    }

    /// Time until the overlay may draw its next frame.
    pub fn frame_interval(&self) -> Duration {
        self.overlay.borrow().frame_interval()
    }

    /// Render the overlay if a frame is due.
    pub fn tick(&mut self, now: Instant) -> Option<String> {
        self.overlay.borrow_mut().render_if_due(now)
    }

    /// Persist the workspace if it changed and the save interval elapsed.
    pub async fn autosave(&mut self) -> StorageResult<bool> {
        self.autosave.maybe_save(&self.workspace).await
    }

    /// Write any unsaved changes.
    pub async fn shutdown(&mut self) -> StorageResult<()> {
        if self.autosave.is_dirty() {
            self.autosave.save(&self.workspace).await?;
            log::info!("Workspace saved on exit");
        }
        Ok(())
    }

    fn sync_workspace(&mut self) {
        let Some((tool, ground)) = self.pending.borrow_mut().take() else {
            return;
        };
        if tool != self.workspace.tools.selected || ground != self.workspace.ground {
            self.workspace.tools.selected = tool;
            self.workspace.ground = ground;
            self.autosave.mark_dirty();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use groundplane_core::pointer::{MouseInput, PRIMARY_BUTTON};
    use groundplane_core::storage::{MemoryStorage, WORKSPACE_KEY};
    use crate::input::{WinitBinding, WinitInput};
    use groundplane_core::{DeltaMode, GesturePhase, GroundPosition, NullBinding, Phase};
    use kurbo::Point;
    use std::sync::Arc;
    use winit::dpi::PhysicalPosition;
    use winit::event::{
        DeviceId, ElementState, MouseButton, MouseScrollDelta, TouchPhase, WindowEvent,
    };

    #[derive(Clone, Default)]
    struct RecordingView {
        cursors: Rc<RefCell<Vec<CursorStyle>>>,
        titles: Rc<RefCell<Vec<String>>>,
    }

    impl WindowView for RecordingView {
        fn set_cursor(&mut self, cursor: CursorStyle) {
            self.cursors.borrow_mut().push(cursor);
        }

        fn set_title(&mut self, title: &str) {
            self.titles.borrow_mut().push(title.to_string());
        }
    }

    fn editor(workspace: Workspace) -> (Editor<MemoryStorage>, RecordingView, Arc<MemoryStorage>) {
        let storage = Arc::new(MemoryStorage::new());
        let view = RecordingView::default();
        let editor = Editor::new(
            workspace,
            AutoSaveManager::new(storage.clone()),
            Box::new(NullBinding::default()),
            Box::new(view.clone()),
            "Groundplane",
        );
        (editor, view, storage)
    }

    fn mouse(phase: Phase, x: f64, y: f64) -> InputEvent {
        InputEvent::Mouse {
            phase,
            input: MouseInput {
                page: Point::new(x, y),
                client: Point::new(x, y),
                button: PRIMARY_BUTTON,
            },
        }
    }

    fn line_wheel(delta_y: f64) -> WheelEvent {
        WheelEvent {
            delta_x: 0.0,
            delta_y,
            mode: DeltaMode::Line,
        }
    }

    #[test]
    fn test_bootstrap_applies_workspace() {
        let mut workspace = Workspace::new(1000.0);
        workspace.tools.selected = ToolMode::Hand;
        workspace.ground.scale = 150;
        let (editor, view, _) = editor(workspace);

        assert_eq!(editor.controller().tool(), ToolMode::Hand);
        assert_eq!(editor.controller().viewport(), &workspace.ground);
        assert!(editor.overlay().is_visible());
        assert_eq!(editor.overlay().get("tool"), Some("hand"));
        assert_eq!(view.cursors.borrow().last(), Some(&CursorStyle::Grab));
        assert_eq!(
            view.titles.borrow().last().map(String::as_str),
            Some("Groundplane - hand - 150%")
        );
        assert!(!editor.is_dirty());
    }

    #[test]
    fn test_debugger_settings_respected() {
        let mut workspace = Workspace::new(1000.0);
        workspace.settings.debugger.enabled = false;
        workspace.settings.debugger.mouse_tracker = false;
        let (editor, _, _) = editor(workspace);

        assert!(!editor.overlay().is_visible());
        assert_eq!(editor.overlay().get("pagePos"), None);
    }

    #[test]
    fn test_pan_updates_workspace_and_saves() {
        let mut workspace = Workspace::new(1000.0);
        workspace.tools.selected = ToolMode::Hand;
        workspace.ground.position = GroundPosition::new(300, 512);
        let (mut editor, _, storage) = editor(workspace);

        editor.handle_input(&mouse(Phase::Start, 100.0, 100.0));
        editor.handle_input(&mouse(Phase::Move, 110.0, 95.0));
        editor.handle_input(&mouse(Phase::End, 110.0, 95.0));

        assert_eq!(editor.workspace().ground.position, GroundPosition::new(305, 502));
        assert!(editor.is_dirty());

        assert!(pollster::block_on(editor.autosave()).unwrap());
        let stored = pollster::block_on(storage.load(WORKSPACE_KEY)).unwrap();
        assert_eq!(stored, editor.workspace().to_json().unwrap());
    }

    #[test]
    fn test_wheel_zoom_updates_title() {
        let mut workspace = Workspace::new(1000.0);
        workspace.tools.selected = ToolMode::Hand;
        let (mut editor, view, _) = editor(workspace);

        editor.handle_wheel(&line_wheel(-1.0));
        assert_eq!(editor.workspace().ground.scale, 110);
        assert_eq!(
            view.titles.borrow().last().map(String::as_str),
            Some("Groundplane - hand - 110%")
        );
        assert_eq!(editor.overlay().get("mouseWheel"), Some("x: 0 / y: -1"));
    }

    #[test]
    fn test_focus_loss_mid_drag_ends_gesture() {
        let mut workspace = Workspace::new(1000.0);
        workspace.tools.selected = ToolMode::Hand;
        let binding = WinitBinding::new();
        let mut editor = Editor::new(
            workspace,
            AutoSaveManager::new(Arc::new(MemoryStorage::new())),
            Box::new(binding.clone()),
            Box::new(RecordingView::default()),
            "Groundplane",
        );
        let mut input = WinitInput::new(binding.clone(), 1.0);

        // SAFETY: only used to build synthetic events.
        let device_id = unsafe { DeviceId::dummy() };
        let events = [
            WindowEvent::CursorMoved { device_id, position: PhysicalPosition::new(10.0, 10.0) },
            WindowEvent::MouseInput {
                device_id,
                state: ElementState::Pressed,
                button: MouseButton::Left,
            },
            WindowEvent::Focused(false),
            WindowEvent::Focused(true),
            WindowEvent::MouseWheel {
                device_id,
                delta: MouseScrollDelta::LineDelta(0.0, 1.0),
                phase: TouchPhase::Moved,
            },
        ];
        for event in &events {
            for translated in input.translate(event) {
                editor.apply(&translated);
            }
        }

        assert_eq!(editor.controller().phase(), GesturePhase::Idle);
        assert!(editor.tracker().pointers().is_empty());
        assert!(!binding.is_listening());
        assert_eq!(editor.workspace().ground.scale, 110);
    }

    #[test]
    fn test_select_tool_persists() {
        let (mut editor, view, _) = editor(Workspace::new(1000.0));
        editor.select_tool(ToolMode::Add);

        assert_eq!(editor.workspace().tools.selected, ToolMode::Add);
        assert!(editor.is_dirty());
        assert_eq!(view.cursors.borrow().last(), Some(&CursorStyle::Default));
    }

    #[test]
    fn test_cursor_moved_reports_hover_target() {
        let (mut editor, _, _) = editor(Workspace::new(1000.0));
        editor.set_scene_size(Size::new(800.0, 600.0));

        let outside = Point::new(-2000.0, -2000.0);
        editor.cursor_moved(&Pointer::new(groundplane_core::MOUSE_POINTER_ID, outside, outside));
        assert_eq!(editor.overlay().get("hoverObj"), Some("?"));
        assert_eq!(editor.overlay().get("posRegion"), Some("other"));
    }

    #[test]
    fn test_toggle_debugger() {
        let (mut editor, _, _) = editor(Workspace::new(1000.0));
        editor.toggle_debugger();
        assert!(!editor.overlay().is_visible());
        assert!(!editor.workspace().settings.debugger.enabled);

        editor.toggle_debugger();
        assert!(editor.workspace().settings.debugger.enabled);
        assert!(editor.tick(Instant::now()).is_some());
    }

    #[test]
    fn test_shutdown_flushes_unsaved_changes() {
        let (mut editor, _, storage) = editor(Workspace::new(1000.0));
        editor.select_tool(ToolMode::Hand);

        pollster::block_on(editor.shutdown()).unwrap();
        assert!(!editor.is_dirty());
        let stored = pollster::block_on(storage.load(WORKSPACE_KEY)).unwrap();
        assert!(stored.contains("\"hand\""));
    }
}
