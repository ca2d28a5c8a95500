//! Core application state and lifecycle.

use groundplane_core::storage::{
    create_default_storage, AutoSaveManager, FileStorage, StorageError,
};
use groundplane_core::{CursorStyle, ToolMode};
use kurbo::Size;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::error::{EventLoopError, OsError};
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{Key, NamedKey};
use winit::window::{CursorIcon, Window, WindowId};

use crate::editor::{Editor, WindowView};
use crate::input::{WinitBinding, WinitInput};
use crate::shortcuts::{ShortcutAction, ShortcutRegistry};

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    /// Workspace directory; the platform data directory when `None`.
    pub storage_dir: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            title: "Groundplane".to_string(),
            width: 1280,
            height: 800,
            storage_dir: None,
        }
    }
}

/// Errors that stop the application.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Event loop error: {0}")]
    EventLoop(#[from] EventLoopError),
    #[error("Failed to create window: {0}")]
    Window(#[from] OsError),
    #[error("Workspace storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Reflects editor state on the native window.
struct NativeView {
    window: Arc<Window>,
}

impl WindowView for NativeView {
    fn set_cursor(&mut self, cursor: CursorStyle) {
        let icon = match cursor {
            CursorStyle::Grab => CursorIcon::Grab,
            CursorStyle::Default => CursorIcon::Default,
        };
        self.window.set_cursor(icon);
    }

    fn set_title(&mut self, title: &str) {
        self.window.set_title(title);
    }
}

/// Runtime state for the application.
struct AppState {
    window: Arc<Window>,
    editor: Editor<FileStorage>,
    input: WinitInput,
}

/// Main application struct.
pub struct App {
    config: AppConfig,
    state: Option<AppState>,
    /// Fatal error raised inside the event loop.
    error: Option<AppError>,
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

impl App {
    /// Create a new application with default configuration.
    pub fn new() -> Self {
        Self::with_config(AppConfig::default())
    }

    /// Create a new application with custom configuration.
    pub fn with_config(config: AppConfig) -> Self {
        Self {
            config,
            state: None,
            error: None,
        }
    }

    /// Run the event loop until the window closes.
    pub fn run(mut self) -> Result<(), AppError> {
        let event_loop = EventLoop::new()?;
        event_loop.run_app(&mut self)?;
        match self.error.take() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn init(&self, event_loop: &ActiveEventLoop) -> Result<AppState, AppError> {
        log::info!("Creating window...");
        let window_attrs = Window::default_attributes()
            .with_title(&self.config.title)
            .with_inner_size(LogicalSize::new(self.config.width, self.config.height));
        let window = Arc::new(event_loop.create_window(window_attrs)?);
        let scale_factor = window.scale_factor();

        // New workspaces are laid out for the monitor, not the window.
        let screen_height = window
            .current_monitor()
            .map(|monitor| monitor.size().to_logical::<f64>(monitor.scale_factor()).height)
            .unwrap_or(f64::from(self.config.height));

        let storage = match &self.config.storage_dir {
            Some(dir) => Arc::new(FileStorage::new(dir.clone())?),
            None => create_default_storage()?,
        };
        log::info!("Workspace storage: {}", storage.base_path().display());
        let mut autosave = AutoSaveManager::new(storage);
        let workspace = pollster::block_on(autosave.load_workspace(screen_height))?;

        let binding = WinitBinding::new();
        let mut editor = Editor::new(
            workspace,
            autosave,
            Box::new(binding.clone()),
            Box::new(NativeView { window: window.clone() }),
            &self.config.title,
        );
        let size = window.inner_size().to_logical::<f64>(scale_factor);
        editor.set_scene_size(Size::new(size.width, size.height));

        log::info!("Keyboard shortcuts:\n{}", ShortcutRegistry::describe());
        Ok(AppState {
            window,
            editor,
            input: WinitInput::new(binding, scale_factor),
        })
    }
}

impl AppState {
    fn handle_key(&mut self, event: &KeyEvent) {
        if event.state != ElementState::Pressed || event.repeat {
            return;
        }
        let action = match &event.logical_key {
            Key::Character(c) => ShortcutRegistry::lookup(c.as_str()),
            Key::Named(NamedKey::F12) => ShortcutRegistry::lookup("F12"),
            _ => None,
        };
        match action {
            Some(ShortcutAction::SelectTool(tool)) => self.select_tool(tool),
            Some(ShortcutAction::ToggleDebugger) => self.editor.toggle_debugger(),
            None => {}
        }
    }

    fn select_tool(&mut self, tool: ToolMode) {
        if self.editor.controller().tool() != tool {
            self.editor.select_tool(tool);
        }
    }

    fn save_on_exit(&mut self) {
        if let Err(e) = pollster::block_on(self.editor.shutdown()) {
            log::warn!("Failed to save workspace: {}", e);
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_some() {
            return;
        }

        match self.init(event_loop) {
            Ok(state) => {
                log::info!("Window created");
                self.state = Some(state);
            }
            Err(e) => {
                log::error!("Failed to start: {}", e);
                self.error = Some(e);
                event_loop.exit();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(state) = &mut self.state else {
            return;
        };
        if window_id != state.window.id() {
            return;
        }

        match event {
            WindowEvent::CloseRequested => {
                state.save_on_exit();
                event_loop.exit();
            }

            WindowEvent::Resized(size) => {
                if size.width == 0 || size.height == 0 {
                    return;
                }
                let size = size.to_logical::<f64>(state.window.scale_factor());
                state.editor.set_scene_size(Size::new(size.width, size.height));
            }

            WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                state.input.set_scale_factor(scale_factor);
            }

            WindowEvent::KeyboardInput { event, .. } => {
                state.handle_key(&event);
            }

            event => {
                for translated in state.input.translate(&event) {
                    state.editor.apply(&translated);
                }
            }
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        let Some(state) = &mut self.state else {
            return;
        };

        let now = Instant::now();
        if let Some(frame) = state.editor.tick(now) {
            log::debug!("Debug overlay:\n{}", frame);
        }
        if let Err(e) = pollster::block_on(state.editor.autosave()) {
            log::warn!("Autosave failed: {}", e);
        }
        event_loop.set_control_flow(ControlFlow::WaitUntil(now + state.editor.frame_interval()));
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(state) = &mut self.state {
            state.save_on_exit();
        }
    }
}
