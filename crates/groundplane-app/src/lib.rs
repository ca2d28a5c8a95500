//! Groundplane Application
//!
//! The native application shell: windowing, input translation and
//! workspace persistence around the core editor.

mod app;
mod editor;
mod input;
mod shortcuts;

pub use app::{App, AppConfig, AppError};
pub use editor::{Editor, WindowView};
pub use input::{Translated, WinitBinding, WinitInput};
pub use shortcuts::{Shortcut, ShortcutAction, ShortcutRegistry};
