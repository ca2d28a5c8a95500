//! Diagnostic key/value channel and the on-screen debug overlay.
//!
//! Core components never own the overlay's data: they publish and clear
//! keys through a [`DiagnosticSink`]. Keys belonging to a gesture or to
//! cursor tracking are published when that phase starts and cleared when
//! it ends.

use crate::controller::{HitTarget, WheelEvent};
use crate::pointer::Pointer;
use std::cell::RefCell;
use std::rc::Rc;
use std::time::{Duration, Instant};

/// Maximum overlay redraws per second.
pub const OVERLAY_FPS: u32 = 18;

/// Observer for diagnostic key/value pairs.
pub trait DiagnosticSink {
    /// Set `key` to `value`, adding it if missing.
    fn publish(&mut self, key: &str, value: String);

    /// Remove `key`. Missing keys are ignored.
    fn clear(&mut self, key: &str);
}

/// Sink that drops everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullDiagnostics;

impl DiagnosticSink for NullDiagnostics {
    fn publish(&mut self, _key: &str, _value: String) {}

    fn clear(&mut self, _key: &str) {}
}

impl<T: DiagnosticSink + ?Sized> DiagnosticSink for Rc<RefCell<T>> {
    fn publish(&mut self, key: &str, value: String) {
        self.borrow_mut().publish(key, value);
    }

    fn clear(&mut self, key: &str) {
        self.borrow_mut().clear(key);
    }
}

/// Key/value table drawn over the scene.
///
/// Redraws are throttled to [`OVERLAY_FPS`] and skipped entirely when
/// nothing changed since the last frame.
#[derive(Debug, Clone)]
pub struct DebugOverlay {
    /// Entries in first-published order.
    entries: Vec<(String, String)>,
    visible: bool,
    /// Bumped on every change to `entries`.
    revision: u64,
    rendered_revision: Option<u64>,
    last_frame: Option<Instant>,
    frame_interval: Duration,
}

impl Default for DebugOverlay {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            visible: false,
            revision: 0,
            rendered_revision: None,
            last_frame: None,
            frame_interval: Duration::from_millis(u64::from(1000 / OVERLAY_FPS)),
        }
    }
}

impl DebugOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Show the overlay and schedule a full redraw.
    pub fn start(&mut self) {
        log::info!("Debug overlay started");
        self.visible = true;
        self.rendered_revision = None;
        self.last_frame = None;
    }

    /// Hide the overlay. Entries are kept.
    pub fn stop(&mut self) {
        log::info!("Debug overlay stopped");
        self.visible = false;
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn frame_interval(&self) -> Duration {
        self.frame_interval
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn entries(&self) -> &[(String, String)] {
        &self.entries
    }

    /// Render a frame if the overlay is visible, a frame is due and the
    /// contents changed since the last rendered frame.
    pub fn render_if_due(&mut self, now: Instant) -> Option<String> {
        if !self.visible {
            return None;
        }
        if let Some(last) = self.last_frame {
            if now.saturating_duration_since(last) < self.frame_interval {
                return None;
            }
        }
        self.last_frame = Some(now);

        if self.rendered_revision == Some(self.revision) {
            return None;
        }
        self.rendered_revision = Some(self.revision);
        Some(self.render())
    }

    /// Render the table unconditionally.
    pub fn render(&self) -> String {
        let width = self.entries.iter().map(|(k, _)| k.len()).max().unwrap_or(0);
        let mut out = String::new();
        for (key, value) in &self.entries {
            out.push_str(&format!("{:<width$}  {}\n", key, value, width = width));
        }
        out
    }
}

impl DiagnosticSink for DebugOverlay {
    fn publish(&mut self, key: &str, value: String) {
        match self.entries.iter_mut().find(|(k, _)| k == key) {
            Some((_, existing)) if *existing == value => return,
            Some((_, existing)) => *existing = value,
            None => self.entries.push((key.to_string(), value)),
        }
        self.revision += 1;
    }

    fn clear(&mut self, key: &str) {
        let before = self.entries.len();
        self.entries.retain(|(k, _)| k != key);
        if self.entries.len() != before {
            self.revision += 1;
        }
    }
}

const CURSOR_KEYS: [&str; 6] =
    ["pagePos", "clientPos", "posRegion", "hoverObj", "tool", "mouseWheel"];

/// Publishes where the cursor is and what it hovers.
pub struct CursorTracker {
    sink: Box<dyn DiagnosticSink>,
    active: bool,
}

impl CursorTracker {
    pub fn new(sink: Box<dyn DiagnosticSink>) -> Self {
        Self { sink, active: false }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn start(&mut self) {
        if self.active {
            return;
        }
        log::info!("Mouse tracking started");
        self.active = true;
        self.sink.publish("pagePos", "x: - / y: -".to_string());
        self.sink.publish("clientPos", "x: - / y: -".to_string());
        self.sink.publish("posRegion", "-".to_string());
        self.sink.publish("hoverObj", "-".to_string());
        self.sink.publish("tool", "-".to_string());
        self.sink.publish("mouseWheel", "x: - / y: -".to_string());
    }

    pub fn stop(&mut self) {
        if !self.active {
            return;
        }
        log::info!("Mouse tracking stopped");
        self.active = false;
        for key in CURSOR_KEYS {
            self.sink.clear(key);
        }
    }

    /// Record a cursor move and what lies under it.
    pub fn cursor_moved(&mut self, pointer: &Pointer, hit: HitTarget) {
        if !self.active {
            return;
        }
        self.sink.publish(
            "pagePos",
            format!("x: {} / y: {}", pointer.page.x, pointer.page.y),
        );
        self.sink.publish(
            "clientPos",
            format!("x: {} / y: {}", pointer.client.x, pointer.client.y),
        );
        self.sink.publish("hoverObj", hit.name().to_string());
        self.sink.publish("posRegion", hit.region().to_string());
        self.sink.publish("mouseWheel", "x: 0 / y: 0".to_string());
    }

    pub fn wheel(&mut self, wheel: &WheelEvent) {
        if !self.active {
            return;
        }
        self.sink.publish(
            "mouseWheel",
            format!("x: {} / y: {}", wheel.delta_x, wheel.delta_y),
        );
    }
}
