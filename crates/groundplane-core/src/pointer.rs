//! Device-agnostic pointer snapshots.
//!
//! Every raw contact (a mouse press, a touch point, a pen or unified pointer
//! event) is normalized into a [`Pointer`] carrying a stable identity and its
//! position in page and client space.

use kurbo::Point;
use serde::{Deserialize, Serialize};

/// Identity of a physical contact, stable from press to release.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PointerId(pub i64);

/// There is only ever one mouse contact, so it shares a single identity.
pub const MOUSE_POINTER_ID: PointerId = PointerId(-1);

/// DOM-style index of the primary (usually left) button.
pub const PRIMARY_BUTTON: i16 = 0;

impl std::fmt::Display for PointerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A mouse event from the legacy mouse stream.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MouseInput {
    pub page: Point,
    pub client: Point,
    /// Button index (0 primary, 1 middle, 2 secondary, ...).
    pub button: i16,
}

/// One changed touch from the legacy touch stream.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TouchPoint {
    /// Hardware-assigned touch identifier.
    pub identifier: i64,
    pub page: Point,
    pub client: Point,
}

/// A sub-frame position sample attached to a unified pointer event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerSample {
    pub page: Point,
    pub client: Point,
}

/// An event from the unified pointer stream (mouse, touch or pen).
#[derive(Debug, Clone, PartialEq)]
pub struct PointerInput {
    /// Hardware-assigned pointer identifier.
    pub pointer_id: i64,
    pub page: Point,
    pub client: Point,
    pub button: i16,
    /// High-frequency samples since the last event, oldest first.
    /// `None` when the platform cannot report them.
    pub coalesced: Option<Vec<PointerSample>>,
}

/// Normalized, immutable snapshot of one contact.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pointer {
    /// Stable identity of the contact.
    pub id: PointerId,
    /// Position relative to the page.
    pub page: Point,
    /// Position relative to the visible viewport.
    pub client: Point,
}

impl Pointer {
    pub fn new(id: PointerId, page: Point, client: Point) -> Self {
        Self { id, page, client }
    }

    /// Expand a unified pointer event into per-sample snapshots.
    ///
    /// Platforms without coalesced samples, or an empty batch, yield the
    /// event itself.
    pub fn coalesced(input: &PointerInput) -> Vec<Pointer> {
        let id = PointerId(input.pointer_id);
        match &input.coalesced {
            Some(samples) if !samples.is_empty() => samples
                .iter()
                .map(|s| Pointer::new(id, s.page, s.client))
                .collect(),
            _ => vec![Pointer::from(input)],
        }
    }
}

impl From<&TouchPoint> for Pointer {
    fn from(touch: &TouchPoint) -> Self {
        Pointer::new(PointerId(touch.identifier), touch.page, touch.client)
    }
}

impl From<&PointerInput> for Pointer {
    fn from(input: &PointerInput) -> Self {
        Pointer::new(PointerId(input.pointer_id), input.page, input.client)
    }
}

impl From<&MouseInput> for Pointer {
    fn from(mouse: &MouseInput) -> Self {
        Pointer::new(MOUSE_POINTER_ID, mouse.page, mouse.client)
    }
}
