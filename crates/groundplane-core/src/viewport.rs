//! Viewport state of the ground surface.

use kurbo::{Point, Rect, Size};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Default scale, in percent.
pub const DEFAULT_SCALE: i32 = 100;

/// Ground size in client units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroundSize {
    pub width: i32,
    pub height: i32,
}

/// Offset of the viewport over the ground. Grows as the view moves
/// right/down over the content; may go negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GroundPosition {
    pub top: i32,
    pub left: i32,
}

impl GroundPosition {
    pub fn new(top: i32, left: i32) -> Self {
        Self { top, left }
    }
}

/// Pannable, zoomable frame through which the ground is viewed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub size: GroundSize,
    pub position: GroundPosition,
    /// Zoom in percent. Unbounded; clamping is up to the embedding app.
    pub scale: i32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            size: GroundSize { width: 1024, height: 2048 },
            position: GroundPosition::default(),
            scale: DEFAULT_SCALE,
        }
    }
}

/// What the rendering collaborator needs to place the ground.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewportTransform {
    pub position: GroundPosition,
    pub scale: i32,
}

impl Viewport {
    pub fn transform(&self) -> ViewportTransform {
        ViewportTransform {
            position: self.position,
            scale: self.scale,
        }
    }

    /// The ground's rectangle in client space.
    ///
    /// The ground sits at the negated position and is scaled about its
    /// own center.
    pub fn client_rect(&self) -> Rect {
        let width = f64::from(self.size.width);
        let height = f64::from(self.size.height);
        let center = Point::new(
            -f64::from(self.position.left) + width / 2.0,
            -f64::from(self.position.top) + height / 2.0,
        );
        let factor = (f64::from(self.scale) / 100.0).abs();
        Rect::from_center_size(center, Size::new(width * factor, height * factor))
    }

    /// Apply the valid fields of a patch. Returns whether anything changed.
    pub fn apply(&mut self, patch: &ViewportPatch) -> bool {
        let before = *self;
        if let Some(width) = patch.width {
            self.size.width = width;
        }
        if let Some(height) = patch.height {
            self.size.height = height;
        }
        if let Some(top) = patch.top {
            self.position.top = top;
        }
        if let Some(left) = patch.left {
            self.position.left = left;
        }
        if let Some(scale) = patch.scale {
            self.scale = scale;
        }
        before != *self
    }
}

/// Partial viewport state, as restored from untrusted storage.
///
/// Each field is `None` when it was absent or not a usable number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ViewportPatch {
    pub width: Option<i32>,
    pub height: Option<i32>,
    pub top: Option<i32>,
    pub left: Option<i32>,
    pub scale: Option<i32>,
}

impl ViewportPatch {
    /// Read `{ size: {width, height}, position: {top, left}, scale }`,
    /// keeping whatever fields are usable.
    pub fn from_value(value: &Value) -> Self {
        let size = value.get("size");
        let position = value.get("position");
        Self {
            width: size.and_then(|s| number_field(s, "width")),
            height: size.and_then(|s| number_field(s, "height")),
            top: position.and_then(|p| number_field(p, "top")),
            left: position.and_then(|p| number_field(p, "left")),
            scale: number_field(value, "scale"),
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

impl From<Viewport> for ViewportPatch {
    fn from(viewport: Viewport) -> Self {
        Self {
            width: Some(viewport.size.width),
            height: Some(viewport.size.height),
            top: Some(viewport.position.top),
            left: Some(viewport.position.left),
            scale: Some(viewport.scale),
        }
    }
}

fn number_field(object: &Value, key: &str) -> Option<i32> {
    let field = object.get(key)?;
    let number = field
        .as_f64()
        .filter(|n| *n >= f64::from(i32::MIN) && *n <= f64::from(i32::MAX));
    if number.is_none() {
        log::warn!("Ignoring invalid viewport field {}: {}", key, field);
    }
    number.map(|n| n.round() as i32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_patch_skips_invalid_fields() {
        let patch = ViewportPatch::from_value(&json!({
            "position": { "top": "bad", "left": 20 }
        }));
        assert_eq!(patch.top, None);
        assert_eq!(patch.left, Some(20));

        let mut viewport = Viewport::default();
        viewport.position = GroundPosition::new(7, 3);
        assert!(viewport.apply(&patch));
        assert_eq!(viewport.position, GroundPosition::new(7, 20));
    }

    #[test]
    fn test_patch_full() {
        let patch = ViewportPatch::from_value(&json!({
            "size": { "width": 640, "height": 480 },
            "position": { "top": -12, "left": 512 },
            "scale": 150
        }));
        let mut viewport = Viewport::default();
        viewport.apply(&patch);
        assert_eq!(viewport.size, GroundSize { width: 640, height: 480 });
        assert_eq!(viewport.position, GroundPosition::new(-12, 512));
        assert_eq!(viewport.scale, 150);
    }

    #[test]
    fn test_patch_rejects_out_of_range_and_non_objects() {
        let patch = ViewportPatch::from_value(&json!({
            "size": "huge",
            "position": { "top": 1e12, "left": null },
            "scale": [100]
        }));
        assert!(patch.is_empty());

        let mut viewport = Viewport::default();
        assert!(!viewport.apply(&patch));
        assert_eq!(viewport, Viewport::default());
    }

    #[test]
    fn test_fractional_values_round() {
        let patch = ViewportPatch::from_value(&json!({ "position": { "top": 307.2 } }));
        assert_eq!(patch.top, Some(307));
    }

    #[test]
    fn test_client_rect_follows_position_and_scale() {
        let viewport = Viewport {
            size: GroundSize { width: 100, height: 200 },
            position: GroundPosition::new(50, -10),
            scale: 100,
        };
        assert_eq!(viewport.client_rect(), Rect::new(10.0, -50.0, 110.0, 150.0));

        let zoomed = Viewport { scale: 50, ..viewport };
        assert_eq!(zoomed.client_rect(), Rect::new(35.0, 0.0, 85.0, 100.0));
    }
}
