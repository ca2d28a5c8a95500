//! Rectangular scene selection.

use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};

/// Offset subtracted from the contact position so the rectangle lines up
/// with the border drawn around the selection handle.
pub const SELECTION_HANDLE_OFFSET: f64 = 3.0;

/// Normalized selection geometry. Width and height are never negative.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SelectionRect {
    pub top: f64,
    pub left: f64,
    pub width: f64,
    pub height: f64,
}

impl SelectionRect {
    /// Rectangle spanned by two corners, regardless of drag direction.
    pub fn from_points(from: Point, to: Point) -> Self {
        Self {
            top: from.y.min(to.y),
            left: from.x.min(to.x),
            width: (to.x - from.x).abs(),
            height: (to.y - from.y).abs(),
        }
    }

    pub fn to_rect(&self) -> Rect {
        Rect::new(self.left, self.top, self.left + self.width, self.top + self.height)
    }

    pub fn contains(&self, point: Point) -> bool {
        self.to_rect().contains(point)
    }
}

/// Corners of an in-progress selection drag.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Selection {
    pub from: Point,
    pub to: Point,
}

impl Selection {
    /// Start a selection at a contact's page position.
    pub fn begin(page: Point) -> Self {
        let from = handle_point(page);
        Self { from, to: from }
    }

    /// Move the free corner to a contact's page position.
    pub fn update(&mut self, page: Point) {
        self.to = handle_point(page);
    }

    pub fn rect(&self) -> SelectionRect {
        SelectionRect::from_points(self.from, self.to)
    }
}

fn handle_point(page: Point) -> Point {
    Point::new(page.x - SELECTION_HANDLE_OFFSET, page.y - SELECTION_HANDLE_OFFSET)
}
