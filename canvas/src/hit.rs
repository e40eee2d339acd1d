//! Hit-testing: which element, and which part of it, sits under the pointer.
//!
//! The selected element's controls (delete button, then resize handles) are
//! tested before any element body so they stay grabbable when they overlap a
//! neighbour. Bodies are tested top-most first. Control radii are defined in
//! screen pixels and converted through the viewport so they keep a constant
//! on-screen size at every zoom level.

#[cfg(test)]
#[path = "hit_test.rs"]
mod hit_test;

use crate::consts::{DELETE_CONTROL_OFFSET_PX, DELETE_CONTROL_RADIUS_PX, HANDLE_RADIUS_PX};
use crate::elements::{CanvasElement, ElementId, ElementStore};
use crate::viewport::{Point, Viewport};

/// Which part of an element was hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitPart {
    Body,
    ResizeHandle(ResizeHandle),
    DeleteControl,
}

/// One of the eight resize handles around an element's bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeHandle {
    Top,
    TopRight,
    Right,
    BottomRight,
    Bottom,
    BottomLeft,
    Left,
    TopLeft,
}

impl ResizeHandle {
    pub const ALL: [Self; 8] = [
        Self::TopLeft,
        Self::Top,
        Self::TopRight,
        Self::Right,
        Self::BottomRight,
        Self::Bottom,
        Self::BottomLeft,
        Self::Left,
    ];

    /// Handle position as fractions of the bounding box, `(0,0)` top-left.
    #[must_use]
    pub fn anchor(self) -> (f64, f64) {
        match self {
            Self::TopLeft => (0.0, 0.0),
            Self::Top => (0.5, 0.0),
            Self::TopRight => (1.0, 0.0),
            Self::Right => (1.0, 0.5),
            Self::BottomRight => (1.0, 1.0),
            Self::Bottom => (0.5, 1.0),
            Self::BottomLeft => (0.0, 1.0),
            Self::Left => (0.0, 0.5),
        }
    }

    /// Whether dragging this handle moves the left edge.
    #[must_use]
    pub fn moves_left(self) -> bool {
        matches!(self, Self::TopLeft | Self::Left | Self::BottomLeft)
    }

    /// Whether dragging this handle moves the right edge.
    #[must_use]
    pub fn moves_right(self) -> bool {
        matches!(self, Self::TopRight | Self::Right | Self::BottomRight)
    }

    /// Whether dragging this handle moves the top edge.
    #[must_use]
    pub fn moves_top(self) -> bool {
        matches!(self, Self::TopLeft | Self::Top | Self::TopRight)
    }

    /// Whether dragging this handle moves the bottom edge.
    #[must_use]
    pub fn moves_bottom(self) -> bool {
        matches!(self, Self::BottomLeft | Self::Bottom | Self::BottomRight)
    }

    /// CSS cursor name shown while hovering or dragging the handle.
    #[must_use]
    pub fn cursor(self) -> &'static str {
        match self {
            Self::Top | Self::Bottom => "ns-resize",
            Self::Left | Self::Right => "ew-resize",
            Self::TopLeft | Self::BottomRight => "nwse-resize",
            Self::TopRight | Self::BottomLeft => "nesw-resize",
        }
    }
}

/// Result of a hit test.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hit {
    pub element_id: ElementId,
    pub part: HitPart,
}

/// World-space center of a resize handle.
#[must_use]
pub fn handle_position(el: &CanvasElement, handle: ResizeHandle) -> Point {
    let (fx, fy) = handle.anchor();
    Point::new(el.x + el.width * fx, el.y + el.height * fy)
}

/// World-space center of the delete control.
#[must_use]
pub fn delete_control_position(el: &CanvasElement, viewport: &Viewport) -> Point {
    let off = viewport.screen_dist_to_world(DELETE_CONTROL_OFFSET_PX);
    Point::new(el.x + el.width + off, el.y - off)
}

/// Find the element part under `world_pt`, checking the selected element's controls first.
#[must_use]
pub fn hit_test(world_pt: Point, store: &ElementStore, viewport: &Viewport) -> Option<Hit> {
    if let Some(selected) = store.selected().and_then(|id| store.get(&id)) {
        if let Some(part) = hit_controls(world_pt, selected, viewport) {
            return Some(Hit { element_id: selected.id, part });
        }
    }

    store
        .sorted_by_z()
        .into_iter()
        .rev()
        .find(|el| el.contains(world_pt.x, world_pt.y))
        .map(|el| Hit { element_id: el.id, part: HitPart::Body })
}

fn hit_controls(world_pt: Point, el: &CanvasElement, viewport: &Viewport) -> Option<HitPart> {
    let delete_r = viewport.screen_dist_to_world(DELETE_CONTROL_RADIUS_PX);
    if distance(world_pt, delete_control_position(el, viewport)) <= delete_r {
        return Some(HitPart::DeleteControl);
    }

    let handle_r = viewport.screen_dist_to_world(HANDLE_RADIUS_PX);
    ResizeHandle::ALL
        .into_iter()
        .find(|h| distance(world_pt, handle_position(el, *h)) <= handle_r)
        .map(HitPart::ResizeHandle)
}

fn distance(a: Point, b: Point) -> f64 {
    (a.x - b.x).hypot(a.y - b.y)
}
