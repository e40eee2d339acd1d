//! Placement math shared by manual uploads and generated results.
//!
//! New elements either cascade from the most recently added element or, for
//! edits of an existing element, from that anchor. Sizes come from the media's
//! natural dimensions scaled down (or up) so the longest side matches a target.

#[cfg(test)]
#[path = "placement_test.rs"]
mod placement_test;

use crate::consts::{
    DEFAULT_AUDIO_SIZE, DEFAULT_ORIGIN_X, DEFAULT_ORIGIN_Y, DEFAULT_TEXT_SIZE, DEFAULT_VIDEO_SIZE, OFFSET_STEP,
};
use crate::elements::{CanvasElement, ElementId, ElementStore, MediaType, NaturalSize};
use crate::viewport::Point;

/// Where a new element should go and how large it should be.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub position: Point,
    pub width: f64,
    pub height: f64,
}

impl Placement {
    /// Build an element of `media_type` at this placement.
    #[must_use]
    pub fn into_element(self, media_type: MediaType, content: impl Into<String>) -> CanvasElement {
        CanvasElement::new(media_type, content, self.position.x, self.position.y, self.width, self.height)
    }
}

/// One step down-right of the last element, or the default origin on an empty canvas.
#[must_use]
pub fn cascade_position(store: &ElementStore) -> Point {
    match store.last() {
        Some(last) => Point::new(last.x + OFFSET_STEP, last.y + OFFSET_STEP),
        None => Point::new(DEFAULT_ORIGIN_X, DEFAULT_ORIGIN_Y),
    }
}

/// One step down-right of `origin`. Falls back to [`cascade_position`] when
/// the origin is gone or was never given.
#[must_use]
pub fn anchored_position(store: &ElementStore, origin: Option<&ElementId>) -> Point {
    match origin.and_then(|id| store.get(id)) {
        Some(anchor) => Point::new(anchor.x + OFFSET_STEP, anchor.y + OFFSET_STEP),
        None => cascade_position(store),
    }
}

/// Scale `(w, h)` so its longest side equals `max_dim`, keeping the aspect ratio.
///
/// Degenerate input (non-positive or non-finite) yields a `max_dim` square.
#[must_use]
pub fn scale_to_fit(w: f64, h: f64, max_dim: f64) -> (f64, f64) {
    let longest = w.max(h);
    if !(w > 0.0 && h > 0.0 && longest.is_finite()) {
        return (max_dim, max_dim);
    }
    let factor = max_dim / longest;
    if w >= h {
        (max_dim, h * factor)
    } else {
        (w * factor, max_dim)
    }
}

/// Footprint for media that has no decoded pixel size.
#[must_use]
pub fn default_size(media_type: MediaType, max_dim: f64) -> (f64, f64) {
    match media_type {
        MediaType::Image => (max_dim, max_dim),
        MediaType::Video => DEFAULT_VIDEO_SIZE,
        MediaType::Audio => DEFAULT_AUDIO_SIZE,
        MediaType::Text => DEFAULT_TEXT_SIZE,
    }
}

/// Full placement for a new element: position from the anchor rule, size from
/// the natural dimensions when known.
#[must_use]
pub fn resolve(
    store: &ElementStore,
    origin: Option<&ElementId>,
    media_type: MediaType,
    natural: Option<NaturalSize>,
    max_dim: f64,
) -> Placement {
    let position = anchored_position(store, origin);
    let (width, height) = match natural {
        Some(n) => scale_to_fit(n.width, n.height, max_dim),
        None => default_size(media_type, max_dim),
    };
    Placement { position, width, height }
}
