//! Element model: placed media, sparse updates, and the history-tracking store.
//!
//! This module defines what sits on the canvas (`CanvasElement`, `MediaType`),
//! a sparse-update type for incremental edits (`PartialElement`), and the
//! runtime store that exclusively owns every live element (`ElementStore`).
//!
//! The store keeps insertion order, since placement cascades from the most
//! recently added element. Every committed mutation appends a full snapshot
//! of the element array to a bounded history so undo/redo can swap whole
//! arrays back in. Gestures edit the live array through `preview` and land in
//! history once, through `commit`.

#[cfg(test)]
#[path = "elements_test.rs"]
mod elements_test;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::consts::MAX_HISTORY_SIZE;

/// Unique identifier for a canvas element.
pub type ElementId = Uuid;

/// The kind of media an element displays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Image,
    Video,
    Audio,
    Text,
}

/// Decoded pixel dimensions of an element's media.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NaturalSize {
    pub width: f64,
    pub height: f64,
}

/// A media element placed on the canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanvasElement {
    /// Unique identifier for this element.
    pub id: ElementId,
    /// What the element displays.
    #[serde(rename = "type")]
    pub media_type: MediaType,
    /// URL for image/video/audio, the literal string for text.
    pub content: String,
    /// Left edge in world coordinates.
    pub x: f64,
    /// Top edge in world coordinates.
    pub y: f64,
    /// Width in world units; always positive.
    pub width: f64,
    /// Height in world units; always positive.
    pub height: f64,
    /// Clockwise rotation in degrees.
    #[serde(default)]
    pub rotation: f64,
    /// Local scale multiplier.
    #[serde(default = "default_scale")]
    pub scale: f64,
    /// Stacking order; lower values are drawn beneath higher values.
    #[serde(default)]
    pub z_index: i64,
    /// Decoded media dimensions. Live handle only, re-acquired after a load.
    #[serde(skip)]
    pub natural: Option<NaturalSize>,
}

fn default_scale() -> f64 {
    1.0
}

impl CanvasElement {
    /// Build an element with a fresh id at the given geometry.
    #[must_use]
    pub fn new(media_type: MediaType, content: impl Into<String>, x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            media_type,
            content: content.into(),
            x,
            y,
            width,
            height,
            rotation: 0.0,
            scale: 1.0,
            z_index: 0,
            natural: None,
        }
    }

    /// Whether a world-space point falls inside the element's bounding box.
    #[must_use]
    pub fn contains(&self, wx: f64, wy: f64) -> bool {
        wx >= self.x && wx <= self.x + self.width && wy >= self.y && wy <= self.y + self.height
    }
}

/// Sparse update for an element. Only present fields are applied.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PartialElement {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    /// New width; values that are not positive are dropped.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    /// New height; values that are not positive are dropped.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rotation: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scale: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub z_index: Option<i64>,
}

impl PartialElement {
    /// A position-only update.
    #[must_use]
    pub fn position(x: f64, y: f64) -> Self {
        Self { x: Some(x), y: Some(y), ..Default::default() }
    }

    /// A full geometry update.
    #[must_use]
    pub fn geometry(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x: Some(x), y: Some(y), width: Some(width), height: Some(height), ..Default::default() }
    }

    fn apply_to(&self, el: &mut CanvasElement) {
        if let Some(ref content) = self.content {
            el.content.clone_from(content);
        }
        if let Some(x) = self.x {
            el.x = x;
        }
        if let Some(y) = self.y {
            el.y = y;
        }
        if let Some(w) = self.width.filter(|w| *w > 0.0) {
            el.width = w;
        }
        if let Some(h) = self.height.filter(|h| *h > 0.0) {
            el.height = h;
        }
        if let Some(r) = self.rotation {
            el.rotation = r;
        }
        if let Some(s) = self.scale {
            el.scale = s;
        }
        if let Some(z) = self.z_index {
            el.z_index = z;
        }
    }
}

/// Ordered store of canvas elements with selection and bounded undo/redo.
///
/// Invariants:
/// - `0 <= history_index < history.len() <= MAX_HISTORY_SIZE`
/// - `selected`, when set, names an element in the live array
#[derive(Debug, Clone)]
pub struct ElementStore {
    elements: Vec<CanvasElement>,
    selected: Option<ElementId>,
    history: Vec<Vec<CanvasElement>>,
    history_index: usize,
}

impl ElementStore {
    /// Create an empty store whose history holds one empty snapshot.
    #[must_use]
    pub fn new() -> Self {
        Self { elements: Vec::new(), selected: None, history: vec![Vec::new()], history_index: 0 }
    }

    // --- Mutations ---

    /// Append an element on top of the stack and record a snapshot.
    ///
    /// Returns the id of the stored element.
    pub fn add(&mut self, mut element: CanvasElement, select: bool) -> ElementId {
        element.z_index = self.top_z() + 1;
        let id = element.id;
        self.elements.push(element);
        if select {
            self.selected = Some(id);
        }
        self.push_history();
        id
    }

    /// Merge fields into the matching element and record a snapshot.
    ///
    /// An unknown id is ignored, so late writes against deleted elements are
    /// harmless. The snapshot is still recorded. Returns whether an element
    /// was found.
    pub fn update(&mut self, id: &ElementId, fields: &PartialElement) -> bool {
        let found = self.apply(id, fields);
        self.push_history();
        found
    }

    /// Remove an element, clearing the selection if it pointed there.
    pub fn remove(&mut self, id: &ElementId) -> Option<CanvasElement> {
        let pos = self.elements.iter().position(|el| el.id == *id)?;
        let removed = self.elements.remove(pos);
        if self.selected == Some(*id) {
            self.selected = None;
        }
        self.push_history();
        Some(removed)
    }

    /// Raise an element above every other element.
    pub fn bring_to_front(&mut self, id: &ElementId) -> bool {
        let top = self.top_z();
        let at_top = self.elements.iter().filter(|el| el.z_index == top).count();
        let Some(el) = self.elements.iter_mut().find(|el| el.id == *id) else {
            return false;
        };
        if el.z_index == top && at_top == 1 {
            return false;
        }
        el.z_index = top + 1;
        self.push_history();
        true
    }

    /// Set or clear the selection. Unknown ids are ignored. Never snapshots.
    pub fn select(&mut self, id: Option<ElementId>) -> bool {
        match id {
            Some(id) if self.get(&id).is_none() => false,
            next => {
                let changed = self.selected != next;
                self.selected = next;
                changed
            }
        }
    }

    /// Apply fields to the live array without recording history.
    ///
    /// Used while a gesture is in flight; pair with [`ElementStore::commit`].
    pub fn preview(&mut self, id: &ElementId, fields: &PartialElement) -> bool {
        self.apply(id, fields)
    }

    /// Record one snapshot if the live array drifted from the current one.
    pub fn commit(&mut self) -> bool {
        if self.is_clean() {
            return false;
        }
        self.push_history();
        true
    }

    /// Throw away uncommitted preview edits.
    pub fn revert(&mut self) {
        if self.is_clean() {
            return;
        }
        self.restore(self.history_index);
    }

    /// Step back one snapshot. No-op at the oldest snapshot.
    pub fn undo(&mut self) -> bool {
        if self.history_index == 0 {
            return false;
        }
        self.restore(self.history_index - 1);
        true
    }

    /// Step forward one snapshot. No-op at the newest snapshot.
    pub fn redo(&mut self) -> bool {
        if self.history_index + 1 >= self.history.len() {
            return false;
        }
        self.restore(self.history_index + 1);
        true
    }

    /// Replace everything with a loaded set of elements and reset history.
    pub fn load(&mut self, elements: Vec<CanvasElement>) {
        self.elements = elements;
        self.selected = None;
        self.history = vec![self.elements.clone()];
        self.history_index = 0;
    }

    /// Restore saved snapshots and put the live array at `index`.
    ///
    /// Snapshots past `MAX_HISTORY_SIZE` are dropped from the oldest end and an
    /// out-of-range index lands on the newest snapshot. An empty history loads
    /// an empty board.
    pub fn load_history(&mut self, mut history: Vec<Vec<CanvasElement>>, index: usize) {
        if history.is_empty() {
            self.load(Vec::new());
            return;
        }
        let mut index = index.min(history.len() - 1);
        if history.len() > MAX_HISTORY_SIZE {
            let excess = history.len() - MAX_HISTORY_SIZE;
            history.drain(..excess);
            index = index.saturating_sub(excess);
        }
        self.elements = history[index].clone();
        self.selected = None;
        self.history = history;
        self.history_index = index;
    }

    /// Attach decoded media dimensions. Live state only, not an edit.
    pub fn set_natural(&mut self, id: &ElementId, natural: NaturalSize) -> bool {
        let Some(el) = self.elements.iter_mut().find(|el| el.id == *id) else {
            return false;
        };
        el.natural = Some(natural);
        for snapshot in &mut self.history {
            if let Some(past) = snapshot.iter_mut().find(|el| el.id == *id) {
                past.natural = Some(natural);
            }
        }
        true
    }

    // --- Queries ---

    #[must_use]
    pub fn get(&self, id: &ElementId) -> Option<&CanvasElement> {
        self.elements.iter().find(|el| el.id == *id)
    }

    /// Elements in insertion order.
    #[must_use]
    pub fn elements(&self) -> &[CanvasElement] {
        &self.elements
    }

    /// The most recently added element still on the canvas.
    #[must_use]
    pub fn last(&self) -> Option<&CanvasElement> {
        self.elements.last()
    }

    /// Elements sorted by `(z_index, insertion order)` for draw order.
    #[must_use]
    pub fn sorted_by_z(&self) -> Vec<&CanvasElement> {
        let mut els: Vec<&CanvasElement> = self.elements.iter().collect();
        els.sort_by_key(|el| el.z_index);
        els
    }

    #[must_use]
    pub fn selected(&self) -> Option<ElementId> {
        self.selected
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Snapshots from oldest to newest.
    #[must_use]
    pub fn history(&self) -> &[Vec<CanvasElement>] {
        &self.history
    }

    #[must_use]
    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    #[must_use]
    pub fn history_index(&self) -> usize {
        self.history_index
    }

    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.history_index > 0
    }

    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.history_index + 1 < self.history.len()
    }

    // --- Internals ---

    fn apply(&mut self, id: &ElementId, fields: &PartialElement) -> bool {
        let Some(el) = self.elements.iter_mut().find(|el| el.id == *id) else {
            return false;
        };
        fields.apply_to(el);
        true
    }

    fn top_z(&self) -> i64 {
        self.elements.iter().map(|el| el.z_index).max().unwrap_or(0)
    }

    fn is_clean(&self) -> bool {
        self.history
            .get(self.history_index)
            .is_some_and(|current| *current == self.elements)
    }

    fn push_history(&mut self) {
        self.history.truncate(self.history_index + 1);
        self.history.push(self.elements.clone());
        if self.history.len() > MAX_HISTORY_SIZE {
            let excess = self.history.len() - MAX_HISTORY_SIZE;
            self.history.drain(..excess);
        }
        self.history_index = self.history.len() - 1;
    }

    fn restore(&mut self, index: usize) {
        let Some(snapshot) = self.history.get(index) else {
            return;
        };
        self.elements = snapshot.clone();
        self.history_index = index;
        if let Some(id) = self.selected {
            if self.get(&id).is_none() {
                self.selected = None;
            }
        }
    }
}

impl Default for ElementStore {
    fn default() -> Self {
        Self::new()
    }
}
