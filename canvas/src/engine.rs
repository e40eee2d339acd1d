use crate::consts::{MIN_ELEMENT_SIZE, WHEEL_ZOOM_STEP};
use crate::elements::{CanvasElement, ElementId, ElementStore, PartialElement};
use crate::hit::{self, HitPart, ResizeHandle};
use crate::input::{Button, InputState, Key, Modifiers, Tool, WheelDelta};
use crate::viewport::{Point, Viewport};

#[cfg(test)]
#[path = "engine_test.rs"]
mod engine_test;

/// Actions returned from input handlers and commands for the host to process.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    ElementCreated(CanvasElement),
    ElementUpdated { id: ElementId, fields: PartialElement },
    ElementDeleted { id: ElementId },
    SelectionChanged(Option<ElementId>),
    SetCursor(String),
    RenderNeeded,
}

/// Immutable view of the engine handed to the renderer between ticks.
#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    /// Elements in draw order.
    pub elements: Vec<CanvasElement>,
    pub viewport: Viewport,
    pub selected: Option<ElementId>,
    pub tool: Tool,
    pub can_undo: bool,
    pub can_redo: bool,
}

/// Viewport, elements, and the interaction state machine.
///
/// All element mutations go through the owned [`ElementStore`]; gestures never
/// hold a private copy of the element they are editing.
#[derive(Debug, Clone, Default)]
pub struct EngineCore {
    pub elements: ElementStore,
    pub viewport: Viewport,
    pub tool: Tool,
    pub input: InputState,
}

impl EngineCore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // --- Commands ---

    /// Add an element, optionally selecting it.
    pub fn add_element(&mut self, element: CanvasElement, select: bool) -> Vec<Action> {
        let id = self.elements.add(element, select);
        let mut actions = Vec::new();
        if let Some(stored) = self.elements.get(&id) {
            actions.push(Action::ElementCreated(stored.clone()));
        }
        if select {
            actions.push(Action::SelectionChanged(Some(id)));
        }
        actions.push(Action::RenderNeeded);
        actions
    }

    /// Merge fields into an element. Unknown ids are ignored.
    pub fn update_element(&mut self, id: &ElementId, fields: PartialElement) -> Vec<Action> {
        if self.elements.update(id, &fields) {
            vec![Action::ElementUpdated { id: *id, fields }, Action::RenderNeeded]
        } else {
            Vec::new()
        }
    }

    /// Delete an element. Also what the "×" control does.
    pub fn remove_element(&mut self, id: &ElementId) -> Vec<Action> {
        let was_selected = self.elements.selected() == Some(*id);
        if self.elements.remove(id).is_none() {
            return Vec::new();
        }
        if self.gesture_target() == Some(*id) {
            self.input = InputState::Idle;
        }
        let mut actions = vec![Action::ElementDeleted { id: *id }];
        if was_selected {
            actions.push(Action::SelectionChanged(None));
        }
        actions.push(Action::RenderNeeded);
        actions
    }

    /// Change the selection without touching history.
    pub fn select(&mut self, id: Option<ElementId>) -> Vec<Action> {
        if self.elements.select(id) {
            vec![Action::SelectionChanged(self.elements.selected()), Action::RenderNeeded]
        } else {
            Vec::new()
        }
    }

    pub fn undo(&mut self) -> Vec<Action> {
        self.cancel_gesture();
        let before = self.elements.selected();
        if self.elements.undo() {
            self.history_actions(before)
        } else {
            Vec::new()
        }
    }

    pub fn redo(&mut self) -> Vec<Action> {
        self.cancel_gesture();
        let before = self.elements.selected();
        if self.elements.redo() {
            self.history_actions(before)
        } else {
            Vec::new()
        }
    }

    /// Set the active tool.
    pub fn set_tool(&mut self, tool: Tool) {
        self.tool = tool;
    }

    /// Replace the element set from persisted state and reset history.
    pub fn load(&mut self, elements: Vec<CanvasElement>) {
        self.input = InputState::Idle;
        self.elements.load(elements);
    }

    /// Replace the element set and its undo history from persisted state.
    pub fn load_history(&mut self, history: Vec<Vec<CanvasElement>>, index: usize) {
        self.input = InputState::Idle;
        self.elements.load_history(history, index);
    }

    // --- Queries ---

    #[must_use]
    pub fn selection(&self) -> Option<ElementId> {
        self.elements.selected()
    }

    #[must_use]
    pub fn element(&self, id: &ElementId) -> Option<&CanvasElement> {
        self.elements.get(id)
    }

    /// Snapshot for the renderer.
    #[must_use]
    pub fn scene(&self) -> Scene {
        Scene {
            elements: self.elements.sorted_by_z().into_iter().cloned().collect(),
            viewport: self.viewport,
            selected: self.elements.selected(),
            tool: self.tool,
            can_undo: self.elements.can_undo(),
            can_redo: self.elements.can_redo(),
        }
    }

    // --- Input events ---

    pub fn on_pointer_down(&mut self, screen_pt: Point, button: Button, _modifiers: Modifiers) -> Vec<Action> {
        if !self.input.is_idle() {
            return Vec::new();
        }

        if button == Button::Middle {
            self.input = InputState::Panning { last_screen: screen_pt };
            return vec![Action::SetCursor("grabbing".into())];
        }
        if button != Button::Primary {
            return Vec::new();
        }

        let world = self.viewport.screen_to_world(screen_pt);
        match hit::hit_test(world, &self.elements, &self.viewport) {
            Some(h) if h.part == HitPart::DeleteControl => self.remove_element(&h.element_id),
            Some(h) => {
                let Some(el) = self.elements.get(&h.element_id) else {
                    return Vec::new();
                };
                let start = Point::new(el.x, el.y);
                if let HitPart::ResizeHandle(handle) = h.part {
                    self.input = InputState::Resizing {
                        id: h.element_id,
                        handle,
                        start,
                        start_size: (el.width, el.height),
                        pointer_start: screen_pt,
                    };
                    return vec![Action::SetCursor(handle.cursor().into())];
                }
                self.input = InputState::Dragging { id: h.element_id, start, pointer_start: screen_pt };
                let mut actions = self.select(Some(h.element_id));
                actions.push(Action::SetCursor("move".into()));
                actions
            }
            None => match self.tool {
                Tool::Move => {
                    self.input = InputState::Panning { last_screen: screen_pt };
                    vec![Action::SetCursor("grabbing".into())]
                }
                Tool::Select => self.select(None),
            },
        }
    }

    pub fn on_pointer_move(&mut self, screen_pt: Point, _modifiers: Modifiers) -> Vec<Action> {
        match self.input.clone() {
            InputState::Idle => Vec::new(),
            InputState::Panning { last_screen } => {
                self.viewport.pan(screen_pt.x - last_screen.x, screen_pt.y - last_screen.y);
                self.input = InputState::Panning { last_screen: screen_pt };
                vec![Action::RenderNeeded]
            }
            InputState::Dragging { id, start, pointer_start } => {
                let (dx, dy) = self.world_travel(pointer_start, screen_pt);
                let fields = PartialElement::position(start.x + dx, start.y + dy);
                if self.elements.preview(&id, &fields) {
                    vec![Action::RenderNeeded]
                } else {
                    self.input = InputState::Idle;
                    Vec::new()
                }
            }
            InputState::Resizing { id, handle, start, start_size, pointer_start } => {
                let (dx, dy) = self.world_travel(pointer_start, screen_pt);
                let Some(fields) = resize_geometry(handle, start, start_size, dx, dy) else {
                    return Vec::new();
                };
                if self.elements.preview(&id, &fields) {
                    vec![Action::RenderNeeded]
                } else {
                    self.input = InputState::Idle;
                    Vec::new()
                }
            }
        }
    }

    pub fn on_pointer_up(&mut self, _screen_pt: Point, _button: Button, _modifiers: Modifiers) -> Vec<Action> {
        self.finish_gesture()
    }

    /// The pointer left the canvas; ends the gesture like a pointer-up.
    pub fn on_pointer_leave(&mut self) -> Vec<Action> {
        self.finish_gesture()
    }

    /// Zoom about the pointer when ctrl/meta is held, otherwise pan.
    pub fn on_wheel(&mut self, screen_pt: Point, delta: WheelDelta, modifiers: Modifiers) -> Vec<Action> {
        if modifiers.command() {
            let before = self.viewport.scale();
            self.viewport.zoom_by(-delta.dy * WHEEL_ZOOM_STEP, Some(screen_pt));
            if (self.viewport.scale() - before).abs() < f64::EPSILON {
                return Vec::new();
            }
        } else {
            self.viewport.pan(-delta.dx, -delta.dy);
        }
        vec![Action::RenderNeeded]
    }

    pub fn on_key_down(&mut self, key: Key, modifiers: Modifiers) -> Vec<Action> {
        match key.0.as_str() {
            "Delete" | "Backspace" => match self.elements.selected() {
                Some(id) if self.input.is_idle() => self.remove_element(&id),
                _ => Vec::new(),
            },
            "Escape" => {
                let mut actions = Vec::new();
                if self.cancel_gesture() {
                    actions.push(Action::RenderNeeded);
                }
                actions.extend(self.select(None));
                actions
            }
            "z" | "Z" if modifiers.command() && modifiers.shift => self.redo(),
            "z" | "Z" if modifiers.command() => self.undo(),
            "y" | "Y" if modifiers.command() => self.redo(),
            _ => Vec::new(),
        }
    }

    // --- Internals ---

    fn world_travel(&self, from: Point, to: Point) -> (f64, f64) {
        (self.viewport.screen_dist_to_world(to.x - from.x), self.viewport.screen_dist_to_world(to.y - from.y))
    }

    fn gesture_target(&self) -> Option<ElementId> {
        match self.input {
            InputState::Dragging { id, .. } | InputState::Resizing { id, .. } => Some(id),
            InputState::Idle | InputState::Panning { .. } => None,
        }
    }

    fn finish_gesture(&mut self) -> Vec<Action> {
        let target = self.gesture_target();
        let was_active = !self.input.is_idle();
        self.input = InputState::Idle;
        if !was_active {
            return Vec::new();
        }

        let mut actions = Vec::new();
        if let Some(id) = target {
            if self.elements.commit() {
                if let Some(el) = self.elements.get(&id) {
                    actions.push(Action::ElementUpdated {
                        id,
                        fields: PartialElement::geometry(el.x, el.y, el.width, el.height),
                    });
                }
            }
        }
        actions.push(Action::SetCursor("default".into()));
        actions
    }

    /// Drop an in-flight gesture and its uncommitted edits.
    fn cancel_gesture(&mut self) -> bool {
        if self.input.is_idle() {
            return false;
        }
        self.input = InputState::Idle;
        self.elements.revert();
        true
    }

    fn history_actions(&self, selected_before: Option<ElementId>) -> Vec<Action> {
        let mut actions = Vec::new();
        if self.elements.selected() != selected_before {
            actions.push(Action::SelectionChanged(self.elements.selected()));
        }
        actions.push(Action::RenderNeeded);
        actions
    }
}

/// New geometry for a resize, or `None` when either side would fall below
/// [`MIN_ELEMENT_SIZE`].
#[must_use]
pub fn resize_geometry(
    handle: ResizeHandle,
    start: Point,
    start_size: (f64, f64),
    dx: f64,
    dy: f64,
) -> Option<PartialElement> {
    let (mut x, mut y) = (start.x, start.y);
    let (mut w, mut h) = start_size;

    if handle.moves_right() {
        w += dx;
    }
    if handle.moves_left() {
        w -= dx;
        x += dx;
    }
    if handle.moves_bottom() {
        h += dy;
    }
    if handle.moves_top() {
        h -= dy;
        y += dy;
    }

    if w < MIN_ELEMENT_SIZE || h < MIN_ELEMENT_SIZE {
        return None;
    }
    Some(PartialElement::geometry(x, y, w, h))
}
