//! Input model: tools, modifier keys, mouse buttons, and the gesture state machine.
//!
//! This module defines the types consumed by the interaction controller.
//! `Tool` and `Modifiers` capture the user's intent at the time of a pointer
//! event. `InputState` is the active gesture tracked between pointer-down and
//! pointer-up, carrying the start geometry needed to turn the pointer's total
//! travel into absolute element geometry on every move.

#[cfg(test)]
#[path = "input_test.rs"]
mod input_test;

use crate::elements::ElementId;
use crate::hit::ResizeHandle;
use crate::viewport::Point;

/// Which tool is currently active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tool {
    /// Pointer / selection tool (default). Empty-canvas drags do nothing.
    #[default]
    Select,
    /// Hand tool. Empty-canvas drags pan the viewport.
    Move,
}

/// Keyboard/mouse modifier keys held during an event.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, Copy, Default)]
pub struct Modifiers {
    /// Shift key is held.
    pub shift: bool,
    /// Ctrl key is held.
    pub ctrl: bool,
    /// Alt / Option key is held.
    pub alt: bool,
    /// Meta / Command key is held.
    pub meta: bool,
}

impl Modifiers {
    /// Ctrl or Meta: turns the wheel into zoom and letters into shortcuts.
    #[must_use]
    pub fn command(self) -> bool {
        self.ctrl || self.meta
    }
}

/// Mouse button identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    /// Left mouse button (or single-finger tap).
    Primary,
    /// Middle mouse button (scroll wheel click). Always pans.
    Middle,
    /// Right mouse button (or two-finger tap).
    Secondary,
}

/// A keyboard key as reported by the host (e.g. `"Delete"`, `"Escape"`, `"z"`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Key(pub String);

/// Wheel / trackpad scroll delta.
#[derive(Debug, Clone, Copy)]
pub struct WheelDelta {
    /// Horizontal scroll amount in pixels.
    pub dx: f64,
    /// Vertical scroll amount in pixels (positive = down).
    pub dy: f64,
}

/// Internal state for the interaction state machine.
#[derive(Debug, Clone, Default)]
pub enum InputState {
    /// No gesture in progress; waiting for the next pointer-down.
    #[default]
    Idle,
    /// The viewport follows the pointer.
    Panning {
        /// Screen-space position of the previous pointer event.
        last_screen: Point,
    },
    /// An element follows the pointer.
    Dragging {
        id: ElementId,
        /// Element top-left at pointer-down, world space.
        start: Point,
        /// Pointer position at pointer-down, screen space.
        pointer_start: Point,
    },
    /// One edge or corner of the selected element follows the pointer.
    Resizing {
        id: ElementId,
        handle: ResizeHandle,
        /// Element top-left at pointer-down, world space.
        start: Point,
        /// Element `(width, height)` at pointer-down.
        start_size: (f64, f64),
        /// Pointer position at pointer-down, screen space.
        pointer_start: Point,
    },
}

impl InputState {
    #[must_use]
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }
}
