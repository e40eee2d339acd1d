//! Shared numeric constants for the canvas crate.

// ── Viewport ────────────────────────────────────────────────────

/// Smallest allowed viewport scale.
pub const MIN_SCALE: f64 = 0.1;

/// Largest allowed viewport scale.
pub const MAX_SCALE: f64 = 10.0;

/// Scale change per pixel of wheel delta while the zoom modifier is held.
pub const WHEEL_ZOOM_STEP: f64 = 0.001;

// ── Elements ────────────────────────────────────────────────────

/// Number of element snapshots retained for undo/redo.
pub const MAX_HISTORY_SIZE: usize = 10;

/// Minimum width and height, in world units, a resize may produce.
pub const MIN_ELEMENT_SIZE: f64 = 50.0;

// ── Placement ───────────────────────────────────────────────────

/// Offset applied on both axes when cascading a new element from an anchor.
pub const OFFSET_STEP: f64 = 20.0;

/// Where the first element lands on an empty canvas.
pub const DEFAULT_ORIGIN_X: f64 = 100.0;
pub const DEFAULT_ORIGIN_Y: f64 = 100.0;

/// Longest side of a generated result after scale-to-fit.
pub const FIT_MAX_DIMENSION: f64 = 300.0;

/// Longest side of a manual upload after scale-to-fit.
pub const UPLOAD_MAX_DIMENSION: f64 = 200.0;

/// Default footprint for a video element.
pub const DEFAULT_VIDEO_SIZE: (f64, f64) = (320.0, 180.0);

/// Default footprint for an audio element.
pub const DEFAULT_AUDIO_SIZE: (f64, f64) = (300.0, 80.0);

/// Default footprint for a text element.
pub const DEFAULT_TEXT_SIZE: (f64, f64) = (200.0, 50.0);

// ── Hit-testing ─────────────────────────────────────────────────

/// Screen-space hit slop in pixels for resize handles.
pub const HANDLE_RADIUS_PX: f64 = 8.0;

/// Screen-space radius of the delete control drawn at the top-right corner.
pub const DELETE_CONTROL_RADIUS_PX: f64 = 10.0;

/// Distance from the top-right corner to the delete control center, in screen pixels.
pub const DELETE_CONTROL_OFFSET_PX: f64 = 14.0;
