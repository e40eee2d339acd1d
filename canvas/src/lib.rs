//! Infinite canvas engine for the media studio.
//!
//! This crate is pure state and math with no I/O: it owns the viewport, the
//! ordered set of placed media elements with their undo history, the pointer
//! gesture state machine, hit-testing, and the placement rules shared by
//! uploads and generated results. The async orchestrator in the root crate
//! drives it through [`engine::EngineCore`] commands and renders from
//! [`engine::Scene`] snapshots.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`engine`] | Testable [`engine::EngineCore`], host [`engine::Action`]s, [`engine::Scene`] snapshots |
//! | [`elements`] | Canvas elements and the history-tracking store |
//! | [`viewport`] | Pan/zoom transform and coordinate conversions |
//! | [`input`] | Input event types and the gesture state machine |
//! | [`hit`] | Hit-testing against elements, resize handles, and the delete control |
//! | [`placement`] | Cascading/anchored positions and scale-to-fit sizing |
//! | [`consts`] | Shared numeric constants (zoom limits, minimum sizes, etc.) |

pub mod consts;
pub mod elements;
pub mod engine;
pub mod hit;
pub mod input;
pub mod placement;
pub mod viewport;
