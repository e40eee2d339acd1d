//! Studio services driven by the CLI and by background pollers.
//!
//! ARCHITECTURE
//! ============
//! Service functions take a `&Studio` and own the async orchestration: they
//! talk to remote collaborators without holding the engine lock and apply
//! their results to the canvas in one locked step.

pub mod generation;
pub mod persistence;
pub mod placement;
pub mod poller;
pub mod tasks;
pub mod upload;
