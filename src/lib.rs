//! Atelier: a media studio on an infinite canvas with remote generation jobs.
//!
//! The [`canvas`] crate owns the synchronous canvas engine. This crate wraps
//! it in a shared [`state::Studio`], submits generation jobs to a remote
//! service, polls them in the background, and places finished results next to
//! the element they were started from.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`state`] | `Studio` handle, `CanvasEngine` behind one lock, scene publishing |
//! | [`services`] | Task registry, pollers, result placement, uploads, persistence |
//! | [`remote`] | Job, upload, and media-probe seams plus their HTTP clients |
//! | [`notify`] | User-facing notifications |
//! | [`config`] | Environment configuration |

pub mod config;
pub mod notify;
pub mod remote;
pub mod services;
pub mod state;
