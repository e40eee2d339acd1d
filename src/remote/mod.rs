//! Remote — narrow seams to the generation service and media hosts.
//!
//! DESIGN
//! ======
//! Each external dependency is an `async_trait` so the orchestrator can be
//! driven by scripted mocks in tests. `HttpJobApi` implements both the job
//! and upload seams against one base URL; `HttpMediaProbe` fetches result
//! bytes and decodes just enough to learn the pixel size.

pub mod http;
pub mod media;
pub mod types;

use canvas::elements::NaturalSize;

use crate::services::tasks::{JobKind, TaskId};
pub use http::HttpJobApi;
pub use media::HttpMediaProbe;
pub use types::{RemoteError, StatusResponse};

/// Submits generation jobs and reports their status.
#[async_trait::async_trait]
pub trait JobApi: Send + Sync {
    /// Start a job and return the id the service assigned to it.
    async fn submit(&self, kind: JobKind, payload: &serde_json::Value) -> Result<TaskId, RemoteError>;

    /// Current status of a previously submitted job.
    async fn status(&self, kind: JobKind, id: &str) -> Result<StatusResponse, RemoteError>;
}

/// Stores user-provided files and returns a URL the canvas can display.
#[async_trait::async_trait]
pub trait Uploader: Send + Sync {
    async fn upload(&self, file_name: &str, bytes: Vec<u8>) -> Result<String, RemoteError>;
}

/// Learns the pixel dimensions of remote media.
#[async_trait::async_trait]
pub trait MediaProbe: Send + Sync {
    async fn dimensions(&self, url: &str) -> Result<NaturalSize, RemoteError>;
}
