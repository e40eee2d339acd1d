//! Wire types and errors shared by the remote clients.

use serde::Deserialize;

use crate::services::tasks::{TaskResult, TaskStatus};

/// Errors produced by remote calls.
#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    /// The HTTP request could not be sent or its body could not be read.
    #[error("request failed: {0}")]
    Request(String),

    /// The service returned a non-success HTTP status.
    #[error("response error: status {status}")]
    Response { status: u16, body: String },

    /// The response body did not match the expected shape.
    #[error("response parse failed: {0}")]
    Parse(String),

    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),

    /// Media bytes could not be decoded.
    #[error("media decode failed: {0}")]
    Decode(String),
}

impl RemoteError {
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Request(_) => "E_REQUEST",
            Self::Response { .. } => "E_RESPONSE",
            Self::Parse(_) => "E_PARSE",
            Self::HttpClientBuild(_) => "E_HTTP_CLIENT_BUILD",
            Self::Decode(_) => "E_DECODE",
        }
    }

    /// Whether trying the same call again later may succeed.
    #[must_use]
    pub fn retryable(&self) -> bool {
        matches!(self, Self::Request(_) | Self::Response { status: 429 | 500..=599, .. })
    }
}

// =============================================================================
// JOB WIRE TYPES
// =============================================================================

#[derive(Debug, Deserialize)]
pub(crate) struct SubmitResponse {
    pub(crate) id: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UploadResponse {
    pub(crate) url: String,
}

/// Body of a status check.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StatusResponse {
    pub status: TaskStatus,
    #[serde(default)]
    pub download_urls: Option<Vec<String>>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl StatusResponse {
    #[must_use]
    pub fn pending() -> Self {
        Self { status: TaskStatus::Pending, download_urls: None, image_url: None, error: None }
    }

    #[must_use]
    pub fn success(download_urls: Vec<String>, image_url: Option<String>) -> Self {
        Self { status: TaskStatus::Success, download_urls: Some(download_urls), image_url, error: None }
    }

    #[must_use]
    pub fn failure(error: impl Into<String>) -> Self {
        Self { status: TaskStatus::Failure, download_urls: None, image_url: None, error: Some(error.into()) }
    }

    /// Result locations carried by this response.
    #[must_use]
    pub fn result(&self) -> TaskResult {
        TaskResult { download_urls: self.download_urls.clone().unwrap_or_default(), image_url: self.image_url.clone() }
    }
}

pub(crate) fn parse_json<T: serde::de::DeserializeOwned>(text: &str) -> Result<T, RemoteError> {
    serde_json::from_str(text).map_err(|e| RemoteError::Parse(e.to_string()))
}

#[cfg(test)]
#[path = "types_test.rs"]
mod tests;
