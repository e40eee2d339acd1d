//! HTTP client for the generation service.
//!
//! Thin reqwest wrapper: `POST {base}/{kind}` submits, `GET {base}/{kind}/{id}`
//! reports status, `POST {base}/upload` stores a raw file body. Pure parsing
//! lives in `types` for testability.

use std::time::Duration;

use super::types::{RemoteError, StatusResponse, SubmitResponse, UploadResponse, parse_json};
use super::{JobApi, Uploader};
use crate::config::RemoteTimeouts;
use crate::services::tasks::{JobKind, TaskId};

const FILE_NAME_HEADER: &str = "x-file-name";

// =============================================================================
// CLIENT
// =============================================================================

pub struct HttpJobApi {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpJobApi {
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(base_url: String, api_key: Option<String>, timeouts: RemoteTimeouts) -> Result<Self, RemoteError> {
        let http = build_http_client(timeouts)?;
        Ok(Self { http, base_url, api_key })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url)
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => request.bearer_auth(key),
            None => request,
        }
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<String, RemoteError> {
        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(|e| RemoteError::Request(e.to_string()))?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| RemoteError::Request(e.to_string()))?;

        if !(200..300).contains(&status) {
            return Err(RemoteError::Response { status, body: text });
        }
        Ok(text)
    }
}

pub(crate) fn build_http_client(timeouts: RemoteTimeouts) -> Result<reqwest::Client, RemoteError> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeouts.request_secs))
        .connect_timeout(Duration::from_secs(timeouts.connect_secs))
        .build()
        .map_err(|e| RemoteError::HttpClientBuild(e.to_string()))
}

#[async_trait::async_trait]
impl JobApi for HttpJobApi {
    async fn submit(&self, kind: JobKind, payload: &serde_json::Value) -> Result<TaskId, RemoteError> {
        let text = self.send(self.http.post(self.url(kind.as_str())).json(payload)).await?;
        let body: SubmitResponse = parse_json(&text)?;
        if body.id.is_empty() {
            return Err(RemoteError::Parse("submit response has empty id".into()));
        }
        Ok(body.id)
    }

    async fn status(&self, kind: JobKind, id: &str) -> Result<StatusResponse, RemoteError> {
        let text = self.send(self.http.get(self.url(&kind.status_path(id)))).await?;
        parse_json(&text)
    }
}

#[async_trait::async_trait]
impl Uploader for HttpJobApi {
    async fn upload(&self, file_name: &str, bytes: Vec<u8>) -> Result<String, RemoteError> {
        let request = self
            .http
            .post(self.url("upload"))
            .header(FILE_NAME_HEADER, file_name)
            .body(bytes);
        let text = self.send(request).await?;
        let body: UploadResponse = parse_json(&text)?;
        Ok(body.url)
    }
}

#[cfg(test)]
#[path = "http_test.rs"]
mod tests;
