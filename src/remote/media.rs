//! Media probing. Fetches the start of a file and decodes the pixel size from
//! its header. Bodies are never read past `PROBE_PREFIX_BYTES`.

use std::io::Cursor;

use canvas::elements::{MediaType, NaturalSize};

use super::http::build_http_client;
use super::types::RemoteError;
use super::MediaProbe;
use crate::config::RemoteTimeouts;

const VIDEO_EXTENSIONS: &[&str] = &["mp4", "webm", "mov", "m4v"];
const AUDIO_EXTENSIONS: &[&str] = &["mp3", "wav", "ogg", "m4a", "flac"];

/// Enough for image headers behind large EXIF or ICC blocks.
pub const PROBE_PREFIX_BYTES: usize = 512 * 1024;

pub struct HttpMediaProbe {
    http: reqwest::Client,
}

impl HttpMediaProbe {
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(timeouts: RemoteTimeouts) -> Result<Self, RemoteError> {
        Ok(Self { http: build_http_client(timeouts)? })
    }
}

#[async_trait::async_trait]
impl MediaProbe for HttpMediaProbe {
    async fn dimensions(&self, url: &str) -> Result<NaturalSize, RemoteError> {
        let mut response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| RemoteError::Request(e.to_string()))?;

        let status = response.status().as_u16();
        if !(200..300).contains(&status) {
            let body = response.text().await.unwrap_or_default();
            return Err(RemoteError::Response { status, body });
        }

        let mut prefix = Vec::new();
        while let Some(chunk) = response.chunk().await.map_err(|e| RemoteError::Request(e.to_string()))? {
            if fill_prefix(&mut prefix, &chunk) {
                break;
            }
        }
        decode_dimensions(&prefix)
    }
}

/// Append as much of `chunk` as fits under `PROBE_PREFIX_BYTES`. Returns
/// `true` once the prefix is full.
fn fill_prefix(prefix: &mut Vec<u8>, chunk: &[u8]) -> bool {
    let room = PROBE_PREFIX_BYTES.saturating_sub(prefix.len());
    prefix.extend_from_slice(&chunk[..chunk.len().min(room)]);
    prefix.len() >= PROBE_PREFIX_BYTES
}

/// Pixel size of an encoded image. Only the header is read, so a prefix of
/// the file is enough.
///
/// # Errors
///
/// Returns [`RemoteError::Decode`] for unknown formats, truncated headers, and
/// zero-sized images.
pub fn decode_dimensions(bytes: &[u8]) -> Result<NaturalSize, RemoteError> {
    let (width, height) = image::ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| RemoteError::Decode(e.to_string()))?
        .into_dimensions()
        .map_err(|e| RemoteError::Decode(e.to_string()))?;
    if width == 0 || height == 0 {
        return Err(RemoteError::Decode(format!("empty image {width}x{height}")));
    }
    Ok(NaturalSize { width: f64::from(width), height: f64::from(height) })
}

/// Guess the media type from a URL or file name extension. Unknown → image.
#[must_use]
pub fn media_type_for(name: &str) -> MediaType {
    let path = name.split(['?', '#']).next().unwrap_or(name);
    let ext = path
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
        MediaType::Video
    } else if AUDIO_EXTENSIONS.contains(&ext.as_str()) {
        MediaType::Audio
    } else {
        MediaType::Image
    }
}

#[cfg(test)]
#[path = "media_test.rs"]
mod tests;
