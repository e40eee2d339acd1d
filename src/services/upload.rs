//! Manual additions: uploaded files and text elements.
//!
//! Uploads are decoded locally before anything is sent, so a file that is not
//! a readable image never reaches the service. New elements cascade from the
//! last one added and are selected.

use canvas::consts::{DEFAULT_TEXT_SIZE, UPLOAD_MAX_DIMENSION};
use canvas::elements::{CanvasElement, ElementId, MediaType};
use canvas::placement;
use tracing::info;

use crate::remote::RemoteError;
use crate::remote::media::{decode_dimensions, media_type_for};
use crate::state::Studio;

/// Upload `bytes` and add the hosted file to the canvas.
///
/// # Errors
///
/// Returns [`RemoteError::Decode`] when an image cannot be decoded, or the
/// uploader's error when the upload fails. The canvas is unchanged on error.
pub async fn upload_file(studio: &Studio, file_name: &str, bytes: Vec<u8>) -> Result<ElementId, RemoteError> {
    let media_type = media_type_for(file_name);
    let natural = match media_type {
        MediaType::Image => Some(decode_dimensions(&bytes)?),
        _ => None,
    };

    let size = bytes.len();
    let url = studio.uploader.upload(file_name, bytes).await?;

    let id = studio
        .with_engine(|engine| {
            let store = &engine.core.elements;
            let position = placement::cascade_position(store);
            let (width, height) = match natural {
                Some(n) => placement::scale_to_fit(n.width, n.height, UPLOAD_MAX_DIMENSION),
                None => placement::default_size(media_type, UPLOAD_MAX_DIMENSION),
            };
            let mut element = CanvasElement::new(media_type, url.as_str(), position.x, position.y, width, height);
            element.natural = natural;
            let id = element.id;
            engine.core.add_element(element, true);
            id
        })
        .await;

    info!(element_id = %id, file_name, size, %url, "file uploaded");
    Ok(id)
}

/// Add a text element at the cascade position.
pub async fn add_text(studio: &Studio, content: &str) -> ElementId {
    studio
        .with_engine(|engine| {
            let position = placement::cascade_position(&engine.core.elements);
            let (width, height) = DEFAULT_TEXT_SIZE;
            let element = CanvasElement::new(MediaType::Text, content, position.x, position.y, width, height);
            let id = element.id;
            engine.core.add_element(element, true);
            id
        })
        .await
}

#[cfg(test)]
#[path = "upload_test.rs"]
mod tests;
