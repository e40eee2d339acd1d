//! Result placement — turn a finished job's URL into a canvas element.
//!
//! The probe runs without the studio lock; the position is computed and the
//! element inserted under one write lock afterwards, so a concurrent delete of
//! the anchor only moves the result to the cascade position.

use canvas::elements::{ElementId, MediaType, NaturalSize};
use canvas::placement;
use tracing::info;

use crate::remote::RemoteError;
use crate::remote::media::media_type_for;
use crate::state::{CanvasEngine, Studio};

/// Place the media at `url` next to `origin` (or cascaded when the origin is
/// gone), scaled so its longest side is `max_dim`.
///
/// # Errors
///
/// Returns the probe error when an image's dimensions cannot be decoded.
/// Nothing is added to the canvas in that case.
pub async fn place_result(
    studio: &Studio,
    origin: Option<ElementId>,
    url: &str,
    max_dim: f64,
) -> Result<ElementId, RemoteError> {
    let media_type = media_type_for(url);
    let natural = probe_natural(studio, media_type, url).await?;
    Ok(studio
        .with_engine(|engine| insert_result(engine, origin, media_type, natural, url, max_dim))
        .await)
}

/// Position, size, and add a probed result. Call under the studio lock.
pub(crate) fn insert_result(
    engine: &mut CanvasEngine,
    origin: Option<ElementId>,
    media_type: MediaType,
    natural: Option<NaturalSize>,
    url: &str,
    max_dim: f64,
) -> ElementId {
    let spot = placement::resolve(&engine.core.elements, origin.as_ref(), media_type, natural, max_dim);
    let mut element = spot.into_element(media_type, url);
    element.natural = natural;
    let id = element.id;
    engine.core.add_element(element, false);
    info!(element_id = %id, ?media_type, url, "result placed");
    id
}

/// Decoded size for images; other media use default footprints.
pub(crate) async fn probe_natural(
    studio: &Studio,
    media_type: MediaType,
    url: &str,
) -> Result<Option<NaturalSize>, RemoteError> {
    if media_type == MediaType::Image {
        studio.probe.dimensions(url).await.map(Some)
    } else {
        Ok(None)
    }
}

#[cfg(test)]
#[path = "placement_test.rs"]
mod tests;
