//! Persistence service — save and restore the board through a key/value store.
//!
//! DESIGN
//! ======
//! The board is one JSON document under `BOARD_KEY`: the element array, its
//! undo history, and view preferences. Selection, the viewport, and in-flight
//! tasks are session state and are not saved. Decoded media sizes are not
//! serializable either; `rehydrate_media` probes them again after a load.
//!
//! ERROR HANDLING
//! ==============
//! Store and serde failures are returned to the caller. Probe failures during
//! rehydration are logged and the element is kept as-is.

use std::collections::HashMap;
use std::path::PathBuf;

use canvas::elements::{CanvasElement, ElementId, MediaType};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::state::{Studio, ViewPrefs};

pub const BOARD_KEY: &str = "atelier.board";

#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("store I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("board JSON invalid: {0}")]
    Serde(#[from] serde_json::Error),
}

/// String key/value storage for saved boards.
#[async_trait::async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, PersistenceError>;
    async fn set(&self, key: &str, value: String) -> Result<(), PersistenceError>;
}

/// Saved form of a board.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersistedBoard {
    pub elements: Vec<CanvasElement>,
    #[serde(default)]
    pub prefs: ViewPrefs,
    /// Undo snapshots, oldest first. Boards saved without one load with a
    /// fresh history.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub history: Vec<Vec<CanvasElement>>,
    #[serde(default)]
    pub history_index: usize,
}

// =============================================================================
// STORES
// =============================================================================

/// Keeps values in process memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
}

#[async_trait::async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        Ok(self.values.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: String) -> Result<(), PersistenceError> {
        self.values.lock().await.insert(key.to_string(), value);
        Ok(())
    }
}

/// Keeps all keys in one JSON object file. A missing file reads as empty.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), write_lock: Mutex::new(()) }
    }

    async fn read_all(&self) -> Result<HashMap<String, String>, PersistenceError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(text) => Ok(serde_json::from_str(&text)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(HashMap::new()),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait::async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        Ok(self.read_all().await?.remove(key))
    }

    async fn set(&self, key: &str, value: String) -> Result<(), PersistenceError> {
        let _guard = self.write_lock.lock().await;
        let mut values = self.read_all().await?;
        values.insert(key.to_string(), value);
        let text = serde_json::to_string_pretty(&values)?;
        let tmp = self.path.with_extension("tmp");
        tokio::fs::write(&tmp, text).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

// =============================================================================
// BOARD
// =============================================================================

/// Save the current elements, undo history, and view preferences.
///
/// # Errors
///
/// Returns an error if serialization or the store write fails.
pub async fn save_board(studio: &Studio, store: &dyn KeyValueStore) -> Result<(), PersistenceError> {
    // Snapshot under the lock, write without it.
    let board = {
        let engine = studio.engine.read().await;
        let current = &engine.core.elements;
        PersistedBoard {
            elements: current.elements().to_vec(),
            prefs: engine.prefs,
            history: current.history().to_vec(),
            history_index: current.history_index(),
        }
    };
    let count = board.elements.len();
    store.set(BOARD_KEY, serde_json::to_string(&board)?).await?;
    info!(count, "board saved");
    Ok(())
}

/// Replace the board with the saved one. Returns `false` when nothing was saved.
///
/// A saved history is restored so undo and redo carry across sessions.
///
/// # Errors
///
/// Returns an error if the store read fails or the saved JSON is invalid.
pub async fn load_board(studio: &Studio, store: &dyn KeyValueStore) -> Result<bool, PersistenceError> {
    let Some(text) = store.get(BOARD_KEY).await? else {
        debug!("no saved board");
        return Ok(false);
    };
    let board: PersistedBoard = serde_json::from_str(&text)?;
    let count = board.elements.len();
    studio
        .with_engine(|engine| {
            if board.history.is_empty() {
                engine.core.load(board.elements);
            } else {
                engine.core.load_history(board.history, board.history_index);
            }
            engine.prefs = board.prefs;
        })
        .await;
    info!(count, "board loaded");
    Ok(true)
}

/// Probe decoded sizes for image elements that lack one. Returns how many
/// were restored.
pub async fn rehydrate_media(studio: &Studio) -> usize {
    let targets: Vec<(ElementId, String)> = {
        let engine = studio.engine.read().await;
        engine
            .core
            .elements
            .elements()
            .iter()
            .filter(|el| el.media_type == MediaType::Image && el.natural.is_none())
            .map(|el| (el.id, el.content.clone()))
            .collect()
    };

    let mut restored = 0;
    for (id, url) in targets {
        match studio.probe.dimensions(&url).await {
            Ok(natural) => {
                if studio.with_engine(|engine| engine.core.elements.set_natural(&id, natural)).await {
                    restored += 1;
                }
            }
            Err(e) => warn!(element_id = %id, url = %url, error = %e, "media rehydration failed"),
        }
    }
    debug!(restored, "media rehydrated");
    restored
}

#[cfg(test)]
#[path = "persistence_test.rs"]
mod tests;
