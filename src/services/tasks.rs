//! Task registry — in-flight generation jobs keyed by remote id.
//!
//! DESIGN
//! ======
//! The registry is a plain map owned by `CanvasEngine`, so it is only ever
//! touched under the studio write lock. Pollers read it at the top of each
//! tick to decide whether to keep going.
//!
//! Once a task is terminal (`Success` or `Failure`) further updates are
//! ignored. Removal is idempotent: a late poller and an explicit cancel may
//! both try to remove the same id.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::time::Instant;

use canvas::elements::ElementId;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Remote-assigned job identifier.
pub type TaskId = String;

// =============================================================================
// JOB KIND
// =============================================================================

/// The remote generation operations the studio can drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    Generate,
    Controlnet,
    Sketch,
    Recolor,
    Interior,
    Logo,
    Background,
    Human,
    Upscale,
    Style,
    Inpainting,
}

impl JobKind {
    pub const ALL: [Self; 11] = [
        Self::Generate,
        Self::Controlnet,
        Self::Sketch,
        Self::Recolor,
        Self::Interior,
        Self::Logo,
        Self::Background,
        Self::Human,
        Self::Upscale,
        Self::Style,
        Self::Inpainting,
    ];

    /// Wire name, also the path segment of the job's endpoints.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Generate => "generate",
            Self::Controlnet => "controlnet",
            Self::Sketch => "sketch",
            Self::Recolor => "recolor",
            Self::Interior => "interior",
            Self::Logo => "logo",
            Self::Background => "background",
            Self::Human => "human",
            Self::Upscale => "upscale",
            Self::Style => "style",
            Self::Inpainting => "inpainting",
        }
    }

    /// Path of the status endpoint for task `id`, relative to the API base.
    #[must_use]
    pub fn status_path(self, id: &str) -> String {
        format!("{}/{id}", self.as_str())
    }
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown job kind: {0}")]
pub struct UnknownJobKind(pub String);

impl FromStr for JobKind {
    type Err = UnknownJobKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| UnknownJobKind(s.to_string()))
    }
}

// =============================================================================
// TASK
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TaskStatus {
    Pending,
    Success,
    Failure,
}

impl TaskStatus {
    #[must_use]
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending)
    }
}

/// Output locations reported by a successful job.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskResult {
    pub download_urls: Vec<String>,
    pub image_url: Option<String>,
}

impl TaskResult {
    /// First non-empty download URL, else the image URL.
    #[must_use]
    pub fn primary_url(&self) -> Option<&str> {
        self.download_urls
            .iter()
            .map(String::as_str)
            .find(|url| !url.is_empty())
            .or_else(|| self.image_url.as_deref().filter(|url| !url.is_empty()))
    }
}

/// One tracked remote job.
#[derive(Debug, Clone)]
pub struct GenerationTask {
    pub id: TaskId,
    pub kind: JobKind,
    pub status: TaskStatus,
    /// Element the job was started from. Results are placed next to it.
    pub origin_element_id: Option<ElementId>,
    pub result: Option<TaskResult>,
    pub error: Option<String>,
    pub created_at: Instant,
}

/// Sparse update merged into a task by [`TaskRegistry::update_task`].
#[derive(Debug, Clone, Default)]
pub struct TaskUpdate {
    pub status: Option<TaskStatus>,
    pub result: Option<TaskResult>,
    pub error: Option<String>,
}

impl TaskUpdate {
    #[must_use]
    pub fn status(status: TaskStatus) -> Self {
        Self { status: Some(status), ..Self::default() }
    }

    #[must_use]
    pub fn success(result: TaskResult) -> Self {
        Self { status: Some(TaskStatus::Success), result: Some(result), error: None }
    }

    #[must_use]
    pub fn failure(error: impl Into<String>) -> Self {
        Self { status: Some(TaskStatus::Failure), result: None, error: Some(error.into()) }
    }
}

// =============================================================================
// REGISTRY
// =============================================================================

#[derive(Debug, Default)]
pub struct TaskRegistry {
    tasks: HashMap<TaskId, GenerationTask>,
}

impl TaskRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start tracking a job as `Pending`. Returns `false` for a duplicate id.
    pub fn add_task(&mut self, id: TaskId, kind: JobKind, origin_element_id: Option<ElementId>) -> bool {
        if self.tasks.contains_key(&id) {
            warn!(task_id = %id, %kind, "duplicate task id; ignoring");
            return false;
        }
        let task = GenerationTask {
            id: id.clone(),
            kind,
            status: TaskStatus::Pending,
            origin_element_id,
            result: None,
            error: None,
            created_at: Instant::now(),
        };
        self.tasks.insert(id, task);
        true
    }

    /// Merge `update` into a pending task. Unknown and terminal tasks are left alone.
    pub fn update_task(&mut self, id: &str, update: TaskUpdate) -> bool {
        let Some(task) = self.tasks.get_mut(id) else {
            debug!(task_id = %id, "update for unknown task ignored");
            return false;
        };
        if task.status.is_terminal() {
            debug!(task_id = %id, status = ?task.status, "update for terminal task ignored");
            return false;
        }
        if let Some(status) = update.status {
            task.status = status;
        }
        if let Some(result) = update.result {
            task.result = Some(result);
        }
        if let Some(error) = update.error {
            task.error = Some(error);
        }
        true
    }

    /// Stop tracking a task. Removing an absent id is a no-op.
    pub fn remove_task(&mut self, id: &str) -> Option<GenerationTask> {
        self.tasks.remove(id)
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&GenerationTask> {
        self.tasks.get(id)
    }

    #[must_use]
    pub fn is_pending(&self, id: &str) -> bool {
        self.tasks.get(id).is_some_and(|t| t.status == TaskStatus::Pending)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Tracked ids, oldest first.
    #[must_use]
    pub fn ids(&self) -> Vec<TaskId> {
        let mut tasks: Vec<&GenerationTask> = self.tasks.values().collect();
        tasks.sort_by_key(|t| t.created_at);
        tasks.into_iter().map(|t| t.id.clone()).collect()
    }
}

#[cfg(test)]
#[path = "tasks_test.rs"]
mod tests;
