//! Generation service — submit jobs, track them, and report failures.
//!
//! DESIGN
//! ======
//! Submitting a job registers it as `Pending` and starts one poller for it.
//! Everything that ends a task unsuccessfully goes through `fail_task`, which
//! records the error, removes the task, and sends exactly one notification.
//!
//! ERROR HANDLING
//! ==============
//! Callers only see `TaskError` for submission. Failures discovered later by a
//! poller are surfaced to the user through the notifier, never returned.

use canvas::elements::ElementId;
use tracing::{debug, info, warn};

use super::poller;
use super::tasks::{GenerationTask, JobKind, TaskId, TaskUpdate};
use crate::notify::Notification;
use crate::remote::RemoteError;
use crate::state::Studio;

/// Why a task ended without a placed result.
#[derive(Debug, thiserror::Error)]
pub enum TaskError {
    /// The service reported `FAILURE`.
    #[error("job failed: {0}")]
    Failed(String),

    /// The service reported `SUCCESS` without any result URL.
    #[error("job succeeded without a result url")]
    MissingResultUrl,

    /// The result could not be fetched or decoded.
    #[error("result could not be placed: {0}")]
    Placement(RemoteError),

    /// Status checks kept failing.
    #[error("status check failed: {0}")]
    Polling(RemoteError),

    /// The job was never accepted.
    #[error("job submission failed: {0}")]
    Submit(RemoteError),
}

impl TaskError {
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Failed(_) => "E_TASK_FAILED",
            Self::MissingResultUrl => "E_MISSING_RESULT_URL",
            Self::Placement(_) => "E_PLACEMENT",
            Self::Polling(_) => "E_POLLING",
            Self::Submit(_) => "E_SUBMIT",
        }
    }
}

/// Submit a job and start tracking it. `origin` is the element the result
/// should be placed next to.
///
/// # Errors
///
/// Returns [`TaskError::Submit`] if the service rejects the job. The user is
/// notified as well.
pub async fn submit_job(
    studio: &Studio,
    kind: JobKind,
    payload: serde_json::Value,
    origin: Option<ElementId>,
) -> Result<TaskId, TaskError> {
    let id = match studio.jobs.submit(kind, &payload).await {
        Ok(id) => id,
        Err(e) => {
            let err = TaskError::Submit(e);
            warn!(%kind, error = %err, error_code = err.error_code(), "job submission failed");
            studio
                .notifier
                .notify(Notification::error("Generation failed", format!("{kind}: {err}")));
            return Err(err);
        }
    };
    track_job(studio, id.clone(), kind, origin).await;
    Ok(id)
}

/// Register an already-submitted job and spawn its poller.
///
/// Returns `false` when the id is already tracked or the studio is shutting down.
pub async fn track_job(studio: &Studio, id: TaskId, kind: JobKind, origin: Option<ElementId>) -> bool {
    if studio.is_shutting_down() {
        warn!(task_id = %id, %kind, "studio shutting down; task not tracked");
        return false;
    }
    let added = studio.engine.write().await.tasks.add_task(id.clone(), kind, origin);
    if added {
        info!(task_id = %id, %kind, origin = ?origin, "tracking task");
        studio.spawn_poller(poller::run_poller(studio.clone(), id, kind)).await;
    }
    added
}

/// Stop tracking a task. Its poller exits at the next tick without placing
/// anything.
pub async fn cancel_job(studio: &Studio, id: &str) -> bool {
    let removed = studio.engine.write().await.tasks.remove_task(id).is_some();
    debug!(task_id = %id, removed, "task cancelled");
    removed
}

/// Record the failure, drop the task, and tell the user once. Returns the
/// removed task.
///
/// A task that already reached a terminal status keeps it; only removal and
/// the notification happen. A task that was already removed (cancelled, or
/// finished elsewhere) is left alone and produces no notification.
pub(crate) async fn fail_task(studio: &Studio, id: &str, kind: JobKind, err: &TaskError) -> Option<GenerationTask> {
    let removed = {
        let mut engine = studio.engine.write().await;
        let terminal = engine.tasks.get(id).is_some_and(|task| task.status.is_terminal());
        if !terminal {
            engine.tasks.update_task(id, TaskUpdate::failure(err.to_string()));
        }
        engine.tasks.remove_task(id)
    };
    let Some(task) = removed else {
        debug!(task_id = %id, "failed task already removed");
        return None;
    };

    warn!(
        task_id = %id,
        %kind,
        error = %err,
        error_code = err.error_code(),
        elapsed_ms = task.created_at.elapsed().as_millis(),
        "task failed"
    );
    studio
        .notifier
        .notify(Notification::error("Generation failed", format!("{kind} job {id}: {err}")));
    Some(task)
}

#[cfg(test)]
#[path = "generation_test.rs"]
mod tests;
