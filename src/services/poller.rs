//! Poller — one background loop per tracked task.
//!
//! DESIGN
//! ======
//! Each task gets its own `tokio` task ticking on an interval. The first check
//! happens one interval (plus a little jitter, so a batch of submissions does
//! not poll in lockstep) after tracking starts. At the top of every tick the
//! loop stops if the studio is shutting down or the task is no longer
//! pending, so removing a task from the registry is how it is cancelled.
//!
//! ERROR HANDLING
//! ==============
//! Retryable transport errors are tolerated until `max_consecutive_errors`
//! in a row; anything else, and any terminal status, ends the loop. The loop
//! never panics and never leaves a task behind in the registry once it has
//! reached a verdict.

use std::time::Duration;

use rand::Rng;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use super::generation::{TaskError, fail_task};
use super::placement::{insert_result, probe_natural};
use super::tasks::{JobKind, TaskResult, TaskStatus, TaskUpdate};
use crate::notify::Notification;
use crate::remote::RemoteError;
use crate::remote::media::media_type_for;
use crate::state::Studio;

/// Upper bound on start-up jitter as a fraction of the poll interval.
const JITTER_DIVISOR: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PollOutcome {
    Continue,
    Done,
}

pub(crate) async fn run_poller(studio: Studio, id: String, kind: JobKind) {
    let period = studio.poll.interval;
    let mut ticker = tokio::time::interval_at(Instant::now() + period + start_jitter(period), period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut shutdown = studio.shutdown_signal();
    let mut consecutive_errors = 0;

    debug!(task_id = %id, %kind, period_ms = period.as_millis(), "poller started");
    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = shutdown.changed() => {}
        }
        if studio.is_shutting_down() {
            debug!(task_id = %id, "poller stopped by shutdown");
            return;
        }
        if poll_once(&studio, &id, kind, &mut consecutive_errors).await == PollOutcome::Done {
            debug!(task_id = %id, "poller finished");
            return;
        }
    }
}

fn start_jitter(period: Duration) -> Duration {
    let max_ms = u64::try_from((period / JITTER_DIVISOR).as_millis()).unwrap_or(0);
    Duration::from_millis(rand::rng().random_range(0..=max_ms))
}

/// One status check and whatever it leads to.
pub(crate) async fn poll_once(studio: &Studio, id: &str, kind: JobKind, consecutive_errors: &mut u32) -> PollOutcome {
    if !studio.engine.read().await.tasks.is_pending(id) {
        debug!(task_id = %id, "task no longer pending");
        return PollOutcome::Done;
    }

    let response = match studio.jobs.status(kind, id).await {
        Ok(response) => {
            *consecutive_errors = 0;
            response
        }
        Err(e) => return on_status_error(studio, id, kind, e, consecutive_errors).await,
    };
    if studio.is_shutting_down() {
        return PollOutcome::Done;
    }

    match response.status {
        TaskStatus::Pending => {
            studio
                .engine
                .write()
                .await
                .tasks
                .update_task(id, TaskUpdate::status(TaskStatus::Pending));
            PollOutcome::Continue
        }
        TaskStatus::Failure => {
            let message = response.error.unwrap_or_else(|| "no error message".into());
            fail_task(studio, id, kind, &TaskError::Failed(message)).await;
            PollOutcome::Done
        }
        TaskStatus::Success => {
            complete_task(studio, id, kind, response.result()).await;
            PollOutcome::Done
        }
    }
}

async fn on_status_error(
    studio: &Studio,
    id: &str,
    kind: JobKind,
    err: RemoteError,
    consecutive_errors: &mut u32,
) -> PollOutcome {
    *consecutive_errors += 1;
    if err.retryable() && *consecutive_errors < studio.poll.max_consecutive_errors {
        warn!(
            task_id = %id,
            %kind,
            error = %err,
            attempt = *consecutive_errors,
            "status check failed; retrying next tick"
        );
        return PollOutcome::Continue;
    }
    fail_task(studio, id, kind, &TaskError::Polling(err)).await;
    PollOutcome::Done
}

async fn complete_task(studio: &Studio, id: &str, kind: JobKind, result: TaskResult) {
    let Some(url) = result.primary_url().map(String::from) else {
        fail_task(studio, id, kind, &TaskError::MissingResultUrl).await;
        return;
    };

    let origin = {
        let mut engine = studio.engine.write().await;
        let Some(origin) = engine.tasks.get(id).map(|task| task.origin_element_id) else {
            debug!(task_id = %id, "task removed before completion");
            return;
        };
        if !engine.tasks.update_task(id, TaskUpdate::success(result)) {
            return;
        }
        origin
    };

    let media_type = media_type_for(&url);
    let natural = match probe_natural(studio, media_type, &url).await {
        Ok(natural) => natural,
        Err(e) => {
            fail_task(studio, id, kind, &TaskError::Placement(e)).await;
            return;
        }
    };

    // Removal and insertion share one lock so a cancel during the probe wins.
    let max_dim = studio.poll.fit_max_dimension;
    let placed = studio
        .with_engine(|engine| {
            let task = engine.tasks.remove_task(id)?;
            let element_id = insert_result(engine, origin, media_type, natural, &url, max_dim);
            Some((element_id, task))
        })
        .await;
    let Some((element_id, task)) = placed else {
        debug!(task_id = %id, "task cancelled during placement; result discarded");
        return;
    };

    info!(
        task_id = %id,
        %kind,
        element_id = %element_id,
        elapsed_ms = task.created_at.elapsed().as_millis(),
        "task completed"
    );
    studio
        .notifier
        .notify(Notification::info("Generation complete", format!("{kind} result added to the canvas")));
}

#[cfg(test)]
#[path = "poller_test.rs"]
mod tests;
