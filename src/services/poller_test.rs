#![allow(clippy::float_cmp)]

use std::time::Duration;

use canvas::elements::{CanvasElement, ElementId, MediaType};

use super::*;
use crate::remote::StatusResponse;
use crate::services::generation::{cancel_job, submit_job, track_job};
use crate::state::test_helpers::*;

const RESULT_URL: &str = "https://cdn.test/result.png";

async fn seed_origin(studio: &Studio) -> ElementId {
    studio
        .with_engine(|engine| {
            let el = CanvasElement::new(MediaType::Image, "https://cdn.test/source.png", 100.0, 100.0, 200.0, 200.0);
            let id = el.id;
            engine.core.add_element(el, true);
            id
        })
        .await
}

// =============================================================================
// SUCCESS
// =============================================================================

#[tokio::test(start_paused = true)]
async fn background_result_is_placed_next_to_origin() {
    let jobs = MockJobApi::new();
    jobs.script(
        "job-1",
        vec![Ok(StatusResponse::pending()), Ok(StatusResponse::success(vec![RESULT_URL.into()], None))],
    );
    let t = test_studio(jobs, MockProbe::with(RESULT_URL, 800.0, 400.0));
    let origin = seed_origin(&t.studio).await;

    let id = submit_job(&t.studio, JobKind::Background, serde_json::json!({"image": "src"}), Some(origin))
        .await
        .unwrap();
    assert_eq!(id, "job-1");
    assert!(t.studio.engine.read().await.tasks.is_pending("job-1"));

    t.studio.wait_for_tasks().await;

    let engine = t.studio.engine.read().await;
    assert!(engine.tasks.is_empty());
    assert_eq!(engine.core.elements.len(), 2);
    let placed = engine.core.elements.last().unwrap();
    assert_eq!((placed.x, placed.y, placed.width, placed.height), (120.0, 120.0, 300.0, 150.0));
    assert_eq!(placed.content, RESULT_URL);
    assert_eq!(engine.core.selection(), Some(origin));
    drop(engine);

    assert_eq!(t.jobs.status_count("job-1"), 2);
    assert!(t.notifier.errors().is_empty());
    assert_eq!(t.notifier.sent.lock().unwrap().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn image_url_used_when_download_urls_empty() {
    let jobs = MockJobApi::new();
    jobs.script("job-1", vec![Ok(StatusResponse::success(Vec::new(), Some(RESULT_URL.into())))]);
    let t = test_studio(jobs, MockProbe::with(RESULT_URL, 100.0, 200.0));

    submit_job(&t.studio, JobKind::Generate, serde_json::json!({}), None).await.unwrap();
    t.studio.wait_for_tasks().await;

    let engine = t.studio.engine.read().await;
    let placed = engine.core.elements.last().unwrap();
    assert_eq!((placed.x, placed.y, placed.width, placed.height), (100.0, 100.0, 150.0, 300.0));
}

// =============================================================================
// FAILURE PATHS
// =============================================================================

#[tokio::test(start_paused = true)]
async fn success_without_url_fails_task() {
    let jobs = MockJobApi::new();
    jobs.script("job-1", vec![Ok(StatusResponse::success(Vec::new(), None))]);
    let t = test_studio(jobs, MockProbe::default());

    submit_job(&t.studio, JobKind::Upscale, serde_json::json!({}), None).await.unwrap();
    t.studio.wait_for_tasks().await;

    let engine = t.studio.engine.read().await;
    assert!(engine.tasks.get("job-1").is_none());
    assert!(engine.core.elements.is_empty());
    drop(engine);

    let errors = t.notifier.errors();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].description.contains("without a result url"));
}

#[tokio::test(start_paused = true)]
async fn remote_failure_notifies_with_error() {
    let jobs = MockJobApi::new();
    jobs.script("job-1", vec![Ok(StatusResponse::pending()), Ok(StatusResponse::failure("content filtered"))]);
    let t = test_studio(jobs, MockProbe::default());

    submit_job(&t.studio, JobKind::Human, serde_json::json!({}), None).await.unwrap();
    t.studio.wait_for_tasks().await;

    assert!(t.studio.engine.read().await.tasks.is_empty());
    assert!(t.studio.engine.read().await.core.elements.is_empty());
    let errors = t.notifier.errors();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].description.contains("content filtered"));
    assert!(errors[0].description.contains("human"));
}

#[tokio::test(start_paused = true)]
async fn undecodable_result_fails_task() {
    let jobs = MockJobApi::new();
    jobs.script("job-1", vec![Ok(StatusResponse::success(vec![RESULT_URL.into()], None))]);
    let t = test_studio(jobs, MockProbe::default());

    submit_job(&t.studio, JobKind::Style, serde_json::json!({}), None).await.unwrap();
    t.studio.wait_for_tasks().await;

    assert!(t.studio.engine.read().await.tasks.is_empty());
    assert!(t.studio.engine.read().await.core.elements.is_empty());
    assert_eq!(t.notifier.errors().len(), 1);
}

// =============================================================================
// TRANSPORT ERRORS
// =============================================================================

#[tokio::test(start_paused = true)]
async fn transient_errors_are_retried() {
    let jobs = MockJobApi::new();
    jobs.script(
        "job-1",
        vec![
            Err("connection reset".into()),
            Err("connection reset".into()),
            Ok(StatusResponse::success(vec![RESULT_URL.into()], None)),
        ],
    );
    let t = test_studio(jobs, MockProbe::with(RESULT_URL, 10.0, 10.0));

    submit_job(&t.studio, JobKind::Logo, serde_json::json!({}), None).await.unwrap();
    t.studio.wait_for_tasks().await;

    assert_eq!(t.jobs.status_count("job-1"), 3);
    assert!(t.notifier.errors().is_empty());
    assert_eq!(t.studio.engine.read().await.core.elements.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn persistent_errors_fail_task() {
    let jobs = MockJobApi::new();
    jobs.script("job-1", vec![Err("timeout".into()), Err("timeout".into()), Err("timeout".into())]);
    let t = test_studio(jobs, MockProbe::default());

    submit_job(&t.studio, JobKind::Sketch, serde_json::json!({}), None).await.unwrap();
    t.studio.wait_for_tasks().await;

    assert_eq!(t.jobs.status_count("job-1"), 3);
    assert!(t.studio.engine.read().await.tasks.is_empty());
    let errors = t.notifier.errors();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].description.contains("status check failed"));
}

// =============================================================================
// CANCELLATION
// =============================================================================

#[tokio::test(start_paused = true)]
async fn cancelled_task_is_never_polled() {
    let t = test_studio(MockJobApi::new(), MockProbe::default());
    assert!(track_job(&t.studio, "job-9".into(), JobKind::Recolor, None).await);
    assert!(cancel_job(&t.studio, "job-9").await);

    t.studio.wait_for_tasks().await;

    assert_eq!(t.jobs.status_count("job-9"), 0);
    assert!(t.notifier.sent.lock().unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn cancel_during_result_probe_discards_result() {
    let jobs = MockJobApi::new();
    jobs.script("job-1", vec![Ok(StatusResponse::success(vec![RESULT_URL.into()], None))]);
    let mut probe = MockProbe::with(RESULT_URL, 800.0, 400.0);
    probe.delay = Some(Duration::from_secs(30));
    let t = test_studio(jobs, probe);

    submit_job(&t.studio, JobKind::Background, serde_json::json!({}), None).await.unwrap();
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(t.jobs.status_count("job-1"), 1);
    assert_eq!(t.probe.calls.lock().unwrap().len(), 1);
    assert!(cancel_job(&t.studio, "job-1").await);

    t.studio.wait_for_tasks().await;

    let engine = t.studio.engine.read().await;
    assert!(engine.core.elements.is_empty());
    assert!(engine.tasks.is_empty());
    drop(engine);
    assert!(t.notifier.sent.lock().unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn shutdown_stops_pending_pollers() {
    let t = test_studio(MockJobApi::new(), MockProbe::default());
    track_job(&t.studio, "job-1".into(), JobKind::Interior, None).await;
    track_job(&t.studio, "job-2".into(), JobKind::Controlnet, None).await;

    tokio::time::sleep(Duration::from_secs(5)).await;
    t.studio.shutdown().await;

    assert!(t.jobs.status_count("job-1") >= 3);
    let engine = t.studio.engine.read().await;
    assert!(engine.tasks.is_pending("job-1"));
    assert!(engine.tasks.is_pending("job-2"));
    assert!(t.notifier.sent.lock().unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn poll_once_skips_untracked_task() {
    let t = test_studio(MockJobApi::new(), MockProbe::default());
    let mut errors = 0;
    assert_eq!(poll_once(&t.studio, "ghost", JobKind::Generate, &mut errors).await, PollOutcome::Done);
    assert_eq!(t.jobs.status_count("ghost"), 0);
}

#[tokio::test(start_paused = true)]
async fn poll_once_keeps_pending_task() {
    let t = test_studio(MockJobApi::new(), MockProbe::default());
    t.studio
        .engine
        .write()
        .await
        .tasks
        .add_task("job-1".into(), JobKind::Generate, None);
    let mut errors = 2;
    assert_eq!(poll_once(&t.studio, "job-1", JobKind::Generate, &mut errors).await, PollOutcome::Continue);
    assert_eq!(errors, 0);
    assert!(t.studio.engine.read().await.tasks.is_pending("job-1"));
}

#[test]
fn jitter_is_bounded() {
    for _ in 0..50 {
        assert!(start_jitter(Duration::from_secs(5)) <= Duration::from_millis(500));
    }
    assert_eq!(start_jitter(Duration::ZERO), Duration::ZERO);
}
