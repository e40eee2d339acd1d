//! Shared studio state.
//!
//! DESIGN
//! ======
//! `Studio` is a cheap `Clone` handle passed to every service and poller.
//! All canvas and task mutations funnel through one `RwLock<CanvasEngine>`;
//! callers hold the write lock for a whole synchronous mutation and release
//! it before any network or decode await. After each mutation the next
//! `Scene` is published on a `watch` channel for renderers.
//!
//! Pollers run on a `JoinSet` so shutdown can signal and then await them.
//! A separate live-poller count is what waiters watch, so the `JoinSet` lock
//! is only held briefly and tracking new jobs never waits on old ones.

use std::sync::Arc;

use canvas::engine::{EngineCore, Scene};
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock, watch};
use tokio::task::JoinSet;
use tracing::{info, warn};

use crate::config::PollSettings;
use crate::notify::Notifier;
use crate::remote::{JobApi, MediaProbe, Uploader};
use crate::services::tasks::TaskRegistry;

// =============================================================================
// CANVAS ENGINE
// =============================================================================

/// Display toggles saved alongside the board.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewPrefs {
    #[serde(default)]
    pub show_grid: bool,
    #[serde(default)]
    pub snap_to_grid: bool,
}

/// Everything guarded by the studio lock.
#[derive(Debug, Default)]
pub struct CanvasEngine {
    pub core: EngineCore,
    pub tasks: TaskRegistry,
    pub prefs: ViewPrefs,
}

// =============================================================================
// STUDIO
// =============================================================================

/// External services a studio talks to.
#[derive(Clone)]
pub struct Collaborators {
    pub jobs: Arc<dyn JobApi>,
    pub uploader: Arc<dyn Uploader>,
    pub probe: Arc<dyn MediaProbe>,
    pub notifier: Arc<dyn Notifier>,
}

#[derive(Clone)]
pub struct Studio {
    pub engine: Arc<RwLock<CanvasEngine>>,
    pub jobs: Arc<dyn JobApi>,
    pub uploader: Arc<dyn Uploader>,
    pub probe: Arc<dyn MediaProbe>,
    pub notifier: Arc<dyn Notifier>,
    pub poll: PollSettings,
    scenes: Arc<watch::Sender<Arc<Scene>>>,
    shutdown: Arc<watch::Sender<bool>>,
    pollers: Arc<Mutex<JoinSet<()>>>,
    active: Arc<watch::Sender<usize>>,
}

/// Decrements the live-poller count when a poller future is dropped, whether
/// it finished, panicked, or was aborted before its first poll.
struct ActiveGuard(Arc<watch::Sender<usize>>);

impl ActiveGuard {
    fn new(active: &Arc<watch::Sender<usize>>) -> Self {
        active.send_modify(|n| *n += 1);
        Self(Arc::clone(active))
    }
}

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        self.0.send_modify(|n| *n = n.saturating_sub(1));
    }
}

impl Studio {
    #[must_use]
    pub fn new(collaborators: Collaborators, poll: PollSettings) -> Self {
        let engine = CanvasEngine::default();
        let (scenes, _) = watch::channel(Arc::new(engine.core.scene()));
        let (shutdown, _) = watch::channel(false);
        let (active, _) = watch::channel(0);
        Self {
            engine: Arc::new(RwLock::new(engine)),
            jobs: collaborators.jobs,
            uploader: collaborators.uploader,
            probe: collaborators.probe,
            notifier: collaborators.notifier,
            poll,
            scenes: Arc::new(scenes),
            shutdown: Arc::new(shutdown),
            pollers: Arc::new(Mutex::new(JoinSet::new())),
            active: Arc::new(active),
        }
    }

    /// Run one mutation under the write lock, then publish the new scene.
    pub async fn with_engine<R>(&self, f: impl FnOnce(&mut CanvasEngine) -> R) -> R {
        let mut engine = self.engine.write().await;
        let out = f(&mut *engine);
        self.scenes.send_replace(Arc::new(engine.core.scene()));
        out
    }

    /// Latest scene, updated after every mutation.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Arc<Scene>> {
        self.scenes.subscribe()
    }

    #[must_use]
    pub fn shutdown_signal(&self) -> watch::Receiver<bool> {
        self.shutdown.subscribe()
    }

    #[must_use]
    pub fn is_shutting_down(&self) -> bool {
        *self.shutdown.borrow()
    }

    /// Run `poller` on the studio's poller set. Finished pollers are reaped first.
    pub(crate) async fn spawn_poller<F>(&self, poller: F)
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let guard = ActiveGuard::new(&self.active);
        let mut pollers = self.pollers.lock().await;
        reap(&mut pollers);
        pollers.spawn(async move {
            let _guard = guard;
            poller.await;
        });
    }

    /// Number of pollers still running.
    #[must_use]
    pub fn active_pollers(&self) -> usize {
        *self.active.borrow()
    }

    /// Wait until every poller has finished on its own, including pollers
    /// spawned while waiting. New jobs can be tracked meanwhile.
    pub async fn wait_for_tasks(&self) {
        let mut active = self.active.subscribe();
        if active.wait_for(|n| *n == 0).await.is_err() {
            warn!("poller count channel closed");
        }
        reap(&mut *self.pollers.lock().await);
    }

    /// Signal every poller to stop and wait for them.
    ///
    /// Tasks still pending stay in the registry. No status check starts after
    /// the signal.
    pub async fn shutdown(&self) {
        self.shutdown.send_replace(true);
        self.wait_for_tasks().await;
        let pending = self.engine.read().await.tasks.len();
        info!(pending, "studio shut down");
    }
}

fn reap(pollers: &mut JoinSet<()>) {
    while let Some(joined) = pollers.try_join_next() {
        if let Err(e) = joined {
            warn!(error = %e, "poller task aborted");
        }
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================

#[cfg(test)]
pub mod test_helpers {
    use std::collections::{HashMap, VecDeque};
    use std::sync::Mutex as StdMutex;
    use std::time::Duration;

    use canvas::elements::NaturalSize;

    use super::*;
    use crate::notify::Notification;
    use crate::remote::{RemoteError, StatusResponse};
    use crate::services::tasks::{JobKind, TaskId};

    /// Scripted job service. Each id replays its queued responses in order and
    /// then repeats `PENDING`. `Err` strings become retryable request errors.
    #[derive(Default)]
    pub struct MockJobApi {
        pub submissions: StdMutex<Vec<(JobKind, serde_json::Value)>>,
        pub status_calls: StdMutex<Vec<(JobKind, String)>>,
        scripts: StdMutex<HashMap<String, VecDeque<Result<StatusResponse, String>>>>,
        next_id: StdMutex<u32>,
        fail_submit: bool,
    }

    impl MockJobApi {
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        #[must_use]
        pub fn failing_submit() -> Self {
            Self { fail_submit: true, ..Self::default() }
        }

        pub fn script(&self, id: &str, responses: Vec<Result<StatusResponse, String>>) {
            self.scripts.lock().unwrap().insert(id.to_string(), responses.into());
        }

        pub fn status_count(&self, id: &str) -> usize {
            self.status_calls.lock().unwrap().iter().filter(|(_, i)| i == id).count()
        }
    }

    #[async_trait::async_trait]
    impl JobApi for MockJobApi {
        async fn submit(&self, kind: JobKind, payload: &serde_json::Value) -> Result<TaskId, RemoteError> {
            if self.fail_submit {
                return Err(RemoteError::Response { status: 500, body: "down".into() });
            }
            self.submissions.lock().unwrap().push((kind, payload.clone()));
            let mut next = self.next_id.lock().unwrap();
            *next += 1;
            Ok(format!("job-{}", *next))
        }

        async fn status(&self, kind: JobKind, id: &str) -> Result<StatusResponse, RemoteError> {
            self.status_calls.lock().unwrap().push((kind, id.to_string()));
            let next = self.scripts.lock().unwrap().get_mut(id).and_then(VecDeque::pop_front);
            match next {
                Some(Ok(resp)) => Ok(resp),
                Some(Err(msg)) => Err(RemoteError::Request(msg)),
                None => Ok(StatusResponse::pending()),
            }
        }
    }

    /// Uploader that hands back `https://uploads.test/{file_name}`.
    #[derive(Default)]
    pub struct MockUploader {
        pub uploads: StdMutex<Vec<(String, usize)>>,
    }

    #[async_trait::async_trait]
    impl Uploader for MockUploader {
        async fn upload(&self, file_name: &str, bytes: Vec<u8>) -> Result<String, RemoteError> {
            self.uploads.lock().unwrap().push((file_name.to_string(), bytes.len()));
            Ok(format!("https://uploads.test/{file_name}"))
        }
    }

    /// Probe with fixed answers per URL; unknown URLs fail to decode.
    #[derive(Default)]
    pub struct MockProbe {
        sizes: StdMutex<HashMap<String, NaturalSize>>,
        pub delay: Option<Duration>,
        pub calls: StdMutex<Vec<String>>,
    }

    impl MockProbe {
        #[must_use]
        pub fn with(url: &str, width: f64, height: f64) -> Self {
            let probe = Self::default();
            probe.insert(url, width, height);
            probe
        }

        pub fn insert(&self, url: &str, width: f64, height: f64) {
            self.sizes.lock().unwrap().insert(url.to_string(), NaturalSize { width, height });
        }
    }

    #[async_trait::async_trait]
    impl MediaProbe for MockProbe {
        async fn dimensions(&self, url: &str) -> Result<NaturalSize, RemoteError> {
            self.calls.lock().unwrap().push(url.to_string());
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.sizes
                .lock()
                .unwrap()
                .get(url)
                .copied()
                .ok_or_else(|| RemoteError::Decode(format!("cannot decode {url}")))
        }
    }

    #[derive(Default)]
    pub struct RecordingNotifier {
        pub sent: StdMutex<Vec<Notification>>,
    }

    impl RecordingNotifier {
        pub fn errors(&self) -> Vec<Notification> {
            self.sent.lock().unwrap().iter().filter(|n| n.is_error).cloned().collect()
        }
    }

    impl Notifier for RecordingNotifier {
        fn notify(&self, notification: Notification) {
            self.sent.lock().unwrap().push(notification);
        }
    }

    pub struct TestStudio {
        pub studio: Studio,
        pub jobs: Arc<MockJobApi>,
        pub uploader: Arc<MockUploader>,
        pub probe: Arc<MockProbe>,
        pub notifier: Arc<RecordingNotifier>,
    }

    /// Poll every second, give up after three transport errors.
    #[must_use]
    pub fn test_poll_settings() -> PollSettings {
        PollSettings { interval: Duration::from_secs(1), max_consecutive_errors: 3, ..PollSettings::default() }
    }

    #[must_use]
    pub fn test_studio(jobs: MockJobApi, probe: MockProbe) -> TestStudio {
        let jobs = Arc::new(jobs);
        let uploader = Arc::new(MockUploader::default());
        let probe = Arc::new(probe);
        let notifier = Arc::new(RecordingNotifier::default());
        let studio = Studio::new(
            Collaborators {
                jobs: jobs.clone(),
                uploader: uploader.clone(),
                probe: probe.clone(),
                notifier: notifier.clone(),
            },
            test_poll_settings(),
        );
        TestStudio { studio, jobs, uploader, probe, notifier }
    }
}

#[cfg(test)]
#[path = "state_test.rs"]
mod tests;
