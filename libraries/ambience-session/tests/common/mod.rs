//! Shared helpers for session controller tests

#![allow(dead_code)]

use ambience_core::{Entry, MemorySettings, SourceKind};
use ambience_engine::test_utils::{PipelineProbe, ScriptedPipeline};
use ambience_resolver::{CancellationToken, ResolveError, Resolver};
use ambience_session::{SessionConfig, SessionController, SessionHandle, SessionNotification};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{broadcast, oneshot};

pub const WAIT: Duration = Duration::from_secs(2);

// ===== Entries =====

pub fn rain() -> Entry {
    Entry::new(1, "Rain", SourceKind::LocalFile, "/tmp/rain.ogg")
}

pub fn forest() -> Entry {
    Entry::new(2, "Forest", SourceKind::VideoLink, "https://video/xyz")
}

pub fn waves() -> Entry {
    Entry::new(3, "Waves", SourceKind::WebUrl, "https://radio/waves.mp3")
}

pub fn campfire() -> Entry {
    Entry::new(4, "Campfire", SourceKind::VideoLink, "https://video/fire")
}

pub fn all_entries() -> Vec<Entry> {
    vec![rain(), forest(), waves(), campfire()]
}

// ===== Fake Resolver =====

struct PendingCall {
    locator: String,
    reply: oneshot::Sender<Result<String, ResolveError>>,
}

#[derive(Default)]
struct FakeState {
    scripted: HashMap<String, Result<String, ResolveError>>,
    pending: Vec<PendingCall>,
    calls: Vec<(String, CancellationToken)>,
}

/// Resolver double
///
/// Locators with a scripted result resolve immediately; all others wait
/// until the test calls `complete`.
pub struct FakeResolver {
    available: bool,
    honor_cancel: bool,
    state: Mutex<FakeState>,
}

impl FakeResolver {
    pub fn new() -> Self {
        Self {
            available: true,
            honor_cancel: true,
            state: Mutex::new(FakeState::default()),
        }
    }

    pub fn unavailable() -> Self {
        Self {
            available: false,
            ..Self::new()
        }
    }

    /// Keep running after cancellation, like a helper that ignores signals
    pub fn ignoring_cancellation() -> Self {
        Self {
            honor_cancel: false,
            ..Self::new()
        }
    }

    pub fn script(self, locator: &str, result: Result<String, ResolveError>) -> Self {
        self.state
            .lock()
            .unwrap()
            .scripted
            .insert(locator.to_string(), result);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .calls
            .iter()
            .map(|(locator, _)| locator.clone())
            .collect()
    }

    pub fn token(&self, index: usize) -> CancellationToken {
        self.state.lock().unwrap().calls[index].1.clone()
    }

    /// Wait until at least `count` resolve calls have been made
    pub async fn wait_for_calls(&self, count: usize) {
        tokio::time::timeout(WAIT, async {
            while self.state.lock().unwrap().calls.len() < count {
                tokio::time::sleep(Duration::from_millis(2)).await;
            }
        })
        .await
        .expect("resolver was not called in time");
    }

    /// Complete the oldest waiting call for `locator`
    pub fn complete(&self, locator: &str, result: Result<String, ResolveError>) -> bool {
        let mut state = self.state.lock().unwrap();
        match state.pending.iter().position(|call| call.locator == locator) {
            Some(index) => state.pending.remove(index).reply.send(result).is_ok(),
            None => false,
        }
    }
}

#[async_trait]
impl Resolver for FakeResolver {
    async fn resolve(
        &self,
        locator: &str,
        cancel: CancellationToken,
    ) -> ambience_resolver::Result<String> {
        let reply = {
            let mut state = self.state.lock().unwrap();
            state.calls.push((locator.to_string(), cancel.clone()));
            if let Some(result) = state.scripted.get(locator) {
                return result.clone();
            }
            let (reply, wait) = oneshot::channel();
            state.pending.push(PendingCall {
                locator: locator.to_string(),
                reply,
            });
            wait
        };

        if self.honor_cancel {
            tokio::select! {
                result = reply => result.unwrap_or(Err(ResolveError::Cancelled)),
                () = cancel.cancelled() => Err(ResolveError::Cancelled),
            }
        } else {
            reply.await.unwrap_or(Err(ResolveError::Cancelled))
        }
    }

    async fn check_available(&self) -> bool {
        self.available
    }
}

// ===== Harness =====

pub struct Harness {
    pub handle: SessionHandle,
    pub probe: PipelineProbe,
    pub resolver: Arc<FakeResolver>,
    pub settings: Arc<MemorySettings>,
    pub notifications: broadcast::Receiver<SessionNotification>,
}

impl Harness {
    pub async fn start(resolver: FakeResolver) -> Self {
        Self::start_with(resolver, MemorySettings::new(all_entries()), true).await
    }

    /// Pipeline that only reports URI changes the test emits
    pub async fn start_manual(resolver: FakeResolver) -> Self {
        Self::start_with(resolver, MemorySettings::new(all_entries()), false).await
    }

    pub async fn start_with(
        resolver: FakeResolver,
        settings: MemorySettings,
        auto_uri_changed: bool,
    ) -> Self {
        let (pipeline, probe) = if auto_uri_changed {
            ScriptedPipeline::new()
        } else {
            ScriptedPipeline::manual()
        };
        let resolver = Arc::new(resolver);
        let settings = Arc::new(settings);

        let handle = SessionController::start(
            pipeline,
            Arc::clone(&resolver),
            Arc::clone(&settings),
            SessionConfig::default(),
        )
        .await
        .unwrap();
        let notifications = handle.subscribe();

        Self {
            handle,
            probe,
            resolver,
            settings,
            notifications,
        }
    }

    pub async fn next_notification(&mut self) -> SessionNotification {
        tokio::time::timeout(WAIT, self.notifications.recv())
            .await
            .expect("no notification in time")
            .expect("notification channel closed")
    }

    /// Assert nothing was notified since the last check
    pub fn assert_no_notification(&mut self) {
        match self.notifications.try_recv() {
            Err(broadcast::error::TryRecvError::Empty) => {}
            other => panic!("unexpected notification: {:?}", other),
        }
    }

    /// Let spawned resolver tasks run, then drain the controller
    pub async fn settle(&self) {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
        self.handle.flush().await.unwrap();
    }
}
