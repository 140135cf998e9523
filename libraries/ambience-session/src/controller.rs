//! Session controller - core orchestration
//!
//! Sequences activation -> resolution -> set-uri -> (uri changed) -> start,
//! and maps resolver and engine failures onto session states.

use crate::{
    error::Result,
    handle::{SessionCommand, SessionHandle},
    types::{FailureReason, SessionConfig, SessionNotification, SessionSnapshot, SessionState},
};
use ambience_core::{Entry, SettingsStore};
use ambience_engine::{EngineEvent, EngineState, MediaPipeline, PipelineMessage, PlaybackEngine};
use ambience_resolver::{CancellationToken, ResolveError, Resolver};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, watch};
use tracing::{debug, info, warn};

/// One in-flight resolution
#[derive(Debug)]
struct ResolutionRequest {
    generation: u64,
    locator: String,
    cancel: CancellationToken,
}

/// Completion of a resolver call, tagged with its activation
#[derive(Debug)]
struct Resolution {
    generation: u64,
    result: std::result::Result<String, ResolveError>,
}

/// Mutable controller state; owned by the controller task only
#[derive(Debug)]
struct Session {
    active_entry: Option<Entry>,
    playback_uri: Option<String>,
    pending_resolution: Option<ResolutionRequest>,

    /// `playback_uri` was handed to the engine and is waiting for the
    /// engine's URI-changed notification before `start()`
    awaiting_start: bool,

    state: SessionState,
}

impl Session {
    fn new() -> Self {
        Self {
            active_entry: None,
            playback_uri: None,
            pending_resolution: None,
            awaiting_start: false,
            state: SessionState::Inactive,
        }
    }
}

/// Session controller actor
///
/// Constructed and spawned by [`SessionController::start`]; afterwards it is
/// only reachable through the returned [`SessionHandle`].
pub struct SessionController<P, R, S>
where
    P: MediaPipeline,
{
    engine: PlaybackEngine<P>,
    resolver: Arc<R>,
    settings: Arc<S>,
    session: Session,

    /// Bumped on every activation; stale completions carry an older value
    generation: u64,

    helper_available: bool,
    resolved_tx: mpsc::UnboundedSender<Resolution>,
    notifications: broadcast::Sender<SessionNotification>,
    snapshot: watch::Sender<SessionSnapshot>,
}

impl<P, R, S> SessionController<P, R, S>
where
    P: MediaPipeline + 'static,
    R: Resolver + 'static,
    S: SettingsStore + 'static,
{
    /// Probe the helper, wire the engine and spawn the controller task
    ///
    /// Must be called from within a tokio runtime.
    pub async fn start(
        pipeline: P,
        resolver: Arc<R>,
        settings: Arc<S>,
        config: SessionConfig,
    ) -> Result<SessionHandle> {
        let (engine, pipeline_messages) = PlaybackEngine::new(pipeline)?;

        let helper_available = if config.probe_helper {
            resolver.check_available().await
        } else {
            true
        };
        if helper_available {
            info!("Stream helper available; video links enabled");
        } else {
            warn!("Stream helper not found; video links disabled");
        }

        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (resolved_tx, resolved_rx) = mpsc::unbounded_channel();
        let (notifications, _) = broadcast::channel(config.notification_capacity.max(1));
        let (snapshot, snapshot_rx) = watch::channel(SessionSnapshot::initial(helper_available));

        let handle = SessionHandle::new(command_tx, notifications.clone(), snapshot_rx);

        let controller = Self {
            engine,
            resolver,
            settings,
            session: Session::new(),
            generation: 0,
            helper_available,
            resolved_tx,
            notifications,
            snapshot,
        };
        tokio::spawn(controller.run(command_rx, pipeline_messages, resolved_rx));

        Ok(handle)
    }

    async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<SessionCommand>,
        mut pipeline_messages: mpsc::UnboundedReceiver<PipelineMessage>,
        mut resolutions: mpsc::UnboundedReceiver<Resolution>,
    ) {
        debug!("Session controller running");

        loop {
            // Internal completions drain before the next user command
            tokio::select! {
                biased;

                Some(message) = pipeline_messages.recv() => self.handle_pipeline_message(message),
                Some(resolution) = resolutions.recv() => self.handle_resolution(resolution),
                command = commands.recv() => match command {
                    Some(SessionCommand::Activate(entry)) => self.activate(entry),
                    Some(SessionCommand::Deactivate) => self.deactivate(),
                    Some(SessionCommand::ResumeLast) => self.resume_last(),
                    Some(SessionCommand::Flush(ack)) => {
                        let _ = ack.send(());
                    }
                    Some(SessionCommand::Shutdown(ack)) => {
                        self.teardown();
                        let _ = ack.send(());
                        break;
                    }
                    None => {
                        debug!("All session handles dropped");
                        self.teardown();
                        break;
                    }
                },
            }

            self.publish();
        }

        debug!("Session controller stopped");
    }

    // ===== Commands =====

    fn activate(&mut self, entry: Entry) {
        if self
            .session
            .active_entry
            .as_ref()
            .is_some_and(|active| active.id == entry.id)
        {
            debug!("Entry {} is already active", entry.id);
            return;
        }

        if entry.source_kind.needs_resolution() && !self.helper_available {
            warn!("Cannot activate {}: stream helper unavailable", entry.name);
            self.notify(SessionNotification::ActivationFailed {
                entry,
                reason: FailureReason::HelperUnavailable,
            });
            return;
        }

        // Hard preemption of whatever was resolving or playing
        self.reset_session();

        self.generation += 1;
        let generation = self.generation;
        info!("Activating {} ({}) as activation {}", entry.name, entry.id, generation);

        let locator = entry.locator.clone();
        let needs_resolution = entry.source_kind.needs_resolution();
        self.session.active_entry = Some(entry);

        if needs_resolution {
            self.spawn_resolution(generation, locator);
            self.transition(SessionState::Resolving);
        } else {
            self.transition(SessionState::Playing);
            self.hand_to_engine(locator);
        }
    }

    fn deactivate(&mut self) {
        let previous = self.session.state;
        self.reset_session();
        self.transition(SessionState::Inactive);

        if previous != SessionState::Inactive {
            info!("Session stopped");
            self.notify(SessionNotification::Stopped);
        }
    }

    fn resume_last(&mut self) {
        let last_played = match self.settings.last_played() {
            Ok(Some(id)) => id,
            Ok(None) => {
                info!("Nothing to resume: no entry has been played yet");
                return;
            }
            Err(e) => {
                warn!("Failed to read last played entry: {}", e);
                return;
            }
        };

        match self.settings.entry(last_played) {
            Ok(Some(entry)) => self.activate(entry),
            Ok(None) => info!("Last played entry {} no longer exists", last_played),
            Err(e) => warn!("Failed to read entries: {}", e),
        }
    }

    fn teardown(&mut self) {
        let previous = self.session.state;
        self.reset_session();
        self.engine.destroy();
        self.transition(SessionState::Inactive);
        self.publish();

        if previous != SessionState::Inactive {
            self.notify(SessionNotification::Stopped);
        }
    }

    // ===== Resolution =====

    fn spawn_resolution(&mut self, generation: u64, locator: String) {
        let cancel = CancellationToken::new();
        let resolver = Arc::clone(&self.resolver);
        let resolved_tx = self.resolved_tx.clone();
        let task_cancel = cancel.clone();
        let task_locator = locator.clone();

        tokio::spawn(async move {
            let result = resolver.resolve(&task_locator, task_cancel).await;
            // The controller may already be gone
            let _ = resolved_tx.send(Resolution { generation, result });
        });

        debug!("Resolving {} for activation {}", locator, generation);
        self.session.pending_resolution = Some(ResolutionRequest {
            generation,
            locator,
            cancel,
        });
    }

    fn handle_resolution(&mut self, resolution: Resolution) {
        let is_current = self
            .session
            .pending_resolution
            .as_ref()
            .is_some_and(|pending| pending.generation == resolution.generation);

        if !is_current {
            debug!(
                "Dropping resolution for superseded activation {}",
                resolution.generation
            );
            return;
        }

        let Some(request) = self.session.pending_resolution.take() else {
            return;
        };

        match resolution.result {
            Ok(uri) => {
                debug!("Resolved {} to {}", request.locator, uri);
                self.hand_to_engine(uri);
            }
            Err(ResolveError::Cancelled) => {
                debug!("Resolution of {} cancelled", request.locator);
                self.clear_active();
                self.transition(SessionState::Inactive);
            }
            Err(ResolveError::Failed { stderr }) => {
                warn!("Could not resolve {}: {}", request.locator, stderr);
                let entry = self.clear_active();
                self.transition(SessionState::Inactive);
                if let Some(entry) = entry {
                    self.notify(SessionNotification::ActivationFailed {
                        entry,
                        reason: FailureReason::Resolution(stderr),
                    });
                }
            }
        }
    }

    // ===== Engine =====

    fn hand_to_engine(&mut self, uri: String) {
        match self.engine.set_uri(&uri) {
            Ok(()) => {
                self.session.playback_uri = Some(uri);
                self.session.awaiting_start = true;
            }
            Err(e) => self.fault(e.to_string()),
        }
    }

    fn handle_pipeline_message(&mut self, message: PipelineMessage) {
        match self.engine.handle_message(message) {
            Some(EngineEvent::UriChanged(uri)) => self.on_uri_changed(uri),
            Some(EngineEvent::Error(message)) => self.on_engine_error(message),
            None => {}
        }
    }

    fn on_uri_changed(&mut self, uri: String) {
        if !self.session.awaiting_start {
            debug!("Ignoring URI change to {}: nothing waiting to start", uri);
            return;
        }

        // Only the URI of the current activation may start playback
        if self.session.playback_uri.as_deref() != Some(uri.as_str()) {
            debug!("Ignoring stale URI change to {}", uri);
            return;
        }

        self.session.awaiting_start = false;
        if let Err(e) = self.engine.start() {
            self.fault(e.to_string());
            return;
        }

        self.transition(SessionState::Playing);
        if let Some(entry) = self.session.active_entry.clone() {
            info!("Playing {}", entry.name);
            if let Err(e) = self.settings.set_last_played(entry.id) {
                warn!("Failed to store last played entry {}: {}", entry.id, e);
            }
            self.notify(SessionNotification::Playing(entry));
        }
    }

    fn on_engine_error(&mut self, message: String) {
        if self.session.playback_uri.is_none() {
            debug!("Ignoring engine error with nothing handed to the engine: {}", message);
            return;
        }
        self.fault(message);
    }

    fn fault(&mut self, message: String) {
        warn!("Playback faulted: {}", message);
        // An engine that faulted itself has already stopped
        if self.engine.state() != EngineState::Faulted {
            self.engine.stop();
        }
        let entry = self.clear_active();
        self.transition(SessionState::Faulted);
        self.notify(SessionNotification::PlaybackFaulted { entry, message });
    }

    // ===== Helpers =====

    /// Cancel any pending resolution, stop the engine, forget the activation
    fn reset_session(&mut self) {
        if let Some(request) = self.session.pending_resolution.take() {
            debug!(
                "Cancelling resolution of {} (activation {})",
                request.locator, request.generation
            );
            request.cancel.cancel();
        }
        self.engine.stop();
        self.clear_active();
    }

    fn clear_active(&mut self) -> Option<Entry> {
        self.session.playback_uri = None;
        self.session.awaiting_start = false;
        self.session.active_entry.take()
    }

    fn transition(&mut self, state: SessionState) {
        if self.session.state != state {
            debug!("Session {:?} -> {:?}", self.session.state, state);
            self.session.state = state;
        }
    }

    fn notify(&self, notification: SessionNotification) {
        // Snapshot first so receivers observe the state the notification describes
        self.publish();
        // No subscribers is fine
        let _ = self.notifications.send(notification);
    }

    fn publish(&self) {
        let next = SessionSnapshot {
            state: self.session.state,
            active_entry: self.session.active_entry.clone(),
            playback_uri: self.session.playback_uri.clone(),
            engine_state: self.engine.state(),
            helper_available: self.helper_available,
        };
        self.snapshot.send_if_modified(|current| {
            if *current == next {
                false
            } else {
                *current = next;
                true
            }
        });
    }
}

impl<P, R, S> std::fmt::Debug for SessionController<P, R, S>
where
    P: MediaPipeline,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionController")
            .field("engine", &self.engine)
            .field("session", &self.session)
            .field("generation", &self.generation)
            .field("helper_available", &self.helper_available)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ambience_core::{MemorySettings, SourceKind};
    use ambience_engine::test_utils::ScriptedPipeline;
    use async_trait::async_trait;

    struct UnreachableResolver;

    #[async_trait]
    impl Resolver for UnreachableResolver {
        async fn resolve(
            &self,
            locator: &str,
            _cancel: CancellationToken,
        ) -> ambience_resolver::Result<String> {
            panic!("resolver called for {locator}");
        }

        async fn check_available(&self) -> bool {
            false
        }
    }

    #[tokio::test]
    async fn engine_state_is_mirrored_in_the_snapshot() {
        let (pipeline, _probe) = ScriptedPipeline::new();
        let rain = Entry::new(1, "Rain", SourceKind::LocalFile, "/tmp/rain.ogg");
        let handle = SessionController::start(
            pipeline,
            Arc::new(UnreachableResolver),
            Arc::new(MemorySettings::new(vec![rain.clone()])),
            SessionConfig::default(),
        )
        .await
        .unwrap();

        assert_eq!(handle.snapshot().engine_state, EngineState::Idle);
        assert!(!handle.snapshot().helper_available);

        handle.activate(rain).unwrap();
        handle.flush().await.unwrap();

        assert_eq!(handle.snapshot().engine_state, EngineState::Playing);
        handle.shutdown().await.unwrap();
        assert_eq!(handle.snapshot().engine_state, EngineState::Idle);
    }
}
