//! Test utilities for pipeline-driven code
//!
//! `ScriptedPipeline` records every call it receives and lets tests inject
//! pipeline messages through a `PipelineProbe` that stays valid after the
//! pipeline itself has been moved into an engine.

use crate::error::PipelineError;
use crate::pipeline::{MediaPipeline, MessageSink, PipelineMessage, SubscriptionId};
use std::sync::{Arc, Mutex, MutexGuard};

/// One call observed by a `ScriptedPipeline`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineCall {
    SetUri(String),
    Play,
    Halt,
    Subscribe,
    Unsubscribe,
}

#[derive(Debug, Default)]
struct Shared {
    calls: Vec<PipelineCall>,
    sink: Option<(SubscriptionId, MessageSink)>,
    next_subscription: u64,
    auto_uri_changed: bool,
    fail_play: bool,
}

/// Pipeline double recording calls
#[derive(Debug)]
pub struct ScriptedPipeline {
    shared: Arc<Mutex<Shared>>,
}

/// Test-side handle onto a `ScriptedPipeline`
#[derive(Debug, Clone)]
pub struct PipelineProbe {
    shared: Arc<Mutex<Shared>>,
}

fn lock(shared: &Mutex<Shared>) -> MutexGuard<'_, Shared> {
    shared.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl ScriptedPipeline {
    /// Pipeline that answers every `set_uri` with `UriChanged` immediately
    pub fn new() -> (Self, PipelineProbe) {
        Self::build(true)
    }

    /// Pipeline that only emits what the test injects
    pub fn manual() -> (Self, PipelineProbe) {
        Self::build(false)
    }

    fn build(auto_uri_changed: bool) -> (Self, PipelineProbe) {
        let shared = Arc::new(Mutex::new(Shared {
            auto_uri_changed,
            ..Shared::default()
        }));
        (
            Self {
                shared: Arc::clone(&shared),
            },
            PipelineProbe { shared },
        )
    }
}

impl MediaPipeline for ScriptedPipeline {
    fn set_uri(&mut self, uri: &str) -> Result<(), PipelineError> {
        let mut shared = lock(&self.shared);
        shared.calls.push(PipelineCall::SetUri(uri.to_string()));
        if shared.auto_uri_changed {
            if let Some((_, sink)) = &shared.sink {
                let _ = sink.send(PipelineMessage::UriChanged(uri.to_string()));
            }
        }
        Ok(())
    }

    fn play(&mut self) -> Result<(), PipelineError> {
        let mut shared = lock(&self.shared);
        shared.calls.push(PipelineCall::Play);
        if shared.fail_play {
            return Err(PipelineError::StateChange("scripted failure".to_string()));
        }
        Ok(())
    }

    fn halt(&mut self) -> Result<(), PipelineError> {
        lock(&self.shared).calls.push(PipelineCall::Halt);
        Ok(())
    }

    fn subscribe(&mut self, sink: MessageSink) -> Result<SubscriptionId, PipelineError> {
        let mut shared = lock(&self.shared);
        shared.calls.push(PipelineCall::Subscribe);
        shared.next_subscription += 1;
        let id = SubscriptionId::new(shared.next_subscription);
        shared.sink = Some((id, sink));
        Ok(id)
    }

    fn unsubscribe(&mut self, id: SubscriptionId) {
        let mut shared = lock(&self.shared);
        shared.calls.push(PipelineCall::Unsubscribe);
        if shared.sink.as_ref().is_some_and(|(current, _)| *current == id) {
            shared.sink = None;
        }
    }
}

impl PipelineProbe {
    /// Every call so far, in order
    pub fn calls(&self) -> Vec<PipelineCall> {
        lock(&self.shared).calls.clone()
    }

    /// URIs passed to `set_uri`, in order
    pub fn uris(&self) -> Vec<String> {
        lock(&self.shared)
            .calls
            .iter()
            .filter_map(|call| match call {
                PipelineCall::SetUri(uri) => Some(uri.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn play_count(&self) -> usize {
        lock(&self.shared)
            .calls
            .iter()
            .filter(|call| **call == PipelineCall::Play)
            .count()
    }

    pub fn is_subscribed(&self) -> bool {
        lock(&self.shared).sink.is_some()
    }

    /// Inject a message as if the pipeline produced it
    ///
    /// Returns false when nobody is subscribed.
    pub fn emit(&self, message: PipelineMessage) -> bool {
        match &lock(&self.shared).sink {
            Some((_, sink)) => sink.send(message).is_ok(),
            None => false,
        }
    }

    /// Make subsequent `play()` calls fail
    pub fn fail_play(&self, fail: bool) {
        lock(&self.shared).fail_play = fail;
    }

    pub fn clear_calls(&self) {
        lock(&self.shared).calls.clear();
    }
}
