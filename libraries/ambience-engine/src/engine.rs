//! Playback engine - single looping stream
//!
//! Wraps one `MediaPipeline` and exposes start/stop/set-uri. The engine is
//! driven entirely by its owner: pipeline messages arrive on the receiver
//! returned from `PlaybackEngine::new` and must be fed back through
//! `handle_message` on the owner's task.

use crate::{
    error::{EngineError, Result},
    pipeline::{MediaPipeline, PipelineMessage, SubscriptionId},
};
use tokio::sync::mpsc;
use tracing::{debug, error, warn};

/// Engine state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    /// Nothing rendering
    Idle,

    /// Rendering the current URI
    Playing,

    /// Stopped after a pipeline error
    Faulted,
}

/// Events surfaced to the engine's owner
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// A URI set by the owner has taken effect
    UriChanged(String),

    /// Playback failed; the engine has already stopped itself
    Error(String),
}

/// Looping playback engine
pub struct PlaybackEngine<P: MediaPipeline> {
    pipeline: P,
    state: EngineState,
    current_uri: Option<String>,

    /// End-of-stream restart in flight; the next matching `UriChanged` is ours
    restarting: bool,

    subscription: Option<SubscriptionId>,
    destroyed: bool,
}

impl<P: MediaPipeline> PlaybackEngine<P> {
    /// Create an engine around `pipeline` and subscribe to its messages
    ///
    /// # Returns
    /// * `Ok((engine, messages))` - messages must be passed to `handle_message`
    /// * `Err(_)` - the pipeline refused the subscription
    pub fn new(mut pipeline: P) -> Result<(Self, mpsc::UnboundedReceiver<PipelineMessage>)> {
        let (sink, messages) = mpsc::unbounded_channel();
        let subscription = pipeline.subscribe(sink)?;

        Ok((
            Self {
                pipeline,
                state: EngineState::Idle,
                current_uri: None,
                restarting: false,
                subscription: Some(subscription),
                destroyed: false,
            },
            messages,
        ))
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn current_uri(&self) -> Option<&str> {
        self.current_uri.as_deref()
    }

    /// Begin rendering the current URI
    ///
    /// Valid from `Idle` and `Faulted`; calling it while `Playing` re-asserts
    /// the playing state.
    pub fn start(&mut self) -> Result<()> {
        if self.destroyed {
            return Err(EngineError::Destroyed);
        }
        if self.current_uri.is_none() {
            return Err(EngineError::NoUriSet);
        }

        self.pipeline.play()?;
        self.state = EngineState::Playing;
        debug!("Engine playing {:?}", self.current_uri);
        Ok(())
    }

    /// Stop rendering; the pipeline stays alive for reuse
    pub fn stop(&mut self) {
        if let Err(e) = self.pipeline.halt() {
            warn!("Pipeline refused to halt: {}", e);
        }
        self.restarting = false;
        self.state = EngineState::Idle;
    }

    /// Replace the target URI
    ///
    /// The switch is asynchronous; wait for `EngineEvent::UriChanged` before
    /// calling `start()`.
    pub fn set_uri(&mut self, uri: &str) -> Result<()> {
        if self.destroyed {
            return Err(EngineError::Destroyed);
        }

        self.pipeline.set_uri(uri)?;
        self.current_uri = Some(uri.to_string());
        self.restarting = false;
        Ok(())
    }

    /// Process one pipeline message
    ///
    /// End-of-stream is handled here by re-issuing the current URI; the
    /// resulting `UriChanged` is consumed internally and playback resumes.
    pub fn handle_message(&mut self, message: PipelineMessage) -> Option<EngineEvent> {
        if self.destroyed {
            return None;
        }

        match message {
            PipelineMessage::UriChanged(uri) => {
                if self.restarting && self.current_uri.as_deref() == Some(uri.as_str()) {
                    self.restarting = false;
                    if self.state == EngineState::Playing {
                        debug!("Looping {}", uri);
                        if let Err(e) = self.pipeline.play() {
                            return Some(self.fault(e.to_string()));
                        }
                    }
                    return None;
                }
                Some(EngineEvent::UriChanged(uri))
            }

            PipelineMessage::EndOfStream => {
                let uri = self.current_uri.clone()?;
                if self.state != EngineState::Playing {
                    debug!("Ignoring end-of-stream while {:?}", self.state);
                    return None;
                }

                if let Err(e) = self.pipeline.halt() {
                    warn!("Pipeline refused to halt for loop restart: {}", e);
                }
                match self.pipeline.set_uri(&uri) {
                    Ok(()) => {
                        self.restarting = true;
                        None
                    }
                    Err(e) => Some(self.fault(e.to_string())),
                }
            }

            PipelineMessage::Error(message) => Some(self.fault(message)),
        }
    }

    /// Stop playback and release the message subscription
    ///
    /// Safe to call more than once.
    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }

        self.stop();
        if let Some(id) = self.subscription.take() {
            self.pipeline.unsubscribe(id);
        }
        self.destroyed = true;
        debug!("Engine destroyed");
    }

    fn fault(&mut self, message: String) -> EngineEvent {
        error!("Playback error: {}", message);
        self.stop();
        self.state = EngineState::Faulted;
        EngineEvent::Error(message)
    }
}

impl<P: MediaPipeline> Drop for PlaybackEngine<P> {
    fn drop(&mut self) {
        self.destroy();
    }
}

impl<P: MediaPipeline> std::fmt::Debug for PlaybackEngine<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackEngine")
            .field("state", &self.state)
            .field("current_uri", &self.current_uri)
            .field("restarting", &self.restarting)
            .field("destroyed", &self.destroyed)
            .finish_non_exhaustive()
    }
}
