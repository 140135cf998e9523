//! Native media pipeline abstraction

use crate::error::PipelineError;
use tokio::sync::mpsc;

/// Asynchronous notifications from a pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineMessage {
    /// The pipeline switched to a new target URI
    UriChanged(String),

    /// The current stream ended
    EndOfStream,

    /// Playback or decoding failed
    Error(String),
}

/// Channel a pipeline delivers its messages to
pub type MessageSink = mpsc::UnboundedSender<PipelineMessage>;

/// Opaque handle to one message subscription
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

/// A single-stream audio pipeline
///
/// Implementations may deliver messages from any thread; the engine only
/// ever reads them on its owner's task.
pub trait MediaPipeline: Send {
    /// Replace the target URI
    ///
    /// Takes effect asynchronously; completion is signalled with
    /// `PipelineMessage::UriChanged`.
    fn set_uri(&mut self, uri: &str) -> Result<(), PipelineError>;

    /// Begin rendering the current URI
    fn play(&mut self) -> Result<(), PipelineError>;

    /// Stop rendering and release stream resources, keeping the pipeline
    fn halt(&mut self) -> Result<(), PipelineError>;

    /// Start delivering messages to `sink`
    fn subscribe(&mut self, sink: MessageSink) -> Result<SubscriptionId, PipelineError>;

    /// Stop delivering messages for `id`
    fn unsubscribe(&mut self, id: SubscriptionId);
}
