//! Ambience - Playback Engine
//!
//! Owns a single audio pipeline and keeps one stream playing in a loop.
//!
//! # Architecture
//!
//! - [`MediaPipeline`] abstracts the native pipeline (GStreamer `playbin3`
//!   behind the `gstreamer` feature)
//! - Pipelines report asynchronously through [`PipelineMessage`]s sent to a
//!   subscribed channel; URI switches are only known to have happened once
//!   `UriChanged` arrives
//! - [`PlaybackEngine`] turns those messages into [`EngineEvent`]s for its
//!   owner, restarting the stream on end-of-stream without surfacing it
//!
//! # Example
//!
//! ```rust,ignore
//! use ambience_engine::{EngineEvent, PlaybackEngine};
//!
//! let (mut engine, mut messages) = PlaybackEngine::new(pipeline)?;
//! engine.set_uri("file:///tmp/rain.ogg")?;
//!
//! while let Some(message) = messages.recv().await {
//!     match engine.handle_message(message) {
//!         Some(EngineEvent::UriChanged(_)) => engine.start()?,
//!         Some(EngineEvent::Error(e)) => break,
//!         None => {}
//!     }
//! }
//! engine.destroy();
//! ```

mod engine;
mod error;
mod pipeline;

#[cfg(feature = "gstreamer")]
mod gst_pipeline;

#[cfg(feature = "test-utils")]
pub mod test_utils;

pub use engine::{EngineEvent, EngineState, PlaybackEngine};
pub use error::{EngineError, PipelineError, Result};
pub use pipeline::{MediaPipeline, MessageSink, PipelineMessage, SubscriptionId};

#[cfg(feature = "gstreamer")]
pub use gst_pipeline::GstPipeline;
