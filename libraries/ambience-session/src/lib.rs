//! Ambience - Playback Session Controller
//!
//! Owns "which entry is active", sequences resolution and playback, and
//! reports what happened to the UI layer.
//!
//! # Architecture
//!
//! The controller is a single tokio task (an actor) that exclusively owns the
//! session state and the [`PlaybackEngine`](ambience_engine::PlaybackEngine).
//! Three sources feed it, all drained on that one task:
//! - commands from any number of [`SessionHandle`] clones
//! - pipeline messages from the engine's subscription
//! - resolution completions from spawned resolver calls
//!
//! Every activation gets a fresh generation number. Resolution results and
//! URI-changed notifications belonging to an older generation are dropped,
//! so a superseded activation can never touch the engine.
//!
//! # Example
//!
//! ```rust,ignore
//! use ambience_session::{SessionConfig, SessionController, SessionNotification};
//!
//! let handle = SessionController::start(pipeline, resolver, settings, SessionConfig::default()).await?;
//! let mut notifications = handle.subscribe();
//!
//! handle.activate(entry)?;
//! if let Ok(SessionNotification::Playing(entry)) = notifications.recv().await {
//!     println!("now playing {}", entry.name);
//! }
//!
//! handle.shutdown().await?;
//! ```

mod controller;
mod error;
mod handle;
pub mod types;

pub use controller::SessionController;
pub use error::{Result, SessionError};
pub use handle::SessionHandle;
pub use types::{FailureReason, SessionConfig, SessionNotification, SessionSnapshot, SessionState};
