//! Core types for the session controller

use ambience_core::{Entry, SourceKind};
use ambience_engine::EngineState;
use serde::{Deserialize, Serialize};

/// Session state as seen by the UI layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    /// No active entry
    Inactive,

    /// Waiting on the resolver (or on the engine) for a video link
    Resolving,

    /// Engine active for the current entry
    Playing,

    /// Last activation failed during playback; shown as "off"
    Faulted,
}

/// Why an activation did not reach playback
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureReason {
    /// The external helper is not installed
    HelperUnavailable,

    /// The helper ran but produced no usable URI
    Resolution(String),
}

/// Notifications for the UI collaborator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionNotification {
    /// Activation ended before playback started
    ActivationFailed {
        /// The entry that was being activated
        entry: Entry,
        /// What went wrong
        reason: FailureReason,
    },

    /// Playback of the active entry failed and was stopped
    PlaybackFaulted {
        /// The entry that was playing, if still known
        entry: Option<Entry>,
        /// Pipeline error text
        message: String,
    },

    /// Playback of `entry` has started
    Playing(Entry),

    /// The session was switched off
    Stopped,
}

/// Point-in-time view of the session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub state: SessionState,
    pub active_entry: Option<Entry>,
    pub playback_uri: Option<String>,
    /// Mirror of the engine's own state
    pub engine_state: EngineState,
    /// Result of the helper availability probe made at start
    pub helper_available: bool,
}

impl SessionSnapshot {
    pub(crate) fn initial(helper_available: bool) -> Self {
        Self {
            state: SessionState::Inactive,
            active_entry: None,
            playback_uri: None,
            engine_state: EngineState::Idle,
            helper_available,
        }
    }

    /// Whether `entry` may be offered for activation
    pub fn is_selectable(&self, entry: &Entry) -> bool {
        entry.source_kind != SourceKind::VideoLink || self.helper_available
    }

    /// Whether `entry` is the active entry
    pub fn is_active(&self, entry: &Entry) -> bool {
        self.active_entry.as_ref().is_some_and(|active| active.id == entry.id)
    }
}

/// Configuration for the session controller
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Notification buffer per subscriber (default: 64)
    pub notification_capacity: usize,

    /// Probe the helper at start; when false it is assumed present (default: true)
    pub probe_helper: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            notification_capacity: 64,
            probe_helper: true,
        }
    }
}
