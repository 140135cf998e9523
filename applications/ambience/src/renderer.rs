//! Terminal rendering of session notifications
//!
//! The renderer is the UI side of the session: it subscribes to controller
//! notifications and never calls back into the controller.

use ambience_core::Entry;
use ambience_session::{FailureReason, SessionNotification, SessionSnapshot};
use std::io::{self, Write};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Something that presents session notifications to the user
pub trait Renderer: Send {
    fn render(&mut self, notification: &SessionNotification) -> io::Result<()>;
}

/// Line-oriented renderer over any writer
pub struct TerminalRenderer<W> {
    out: W,
}

impl<W: Write> TerminalRenderer<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write + Send> Renderer for TerminalRenderer<W> {
    fn render(&mut self, notification: &SessionNotification) -> io::Result<()> {
        writeln!(self.out, "{}", describe(notification))?;
        self.out.flush()
    }
}

/// One-line description of a notification
pub fn describe(notification: &SessionNotification) -> String {
    match notification {
        SessionNotification::Playing(entry) => format!("playing: {}", entry.name),
        SessionNotification::Stopped => "stopped".to_string(),
        SessionNotification::ActivationFailed {
            entry,
            reason: FailureReason::HelperUnavailable,
        } => format!(
            "cannot play {}: stream helper is not installed",
            entry.name
        ),
        SessionNotification::ActivationFailed {
            entry,
            reason: FailureReason::Resolution(stderr),
        } => format!("could not resolve {}: {}", entry.name, stderr),
        SessionNotification::PlaybackFaulted {
            entry: Some(entry),
            message,
        } => format!("playback of {} failed: {}", entry.name, message),
        SessionNotification::PlaybackFaulted {
            entry: None,
            message,
        } => format!("playback failed: {}", message),
    }
}

/// Entry menu lines
///
/// The active entry is marked with `*`; video links are flagged when the
/// helper is missing.
pub fn format_entries(entries: &[Entry], snapshot: &SessionSnapshot) -> Vec<String> {
    entries
        .iter()
        .map(|entry| {
            let marker = if snapshot.is_active(entry) { '*' } else { ' ' };
            let suffix = if snapshot.is_selectable(entry) {
                ""
            } else {
                "  (unavailable)"
            };
            format!("{} {:>3}  {}{}", marker, entry.id.get(), entry.name, suffix)
        })
        .collect()
}

/// Drive `renderer` from `notifications` until the controller goes away
pub fn spawn_renderer<R>(
    mut notifications: broadcast::Receiver<SessionNotification>,
    mut renderer: R,
) -> JoinHandle<R>
where
    R: Renderer + 'static,
{
    tokio::spawn(async move {
        loop {
            match notifications.recv().await {
                Ok(notification) => {
                    if let Err(e) = renderer.render(&notification) {
                        warn!("Failed to render notification: {}", e);
                    }
                }
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    warn!("Renderer fell behind; {} notifications dropped", missed);
                }
                Err(broadcast::error::RecvError::Closed) => {
                    debug!("Notification channel closed");
                    break;
                }
            }
        }
        renderer
    })
}
