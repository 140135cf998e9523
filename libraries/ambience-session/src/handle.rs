//! Cloneable front door to the controller task

use crate::error::{Result, SessionError};
use crate::types::{SessionNotification, SessionSnapshot};
use ambience_core::Entry;
use tokio::sync::{broadcast, mpsc, oneshot, watch};

/// Commands processed by the controller task
#[derive(Debug)]
pub(crate) enum SessionCommand {
    Activate(Entry),
    Deactivate,
    ResumeLast,
    Flush(oneshot::Sender<()>),
    Shutdown(oneshot::Sender<()>),
}

/// Handle to a running session controller
///
/// All mutation goes through the controller task; handles only enqueue
/// commands and read the published snapshot.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    commands: mpsc::UnboundedSender<SessionCommand>,
    notifications: broadcast::Sender<SessionNotification>,
    snapshot: watch::Receiver<SessionSnapshot>,
}

impl SessionHandle {
    pub(crate) fn new(
        commands: mpsc::UnboundedSender<SessionCommand>,
        notifications: broadcast::Sender<SessionNotification>,
        snapshot: watch::Receiver<SessionSnapshot>,
    ) -> Self {
        Self {
            commands,
            notifications,
            snapshot,
        }
    }

    /// Make `entry` the active, playing entry
    ///
    /// Re-activating the active entry is a no-op. Activating another entry
    /// preempts whatever is resolving or playing.
    pub fn activate(&self, entry: Entry) -> Result<()> {
        self.send(SessionCommand::Activate(entry))
    }

    /// Stop playback and clear the active entry
    pub fn deactivate(&self) -> Result<()> {
        self.send(SessionCommand::Deactivate)
    }

    /// Activate the last played entry from settings, if it still exists
    pub fn resume_last(&self) -> Result<()> {
        self.send(SessionCommand::ResumeLast)
    }

    /// Wait until every command sent before this call has been processed
    pub async fn flush(&self) -> Result<()> {
        let (ack, done) = oneshot::channel();
        self.send(SessionCommand::Flush(ack))?;
        done.await.map_err(|_| SessionError::Closed)
    }

    /// Tear the controller down and wait for it to finish
    ///
    /// Pending resolutions are cancelled and the engine is destroyed.
    pub async fn shutdown(&self) -> Result<()> {
        let (ack, done) = oneshot::channel();
        self.send(SessionCommand::Shutdown(ack))?;
        done.await.map_err(|_| SessionError::Closed)
    }

    /// Subscribe to controller notifications
    pub fn subscribe(&self) -> broadcast::Receiver<SessionNotification> {
        self.notifications.subscribe()
    }

    /// Current session snapshot
    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshot.borrow().clone()
    }

    /// Whether `entry` may be offered for activation
    pub fn is_selectable(&self, entry: &Entry) -> bool {
        self.snapshot.borrow().is_selectable(entry)
    }

    pub fn is_running(&self) -> bool {
        !self.commands.is_closed()
    }

    fn send(&self, command: SessionCommand) -> Result<()> {
        self.commands.send(command).map_err(|_| SessionError::Closed)
    }
}
