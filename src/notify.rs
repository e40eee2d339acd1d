//! User-facing notifications for task outcomes.
//!
//! Fire-and-forget: the orchestrator never waits on or fails because of a
//! notifier. A UI host takes a `ChannelNotifier` receiver; the CLI logs.

use tokio::sync::mpsc;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub description: String,
    pub is_error: bool,
}

impl Notification {
    #[must_use]
    pub fn info(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self { title: title.into(), description: description.into(), is_error: false }
    }

    #[must_use]
    pub fn error(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self { title: title.into(), description: description.into(), is_error: true }
    }
}

pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Writes notifications to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notification: Notification) {
        if notification.is_error {
            warn!(title = %notification.title, description = %notification.description, "notification");
        } else {
            info!(title = %notification.title, description = %notification.description, "notification");
        }
    }
}

/// Forwards notifications to a bounded queue. Drops them when the queue is
/// full or its receiver is gone.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    tx: mpsc::Sender<Notification>,
}

impl ChannelNotifier {
    #[must_use]
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<Notification>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, rx)
    }
}

impl Notifier for ChannelNotifier {
    fn notify(&self, notification: Notification) {
        match self.tx.try_send(notification) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(n)) => {
                warn!(title = %n.title, "notification queue full; dropping notification");
            }
            Err(mpsc::error::TrySendError::Closed(n)) => {
                warn!(title = %n.title, "notification queue closed; dropping notification");
            }
        }
    }
}

#[cfg(test)]
#[path = "notify_test.rs"]
mod tests;
