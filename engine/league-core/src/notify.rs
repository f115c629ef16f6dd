//! User-facing notifications for league mutations

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Success,
    Error,
}

/// One message for the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub message: String,
    pub severity: Severity,
    pub duration: Duration,
}

/// Fire-and-forget sink for notifications
pub trait NotificationSink: Send + Sync {
    fn notify(&self, message: &str, severity: Severity, duration: Duration);
}

/// Writes notifications to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl NotificationSink for TracingNotifier {
    fn notify(&self, message: &str, severity: Severity, duration: Duration) {
        match severity {
            Severity::Success => tracing::info!(duration_ms = duration.as_millis() as u64, "{}", message),
            Severity::Error => tracing::warn!(duration_ms = duration.as_millis() as u64, "{}", message),
        }
    }
}

/// Forwards notifications to a UI consumer over an unbounded channel
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    sender: mpsc::UnboundedSender<Notification>,
}

impl ChannelNotifier {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Notification>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl NotificationSink for ChannelNotifier {
    fn notify(&self, message: &str, severity: Severity, duration: Duration) {
        let notification = Notification { message: message.to_string(), severity, duration };
        if self.sender.send(notification).is_err() {
            // Receiver gone; nobody is listening any more
            tracing::debug!("Dropped notification: {}", message);
        }
    }
}
