//! # Notifications
//!
//! Short-lived toast messages reporting the outcome of provider operations.
//!
//! ## Key Types
//! - [`Toast`]: a single message with its kind and display duration
//! - [`Notifier`]: sink the providers report into
//! - [`ToastChannel`]: broadcast sink for UIs with several listeners
//! - [`LogNotifier`]: sink that writes toasts to the log (used by the CLI)

use std::time::Duration;

use tokio::sync::broadcast;
use tracing::{debug, info, warn};

/// How long a short toast stays on screen
pub const SHORT_TOAST_DURATION: Duration = Duration::from_secs(3);

const CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Toast {
    pub kind: ToastKind,
    pub message: String,
    pub duration: Duration,
}

impl Toast {
    pub fn short_success(message: impl Into<String>) -> Self {
        Self {
            kind: ToastKind::Success,
            message: message.into(),
            duration: SHORT_TOAST_DURATION,
        }
    }

    pub fn short_error(message: impl Into<String>) -> Self {
        Self {
            kind: ToastKind::Error,
            message: message.into(),
            duration: SHORT_TOAST_DURATION,
        }
    }

    pub fn is_error(&self) -> bool {
        self.kind == ToastKind::Error
    }
}

/// Destination for user-facing notifications
pub trait Notifier: Send + Sync {
    fn notify(&self, toast: Toast);
}

/// Fans toasts out to every subscriber
#[derive(Clone)]
pub struct ToastChannel {
    sender: broadcast::Sender<Toast>,
}

impl ToastChannel {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Toast> {
        self.sender.subscribe()
    }
}

impl Default for ToastChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl Notifier for ToastChannel {
    fn notify(&self, toast: Toast) {
        // Nobody listening is fine, the toast is simply dropped
        if self.sender.send(toast).is_err() {
            debug!("Toast dropped, no subscribers");
        }
    }
}

/// Writes toasts through `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, toast: Toast) {
        match toast.kind {
            ToastKind::Success => info!(target: "toast", "✅ {}", toast.message),
            ToastKind::Error => warn!(target: "toast", "❌ {}", toast.message),
        }
    }
}
