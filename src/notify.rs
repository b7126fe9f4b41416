//! User-visible failure notices.
//!
//! The store reports each failed action exactly once through a
//! [`Notifier`]. Presentation (toasts, stderr, ...) belongs to the caller.

use tokio::sync::mpsc;

use crate::profile::Operation;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub operation: Operation,
    pub message: String,
}

impl Notice {
    pub fn failure(operation: Operation) -> Self {
        Self {
            operation,
            message: operation.failure_notice().to_string(),
        }
    }
}

/// Sink for notices. Must not block.
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);
}

/// Forwards notices over an unbounded channel.
#[derive(Clone)]
pub struct ChannelNotifier {
    sender: mpsc::UnboundedSender<Notice>,
}

impl Notifier for ChannelNotifier {
    fn notify(&self, notice: Notice) {
        // Nobody listening is fine: notices are fire-and-forget.
        let _ = self.sender.send(notice);
    }
}

pub fn notice_channel() -> (ChannelNotifier, mpsc::UnboundedReceiver<Notice>) {
    let (sender, receiver) = mpsc::unbounded_channel();
    (ChannelNotifier { sender }, receiver)
}
