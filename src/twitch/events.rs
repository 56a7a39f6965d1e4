use thiserror::Error;

use super::types::Notification;

/// What the receiver should make of a verified notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    /// Work was handed off to the background.
    Accepted,
    Ignored(String),
}

#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("Malformed event payload: {0}")]
    Payload(#[from] serde_json::Error),
}

/// Consumer of verified EventSub notifications.
///
/// Called synchronously from the webhook handler, so implementations must
/// return without waiting on network I/O.
pub trait NotificationHandler: Send + Sync {
    fn dispatch(&self, notification: Notification) -> Result<Dispatch, DispatchError>;
}
