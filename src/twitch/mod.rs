mod client;
mod error;
mod events;
#[cfg(test)]
pub mod fake;
pub mod types;
pub mod verify;

pub use client::{ChannelApi, Client, SubscriptionOutcome};
pub use error::Error;
pub use events::{Dispatch, DispatchError, NotificationHandler};
pub use types::{Notification, CHANNEL_UPDATE, STREAM_ONLINE};
