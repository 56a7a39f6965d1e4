use std::{collections::HashMap, fmt};

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const STREAM_ONLINE: &str = "stream.online";
pub const CHANNEL_UPDATE: &str = "channel.update";

/// Body of every webhook delivery: verification challenges, notifications and revocations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub subscription: Subscription,
    #[serde(default)]
    pub challenge: Option<String>,
    #[serde(default)]
    pub event: Option<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subscription {
    pub id: String,
    pub status: SubscriptionStatus,
    #[serde(rename = "type")]
    pub kind: String,
    pub version: String,
    #[serde(default)]
    pub cost: i64,
    #[serde(default)]
    pub condition: HashMap<String, Value>,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SubscriptionStatus {
    Enabled,
    VerificationPending,
    VerificationFailed,
    NotificationFailuresExceeded,
    AuthorizationRevoked,
    UserRemoved,
    VersionRemoved,
    Other(String),
}

impl From<String> for SubscriptionStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "enabled" => Self::Enabled,
            "webhook_callback_verification_pending" => Self::VerificationPending,
            "webhook_callback_verification_failed" => Self::VerificationFailed,
            "notification_failures_exceeded" => Self::NotificationFailuresExceeded,
            "authorization_revoked" => Self::AuthorizationRevoked,
            "user_removed" => Self::UserRemoved,
            "version_removed" => Self::VersionRemoved,
            _ => Self::Other(s),
        }
    }
}

impl From<SubscriptionStatus> for String {
    fn from(status: SubscriptionStatus) -> Self {
        match status {
            SubscriptionStatus::Enabled => "enabled".to_string(),
            SubscriptionStatus::VerificationPending => {
                "webhook_callback_verification_pending".to_string()
            }
            SubscriptionStatus::VerificationFailed => {
                "webhook_callback_verification_failed".to_string()
            }
            SubscriptionStatus::NotificationFailuresExceeded => {
                "notification_failures_exceeded".to_string()
            }
            SubscriptionStatus::AuthorizationRevoked => "authorization_revoked".to_string(),
            SubscriptionStatus::UserRemoved => "user_removed".to_string(),
            SubscriptionStatus::VersionRemoved => "version_removed".to_string(),
            SubscriptionStatus::Other(s) => s,
        }
    }
}

impl fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from(self.clone()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamOnlineEvent {
    #[serde(default)]
    pub id: String,
    pub broadcaster_user_id: String,
    #[serde(default)]
    pub broadcaster_user_login: String,
    #[serde(default)]
    pub broadcaster_user_name: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub started_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelUpdateEvent {
    pub broadcaster_user_id: String,
    #[serde(default)]
    pub broadcaster_user_login: String,
    #[serde(default)]
    pub broadcaster_user_name: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub language: String,
    #[serde(default)]
    pub category_id: String,
    #[serde(default)]
    pub category_name: String,
}

/// Decoded `event` payload for the subscription types this service acts on.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    StreamOnline(StreamOnlineEvent),
    ChannelUpdate(ChannelUpdateEvent),
    Unsupported(String),
}

impl Notification {
    pub fn event(&self) -> Result<Event, serde_json::Error> {
        let kind = self.subscription.kind.as_str();
        if kind != STREAM_ONLINE && kind != CHANNEL_UPDATE {
            return Ok(Event::Unsupported(kind.to_string()));
        }

        let payload = self.event.clone().unwrap_or(Value::Null);
        match kind {
            STREAM_ONLINE => serde_json::from_value(payload).map(Event::StreamOnline),
            _ => serde_json::from_value(payload).map(Event::ChannelUpdate),
        }
    }
}
