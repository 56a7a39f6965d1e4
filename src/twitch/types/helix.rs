use serde::{Deserialize, Serialize};

/// Envelope used by most Helix list endpoints.
#[derive(Serialize, Deserialize, Debug)]
pub struct DataResponse<T> {
    pub data: Vec<T>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Game {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub box_art_url: String,
    #[serde(default)]
    pub igdb_id: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Stream {
    pub id: String,
    pub user_id: String,
    #[serde(default)]
    pub user_login: String,
    #[serde(default)]
    pub user_name: String,
    pub game_id: String,
    #[serde(default)]
    pub game_name: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub viewer_count: u64,
    #[serde(default)]
    pub started_at: Option<String>,
}

/// Error body Helix returns alongside non-success statuses.
#[derive(Deserialize, Debug)]
pub struct ErrorResponse {
    #[serde(default)]
    pub error: String,
    #[serde(default)]
    pub message: String,
}

#[derive(Deserialize, Debug)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub expires_in: u64,
}

#[derive(Serialize, Debug)]
pub struct SubscriptionRequest<'a> {
    #[serde(rename = "type")]
    pub kind: &'a str,
    pub version: &'a str,
    pub condition: SubscriptionCondition<'a>,
    pub transport: WebhookTransport<'a>,
}

#[derive(Serialize, Debug)]
pub struct SubscriptionCondition<'a> {
    pub broadcaster_user_id: &'a str,
}

#[derive(Serialize, Debug)]
pub struct WebhookTransport<'a> {
    pub method: &'static str,
    pub callback: &'a str,
    pub secret: &'a str,
}
