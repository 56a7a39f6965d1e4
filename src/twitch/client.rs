use std::time::Duration;

use async_trait::async_trait;
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;

use crate::{config::Config, rewards::RewardSpec};

use super::{
    types::{
        DataResponse, ErrorResponse, Game, NewReward, Reward, RewardsResponse, Stream,
        SubscriptionCondition, SubscriptionRequest, TokenResponse, WebhookTransport,
    },
    Error,
};

pub const HELIX_URL: &str = "https://api.twitch.tv/helix";
pub const OAUTH_URL: &str = "https://id.twitch.tv/oauth2";

/// Upper bound for a single Helix or OAuth request. Reconciliation holds the
/// broadcaster lock across create calls, so none of them may hang.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// The Helix operations reward reconciliation depends on.
#[async_trait]
pub trait ChannelApi: Send + Sync {
    /// Every custom reward on the channel, including ones this application did not create.
    async fn get_custom_rewards(&self, broadcaster_id: &str) -> Result<Vec<Reward>, Error>;

    async fn create_custom_reward(
        &self,
        broadcaster_id: &str,
        spec: &RewardSpec,
    ) -> Result<Reward, Error>;

    async fn delete_custom_reward(&self, broadcaster_id: &str, reward_id: &str)
        -> Result<(), Error>;

    async fn get_game_by_name(&self, name: &str) -> Result<Option<Game>, Error>;

    /// The broadcaster's live stream, or `None` when offline.
    async fn get_current_stream(&self, broadcaster_id: &str) -> Result<Option<Stream>, Error>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionOutcome {
    Created,
    AlreadyExists,
}

#[derive(Debug, Clone)]
pub struct Client {
    http: reqwest::Client,
    helix_url: String,
    oauth_url: String,
    client_id: String,
    secret: String,
    token: String,

    access_token: Option<String>,
}

impl Client {
    pub fn new(client_id: String, secret: String, token: String) -> Result<Self, Error> {
        Self::with_timeout(client_id, secret, token, REQUEST_TIMEOUT)
    }

    pub fn with_timeout(
        client_id: String,
        secret: String,
        token: String,
        timeout: Duration,
    ) -> Result<Self, Error> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            helix_url: HELIX_URL.to_string(),
            oauth_url: OAUTH_URL.to_string(),
            client_id,
            secret,
            token,
            access_token: None,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, Error> {
        Self::new(
            config.app_id.clone(),
            config.app_secret.clone(),
            config.oauth_token.clone(),
        )
    }

    #[cfg(test)]
    pub fn with_base_urls(mut self, helix_url: &str, oauth_url: &str) -> Self {
        self.helix_url = helix_url.trim_end_matches('/').to_string();
        self.oauth_url = oauth_url.trim_end_matches('/').to_string();
        self
    }

    pub async fn with_access_token(mut self) -> Result<Self, Error> {
        self.access_token = Some(self.get_app_access_token().await?);
        Ok(self)
    }

    /// Client-credentials grant; EventSub webhook subscriptions require an app token.
    pub async fn get_app_access_token(&self) -> Result<String, Error> {
        let response = self
            .http
            .post(format!("{}/token", self.oauth_url))
            .form(&[
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.secret.as_str()),
                ("grant_type", "client_credentials"),
            ])
            .send()
            .await?;

        let response: TokenResponse = check(response).await?.json().await?;
        log::trace!("app access token expires in {}s", response.expires_in);

        Ok(response.access_token)
    }

    fn user_request(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header("Client-ID", &self.client_id)
            .header("Authorization", format!("Bearer {}", self.token))
    }

    async fn helix_get<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        query: &[(&str, &str)],
    ) -> Result<T, Error> {
        let url = format!("{}/{}", self.helix_url, endpoint);
        let response = self
            .user_request(self.http.get(&url).query(query))
            .send()
            .await?;

        Ok(check(response).await?.json().await?)
    }

    pub async fn create_eventsub_subscription(
        &self,
        kind: &str,
        version: &str,
        broadcaster_id: &str,
        callback: &str,
        secret: &str,
    ) -> Result<SubscriptionOutcome, Error> {
        let access_token = self
            .access_token
            .as_ref()
            .ok_or(Error::MissingAccessToken)?;

        let req = SubscriptionRequest {
            kind,
            version,
            condition: SubscriptionCondition {
                broadcaster_user_id: broadcaster_id,
            },
            transport: WebhookTransport {
                method: "webhook",
                callback,
                secret,
            },
        };

        let response = self
            .http
            .post(format!("{}/eventsub/subscriptions", self.helix_url))
            .header("Client-ID", &self.client_id)
            .header("Authorization", format!("Bearer {access_token}"))
            .json(&req)
            .send()
            .await?;

        if response.status() == StatusCode::CONFLICT {
            return Ok(SubscriptionOutcome::AlreadyExists);
        }

        check(response).await?;
        Ok(SubscriptionOutcome::Created)
    }
}

#[async_trait]
impl ChannelApi for Client {
    async fn get_custom_rewards(&self, broadcaster_id: &str) -> Result<Vec<Reward>, Error> {
        let response: RewardsResponse = self
            .helix_get(
                "channel_points/custom_rewards",
                &[
                    ("broadcaster_id", broadcaster_id),
                    ("only_manageable_rewards", "false"),
                ],
            )
            .await?;

        Ok(response.data)
    }

    async fn create_custom_reward(
        &self,
        broadcaster_id: &str,
        spec: &RewardSpec,
    ) -> Result<Reward, Error> {
        let url = format!("{}/channel_points/custom_rewards", self.helix_url);
        let response = self
            .user_request(
                self.http
                    .post(&url)
                    .query(&[("broadcaster_id", broadcaster_id)])
                    .json(&NewReward::from(spec)),
            )
            .send()
            .await?;

        let response: RewardsResponse = check(response).await?.json().await?;
        response.data.into_iter().next().ok_or_else(|| {
            Error::InvalidResponse(format!("no reward returned for \"{}\"", spec.title))
        })
    }

    async fn delete_custom_reward(
        &self,
        broadcaster_id: &str,
        reward_id: &str,
    ) -> Result<(), Error> {
        let url = format!("{}/channel_points/custom_rewards", self.helix_url);
        let response = self
            .user_request(
                self.http
                    .delete(&url)
                    .query(&[("broadcaster_id", broadcaster_id), ("id", reward_id)]),
            )
            .send()
            .await?;

        check(response).await?;
        Ok(())
    }

    async fn get_game_by_name(&self, name: &str) -> Result<Option<Game>, Error> {
        let response: DataResponse<Game> = self.helix_get("games", &[("name", name)]).await?;
        Ok(response.data.into_iter().next())
    }

    async fn get_current_stream(&self, broadcaster_id: &str) -> Result<Option<Stream>, Error> {
        let response: DataResponse<Stream> = self
            .helix_get("streams", &[("user_id", broadcaster_id), ("first", "1")])
            .await?;
        Ok(response.data.into_iter().next())
    }
}

/// Turns a non-success response into [`Error::Api`], keeping Twitch's message when present.
async fn check(response: Response) -> Result<Response, Error> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = match serde_json::from_str::<ErrorResponse>(&body) {
        Ok(err) if !err.message.is_empty() => err.message,
        Ok(err) if !err.error.is_empty() => err.error,
        _ => body,
    };

    Err(Error::Api {
        status: status.as_u16(),
        message,
    })
}
