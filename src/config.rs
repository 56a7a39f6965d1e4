use std::{env, fs, path::Path};

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer};
use thiserror::Error;

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_NGROK_API_URL: &str = "http://127.0.0.1:4040";

#[derive(Error, Debug)]
pub enum Error {
    #[error("Could not read configuration file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("Invalid configuration file: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    pub app_id: String,
    pub app_secret: String,
    pub broadcaster_id: String,
    pub oauth_token: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub use_ngrok: bool,
    #[serde(default)]
    pub callback_url: Option<String>,
    #[serde(default = "default_ngrok_api_url")]
    pub ngrok_api_url: String,
    #[serde(default)]
    pub webhook_secret: Option<String>,
    #[serde(default, deserialize_with = "games")]
    pub games: Vec<GameConfig>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct GameConfig {
    pub name: String,
    #[serde(default, deserialize_with = "rewards")]
    pub rewards: Vec<RewardConfig>,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RewardConfig {
    /// Set from the mapping key when rewards are written as a keyed section.
    #[serde(default)]
    pub id: Option<String>,
    pub title: String,
    #[serde(default)]
    pub prompt: String,
    pub cost: u32,
    #[serde(default)]
    pub skip_request_queue: bool,
    #[serde(default)]
    pub user_input_required: bool,
}

/// A section written either as a keyed mapping or as a list. Mapping order is kept.
#[derive(Deserialize)]
#[serde(untagged)]
enum Section<T> {
    Keyed(IndexMap<String, T>),
    Listed(Vec<T>),
}

fn games<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<GameConfig>, D::Error> {
    Ok(match Section::<GameConfig>::deserialize(deserializer)? {
        Section::Keyed(games) => games.into_values().collect(),
        Section::Listed(games) => games,
    })
}

fn rewards<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<RewardConfig>, D::Error> {
    Ok(match Section::<RewardConfig>::deserialize(deserializer)? {
        Section::Keyed(rewards) => rewards
            .into_iter()
            .map(|(key, mut reward)| {
                reward.id = Some(key);
                reward
            })
            .collect(),
        Section::Listed(rewards) => rewards,
    })
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_ngrok_api_url() -> String {
    DEFAULT_NGROK_API_URL.to_string()
}

impl Config {
    /// Reads the YAML file at `path`, applies environment overrides and validates the result.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.display().to_string(),
            source,
        })?;

        let mut config = Self::from_yaml(&raw)?;
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml(raw: &str) -> Result<Self, Error> {
        Ok(serde_yaml::from_str(raw)?)
    }

    fn apply_env_overrides(&mut self) -> Result<(), Error> {
        if let Ok(client_id) = env::var("TWITCH_CLIENT_ID") {
            self.app_id = client_id;
        }
        if let Ok(secret) = env::var("TWITCH_SECRET") {
            self.app_secret = secret;
        }
        if let Ok(token) = env::var("TWITCH_TOKEN") {
            self.oauth_token = token;
        }
        if let Ok(broadcaster_id) = env::var("TWITCH_BROADCASTER_ID") {
            self.broadcaster_id = broadcaster_id;
        }
        if let Ok(port) = env::var("PORT") {
            self.port = port
                .parse()
                .map_err(|_| Error::Invalid(format!("PORT is not a valid port: {port}")))?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), Error> {
        for (name, value) in [
            ("appId", &self.app_id),
            ("appSecret", &self.app_secret),
            ("broadcasterId", &self.broadcaster_id),
            ("oauthToken", &self.oauth_token),
        ] {
            if value.trim().is_empty() {
                return Err(Error::Invalid(format!("{name} must not be empty")));
            }
        }

        if !self.use_ngrok && self.callback_url.as_deref().unwrap_or("").is_empty() {
            return Err(Error::Invalid(
                "callbackUrl is required when useNgrok is false".to_string(),
            ));
        }

        // EventSub rejects secrets outside this range.
        let secret_len = self.webhook_secret().len();
        if !(10..=100).contains(&secret_len) {
            return Err(Error::Invalid(format!(
                "webhook secret must be between 10 and 100 characters, got {secret_len}"
            )));
        }

        for game in &self.games {
            if game.name.trim().is_empty() {
                return Err(Error::Invalid("game name must not be empty".to_string()));
            }
            for reward in &game.rewards {
                if reward.title.trim().is_empty() {
                    return Err(Error::Invalid(format!(
                        "reward title must not be empty (game {})",
                        game.name
                    )));
                }
            }
        }

        Ok(())
    }

    /// Secret shared with EventSub for signing notifications.
    pub fn webhook_secret(&self) -> &str {
        self.webhook_secret.as_deref().unwrap_or(&self.app_secret)
    }
}
