use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("An error occurred while communicating with Twitch: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Twitch API returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Invalid response from Twitch: {0}")]
    InvalidResponse(String),

    #[error("Missing app access token")]
    MissingAccessToken,
}
