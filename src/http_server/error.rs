use axum::response::IntoResponse;
use thiserror::Error;

use crate::twitch::{verify::VerifyError, DispatchError};

#[derive(Error, Debug)]
pub enum Error {
    #[error("Rejected notification: {0}")]
    Verification(#[from] VerifyError),

    #[error("Malformed notification: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Could not dispatch notification: {0}")]
    Dispatch(#[from] DispatchError),
}

impl IntoResponse for Error {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            Error::Verification(_) => axum::http::StatusCode::FORBIDDEN,
            Error::Malformed(_) => axum::http::StatusCode::INTERNAL_SERVER_ERROR,
            Error::Dispatch(_) => axum::http::StatusCode::INTERNAL_SERVER_ERROR,
        };

        log::warn!("{self}");
        (status, self.to_string()).into_response()
    }
}
