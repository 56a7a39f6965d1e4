use axum::{
    body::Bytes,
    extract::Extension,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};

use crate::twitch::{
    verify::{
        SignedMessage, VerifyError, MESSAGE_ID_HEADER, MESSAGE_SIGNATURE_HEADER,
        MESSAGE_TIMESTAMP_HEADER, MESSAGE_TYPE_HEADER,
    },
    Dispatch, Notification,
};

use super::{error::Error, State};

const REVOCATION: &str = "revocation";

fn header<'a>(headers: &'a HeaderMap, name: &'static str) -> Result<&'a str, VerifyError> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .ok_or(VerifyError::MissingHeader(name))
}

pub async fn callback(
    Extension(state): Extension<State>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, Error> {
    let message = SignedMessage {
        message_id: header(&headers, MESSAGE_ID_HEADER)?,
        timestamp: header(&headers, MESSAGE_TIMESTAMP_HEADER)?,
        signature: header(&headers, MESSAGE_SIGNATURE_HEADER)?,
        body: &body,
    };
    state.verifier.verify(&message)?;

    let notification: Notification = serde_json::from_slice(&body)?;
    let subscription = &notification.subscription;

    if let Some(challenge) = &notification.challenge {
        log::info!(
            "Answering verification challenge for {} subscription {}",
            subscription.kind,
            subscription.id
        );
        return Ok(challenge.clone().into_response());
    }

    if header(&headers, MESSAGE_TYPE_HEADER).ok() == Some(REVOCATION) {
        log::warn!(
            "Subscription {} ({}) was revoked: {}",
            subscription.id,
            subscription.kind,
            subscription.status
        );
        return Ok(StatusCode::OK.into_response());
    }

    match state.handler.dispatch(notification)? {
        Dispatch::Accepted => log::debug!("Notification {} accepted", message.message_id),
        Dispatch::Ignored(reason) => {
            log::debug!("Notification {} ignored: {reason}", message.message_id)
        }
    }

    Ok(StatusCode::OK.into_response())
}
