mod error;
mod webhook;

use std::sync::Arc;

use axum::{extract::Extension, routing::post, Router};
use tokio::net::TcpListener;

use crate::twitch::{verify::Verifier, NotificationHandler};

pub const CALLBACK_PATH: &str = "/webhooks/callback";

#[derive(Clone)]
pub struct State {
    verifier: Arc<Verifier>,
    handler: Arc<dyn NotificationHandler>,
}

impl State {
    pub fn new(verifier: Verifier, handler: Arc<dyn NotificationHandler>) -> Self {
        Self {
            verifier: Arc::new(verifier),
            handler,
        }
    }
}

pub fn router(state: State) -> Router {
    Router::new()
        .route(CALLBACK_PATH, post(webhook::callback))
        .layer(Extension(state))
}

pub async fn start(listener: TcpListener, state: State) -> anyhow::Result<()> {
    log::info!("Listening on: {}", listener.local_addr()?);
    axum::serve(listener, router(state)).await?;
    Ok(())
}
