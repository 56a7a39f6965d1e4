mod config;
mod http_server;
mod rewards;
mod tunnel;
mod twitch;

use std::sync::Arc;

use anyhow::Context;
use env_logger::Env;
use tokio::{net::TcpListener, task::JoinHandle};

use crate::{
    config::Config,
    http_server::{State, CALLBACK_PATH},
    rewards::{RewardCatalog, RewardSync},
    twitch::{verify::Verifier, Client, SubscriptionOutcome, CHANNEL_UPDATE, STREAM_ONLINE},
};

const SUBSCRIPTIONS: &[(&str, &str)] = &[(STREAM_ONLINE, "1"), (CHANNEL_UPDATE, "2")];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    let env = Env::default().filter_or("LOG_LEVEL", "game_rewards=debug");
    env_logger::init_from_env(env);

    let config_path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.yml".to_string());
    log::debug!("Loading configuration from {config_path}...");
    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load configuration file {config_path}"))?;

    let client = Client::from_config(&config)?;

    log::debug!("Init reward catalog...");
    let catalog = RewardCatalog::build(&client, &config.games).await?;
    log::info!("Reward catalog covers {} games", catalog.game_count());
    let sync = RewardSync::new(Arc::new(client.clone()), Arc::new(catalog));

    log::debug!("Init HTTP server...");
    let state = State::new(Verifier::new(config.webhook_secret()), Arc::new(sync));
    let http_join_handle = init_http_server(config.port, state).await?;

    log::debug!("Init EventSub subscriptions...");
    if let Err(e) = init_subscriptions(&config, client).await {
        log::error!("Could not subscribe to EventSub: {e:#}");
    }

    http_join_handle.await??;

    Ok(())
}

async fn init_http_server(
    port: u16,
    state: State,
) -> anyhow::Result<JoinHandle<anyhow::Result<()>>> {
    let address = format!("0.0.0.0:{port}");
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("Could not listen on {address}"))?;

    Ok(tokio::spawn(http_server::start(listener, state)))
}

async fn callback_url(config: &Config) -> anyhow::Result<String> {
    let base = if config.use_ngrok {
        log::info!(
            "Reading the public URL from the ngrok agent at {}; it must already be running (ngrok http {})",
            config.ngrok_api_url,
            config.port
        );
        tunnel::public_url(&config.ngrok_api_url).await?
    } else {
        config
            .callback_url
            .as_deref()
            .unwrap_or_default()
            .trim_end_matches('/')
            .to_string()
    };

    Ok(format!("{base}{CALLBACK_PATH}"))
}

async fn init_subscriptions(config: &Config, client: Client) -> anyhow::Result<()> {
    let callback = callback_url(config).await?;
    log::info!("Using EventSub callback {callback}");

    let client = client.with_access_token().await?;
    for (kind, version) in SUBSCRIPTIONS {
        let outcome = client
            .create_eventsub_subscription(
                kind,
                version,
                &config.broadcaster_id,
                &callback,
                config.webhook_secret(),
            )
            .await;

        match outcome {
            Ok(SubscriptionOutcome::Created) => log::info!("Subscribed to {kind}"),
            Ok(SubscriptionOutcome::AlreadyExists) => log::info!("Already subscribed to {kind}"),
            Err(e) => log::error!("Could not subscribe to {kind}: {e}"),
        }
    }

    Ok(())
}
