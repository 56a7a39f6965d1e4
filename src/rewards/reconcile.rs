use std::sync::Arc;

use dashmap::DashMap;
use thiserror::Error;
use tokio::{sync::Mutex, task::JoinHandle};

use crate::twitch::{
    self,
    types::{Event, SubscriptionStatus},
    ChannelApi, Dispatch, DispatchError, Notification, NotificationHandler,
};

use super::RewardCatalog;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Could not fetch rewards of broadcaster {broadcaster_id}: {source}")]
    FetchRewards {
        broadcaster_id: String,
        source: twitch::Error,
    },

    #[error("Could not fetch the stream of broadcaster {broadcaster_id}: {source}")]
    FetchStream {
        broadcaster_id: String,
        source: twitch::Error,
    },
}

/// What caused a reconciliation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Trigger {
    /// The stream went live; the game has to be looked up.
    StreamOnline { broadcaster_id: String },
    GameChanged {
        broadcaster_id: String,
        game_id: String,
    },
}

#[derive(Debug)]
pub struct Creation {
    pub title: String,
    /// Id of the created reward.
    pub result: Result<String, twitch::Error>,
}

/// Creations still running in the background. Dropping it does not cancel them.
#[derive(Debug)]
pub struct CreationHandle(JoinHandle<Vec<Creation>>);

impl CreationHandle {
    pub async fn settled(self) -> Vec<Creation> {
        match self.0.await {
            Ok(creations) => creations,
            Err(e) => {
                log::error!("Reward creation task failed: {e}");
                Vec::new()
            }
        }
    }
}

#[derive(Debug)]
pub struct Reconciliation {
    pub game_id: String,
    pub deleted: Vec<String>,
    pub failed_deletes: Vec<String>,
    pub creations: CreationHandle,
}

impl Reconciliation {
    /// Waits for the creations to settle and logs a summary.
    pub async fn report(self) {
        let creations = self.creations.settled().await;
        let failed: Vec<&str> = creations
            .iter()
            .filter(|c| c.result.is_err())
            .map(|c| c.title.as_str())
            .collect();
        log::info!(
            "Rewards for game {} in place: {} deleted, {} failed to delete, {}/{} created",
            self.game_id,
            self.deleted.len(),
            self.failed_deletes.len(),
            creations.len() - failed.len(),
            creations.len()
        );
        if !failed.is_empty() {
            log::warn!("Rewards not created for game {}: {}", self.game_id, failed.join(", "));
        }
    }
}

/// Keeps a broadcaster's custom rewards in line with the game being played.
#[derive(Clone)]
pub struct RewardSync {
    api: Arc<dyn ChannelApi>,
    catalog: Arc<RewardCatalog>,
    locks: Arc<DashMap<String, Arc<Mutex<()>>>>,
}

impl RewardSync {
    pub fn new(api: Arc<dyn ChannelApi>, catalog: Arc<RewardCatalog>) -> Self {
        Self {
            api,
            catalog,
            locks: Arc::new(DashMap::new()),
        }
    }

    /// Resolves the game for `trigger` and reconciles. `Ok(None)` means the stream was already gone.
    pub async fn run(&self, trigger: Trigger) -> Result<Option<Reconciliation>, Error> {
        let (broadcaster_id, game_id) = match trigger {
            Trigger::GameChanged {
                broadcaster_id,
                game_id,
            } => (broadcaster_id, game_id),
            Trigger::StreamOnline { broadcaster_id } => {
                let stream = self
                    .api
                    .get_current_stream(&broadcaster_id)
                    .await
                    .map_err(|source| Error::FetchStream {
                        broadcaster_id: broadcaster_id.clone(),
                        source,
                    })?;

                let Some(stream) = stream else {
                    log::info!("Broadcaster {broadcaster_id} is no longer live, skipping");
                    return Ok(None);
                };
                (broadcaster_id, stream.game_id)
            }
        };

        self.reconcile(&broadcaster_id, &game_id).await.map(Some)
    }

    /// Deletes every reward the catalog manages, then queues creation of the rewards for `game_id`.
    ///
    /// Deletions are awaited; creations run in order on a background task whose
    /// outcome is available through [`Reconciliation::creations`]. Runs for the
    /// same broadcaster are serialized until their creations have settled.
    pub async fn reconcile(
        &self,
        broadcaster_id: &str,
        game_id: &str,
    ) -> Result<Reconciliation, Error> {
        let guard = self.lock_for(broadcaster_id).lock_owned().await;

        let current = self
            .api
            .get_custom_rewards(broadcaster_id)
            .await
            .map_err(|source| Error::FetchRewards {
                broadcaster_id: broadcaster_id.to_string(),
                source,
            })?;

        let mut deleted = Vec::new();
        let mut failed_deletes = Vec::new();
        for reward in current.iter().filter(|r| self.catalog.manages(&r.title)) {
            match self
                .api
                .delete_custom_reward(broadcaster_id, &reward.id)
                .await
            {
                Ok(()) => {
                    log::info!("Deleted reward \"{}\" ({})", reward.title, reward.id);
                    deleted.push(reward.title.clone());
                }
                Err(e) => {
                    log::error!("Could not delete reward \"{}\": {e}", reward.title);
                    failed_deletes.push(reward.title.clone());
                }
            }
        }

        if !self.catalog.contains_game(game_id) {
            log::info!("No rewards configured for game {game_id}");
        }
        let specs = self.catalog.rewards_for(game_id).to_vec();

        let api = self.api.clone();
        let broadcaster = broadcaster_id.to_string();
        let handle = tokio::spawn(async move {
            let _guard = guard;
            let mut creations = Vec::with_capacity(specs.len());
            for spec in specs {
                let result = api.create_custom_reward(&broadcaster, &spec).await;
                match &result {
                    Ok(reward) => log::info!("Created reward \"{}\" ({})", spec.title, reward.id),
                    Err(e) => log::error!("Could not create reward \"{}\": {e}", spec.title),
                }
                creations.push(Creation {
                    title: spec.title,
                    result: result.map(|reward| reward.id),
                });
            }
            creations
        });

        Ok(Reconciliation {
            game_id: game_id.to_string(),
            deleted,
            failed_deletes,
            creations: CreationHandle(handle),
        })
    }

    fn lock_for(&self, broadcaster_id: &str) -> Arc<Mutex<()>> {
        self.locks
            .entry(broadcaster_id.to_string())
            .or_default()
            .clone()
    }
}

impl NotificationHandler for RewardSync {
    fn dispatch(&self, notification: Notification) -> Result<Dispatch, DispatchError> {
        let subscription = &notification.subscription;
        if subscription.status != SubscriptionStatus::Enabled {
            return Ok(Dispatch::Ignored(format!(
                "subscription {} is {}",
                subscription.id,
                subscription.status
            )));
        }

        let trigger = match notification.event()? {
            Event::StreamOnline(event) => Trigger::StreamOnline {
                broadcaster_id: event.broadcaster_user_id,
            },
            Event::ChannelUpdate(event) => Trigger::GameChanged {
                broadcaster_id: event.broadcaster_user_id,
                game_id: event.category_id,
            },
            Event::Unsupported(kind) => {
                return Ok(Dispatch::Ignored(format!("unsupported type {kind}")));
            }
        };

        log::debug!("Dispatching {trigger:?}");
        let sync = self.clone();
        tokio::spawn(async move {
            match sync.run(trigger).await {
                Ok(Some(reconciliation)) => reconciliation.report().await,
                Ok(None) => {}
                Err(e) => log::error!("Reward reconciliation aborted: {e}"),
            }
        });

        Ok(Dispatch::Accepted)
    }
}
