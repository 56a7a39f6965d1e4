//! In-memory [`ChannelApi`] used by tests.

use std::{
    collections::{HashMap, HashSet},
    sync::Mutex,
};

use async_trait::async_trait;

use crate::rewards::RewardSpec;

use super::{
    types::{Game, Reward, Stream},
    ChannelApi, Error,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    List(String),
    Create(String, String),
    Delete(String, String),
    Game(String),
    Stream(String),
}

#[derive(Default)]
struct State {
    rewards: Vec<Reward>,
    games: HashMap<String, Game>,
    streams: HashMap<String, Stream>,
    calls: Vec<Call>,
    fail_list: bool,
    fail_stream: bool,
    fail_delete: HashSet<String>,
    fail_create: HashSet<String>,
    next_id: u64,
}

#[derive(Default)]
pub struct FakeChannel {
    state: Mutex<State>,
}

fn api_error(message: &str) -> Error {
    Error::Api {
        status: 500,
        message: message.to_string(),
    }
}

impl FakeChannel {
    pub fn with_rewards(titles: &[&str]) -> Self {
        let fake = Self::default();
        for title in titles {
            fake.add_reward(title);
        }
        fake
    }

    pub fn add_reward(&self, title: &str) {
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let id = format!("reward-{}", state.next_id);
        state.rewards.push(Reward {
            id,
            title: title.to_string(),
            ..Default::default()
        });
    }

    pub fn add_game(&self, id: &str, name: &str) {
        self.state.lock().unwrap().games.insert(
            name.to_string(),
            Game {
                id: id.to_string(),
                name: name.to_string(),
                box_art_url: String::new(),
                igdb_id: String::new(),
            },
        );
    }

    pub fn set_stream(&self, broadcaster_id: &str, game_id: &str) {
        self.state.lock().unwrap().streams.insert(
            broadcaster_id.to_string(),
            Stream {
                id: "stream-1".to_string(),
                user_id: broadcaster_id.to_string(),
                user_login: String::new(),
                user_name: String::new(),
                game_id: game_id.to_string(),
                game_name: String::new(),
                kind: "live".to_string(),
                title: String::new(),
                viewer_count: 0,
                started_at: None,
            },
        );
    }

    pub fn fail_list(&self) {
        self.state.lock().unwrap().fail_list = true;
    }

    pub fn fail_stream(&self) {
        self.state.lock().unwrap().fail_stream = true;
    }

    pub fn fail_delete(&self, title: &str) {
        self.state
            .lock()
            .unwrap()
            .fail_delete
            .insert(title.to_string());
    }

    pub fn fail_create(&self, title: &str) {
        self.state
            .lock()
            .unwrap()
            .fail_create
            .insert(title.to_string());
    }

    /// Titles currently registered, in creation order.
    pub fn titles(&self) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .rewards
            .iter()
            .map(|r| r.title.clone())
            .collect()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn created_titles(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Create(_, title) => Some(title),
                _ => None,
            })
            .collect()
    }

    pub fn deleted_titles(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Delete(_, title) => Some(title),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl ChannelApi for FakeChannel {
    async fn get_custom_rewards(&self, broadcaster_id: &str) -> Result<Vec<Reward>, Error> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::List(broadcaster_id.to_string()));
        if state.fail_list {
            return Err(api_error("list failed"));
        }
        Ok(state.rewards.clone())
    }

    async fn create_custom_reward(
        &self,
        broadcaster_id: &str,
        spec: &RewardSpec,
    ) -> Result<Reward, Error> {
        let mut state = self.state.lock().unwrap();
        state
            .calls
            .push(Call::Create(broadcaster_id.to_string(), spec.title.clone()));
        if state.fail_create.contains(&spec.title) {
            return Err(api_error("create failed"));
        }

        state.next_id += 1;
        let reward = Reward {
            id: format!("reward-{}", state.next_id),
            title: spec.title.clone(),
            prompt: spec.prompt.clone(),
            cost: spec.cost.into(),
            ..Default::default()
        };
        state.rewards.push(reward.clone());
        Ok(reward)
    }

    async fn delete_custom_reward(
        &self,
        broadcaster_id: &str,
        reward_id: &str,
    ) -> Result<(), Error> {
        let mut state = self.state.lock().unwrap();
        let title = state
            .rewards
            .iter()
            .find(|r| r.id == reward_id)
            .map(|r| r.title.clone())
            .unwrap_or_default();
        state
            .calls
            .push(Call::Delete(broadcaster_id.to_string(), title.clone()));
        if state.fail_delete.contains(&title) {
            return Err(api_error("delete failed"));
        }

        state.rewards.retain(|r| r.id != reward_id);
        Ok(())
    }

    async fn get_game_by_name(&self, name: &str) -> Result<Option<Game>, Error> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Game(name.to_string()));
        Ok(state.games.get(name).cloned())
    }

    async fn get_current_stream(&self, broadcaster_id: &str) -> Result<Option<Stream>, Error> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Stream(broadcaster_id.to_string()));
        if state.fail_stream {
            return Err(api_error("stream lookup failed"));
        }
        Ok(state.streams.get(broadcaster_id).cloned())
    }
}
