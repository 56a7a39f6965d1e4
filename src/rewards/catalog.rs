use std::collections::{HashMap, HashSet};

use crate::{
    config::{GameConfig, RewardConfig},
    twitch::{self, ChannelApi},
};

/// A reward this service wants to exist while a given game is being played.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewardSpec {
    pub id: String,
    pub title: String,
    pub prompt: String,
    pub cost: u32,
    pub skip_request_queue: bool,
    pub user_input_required: bool,
}

impl From<&RewardConfig> for RewardSpec {
    fn from(config: &RewardConfig) -> Self {
        RewardSpec {
            id: config.id.clone().unwrap_or_else(|| config.title.clone()),
            title: config.title.clone(),
            prompt: config.prompt.clone(),
            cost: config.cost,
            skip_request_queue: config.skip_request_queue,
            user_input_required: config.user_input_required,
        }
    }
}

/// Desired rewards keyed by Twitch game id. Built once at startup, read-only afterwards.
#[derive(Debug, Default)]
pub struct RewardCatalog {
    games: HashMap<String, Vec<RewardSpec>>,
    managed_titles: HashSet<String>,
}

impl RewardCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, game_id: &str, spec: RewardSpec) {
        self.managed_titles.insert(spec.title.to_lowercase());
        self.games.entry(game_id.to_string()).or_default().push(spec);
    }

    /// Rewards for `game_id` in configuration order; empty for unknown games.
    pub fn rewards_for(&self, game_id: &str) -> &[RewardSpec] {
        self.games.get(game_id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains_game(&self, game_id: &str) -> bool {
        self.games.contains_key(game_id)
    }

    /// Whether a reward titled `title` belongs to any game in the catalog, ignoring case.
    pub fn manages(&self, title: &str) -> bool {
        self.managed_titles.contains(&title.to_lowercase())
    }

    pub fn game_count(&self) -> usize {
        self.games.len()
    }

    /// Resolves each configured game name to its Twitch id and collects its rewards.
    ///
    /// Names Twitch does not know are logged and skipped.
    pub async fn build(api: &dyn ChannelApi, games: &[GameConfig]) -> Result<Self, twitch::Error> {
        let mut catalog = Self::new();

        for game in games {
            let Some(found) = api.get_game_by_name(&game.name).await? else {
                log::warn!("Game {} not found.", game.name);
                continue;
            };

            for reward in &game.rewards {
                catalog.insert(&found.id, RewardSpec::from(reward));
            }

            log::info!(
                "Loaded {} channel point rewards for game {} (ID: {})",
                catalog.rewards_for(&found.id).len(),
                game.name,
                found.id
            );
        }

        Ok(catalog)
    }
}

#[cfg(test)]
mod tests {
    use crate::twitch::fake::{Call, FakeChannel};

    use super::*;

    fn reward(title: &str, cost: u32) -> RewardConfig {
        RewardConfig {
            id: None,
            title: title.to_string(),
            prompt: String::new(),
            cost,
            skip_request_queue: false,
            user_input_required: false,
        }
    }

    fn spec(title: &str, cost: u32) -> RewardSpec {
        RewardSpec::from(&reward(title, cost))
    }

    #[test]
    fn test_manages_ignores_case_across_games() {
        let mut catalog = RewardCatalog::new();
        catalog.insert("g1", spec("Easy Mode", 100));
        catalog.insert("g2", spec("Hard Mode", 500));

        assert!(catalog.manages("easy mode"));
        assert!(catalog.manages("HARD MODE"));
        assert!(!catalog.manages("Old Reward"));
    }

    #[test]
    fn test_rewards_keep_insertion_order() {
        let mut catalog = RewardCatalog::new();
        catalog.insert("g1", spec("R1", 1));
        catalog.insert("g1", spec("R2", 2));
        catalog.insert("g1", spec("R1", 3));

        let titles: Vec<_> = catalog
            .rewards_for("g1")
            .iter()
            .map(|s| (s.title.as_str(), s.cost))
            .collect();
        assert_eq!(titles, vec![("R1", 1), ("R2", 2), ("R1", 3)]);
        assert!(catalog.rewards_for("nope").is_empty());
        assert!(!catalog.contains_game("nope"));
    }

    #[test]
    fn test_spec_id_defaults_to_title() {
        let mut config = reward("Assist Mode", 10);
        assert_eq!(RewardSpec::from(&config).id, "Assist Mode");

        config.id = Some("assist".to_string());
        assert_eq!(RewardSpec::from(&config).id, "assist");
    }

    #[tokio::test]
    async fn test_build_skips_unknown_games() {
        let api = FakeChannel::default();
        api.add_game("504461", "Celeste");

        let games = vec![
            GameConfig {
                name: "Celeste".to_string(),
                rewards: vec![reward("Assist Mode", 500), reward("Pick a level", 1000)],
            },
            GameConfig {
                name: "Not A Real Game".to_string(),
                rewards: vec![reward("Ghost", 1)],
            },
        ];

        let catalog = RewardCatalog::build(&api, &games).await.unwrap();
        assert_eq!(catalog.game_count(), 1);
        assert_eq!(catalog.rewards_for("504461").len(), 2);
        assert!(!catalog.manages("Ghost"));
        assert_eq!(
            api.calls(),
            vec![
                Call::Game("Celeste".to_string()),
                Call::Game("Not A Real Game".to_string())
            ]
        );
    }
}
