use serde::{Deserialize, Serialize};

use crate::rewards::RewardSpec;

use super::{
    CooldownSetting, Image, RedemptionPerStreamLimitSetting, RedemptionPerUserStreamLimitSetting,
};

/// A custom channel points reward as reported by Helix.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Reward {
    #[serde(default)]
    pub broadcaster_id: String,
    #[serde(default)]
    pub broadcaster_login: String,
    #[serde(default)]
    pub broadcaster_name: String,
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub prompt: String,
    #[serde(default)]
    pub cost: i64,
    pub image: Option<Image>,
    #[serde(default)]
    pub default_image: Option<Image>,
    #[serde(default)]
    pub background_color: String,
    #[serde(default)]
    pub is_enabled: bool,
    #[serde(default)]
    pub is_user_input_required: bool,
    #[serde(default)]
    pub max_per_stream_setting: RedemptionPerStreamLimitSetting,
    #[serde(default)]
    pub max_per_user_per_stream_setting: RedemptionPerUserStreamLimitSetting,
    #[serde(default)]
    pub global_cooldown_setting: CooldownSetting,
    #[serde(default)]
    pub is_paused: bool,
    #[serde(default)]
    pub is_in_stock: bool,
    #[serde(default)]
    pub should_redemptions_skip_request_queue: bool,
    pub redemptions_redeemed_current_stream: Option<i64>,
    pub cooldown_expires_at: Option<String>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct RewardsResponse {
    pub data: Vec<Reward>,
}

/// Request body for `POST /channel_points/custom_rewards`.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct NewReward<'a> {
    pub title: &'a str,
    pub cost: u32,
    #[serde(skip_serializing_if = "str::is_empty")]
    pub prompt: &'a str,
    pub is_enabled: bool,
    pub is_user_input_required: bool,
    pub should_redemptions_skip_request_queue: bool,
}

impl<'a> From<&'a RewardSpec> for NewReward<'a> {
    fn from(spec: &'a RewardSpec) -> Self {
        NewReward {
            title: &spec.title,
            cost: spec.cost,
            prompt: &spec.prompt,
            is_enabled: true,
            is_user_input_required: spec.user_input_required,
            should_redemptions_skip_request_queue: spec.skip_request_queue,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_reward_list() {
        let json = r##"{
            "data": [{
                "broadcaster_name": "torpedo09",
                "broadcaster_login": "torpedo09",
                "broadcaster_id": "274637212",
                "id": "92af127c-7326-4483-a52b-b0da0be61c01",
                "image": null,
                "background_color": "#00E5CB",
                "is_enabled": true,
                "cost": 50000,
                "title": "game analysis",
                "prompt": "",
                "is_user_input_required": false,
                "max_per_stream_setting": { "is_enabled": false, "max_per_stream": 0 },
                "max_per_user_per_stream_setting": { "is_enabled": false, "max_per_user_per_stream": 0 },
                "global_cooldown_setting": { "is_enabled": false, "global_cooldown_seconds": 0 },
                "is_paused": false,
                "is_in_stock": true,
                "default_image": {
                    "url_1x": "https://static-cdn.jtvnw.net/custom-reward-images/default-1.png",
                    "url_2x": "https://static-cdn.jtvnw.net/custom-reward-images/default-2.png",
                    "url_4x": "https://static-cdn.jtvnw.net/custom-reward-images/default-4.png"
                },
                "should_redemptions_skip_request_queue": false,
                "redemptions_redeemed_current_stream": null,
                "cooldown_expires_at": null
            }]
        }"##;

        let response: RewardsResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.data.len(), 1);
        let reward = &response.data[0];
        assert_eq!(reward.title, "game analysis");
        assert_eq!(reward.cost, 50000);
        assert!(reward.image.is_none());
        assert!(reward.is_in_stock);
    }

    #[test]
    fn test_new_reward_from_spec() {
        let spec = RewardSpec {
            id: "hard".to_string(),
            title: "Hard Mode".to_string(),
            prompt: String::new(),
            cost: 500,
            skip_request_queue: true,
            user_input_required: false,
        };

        let body = serde_json::to_value(NewReward::from(&spec)).unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "title": "Hard Mode",
                "cost": 500,
                "is_enabled": true,
                "is_user_input_required": false,
                "should_redemptions_skip_request_queue": true,
            })
        );
    }
}
