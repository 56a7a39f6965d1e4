use serde::{Deserialize, Serialize};

mod eventsub;
mod helix;
mod reward;

pub use eventsub::*;
pub use helix::*;
pub use reward::*;

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Image {
    pub url_1x: Option<String>,
    pub url_2x: Option<String>,
    pub url_4x: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct CooldownSetting {
    pub is_enabled: bool,
    pub global_cooldown_seconds: i64,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct RedemptionPerStreamLimitSetting {
    pub is_enabled: bool,
    pub max_per_stream: Option<i64>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct RedemptionPerUserStreamLimitSetting {
    pub is_enabled: bool,
    pub max_per_user_per_stream: Option<i64>,
}
