//! Value objects - Immutable objects defined by their attributes

mod boss_template;
mod element;
mod ids;
mod quest_config;
mod settings;

pub use boss_template::{
    BossTemplate, FALLBACK_BOSS_ATK, FALLBACK_BOSS_DEF, FALLBACK_BOSS_ELEMENT, FALLBACK_BOSS_HP,
    FALLBACK_BOSS_TIER,
};
pub use element::Element;
pub use ids::*;
pub use quest_config::{AreaConfig, BossConfig, ConfigError, QuestConfig, QuestRewards};
pub use settings::GameSettings;
