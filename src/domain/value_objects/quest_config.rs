//! Typed quest, boss and area configuration
//!
//! Game content arrives as JSON from the content pipeline. Every optional
//! field carries a serde default and the whole structure is validated once
//! with `validate()` when content is loaded, so domain code can read fields
//! directly without re-checking them.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::Element;

/// Configuration errors surfaced at content load time
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("Quest {quest_id}: {reason}")]
    InvalidQuest { quest_id: String, reason: String },

    #[error("Area {area_id}: {reason}")]
    InvalidArea { area_id: String, reason: String },

    #[error("Setting {key}: {reason}")]
    InvalidSetting { key: String, reason: String },
}

impl ConfigError {
    pub fn invalid_setting(key: &str, reason: &str) -> Self {
        Self::InvalidSetting {
            key: key.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Base rewards granted by a quest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestRewards {
    #[serde(default = "default_reward_jijies")]
    pub jijies: i64,
    #[serde(default = "default_reward_xp")]
    pub xp: i64,
}

impl Default for QuestRewards {
    fn default() -> Self {
        Self {
            jijies: default_reward_jijies(),
            xp: default_reward_xp(),
        }
    }
}

/// Boss section of a boss quest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BossConfig {
    /// Candidate species names, one is picked uniformly per encounter
    #[serde(default)]
    pub possible_esprits: Vec<String>,
    /// Falls back to `GameSettings::default_boss_hp_multiplier` when absent
    #[serde(default)]
    pub hp_multiplier: Option<f64>,
    #[serde(default = "default_jijies_multiplier")]
    pub bonus_jijies_multiplier: f64,
    #[serde(default = "default_xp_multiplier")]
    pub bonus_xp_multiplier: f64,
    #[serde(default)]
    pub guaranteed_items: BTreeMap<String, u32>,
    #[serde(default = "default_rare_drop_chance")]
    pub rare_drop_chance: f64,
    #[serde(default)]
    pub background: Option<String>,
}

impl Default for BossConfig {
    fn default() -> Self {
        Self {
            possible_esprits: Vec::new(),
            hp_multiplier: None,
            bonus_jijies_multiplier: default_jijies_multiplier(),
            bonus_xp_multiplier: default_xp_multiplier(),
            guaranteed_items: BTreeMap::new(),
            rare_drop_chance: default_rare_drop_chance(),
            background: None,
        }
    }
}

/// A quest definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestConfig {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub is_boss: bool,
    #[serde(default)]
    pub rewards: QuestRewards,
    #[serde(default, rename = "boss_data")]
    pub boss: Option<BossConfig>,
}

impl QuestConfig {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            is_boss: false,
            rewards: QuestRewards::default(),
            boss: None,
        }
    }

    pub fn with_rewards(mut self, jijies: i64, xp: i64) -> Self {
        self.rewards = QuestRewards { jijies, xp };
        self
    }

    pub fn with_boss(mut self, boss: BossConfig) -> Self {
        self.is_boss = true;
        self.boss = Some(boss);
        self
    }

    /// The boss section, only if this is a boss quest with a non-empty pool
    pub fn boss_config(&self) -> Option<&BossConfig> {
        if !self.is_boss {
            return None;
        }
        self.boss
            .as_ref()
            .filter(|boss| !boss.possible_esprits.is_empty())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |reason: &str| ConfigError::InvalidQuest {
            quest_id: self.id.clone(),
            reason: reason.to_string(),
        };

        if self.id.trim().is_empty() {
            return Err(invalid("id cannot be empty"));
        }
        if self.rewards.jijies < 0 || self.rewards.xp < 0 {
            return Err(invalid("rewards cannot be negative"));
        }
        if let Some(boss) = &self.boss {
            if let Some(multiplier) = boss.hp_multiplier {
                if !multiplier.is_finite() || multiplier <= 0.0 {
                    return Err(invalid("hp_multiplier must be positive"));
                }
            }
            if !boss.bonus_jijies_multiplier.is_finite() || boss.bonus_jijies_multiplier < 0.0 {
                return Err(invalid("bonus_jijies_multiplier must be non-negative"));
            }
            if !boss.bonus_xp_multiplier.is_finite() || boss.bonus_xp_multiplier < 0.0 {
                return Err(invalid("bonus_xp_multiplier must be non-negative"));
            }
            if !(0.0..=1.0).contains(&boss.rare_drop_chance) {
                return Err(invalid("rare_drop_chance must be within [0, 1]"));
            }
            if boss.possible_esprits.iter().any(|name| name.trim().is_empty()) {
                return Err(invalid("possible_esprits cannot contain blank names"));
            }
        }
        Ok(())
    }
}

/// An exploration area definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AreaConfig {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub capturable_tiers: Vec<u32>,
    #[serde(default)]
    pub element_affinity: Option<Element>,
    #[serde(default)]
    pub capture_bonus: f64,
}

impl AreaConfig {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            capturable_tiers: Vec::new(),
            element_affinity: None,
            capture_bonus: 0.0,
        }
    }

    pub fn with_capturable_tiers(mut self, tiers: impl Into<Vec<u32>>) -> Self {
        self.capturable_tiers = tiers.into();
        self
    }

    pub fn with_affinity(mut self, element: Element) -> Self {
        self.element_affinity = Some(element);
        self
    }

    pub fn with_capture_bonus(mut self, bonus: f64) -> Self {
        self.capture_bonus = bonus;
        self
    }

    /// Tag used as the source of captures made here
    pub fn source_tag(&self) -> &str {
        if self.name.is_empty() {
            "quest"
        } else {
            &self.name
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.id.trim().is_empty() {
            return Err(ConfigError::InvalidArea {
                area_id: self.id.clone(),
                reason: "id cannot be empty".to_string(),
            });
        }
        if !self.capture_bonus.is_finite() {
            return Err(ConfigError::InvalidArea {
                area_id: self.id.clone(),
                reason: "capture_bonus must be a finite number".to_string(),
            });
        }
        Ok(())
    }
}

fn default_reward_jijies() -> i64 {
    100
}

fn default_reward_xp() -> i64 {
    50
}

fn default_jijies_multiplier() -> f64 {
    2.0
}

fn default_xp_multiplier() -> f64 {
    3.0
}

fn default_rare_drop_chance() -> f64 {
    0.1
}
