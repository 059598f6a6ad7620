//! Tunable game settings value object
//!
//! Settings are stored in SQLite as key-value pairs and may be overridden
//! from the environment. Every field has a default so a missing or
//! unparsable entry never leaves the struct partially filled, and an entry
//! that would break `validate()` is rejected in favour of the current value.

use serde::{Deserialize, Serialize};

use super::ConfigError;

/// All tunable game constants
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GameSettings {
    // Exploration capture
    pub base_capture_chance: f64,
    pub capture_bonus_per_level: f64,

    // Daily reward
    pub daily_base_jijies: i64,
    pub daily_bonus_per_day: i64,
    pub daily_max_bonus: i64,

    // Boss encounters
    pub default_boss_hp_multiplier: f64,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            base_capture_chance: 0.15,
            capture_bonus_per_level: 0.001,
            daily_base_jijies: 1000,
            daily_bonus_per_day: 100,
            daily_max_bonus: 1000,
            default_boss_hp_multiplier: 3.0,
        }
    }
}

impl GameSettings {
    /// Keys used by the key-value settings store
    pub const KEYS: [&'static str; 6] = [
        "base_capture_chance",
        "capture_bonus_per_level",
        "daily_base_jijies",
        "daily_bonus_per_day",
        "daily_max_bonus",
        "default_boss_hp_multiplier",
    ];

    /// Load from environment variables, using defaults for missing or invalid values
    pub fn from_env() -> Self {
        let mut settings = Self::default();
        for key in Self::KEYS {
            let var = format!("ESPRIT_{}", key.to_ascii_uppercase());
            if let Ok(value) = std::env::var(&var) {
                if !settings.apply_override(key, &value) {
                    tracing::warn!("Ignoring {} = {:?}", var, value);
                }
            }
        }
        settings
    }

    /// Apply a single stored override.
    ///
    /// Returns false, leaving `self` untouched, for unknown keys, unparsable
    /// values and values that fail `validate()`.
    pub fn apply_override(&mut self, key: &str, value: &str) -> bool {
        let mut candidate = self.clone();
        let parsed = match key {
            "base_capture_chance" => parse_into(value, &mut candidate.base_capture_chance),
            "capture_bonus_per_level" => parse_into(value, &mut candidate.capture_bonus_per_level),
            "daily_base_jijies" => parse_into(value, &mut candidate.daily_base_jijies),
            "daily_bonus_per_day" => parse_into(value, &mut candidate.daily_bonus_per_day),
            "daily_max_bonus" => parse_into(value, &mut candidate.daily_max_bonus),
            "default_boss_hp_multiplier" => parse_into(value, &mut candidate.default_boss_hp_multiplier),
            _ => false,
        };
        if !parsed || candidate.validate().is_err() {
            return false;
        }
        *self = candidate;
        true
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let probability = |key: &'static str, value: f64| {
            if value.is_finite() && (0.0..=1.0).contains(&value) {
                Ok(())
            } else {
                Err(ConfigError::invalid_setting(key, "must be within [0, 1]"))
            }
        };
        let amount = |key: &'static str, value: i64| {
            if value >= 0 {
                Ok(())
            } else {
                Err(ConfigError::invalid_setting(key, "cannot be negative"))
            }
        };

        probability("base_capture_chance", self.base_capture_chance)?;
        probability("capture_bonus_per_level", self.capture_bonus_per_level)?;
        amount("daily_base_jijies", self.daily_base_jijies)?;
        amount("daily_bonus_per_day", self.daily_bonus_per_day)?;
        amount("daily_max_bonus", self.daily_max_bonus)?;
        if !self.default_boss_hp_multiplier.is_finite() || self.default_boss_hp_multiplier <= 0.0 {
            return Err(ConfigError::invalid_setting(
                "default_boss_hp_multiplier",
                "must be positive",
            ));
        }
        Ok(())
    }

    /// Key-value pairs for persistence, in `KEYS` order
    pub fn to_pairs(&self) -> [(&'static str, String); 6] {
        [
            ("base_capture_chance", self.base_capture_chance.to_string()),
            ("capture_bonus_per_level", self.capture_bonus_per_level.to_string()),
            ("daily_base_jijies", self.daily_base_jijies.to_string()),
            ("daily_bonus_per_day", self.daily_bonus_per_day.to_string()),
            ("daily_max_bonus", self.daily_max_bonus.to_string()),
            ("default_boss_hp_multiplier", self.default_boss_hp_multiplier.to_string()),
        ]
    }
}

fn parse_into<T: std::str::FromStr>(value: &str, slot: &mut T) -> bool {
    match value.trim().parse() {
        Ok(parsed) => {
            *slot = parsed;
            true
        }
        Err(_) => false,
    }
}
