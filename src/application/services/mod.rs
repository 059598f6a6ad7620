//! Application services - Use case implementations
//!
//! Each service depends only on the outbound ports carried by `GameContext`
//! and returns domain entities or plain result types.

pub mod encounter_service;
pub mod game_engine;
pub mod reward_service;
pub mod settings_service;

#[cfg(test)]
pub(crate) mod test_support;

pub use encounter_service::{EncounterError, EncounterService};
pub use game_engine::GameEngine;
pub use reward_service::{DailyRewardResult, RewardError, RewardService};
pub use settings_service::SettingsService;
