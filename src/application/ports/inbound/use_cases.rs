//! Use case definitions for the game engine
//!
//! Callers (HTTP handlers, bots, tests) drive the engine through this trait
//! and never touch repositories directly.

use async_trait::async_trait;

use crate::application::services::{DailyRewardResult, EncounterError, RewardError};
use crate::domain::entities::{BossEncounter, CombatResult, Esprit, Player, VictoryReward};
use crate::domain::services::PendingCapture;
use crate::domain::value_objects::{AreaConfig, PlayerId, QuestConfig};

#[async_trait]
pub trait GameUseCases: Send + Sync {
    /// `None` for non-boss quests or empty species pools
    async fn start_encounter(&self, quest: &QuestConfig, area: &AreaConfig) -> Option<BossEncounter>;

    fn resolve_attack(
        &self,
        encounter: &mut BossEncounter,
        attacker_power: i64,
    ) -> Result<CombatResult, EncounterError>;

    async fn finalize_victory(
        &self,
        encounter: &mut BossEncounter,
        player_id: PlayerId,
    ) -> Result<VictoryReward, EncounterError>;

    async fn attempt_capture(
        &self,
        player: &Player,
        area: &AreaConfig,
    ) -> Result<Option<PendingCapture>, EncounterError>;

    async fn confirm_capture(
        &self,
        player_id: PlayerId,
        pending: &PendingCapture,
    ) -> Result<Esprit, EncounterError>;

    async fn claim_daily_reward(&self, player_id: PlayerId) -> Result<DailyRewardResult, RewardError>;
}
