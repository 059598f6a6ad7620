//! Game engine - the single entry point implementing `GameUseCases`

use std::sync::Arc;

use async_trait::async_trait;

use crate::application::context::GameContext;
use crate::application::ports::inbound::GameUseCases;
use crate::application::services::{
    DailyRewardResult, EncounterError, EncounterService, RewardError, RewardService,
};
use crate::domain::entities::{BossEncounter, CombatResult, Esprit, Player, VictoryReward};
use crate::domain::services::PendingCapture;
use crate::domain::value_objects::{AreaConfig, GameSettings, PlayerId, QuestConfig};

pub struct GameEngine {
    ctx: Arc<GameContext>,
    encounters: EncounterService,
    rewards: RewardService,
}

impl GameEngine {
    pub fn new(ctx: Arc<GameContext>) -> Self {
        Self {
            encounters: EncounterService::new(ctx.clone()),
            rewards: RewardService::new(ctx.clone()),
            ctx,
        }
    }

    pub fn context(&self) -> &Arc<GameContext> {
        &self.ctx
    }

    pub async fn reload_settings(&self) -> GameSettings {
        self.ctx.reload_settings().await
    }
}

#[async_trait]
impl GameUseCases for GameEngine {
    async fn start_encounter(&self, quest: &QuestConfig, area: &AreaConfig) -> Option<BossEncounter> {
        self.encounters.start_encounter(quest, area).await
    }

    fn resolve_attack(
        &self,
        encounter: &mut BossEncounter,
        attacker_power: i64,
    ) -> Result<CombatResult, EncounterError> {
        self.encounters.resolve_attack(encounter, attacker_power)
    }

    async fn finalize_victory(
        &self,
        encounter: &mut BossEncounter,
        player_id: PlayerId,
    ) -> Result<VictoryReward, EncounterError> {
        self.encounters.finalize_victory(encounter, player_id).await
    }

    async fn attempt_capture(
        &self,
        player: &Player,
        area: &AreaConfig,
    ) -> Result<Option<PendingCapture>, EncounterError> {
        self.encounters.attempt_capture(player, area).await
    }

    async fn confirm_capture(
        &self,
        player_id: PlayerId,
        pending: &PendingCapture,
    ) -> Result<Esprit, EncounterError> {
        self.encounters.confirm_capture(player_id, pending).await
    }

    async fn claim_daily_reward(&self, player_id: PlayerId) -> Result<DailyRewardResult, RewardError> {
        self.rewards.claim_daily_reward(player_id).await
    }
}
