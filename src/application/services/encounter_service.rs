//! Encounter service - boss fights and exploration captures
//!
//! Combat itself is pure domain logic on `BossEncounter`. This service adds
//! the reference-data lookups, the locked persistence of rewards and the
//! audit trail.

use std::sync::Arc;

use serde_json::json;

use crate::application::context::GameContext;
use crate::application::ports::outbound::RepositoryError;
use crate::domain::entities::{
    BossEncounter, CombatError, CombatResult, EncounterState, Esprit, Player, VictoryReward,
};
use crate::domain::events::{TransactionEvent, TransactionKind};
use crate::domain::services::capture_system::{build_pending, roll_capture, select_esprit};
use crate::domain::services::PendingCapture;
use crate::domain::value_objects::{AreaConfig, BossTemplate, PlayerId, QuestConfig};

#[derive(Debug, thiserror::Error)]
pub enum EncounterError {
    #[error(transparent)]
    Combat(#[from] CombatError),

    #[error("Player not found: {0}")]
    PlayerNotFound(PlayerId),

    #[error("Player is busy, try again: {0}")]
    Conflict(String),

    #[error("Repository error: {0}")]
    Repository(RepositoryError),
}

impl From<RepositoryError> for EncounterError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::Conflict(msg) => EncounterError::Conflict(msg),
            other => EncounterError::Repository(other),
        }
    }
}

pub struct EncounterService {
    ctx: Arc<GameContext>,
}

impl EncounterService {
    pub fn new(ctx: Arc<GameContext>) -> Self {
        Self { ctx }
    }

    /// Create a boss encounter for a quest.
    ///
    /// `None` when the quest is not a boss quest or has an empty pool. A
    /// species missing from the catalog, or a failed catalog query, uses the
    /// fallback stats.
    #[tracing::instrument(skip_all, fields(quest_id = %quest.id))]
    pub async fn start_encounter(&self, quest: &QuestConfig, area: &AreaConfig) -> Option<BossEncounter> {
        let species = self
            .ctx
            .rng
            .with(|rng| BossEncounter::pick_species(quest, rng).map(str::to_string))?;

        let found = match self.ctx.catalog.find_by_name(&species).await {
            Ok(Some(base)) => Some(base),
            Ok(None) => {
                tracing::warn!(species = %species, "Boss species not in catalog, using fallback stats");
                None
            }
            Err(e) => {
                tracing::warn!(species = %species, "Boss species lookup failed, using fallback stats: {}", e);
                None
            }
        };

        let template = BossTemplate::resolve(&species, found.as_ref());
        let settings = self.ctx.settings.get().await;
        let encounter = BossEncounter::from_template(quest, area, template, settings.default_boss_hp_multiplier)?;

        tracing::info!(
            encounter_id = %encounter.id,
            quest_id = %quest.id,
            boss = %encounter.name(),
            max_hp = encounter.max_hp,
            "Boss encounter started"
        );
        Some(encounter)
    }

    /// Apply one attack to the boss. Nothing is persisted.
    pub fn resolve_attack(
        &self,
        encounter: &mut BossEncounter,
        attacker_power: i64,
    ) -> Result<CombatResult, EncounterError> {
        let result = self
            .ctx
            .rng
            .with(|rng| encounter.resolve_attack(attacker_power, rng))?;
        Ok(result)
    }

    /// Grant victory rewards to a player.
    ///
    /// Works on a copy of the encounter. The copy replaces `encounter` only
    /// after the player's unit of work commits, so a failed commit leaves the
    /// encounter `Defeated` and the call can be retried.
    #[tracing::instrument(skip(self, encounter), fields(encounter_id = %encounter.id))]
    pub async fn finalize_victory(
        &self,
        encounter: &mut BossEncounter,
        player_id: PlayerId,
    ) -> Result<VictoryReward, EncounterError> {
        match encounter.state() {
            EncounterState::Active => return Err(CombatError::NotDefeated.into()),
            EncounterState::Rewarded => return Err(CombatError::AlreadyRewarded.into()),
            EncounterState::Defeated => {}
        }

        let mut uow = self.ctx.players.begin().await?;
        let Some(mut player) = uow.lock_player(player_id).await? else {
            if let Err(e) = uow.rollback().await {
                tracing::warn!("Rollback after missing player failed: {}", e);
            }
            return Err(EncounterError::PlayerNotFound(player_id));
        };

        let now = self.ctx.clock.now();
        let mut staged = encounter.clone();
        let outcome = self.ctx.rng.with(|rng| {
            staged.process_victory(&mut player, self.ctx.leveling.as_ref(), now, rng)
        })?;

        let mut reward = outcome.reward;
        if let Some(captured) = &reward.captured_esprit {
            reward.captured_esprit = Some(uow.add_esprit(captured).await?);
        }
        uow.save_player(&player).await?;
        uow.commit().await?;

        *encounter = staged;

        tracing::info!(
            encounter_id = %encounter.id,
            player_id = %player_id,
            jijies = reward.jijies,
            xp = reward.xp,
            captured = reward.captured_esprit.is_some(),
            "Boss victory rewarded"
        );
        self.ctx.transaction_log.record_all(outcome.events);

        Ok(reward)
    }

    /// First phase of an exploration capture. Nothing is persisted; a
    /// successful attempt must be confirmed with `confirm_capture`.
    #[tracing::instrument(skip_all, fields(player_id = %player.id, area_id = %area.id))]
    pub async fn attempt_capture(
        &self,
        player: &Player,
        area: &AreaConfig,
    ) -> Result<Option<PendingCapture>, EncounterError> {
        let settings = self.ctx.settings.get().await;
        let Some(chance) = self
            .ctx
            .rng
            .with(|rng| roll_capture(player, area, &settings, rng))
        else {
            return Ok(None);
        };

        let candidates = self.ctx.catalog.list_by_tiers(&area.capturable_tiers).await?;
        let chosen = self
            .ctx
            .rng
            .with(|rng| select_esprit(&candidates, area.element_affinity, rng).cloned());

        let Some(base) = chosen else {
            tracing::debug!(area_id = %area.id, "Capture succeeded but no species matches the area tiers");
            return Ok(None);
        };

        tracing::debug!(
            player_id = %player.id,
            species = %base.name,
            chance = chance.final_chance,
            "Capture attempt succeeded"
        );
        Ok(Some(build_pending(base, area, &chance)))
    }

    /// Second phase: add the pending esprit to the player's collection.
    #[tracing::instrument(skip(self, pending))]
    pub async fn confirm_capture(
        &self,
        player_id: PlayerId,
        pending: &PendingCapture,
    ) -> Result<Esprit, EncounterError> {
        let mut uow = self.ctx.players.begin().await?;
        let Some(mut player) = uow.lock_player(player_id).await? else {
            if let Err(e) = uow.rollback().await {
                tracing::warn!("Rollback after missing player failed: {}", e);
            }
            return Err(EncounterError::PlayerNotFound(player_id));
        };

        let now = self.ctx.clock.now();
        let stack = uow
            .add_esprit(&Esprit::captured(&pending.esprit_base, player.id, now))
            .await?;
        player.update_activity(now);
        uow.save_player(&player).await?;
        uow.commit().await?;

        tracing::info!(
            player_id = %player_id,
            species = %pending.esprit_base.name,
            quantity = stack.quantity,
            "Esprit captured"
        );
        self.ctx.transaction_log.record(
            TransactionEvent::new(player_id, TransactionKind::EspritCaptured, 1, pending.source.clone(), now)
                .with_details(json!({
                    "esprit_base_id": pending.esprit_base.id.to_string(),
                    "esprit_name": pending.esprit_base.name,
                    "element": pending.esprit_base.element.as_str(),
                    "tier": pending.esprit_base.base_tier,
                    "capture_chance": pending.preview.capture_chance,
                })),
        );

        Ok(stack)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::outbound::PlayerRepositoryPort;
    use crate::application::services::test_support::{at, Harness};
    use crate::domain::entities::EspritBase;
    use crate::domain::value_objects::{BossConfig, Element};

    fn boss_quest(species: &[&str]) -> QuestConfig {
        QuestConfig::new("q7", "Grove Warden")
            .with_rewards(100, 50)
            .with_boss(BossConfig {
                possible_esprits: species.iter().map(|s| s.to_string()).collect(),
                hp_multiplier: Some(3.0),
                ..BossConfig::default()
            })
    }

    fn grove() -> AreaConfig {
        AreaConfig::new("area_1", "Whispering Grove").with_capturable_tiers([1, 2])
    }

    #[tokio::test]
    async fn test_start_encounter_uses_catalog_stats() {
        let harness = Harness::new(3);
        harness
            .add_species(EspritBase::new("Thornback", Element::Verdant, 2, 60, 20, 100))
            .await;
        let service = EncounterService::new(harness.ctx.clone());

        let encounter = service
            .start_encounter(&boss_quest(&["thornback"]), &grove())
            .await
            .unwrap();

        assert_eq!(encounter.name(), "Thornback");
        assert_eq!(encounter.max_hp, 300);
        assert!(!encounter.template.is_fallback());
    }

    #[tokio::test]
    async fn test_start_encounter_falls_back_for_unknown_species() {
        let harness = Harness::new(3);
        let service = EncounterService::new(harness.ctx.clone());

        let encounter = service
            .start_encounter(&boss_quest(&["Nobody"]), &grove())
            .await
            .unwrap();

        assert!(encounter.template.is_fallback());
        assert_eq!(encounter.max_hp, 900);
        assert_eq!(encounter.base_def(), 35);
    }

    #[tokio::test]
    async fn test_start_encounter_rejects_non_boss_quest() {
        let harness = Harness::new(3);
        let service = EncounterService::new(harness.ctx.clone());

        let plain = QuestConfig::new("q1", "Gather herbs");
        assert!(service.start_encounter(&plain, &grove()).await.is_none());
        assert!(service.start_encounter(&boss_quest(&[]), &grove()).await.is_none());
    }

    async fn defeated_encounter(harness: &Harness) -> BossEncounter {
        let service = EncounterService::new(harness.ctx.clone());
        let mut encounter = service
            .start_encounter(&boss_quest(&["Nobody"]), &grove())
            .await
            .unwrap();
        while !encounter.is_defeated() {
            service.resolve_attack(&mut encounter, 10_000).unwrap();
        }
        encounter
    }

    #[tokio::test]
    async fn test_finalize_victory_persists_rewards() {
        let harness = Harness::new(11);
        let player = harness.add_player(Player::new("ash", at(2026, 3, 1, 0))).await;
        harness.clock.set(at(2026, 3, 1, 12));
        let service = EncounterService::new(harness.ctx.clone());
        let mut encounter = defeated_encounter(&harness).await;

        let reward = service.finalize_victory(&mut encounter, player.id).await.unwrap();

        assert_eq!(reward.jijies, 200);
        assert_eq!(reward.xp, 150);
        assert!(reward.leveled_up);
        assert_eq!(reward.new_level, 2);
        assert_eq!(encounter.state(), EncounterState::Rewarded);

        let stored = harness.players.get_player(player.id).await.unwrap().unwrap();
        assert_eq!(stored.jijies, 200);
        assert_eq!(stored.level, 2);
        assert_eq!(stored.experience, 50);
        assert_eq!(stored.last_active, at(2026, 3, 1, 12));

        let kinds: Vec<TransactionKind> = harness.log.events().iter().map(|e| e.kind).collect();
        assert!(kinds.contains(&TransactionKind::CurrencyGain));
        assert!(kinds.contains(&TransactionKind::ExperienceGain));
        // Fallback bosses are never captured
        assert!(reward.captured_esprit.is_none());
        assert!(!kinds.contains(&TransactionKind::EspritCaptured));
    }

    #[tokio::test]
    async fn test_finalize_victory_twice_is_rejected() {
        let harness = Harness::new(11);
        let player = harness.add_player(Player::new("ash", at(2026, 3, 1, 0))).await;
        let service = EncounterService::new(harness.ctx.clone());
        let mut encounter = defeated_encounter(&harness).await;

        service.finalize_victory(&mut encounter, player.id).await.unwrap();
        let events_after_first = harness.log.events().len();

        let err = service.finalize_victory(&mut encounter, player.id).await.unwrap_err();
        assert!(matches!(err, EncounterError::Combat(CombatError::AlreadyRewarded)));

        let stored = harness.players.get_player(player.id).await.unwrap().unwrap();
        assert_eq!(stored.jijies, 200);
        assert_eq!(harness.log.events().len(), events_after_first);
    }

    #[tokio::test]
    async fn test_finalize_before_defeat_is_rejected() {
        let harness = Harness::new(11);
        let player = harness.add_player(Player::new("ash", at(2026, 3, 1, 0))).await;
        let service = EncounterService::new(harness.ctx.clone());
        let mut encounter = service
            .start_encounter(&boss_quest(&["Nobody"]), &grove())
            .await
            .unwrap();

        let err = service.finalize_victory(&mut encounter, player.id).await.unwrap_err();
        assert!(matches!(err, EncounterError::Combat(CombatError::NotDefeated)));
        assert!(harness.log.events().is_empty());
    }

    #[tokio::test]
    async fn test_failed_finalize_keeps_encounter_defeated() {
        let harness = Harness::new(11);
        let service = EncounterService::new(harness.ctx.clone());
        let mut encounter = defeated_encounter(&harness).await;

        let err = service
            .finalize_victory(&mut encounter, PlayerId::new())
            .await
            .unwrap_err();
        assert!(matches!(err, EncounterError::PlayerNotFound(_)));
        assert_eq!(encounter.state(), EncounterState::Defeated);
    }

    #[tokio::test]
    async fn test_boss_capture_stacks_onto_collection() {
        let harness = Harness::new(5);
        let species = harness
            .add_species(EspritBase::new("Thornback", Element::Verdant, 2, 60, 20, 100))
            .await;
        let player = harness.add_player(Player::new("ash", at(2026, 3, 1, 0))).await;
        let service = EncounterService::new(harness.ctx.clone());

        let mut captures = 0;
        for _ in 0..100 {
            let mut encounter = service
                .start_encounter(&boss_quest(&["Thornback"]), &grove())
                .await
                .unwrap();
            while !encounter.is_defeated() {
                service.resolve_attack(&mut encounter, 10_000).unwrap();
            }
            let reward = service.finalize_victory(&mut encounter, player.id).await.unwrap();
            if let Some(stack) = reward.captured_esprit {
                captures += 1;
                assert_eq!(stack.quantity, captures);
            }
        }

        assert!(captures > 0, "expected at least one capture in 100 victories");
        let owned = harness.players.list_esprits(player.id).await.unwrap();
        assert_eq!(owned.len(), 1);
        assert_eq!(owned[0].esprit_base_id, species.id);
        assert_eq!(owned[0].quantity, captures);
    }

    #[tokio::test]
    async fn test_capture_two_phase_flow() {
        let harness = Harness::new(21);
        harness
            .add_species(EspritBase::new("Mossling", Element::Verdant, 1, 20, 10, 50))
            .await;
        harness
            .add_species(EspritBase::new("Cinderpup", Element::Inferno, 2, 25, 8, 45))
            .await;
        harness
            .add_species(EspritBase::new("Glacier Titan", Element::Abyssal, 6, 90, 70, 400))
            .await;
        let player = harness.add_player(Player::new("ash", at(2026, 3, 1, 0))).await;
        let area = grove().with_affinity(Element::Verdant).with_capture_bonus(0.5);
        let service = EncounterService::new(harness.ctx.clone());

        let mut pending = None;
        for _ in 0..50 {
            if let Some(found) = service.attempt_capture(&player, &area).await.unwrap() {
                pending = Some(found);
                break;
            }
        }
        let pending = pending.expect("an attempt at ~0.7 chance should succeed");
        assert_ne!(pending.esprit_base.name, "Glacier Titan");
        assert_eq!(pending.source, "Whispering Grove");
        assert_eq!(pending.preview.area_element, Some(Element::Verdant));

        // Attempts never persist anything
        assert!(harness.players.list_esprits(player.id).await.unwrap().is_empty());

        let stack = service.confirm_capture(player.id, &pending).await.unwrap();
        assert_eq!(stack.quantity, 1);
        assert_eq!(stack.esprit_base_id, pending.esprit_base.id);

        let again = service.confirm_capture(player.id, &pending).await.unwrap();
        assert_eq!(again.quantity, 2);
        assert_eq!(again.id, stack.id);

        let events = harness.log.events();
        assert_eq!(events.len(), 2);
        assert!(events.iter().all(|e| e.kind == TransactionKind::EspritCaptured));
        assert!(events.iter().all(|e| e.source == "Whispering Grove"));
    }

    #[tokio::test]
    async fn test_capture_in_area_without_tiers_never_succeeds() {
        let harness = Harness::new(21);
        harness
            .add_species(EspritBase::new("Mossling", Element::Verdant, 1, 20, 10, 50))
            .await;
        let player = harness.add_player(Player::new("ash", at(2026, 3, 1, 0))).await;
        let barren = AreaConfig::new("area_0", "Barren Flats").with_capture_bonus(0.9);
        let service = EncounterService::new(harness.ctx.clone());

        for _ in 0..20 {
            assert!(service.attempt_capture(&player, &barren).await.unwrap().is_none());
        }
    }
}
