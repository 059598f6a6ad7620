//! Boss encounter - the per-fight combat state machine
//!
//! ```text
//! Active --resolve_attack--> Active | Defeated --process_victory--> Rewarded
//! ```
//!
//! An encounter is owned by the session that started it and is never shared,
//! so it carries no locking of its own. Player mutations it produces must be
//! applied inside a locked unit of work by the caller.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;
use rand::Rng;

use crate::domain::entities::{Esprit, EspritBase, Player};
use crate::domain::events::{TransactionEvent, TransactionKind};
use crate::domain::services::LevelProgression;
use crate::domain::value_objects::{
    AreaConfig, BossTemplate, Element, EncounterId, EspritId, QuestConfig,
};

/// Damage floor applied before variance
pub const FLOOR_DAMAGE: i64 = 5;
/// No resolved hit deals less than this
pub const MIN_DAMAGE: i64 = 8;
/// Symmetric variance applied to base damage
pub const DAMAGE_VARIANCE: f64 = 0.3;
pub const CRITICAL_CHANCE: f64 = 0.1;
pub const CRITICAL_MULTIPLIER: f64 = 1.8;
/// Flat chance to capture the boss on victory. Tuned independently of
/// exploration captures.
pub const BOSS_CAPTURE_CHANCE: f64 = 0.1;

/// Combat rule violations
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum CombatError {
    #[error("Boss is already defeated")]
    AlreadyDefeated,

    #[error("Boss has not been defeated yet")]
    NotDefeated,

    #[error("Victory rewards were already granted for this encounter")]
    AlreadyRewarded,
}

/// Lifecycle of an encounter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncounterState {
    Active,
    Defeated,
    /// Terminal. Victory rewards have been granted.
    Rewarded,
}

/// Snapshot after a single attack
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CombatResult {
    pub damage_dealt: i64,
    pub is_critical: bool,
    pub boss_current_hp: i64,
    pub boss_max_hp: i64,
    pub is_boss_defeated: bool,
    pub attack_count: u32,
    pub total_damage: i64,
}

/// Rewards granted for a victory
#[derive(Debug, Clone, PartialEq)]
pub struct VictoryReward {
    pub jijies: i64,
    pub xp: i64,
    pub items: BTreeMap<String, u32>,
    pub captured_esprit: Option<Esprit>,
    pub leveled_up: bool,
    pub new_level: u32,
}

/// Everything a victory produced: the reward plus the audit events that
/// must be recorded once the player's changes are committed.
#[derive(Debug, Clone, PartialEq)]
pub struct VictoryOutcome {
    pub reward: VictoryReward,
    pub events: Vec<TransactionEvent>,
}

/// A single damage roll
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DamageRoll {
    pub base_damage: i64,
    pub damage: i64,
    pub is_critical: bool,
}

/// Roll damage for `attacker_power` against `defense`
pub fn roll_damage<R: Rng + ?Sized>(attacker_power: i64, defense: i64, rng: &mut R) -> DamageRoll {
    let base_damage = attacker_power.saturating_sub(defense).max(FLOOR_DAMAGE);

    let multiplier = 1.0 + rng.gen_range(-DAMAGE_VARIANCE..=DAMAGE_VARIANCE);
    let mut damage = (base_damage as f64 * multiplier) as i64;

    let is_critical = rng.gen::<f64>() < CRITICAL_CHANCE;
    if is_critical {
        damage = (damage as f64 * CRITICAL_MULTIPLIER) as i64;
    }

    DamageRoll {
        base_damage,
        damage: damage.max(MIN_DAMAGE),
        is_critical,
    }
}

/// An active boss fight
#[derive(Debug, Clone, PartialEq)]
pub struct BossEncounter {
    pub id: EncounterId,
    pub quest_id: String,
    pub area_id: String,

    // Boss identity
    pub template: BossTemplate,
    pub background: Option<String>,

    // Combat state
    pub max_hp: i64,
    pub current_hp: i64,
    pub attack_count: u32,
    pub total_damage_dealt: i64,
    state: EncounterState,

    // Rewards
    pub base_jijies: i64,
    pub base_xp: i64,
    pub jijies_multiplier: f64,
    pub xp_multiplier: f64,
    pub guaranteed_items: BTreeMap<String, u32>,
    pub rare_drop_chance: f64,
}

impl BossEncounter {
    /// Pick one boss species uniformly from the quest's pool. `None` for
    /// non-boss quests and empty pools.
    pub fn pick_species<'q, R: Rng + ?Sized>(quest: &'q QuestConfig, rng: &mut R) -> Option<&'q str> {
        quest
            .boss_config()?
            .possible_esprits
            .choose(rng)
            .map(String::as_str)
    }

    /// Build an encounter from an already resolved template.
    ///
    /// `max_hp = round(base_hp * hp_multiplier)`, where the quest's multiplier
    /// wins over `default_hp_multiplier`.
    pub fn from_template(
        quest: &QuestConfig,
        area: &AreaConfig,
        template: BossTemplate,
        default_hp_multiplier: f64,
    ) -> Option<Self> {
        let boss = quest.boss_config()?;
        let hp_multiplier = boss.hp_multiplier.unwrap_or(default_hp_multiplier);
        let max_hp = ((template.base_hp as f64 * hp_multiplier).round() as i64).max(1);

        Some(Self {
            id: EncounterId::new(),
            quest_id: quest.id.clone(),
            area_id: area.id.clone(),
            template,
            background: boss.background.clone(),
            max_hp,
            current_hp: max_hp,
            attack_count: 0,
            total_damage_dealt: 0,
            state: EncounterState::Active,
            base_jijies: quest.rewards.jijies,
            base_xp: quest.rewards.xp,
            jijies_multiplier: boss.bonus_jijies_multiplier,
            xp_multiplier: boss.bonus_xp_multiplier,
            guaranteed_items: boss.guaranteed_items.clone(),
            rare_drop_chance: boss.rare_drop_chance,
        })
    }

    /// Pick a species, resolve it through `lookup` and build the encounter.
    /// A species missing from reference data falls back to default stats.
    pub fn create_from_quest<R, F>(
        quest: &QuestConfig,
        area: &AreaConfig,
        default_hp_multiplier: f64,
        rng: &mut R,
        lookup: F,
    ) -> Option<Self>
    where
        R: Rng + ?Sized,
        F: FnOnce(&str) -> Option<EspritBase>,
    {
        let species = Self::pick_species(quest, rng)?;
        let found = lookup(species);
        let template = BossTemplate::resolve(species, found.as_ref());
        Self::from_template(quest, area, template, default_hp_multiplier)
    }

    pub fn name(&self) -> &str {
        &self.template.name
    }

    pub fn element(&self) -> Element {
        self.template.element
    }

    pub fn base_def(&self) -> i64 {
        self.template.base_def
    }

    pub fn state(&self) -> EncounterState {
        self.state
    }

    pub fn is_defeated(&self) -> bool {
        self.current_hp == 0
    }

    pub fn hp_percent(&self) -> f64 {
        if self.max_hp > 0 {
            self.current_hp as f64 / self.max_hp as f64
        } else {
            0.0
        }
    }

    /// Resolve one attack against the boss
    pub fn resolve_attack<R: Rng + ?Sized>(
        &mut self,
        attacker_power: i64,
        rng: &mut R,
    ) -> Result<CombatResult, CombatError> {
        if self.state != EncounterState::Active {
            return Err(CombatError::AlreadyDefeated);
        }

        let roll = roll_damage(attacker_power, self.base_def(), rng);
        Ok(self.apply_damage(roll))
    }

    fn apply_damage(&mut self, roll: DamageRoll) -> CombatResult {
        let before = self.current_hp;
        self.current_hp = (self.current_hp - roll.damage).max(0);
        self.attack_count += 1;
        self.total_damage_dealt += roll.damage;

        if self.current_hp == 0 {
            self.state = EncounterState::Defeated;
            tracing::info!(
                encounter_id = %self.id,
                boss = %self.name(),
                attacks = self.attack_count,
                "Boss defeated"
            );
        } else {
            tracing::debug!(
                encounter_id = %self.id,
                damage = roll.damage,
                critical = roll.is_critical,
                "Boss HP: {} -> {}",
                before,
                self.current_hp
            );
        }

        CombatResult {
            damage_dealt: roll.damage,
            is_critical: roll.is_critical,
            boss_current_hp: self.current_hp,
            boss_max_hp: self.max_hp,
            is_boss_defeated: self.is_defeated(),
            attack_count: self.attack_count,
            total_damage: self.total_damage_dealt,
        }
    }

    fn source_tag(&self) -> String {
        format!("boss_victory_{}", self.quest_id)
    }

    /// Grant victory rewards to `player` and move to `Rewarded`.
    ///
    /// Only the in-memory `player` is changed. The caller persists it and
    /// records `VictoryOutcome::events` after committing.
    pub fn process_victory<R: Rng + ?Sized>(
        &mut self,
        player: &mut Player,
        leveling: &dyn LevelProgression,
        now: DateTime<Utc>,
        rng: &mut R,
    ) -> Result<VictoryOutcome, CombatError> {
        match self.state {
            EncounterState::Active => return Err(CombatError::NotDefeated),
            EncounterState::Rewarded => return Err(CombatError::AlreadyRewarded),
            EncounterState::Defeated => {}
        }

        let source = self.source_tag();
        let mut events = Vec::new();

        let jijies = (self.base_jijies as f64 * self.jijies_multiplier) as i64;
        let xp = (self.base_xp as f64 * self.xp_multiplier) as i64;

        let old_jijies = player.credit_jijies(jijies);
        events.push(
            TransactionEvent::new(player.id, TransactionKind::CurrencyGain, jijies, &source, now)
                .with_balances(old_jijies, player.jijies)
                .with_details(serde_json::json!({ "boss_name": self.name() })),
        );

        let old_level = player.level;
        let old_experience = player.experience;
        player.experience = player.experience.saturating_add(xp);
        let levels_gained = leveling.apply(player);
        events.push(
            TransactionEvent::new(player.id, TransactionKind::ExperienceGain, xp, &source, now)
                .with_balances(old_experience, player.experience)
                .with_details(serde_json::json!({
                    "old_level": old_level,
                    "new_level": player.level,
                    "levels_gained": levels_gained,
                })),
        );

        let items = self.roll_items(rng);
        for (item, quantity) in &items {
            let old_count = player.inventory.get(item).copied().unwrap_or(0);
            let new_count = player.add_item(item.clone(), *quantity);
            events.push(
                TransactionEvent::new(player.id, TransactionKind::ItemGain, i64::from(*quantity), &source, now)
                    .with_balances(i64::from(old_count), i64::from(new_count))
                    .with_details(serde_json::json!({ "item": item })),
            );
        }

        let captured_esprit = if rng.gen::<f64>() < BOSS_CAPTURE_CHANCE {
            self.capture_boss(player, now, &mut events)
        } else {
            None
        };

        player.update_activity(now);
        self.state = EncounterState::Rewarded;

        tracing::info!(
            boss = %self.name(),
            player_id = %player.id,
            jijies,
            xp,
            captured = captured_esprit.is_some(),
            "Boss victory processed"
        );

        Ok(VictoryOutcome {
            reward: VictoryReward {
                jijies,
                xp,
                items,
                captured_esprit,
                leveled_up: levels_gained > 0,
                new_level: player.level,
            },
            events,
        })
    }

    fn roll_items<R: Rng + ?Sized>(&self, rng: &mut R) -> BTreeMap<String, u32> {
        let mut items = self.guaranteed_items.clone();
        if rng.gen::<f64>() < self.rare_drop_chance {
            let (item, quantity) = rare_drop_for_tier(self.template.tier);
            let count = items.entry(item.to_string()).or_insert(0);
            *count = count.saturating_add(quantity);
        }
        items
    }

    fn capture_boss(
        &self,
        player: &Player,
        now: DateTime<Utc>,
        events: &mut Vec<TransactionEvent>,
    ) -> Option<Esprit> {
        let Some(base_id) = self.template.base_id else {
            tracing::warn!(boss = %self.name(), "Boss species has no reference entry, skipping capture");
            return None;
        };

        let esprit = Esprit {
            id: EspritId::new(),
            esprit_base_id: base_id,
            owner_id: player.id,
            quantity: 1,
            tier: self.template.tier,
            awakening_level: 0,
            element: self.template.element,
            created_at: now,
            last_modified: now,
        };

        events.push(
            TransactionEvent::new(
                player.id,
                TransactionKind::EspritCaptured,
                1,
                format!("boss_capture_{}", self.quest_id),
                now,
            )
            .with_details(serde_json::json!({
                "esprit_name": self.name(),
                "element": self.element(),
                "tier": self.template.tier,
            })),
        );

        Some(esprit)
    }
}

/// Tier-appropriate rare drop
pub fn rare_drop_for_tier(tier: u32) -> (&'static str, u32) {
    match tier {
        0..=2 => ("energy_potion", 1),
        3..=4 => ("xp_orb", 3),
        5..=6 => ("capture_charm", 1),
        _ => ("fusion_catalyst", 1),
    }
}
