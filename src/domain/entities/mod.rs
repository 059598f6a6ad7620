//! Domain entities - Core business objects with identity

mod boss_encounter;
mod esprit;
mod player;

pub use boss_encounter::{
    rare_drop_for_tier, roll_damage, BossEncounter, CombatError, CombatResult, DamageRoll,
    EncounterState, VictoryOutcome, VictoryReward, BOSS_CAPTURE_CHANCE, CRITICAL_CHANCE,
    CRITICAL_MULTIPLIER, DAMAGE_VARIANCE, FLOOR_DAMAGE, MIN_DAMAGE,
};
pub use esprit::{Esprit, EspritBase};
pub use player::Player;
