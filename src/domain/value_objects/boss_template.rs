//! Resolved boss species stats
//!
//! Encounter setup looks the chosen species up in reference data and then
//! defaults whatever was not found. The result is always fully populated.

use super::{Element, EspritBaseId};
use crate::domain::entities::EspritBase;

pub const FALLBACK_BOSS_HP: i64 = 300;
pub const FALLBACK_BOSS_ATK: i64 = 75;
pub const FALLBACK_BOSS_DEF: i64 = 35;
pub const FALLBACK_BOSS_ELEMENT: Element = Element::Verdant;
pub const FALLBACK_BOSS_TIER: u32 = 1;

/// Stats an encounter is built from
#[derive(Debug, Clone, PartialEq)]
pub struct BossTemplate {
    /// `None` when the species is missing from reference data
    pub base_id: Option<EspritBaseId>,
    pub name: String,
    pub element: Element,
    pub tier: u32,
    pub base_hp: i64,
    pub base_atk: i64,
    pub base_def: i64,
}

impl BossTemplate {
    /// Use the reference data if it was found, otherwise the fixed fallback stats
    pub fn resolve(species: &str, found: Option<&EspritBase>) -> Self {
        match found {
            Some(base) => Self::from_base(base),
            None => Self::fallback(species),
        }
    }

    pub fn from_base(base: &EspritBase) -> Self {
        Self {
            base_id: Some(base.id),
            name: base.name.clone(),
            element: base.element,
            tier: base.base_tier,
            base_hp: base.base_hp,
            base_atk: base.base_atk,
            base_def: base.base_def,
        }
    }

    pub fn fallback(species: &str) -> Self {
        Self {
            base_id: None,
            name: species.to_string(),
            element: FALLBACK_BOSS_ELEMENT,
            tier: FALLBACK_BOSS_TIER,
            base_hp: FALLBACK_BOSS_HP,
            base_atk: FALLBACK_BOSS_ATK,
            base_def: FALLBACK_BOSS_DEF,
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.base_id.is_none()
    }
}
