//! Esprit species templates and owned esprit stacks

use chrono::{DateTime, Utc};

use crate::domain::value_objects::{Element, EspritBaseId, EspritId, PlayerId};

/// Static species template. Read-only reference data.
#[derive(Debug, Clone, PartialEq)]
pub struct EspritBase {
    pub id: EspritBaseId,
    pub name: String,
    pub element: Element,
    pub base_tier: u32,
    pub base_atk: i64,
    pub base_def: i64,
    pub base_hp: i64,
    pub description: String,
}

impl EspritBase {
    pub fn new(
        name: impl Into<String>,
        element: Element,
        base_tier: u32,
        base_atk: i64,
        base_def: i64,
        base_hp: i64,
    ) -> Self {
        Self {
            id: EspritBaseId::new(),
            name: name.into(),
            element,
            base_tier,
            base_atk,
            base_def,
            base_hp,
            description: String::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// An owned stack of one species. Each row holds every copy a player owns.
#[derive(Debug, Clone, PartialEq)]
pub struct Esprit {
    pub id: EspritId,
    pub esprit_base_id: EspritBaseId,
    pub owner_id: PlayerId,
    pub quantity: i64,
    pub tier: u32,
    pub awakening_level: u32,
    /// Cached from the base for quick filtering
    pub element: Element,
    pub created_at: DateTime<Utc>,
    pub last_modified: DateTime<Utc>,
}

impl Esprit {
    /// A fresh single-copy stack of `base` owned by `owner_id`
    pub fn captured(base: &EspritBase, owner_id: PlayerId, now: DateTime<Utc>) -> Self {
        Self {
            id: EspritId::new(),
            esprit_base_id: base.id,
            owner_id,
            quantity: 1,
            tier: base.base_tier,
            awakening_level: 0,
            element: base.element,
            created_at: now,
            last_modified: now,
        }
    }
}
