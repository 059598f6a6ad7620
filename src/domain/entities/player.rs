//! Player entity - the persistent owner of balances, progression and streaks

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::domain::value_objects::PlayerId;

/// A player record
///
/// Mutated only inside a locked unit of work. Never deleted by this engine.
#[derive(Debug, Clone, PartialEq)]
pub struct Player {
    pub id: PlayerId,
    pub username: String,

    // Progression
    pub level: u32,
    pub experience: i64,

    // Currency
    pub jijies: i64,
    pub total_jijies_earned: i64,

    /// Item name -> count
    pub inventory: BTreeMap<String, u32>,

    // Daily reward
    pub daily_streak: u32,
    pub last_daily_reward: Option<DateTime<Utc>>,

    pub last_active: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Player {
    pub fn new(username: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: PlayerId::new(),
            username: username.into(),
            level: 1,
            experience: 0,
            jijies: 0,
            total_jijies_earned: 0,
            inventory: BTreeMap::new(),
            daily_streak: 0,
            last_daily_reward: None,
            last_active: now,
            created_at: now,
        }
    }

    pub fn with_level(mut self, level: u32) -> Self {
        self.level = level.max(1);
        self
    }

    pub fn with_jijies(mut self, jijies: i64) -> Self {
        self.jijies = jijies;
        self
    }

    /// Credit currency to the balance and the lifetime-earned counter.
    /// Returns the balance before the credit. Both counters saturate.
    pub fn credit_jijies(&mut self, amount: i64) -> i64 {
        let old_balance = self.jijies;
        self.jijies = self.jijies.saturating_add(amount);
        self.total_jijies_earned = self.total_jijies_earned.saturating_add(amount);
        old_balance
    }

    /// Returns the new stack count
    pub fn add_item(&mut self, item: impl Into<String>, quantity: u32) -> u32 {
        let count = self.inventory.entry(item.into()).or_insert(0);
        *count = count.saturating_add(quantity);
        *count
    }

    pub fn update_activity(&mut self, now: DateTime<Utc>) {
        self.last_active = now;
    }
}
