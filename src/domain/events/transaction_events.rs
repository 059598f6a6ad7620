//! Audit events - an append-only record of every balance mutation and capture
//!
//! Events are built by domain operations and handed to the transaction log
//! after the owning unit of work has committed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::value_objects::PlayerId;

/// Kind of audited change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    CurrencyGain,
    ExperienceGain,
    ItemGain,
    EspritCaptured,
    DailyReward,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CurrencyGain => "currency_gain",
            Self::ExperienceGain => "experience_gain",
            Self::ItemGain => "item_gain",
            Self::EspritCaptured => "esprit_captured",
            Self::DailyReward => "daily_reward",
        }
    }
}

/// One audit entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionEvent {
    pub player_id: PlayerId,
    pub kind: TransactionKind,
    pub amount: i64,
    pub old_balance: Option<i64>,
    pub new_balance: Option<i64>,
    pub streak: Option<u32>,
    /// What caused the change, e.g. `boss_victory_1-8`
    pub source: String,
    /// Kind-specific extras
    #[serde(default)]
    pub details: serde_json::Value,
    pub occurred_at: DateTime<Utc>,
}

impl TransactionEvent {
    pub fn new(
        player_id: PlayerId,
        kind: TransactionKind,
        amount: i64,
        source: impl Into<String>,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        Self {
            player_id,
            kind,
            amount,
            old_balance: None,
            new_balance: None,
            streak: None,
            source: source.into(),
            details: serde_json::Value::Null,
            occurred_at,
        }
    }

    pub fn with_balances(mut self, old_balance: i64, new_balance: i64) -> Self {
        self.old_balance = Some(old_balance);
        self.new_balance = Some(new_balance);
        self
    }

    pub fn with_streak(mut self, streak: u32) -> Self {
        self.streak = Some(streak);
        self
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = details;
        self
    }
}
