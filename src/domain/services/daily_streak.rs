//! Daily reward streak rules

use chrono::{DateTime, Days, NaiveDate, Utc};

use crate::domain::value_objects::GameSettings;

/// Outcome of evaluating a claim against the previous one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreakDecision {
    /// Already claimed on `today`
    AlreadyClaimed,
    /// Claimable, with the streak the claim produces
    Claimable { streak: u32 },
}

/// Amounts paid for a claim
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailyPayout {
    pub base: i64,
    pub bonus: i64,
    pub total: i64,
}

/// Decide whether a claim on `today` is allowed and what the streak becomes.
///
/// The streak grows by one only when the previous claim fell on the calendar
/// day before `today`; any other history restarts it at 1.
pub fn evaluate_claim(
    last_claim: Option<DateTime<Utc>>,
    current_streak: u32,
    today: NaiveDate,
) -> StreakDecision {
    let Some(last_date) = last_claim.map(|at| at.date_naive()) else {
        return StreakDecision::Claimable { streak: 1 };
    };

    if last_date == today {
        return StreakDecision::AlreadyClaimed;
    }

    let yesterday = today.checked_sub_days(Days::new(1));
    if Some(last_date) == yesterday {
        StreakDecision::Claimable {
            streak: current_streak.saturating_add(1),
        }
    } else {
        StreakDecision::Claimable { streak: 1 }
    }
}

/// `bonus = min(streak * bonus_per_day, max_bonus)`, `total = base + bonus`.
/// Saturates at `i64::MAX`.
pub fn payout(streak: u32, settings: &GameSettings) -> DailyPayout {
    let bonus = i64::from(streak)
        .saturating_mul(settings.daily_bonus_per_day)
        .min(settings.daily_max_bonus);
    DailyPayout {
        base: settings.daily_base_jijies,
        bonus,
        total: settings.daily_base_jijies.saturating_add(bonus),
    }
}
