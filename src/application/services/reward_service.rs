//! Reward service - daily reward claims
//!
//! A claim runs inside one player unit of work: the player row is locked,
//! the streak evaluated, currency credited and the row written back before
//! the lock is released. Two concurrent claims for the same player therefore
//! serialize, and the second one sees the first one's timestamp.

use std::sync::Arc;

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::application::context::GameContext;
use crate::application::ports::outbound::RepositoryError;
use crate::domain::events::{TransactionEvent, TransactionKind};
use crate::domain::services::daily_streak::{evaluate_claim, payout};
use crate::domain::services::StreakDecision;
use crate::domain::value_objects::PlayerId;

/// Source tag written to the audit log for daily claims
pub const DAILY_REWARD_SOURCE: &str = "daily_reward";

#[derive(Debug, thiserror::Error)]
pub enum RewardError {
    #[error("Daily reward already claimed, next claim on {next_claim}")]
    AlreadyClaimed { next_claim: NaiveDate },

    #[error("Player not found: {0}")]
    PlayerNotFound(PlayerId),

    #[error("Player is busy, try again: {0}")]
    Conflict(String),

    #[error("Repository error: {0}")]
    Repository(RepositoryError),
}

impl From<RepositoryError> for RewardError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::Conflict(msg) => RewardError::Conflict(msg),
            other => RewardError::Repository(other),
        }
    }
}

/// What a successful claim paid out
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyRewardResult {
    pub player_id: PlayerId,
    pub streak: u32,
    /// `base_reward + streak_bonus`
    pub jijies: i64,
    pub base_reward: i64,
    pub streak_bonus: i64,
    pub new_balance: i64,
    pub next_claim: NaiveDate,
}

pub struct RewardService {
    ctx: Arc<GameContext>,
}

impl RewardService {
    pub fn new(ctx: Arc<GameContext>) -> Self {
        Self { ctx }
    }

    /// Claim today's reward for a player.
    ///
    /// Fails with `AlreadyClaimed` (and changes nothing) when a claim was
    /// already made on the current UTC date.
    #[tracing::instrument(skip(self))]
    pub async fn claim_daily_reward(&self, player_id: PlayerId) -> Result<DailyRewardResult, RewardError> {
        let settings = self.ctx.settings.get().await;

        let mut uow = self.ctx.players.begin().await?;
        let Some(mut player) = uow.lock_player(player_id).await? else {
            if let Err(e) = uow.rollback().await {
                tracing::warn!("Rollback after missing player failed: {}", e);
            }
            return Err(RewardError::PlayerNotFound(player_id));
        };

        // Read the clock only once the lock is held so serialized claims see each other
        let now = self.ctx.clock.now();
        let today = now.date_naive();
        let next_claim = today.checked_add_days(Days::new(1)).unwrap_or(today);

        let streak = match evaluate_claim(player.last_daily_reward, player.daily_streak, today) {
            StreakDecision::AlreadyClaimed => {
                if let Err(e) = uow.rollback().await {
                    tracing::warn!("Rollback after duplicate claim failed: {}", e);
                }
                tracing::debug!(player_id = %player_id, "Daily reward already claimed today");
                return Err(RewardError::AlreadyClaimed { next_claim });
            }
            StreakDecision::Claimable { streak } => streak,
        };

        let amounts = payout(streak, &settings);
        let old_balance = player.credit_jijies(amounts.total);
        player.daily_streak = streak;
        player.last_daily_reward = Some(now);
        player.update_activity(now);

        uow.save_player(&player).await?;
        uow.commit().await?;

        tracing::info!(
            player_id = %player_id,
            streak,
            jijies = amounts.total,
            new_balance = player.jijies,
            "Daily reward claimed"
        );

        self.ctx.transaction_log.record(
            TransactionEvent::new(player_id, TransactionKind::DailyReward, amounts.total, DAILY_REWARD_SOURCE, now)
                .with_balances(old_balance, player.jijies)
                .with_streak(streak)
                .with_details(json!({
                    "base_reward": amounts.base,
                    "streak_bonus": amounts.bonus,
                })),
        );

        Ok(DailyRewardResult {
            player_id,
            streak,
            jijies: amounts.total,
            base_reward: amounts.base,
            streak_bonus: amounts.bonus,
            new_balance: player.jijies,
            next_claim,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::outbound::{PlayerRepositoryPort, SettingsRepositoryPort};
    use crate::application::services::test_support::{at, Harness};
    use crate::domain::entities::Player;
    use crate::domain::value_objects::GameSettings;
    use chrono::Duration;

    #[tokio::test]
    async fn test_first_claim_starts_streak() {
        let harness = Harness::new(1);
        let player = harness.add_player(Player::new("ash", at(2026, 3, 1, 8))).await;
        harness.clock.set(at(2026, 3, 1, 9));

        let result = RewardService::new(harness.ctx.clone())
            .claim_daily_reward(player.id)
            .await
            .unwrap();

        assert_eq!(result.streak, 1);
        assert_eq!(result.base_reward, 1000);
        assert_eq!(result.streak_bonus, 100);
        assert_eq!(result.jijies, 1100);
        assert_eq!(result.new_balance, 1100);
        assert_eq!(result.next_claim, NaiveDate::from_ymd_opt(2026, 3, 2).unwrap());

        let stored = harness.players.get_player(player.id).await.unwrap().unwrap();
        assert_eq!(stored.jijies, 1100);
        assert_eq!(stored.total_jijies_earned, 1100);
        assert_eq!(stored.daily_streak, 1);
        assert_eq!(stored.last_daily_reward, Some(at(2026, 3, 1, 9)));
    }

    #[tokio::test]
    async fn test_consecutive_day_continues_streak() {
        let harness = Harness::new(1);
        let mut player = Player::new("ash", at(2026, 2, 1, 0)).with_jijies(500);
        player.daily_streak = 2;
        player.last_daily_reward = Some(at(2026, 3, 1, 23));
        let player = harness.add_player(player).await;
        harness.clock.set(at(2026, 3, 2, 0) + Duration::minutes(5));

        let result = RewardService::new(harness.ctx.clone())
            .claim_daily_reward(player.id)
            .await
            .unwrap();

        assert_eq!(result.streak, 3);
        assert_eq!(result.jijies, 1300);
        assert_eq!(result.new_balance, 1800);

        let events = harness.log.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, TransactionKind::DailyReward);
        assert_eq!(events[0].amount, 1300);
        assert_eq!(events[0].old_balance, Some(500));
        assert_eq!(events[0].new_balance, Some(1800));
        assert_eq!(events[0].streak, Some(3));
        assert_eq!(events[0].source, DAILY_REWARD_SOURCE);
    }

    #[tokio::test]
    async fn test_skipped_day_resets_streak() {
        let harness = Harness::new(1);
        let mut player = Player::new("ash", at(2026, 2, 1, 0));
        player.daily_streak = 9;
        player.last_daily_reward = Some(at(2026, 3, 1, 12));
        let player = harness.add_player(player).await;
        harness.clock.set(at(2026, 3, 3, 12));

        let result = RewardService::new(harness.ctx.clone())
            .claim_daily_reward(player.id)
            .await
            .unwrap();

        assert_eq!(result.streak, 1);
        assert_eq!(result.jijies, 1100);
    }

    #[tokio::test]
    async fn test_bonus_is_capped() {
        let harness = Harness::new(1);
        let mut player = Player::new("ash", at(2026, 2, 1, 0));
        player.daily_streak = 30;
        player.last_daily_reward = Some(at(2026, 3, 1, 12));
        let player = harness.add_player(player).await;
        harness.clock.set(at(2026, 3, 2, 12));

        let result = RewardService::new(harness.ctx.clone())
            .claim_daily_reward(player.id)
            .await
            .unwrap();

        assert_eq!(result.streak, 31);
        assert_eq!(result.streak_bonus, 1000);
        assert_eq!(result.jijies, 2000);
    }

    #[tokio::test]
    async fn test_extreme_settings_saturate_instead_of_overflowing() {
        let harness = Harness::new(1);
        harness
            .settings
            .save(&GameSettings {
                daily_bonus_per_day: i64::MAX,
                daily_max_bonus: i64::MAX,
                ..GameSettings::default()
            })
            .await
            .unwrap();
        let mut player = Player::new("ash", at(2026, 2, 1, 0)).with_jijies(i64::MAX - 10);
        player.daily_streak = 1;
        player.last_daily_reward = Some(at(2026, 3, 1, 12));
        let player = harness.add_player(player).await;
        harness.clock.set(at(2026, 3, 2, 12));

        let result = RewardService::new(harness.ctx.clone())
            .claim_daily_reward(player.id)
            .await
            .unwrap();

        assert_eq!(result.streak, 2);
        assert_eq!(result.jijies, i64::MAX);
        assert_eq!(result.new_balance, i64::MAX);
    }

    #[tokio::test]
    async fn test_second_claim_same_day_changes_nothing() {
        let harness = Harness::new(1);
        let player = harness.add_player(Player::new("ash", at(2026, 3, 1, 0))).await;
        harness.clock.set(at(2026, 3, 1, 6));
        let service = RewardService::new(harness.ctx.clone());

        service.claim_daily_reward(player.id).await.unwrap();
        let after_first = harness.players.get_player(player.id).await.unwrap().unwrap();

        harness.clock.set(at(2026, 3, 1, 23));
        let err = service.claim_daily_reward(player.id).await.unwrap_err();
        match err {
            RewardError::AlreadyClaimed { next_claim } => {
                assert_eq!(next_claim, NaiveDate::from_ymd_opt(2026, 3, 2).unwrap())
            }
            other => panic!("unexpected error: {other:?}"),
        }

        let after_second = harness.players.get_player(player.id).await.unwrap().unwrap();
        assert_eq!(after_first, after_second);
        assert_eq!(harness.log.events().len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_player() {
        let harness = Harness::new(1);
        let missing = PlayerId::new();

        let err = RewardService::new(harness.ctx.clone())
            .claim_daily_reward(missing)
            .await
            .unwrap_err();
        assert!(matches!(err, RewardError::PlayerNotFound(id) if id == missing));
        assert!(harness.log.events().is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_claims_pay_once() {
        let harness = Harness::new(1);
        let player = harness.add_player(Player::new("ash", at(2026, 3, 1, 0))).await;
        harness.clock.set(at(2026, 3, 1, 10));
        let service = Arc::new(RewardService::new(harness.ctx.clone()));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let service = service.clone();
                tokio::spawn(async move { service.claim_daily_reward(player.id).await })
            })
            .collect();

        let mut successes = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => successes += 1,
                Err(RewardError::AlreadyClaimed { .. }) => {}
                Err(other) => panic!("unexpected error: {other:?}"),
            }
        }

        assert_eq!(successes, 1);
        let stored = harness.players.get_player(player.id).await.unwrap().unwrap();
        assert_eq!(stored.jijies, 1100);
        assert_eq!(harness.log.events().len(), 1);
    }

    #[tokio::test]
    async fn test_lock_timeout_reports_conflict() {
        let harness = Harness::with_lock_timeout(1, std::time::Duration::from_millis(20));
        let player = harness.add_player(Player::new("ash", at(2026, 3, 1, 0))).await;
        harness.clock.set(at(2026, 3, 1, 10));

        let mut holder = harness.players.begin().await.unwrap();
        holder.lock_player(player.id).await.unwrap();

        let err = RewardService::new(harness.ctx.clone())
            .claim_daily_reward(player.id)
            .await
            .unwrap_err();
        assert!(matches!(err, RewardError::Conflict(_)));

        holder.rollback().await.unwrap();
        let stored = harness.players.get_player(player.id).await.unwrap().unwrap();
        assert_eq!(stored.jijies, 0);
        assert!(harness.log.events().is_empty());
    }
}
