//! Shared application state

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::mpsc;

use crate::application::context::{GameContext, RandomSource};
use crate::application::services::{GameEngine, SettingsService};
use crate::domain::events::TransactionEvent;
use crate::domain::services::CurveProgression;
use crate::infrastructure::clock::SystemClock;
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::persistence::SqlitePersistence;
use crate::infrastructure::transaction_log::{
    transaction_log_worker, ChannelTransactionLog, SqliteTransactionLogSink,
};

/// Shared application state
pub struct AppState {
    pub config: AppConfig,
    pub persistence: SqlitePersistence,
    pub engine: Arc<GameEngine>,
}

/// The audit worker, returned separately so the caller decides where it runs
pub struct TransactionLogWorker {
    receiver: mpsc::UnboundedReceiver<TransactionEvent>,
    sink: Arc<SqliteTransactionLogSink>,
}

impl TransactionLogWorker {
    pub async fn run(self) {
        transaction_log_worker(self.receiver, self.sink).await;
    }
}

impl AppState {
    pub async fn new(config: AppConfig) -> Result<(Self, TransactionLogWorker)> {
        // Initialize SQLite persistence
        let persistence = SqlitePersistence::connect(
            &config.database_url,
            config.max_connections,
            config.lock_timeout(),
        )
        .await?;

        let settings_repository = persistence
            .settings()
            .await
            .context("Failed to initialize settings table")?;
        let settings = Arc::new(SettingsService::new(Arc::new(settings_repository)));

        let (transaction_log, receiver) = ChannelTransactionLog::new();
        let worker = TransactionLogWorker {
            receiver,
            sink: Arc::new(SqliteTransactionLogSink::new(persistence.pool().clone())),
        };

        let rng = match config.rng_seed {
            Some(seed) => {
                tracing::warn!(seed, "Using a fixed RNG seed");
                RandomSource::seeded(seed)
            }
            None => RandomSource::from_entropy(),
        };

        let ctx = Arc::new(GameContext::new(
            Arc::new(persistence.players()),
            Arc::new(persistence.catalog()),
            Arc::new(transaction_log),
            Arc::new(SystemClock),
            settings,
            Arc::new(CurveProgression::default()),
            rng,
        ));
        ctx.init().await;

        Ok((
            Self {
                config,
                persistence,
                engine: Arc::new(GameEngine::new(ctx)),
            },
            worker,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::inbound::GameUseCases;
    use crate::application::ports::outbound::PlayerRepositoryPort;
    use crate::domain::entities::Player;
    use chrono::Utc;

    #[tokio::test]
    async fn test_bootstrap_claims_and_audits() {
        let config = AppConfig {
            database_url: "sqlite::memory:".to_string(),
            max_connections: 1,
            lock_timeout_ms: 500,
            rng_seed: Some(7),
        };
        let (state, worker) = AppState::new(config).await.unwrap();
        let worker = tokio::spawn(worker.run());

        let player = Player::new("ash", Utc::now());
        let players = state.persistence.players();
        let mut uow = players.begin().await.unwrap();
        uow.insert_player(&player).await.unwrap();
        uow.commit().await.unwrap();

        let claim = state.engine.claim_daily_reward(player.id).await.unwrap();
        assert_eq!(claim.jijies, 1100);

        let persistence = state.persistence.clone();
        drop(state);
        worker.await.unwrap();

        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM transaction_log WHERE kind = 'daily_reward'")
            .fetch_one(persistence.pool())
            .await
            .unwrap();
        assert_eq!(count, 1);
    }
}
