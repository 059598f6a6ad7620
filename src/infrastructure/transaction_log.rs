//! Transaction log adapters
//!
//! `ChannelTransactionLog` hands events to an unbounded channel so recording
//! never blocks a gameplay call. A background worker drains the channel into
//! a `TransactionLogSink`. Events that cannot be persisted are written to the
//! error log in full.

use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use sqlx::SqlitePool;
use tokio::sync::mpsc;

use crate::application::ports::outbound::{RepositoryError, TransactionLogPort};
use crate::domain::events::TransactionEvent;
use crate::infrastructure::persistence::map_sqlx_error;

/// Where the worker persists events
#[async_trait]
pub trait TransactionLogSink: Send + Sync {
    async fn write(&self, event: &TransactionEvent) -> Result<(), RepositoryError>;
}

pub struct ChannelTransactionLog {
    sender: mpsc::UnboundedSender<TransactionEvent>,
}

impl ChannelTransactionLog {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<TransactionEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl TransactionLogPort for ChannelTransactionLog {
    fn record(&self, event: TransactionEvent) {
        if let Err(mpsc::error::SendError(event)) = self.sender.send(event) {
            report_lost(&event, "transaction log worker has stopped");
        }
    }
}

/// Drain `receiver` into `sink` until every sender is dropped
pub async fn transaction_log_worker(
    mut receiver: mpsc::UnboundedReceiver<TransactionEvent>,
    sink: Arc<dyn TransactionLogSink>,
) {
    tracing::info!("Starting transaction log worker");
    let mut written = 0u64;
    while let Some(event) = receiver.recv().await {
        match sink.write(&event).await {
            Ok(()) => written += 1,
            Err(e) => report_lost(&event, &e.to_string()),
        }
    }
    tracing::info!(written, "Transaction log worker stopped");
}

fn report_lost(event: &TransactionEvent, reason: &str) {
    let payload = serde_json::to_string(event).unwrap_or_else(|e| format!("{:?} ({})", event, e));
    tracing::error!(
        player_id = %event.player_id,
        kind = event.kind.as_str(),
        event = %payload,
        "Failed to persist transaction event: {}",
        reason
    );
}

/// Appends events to the `transaction_log` table
pub struct SqliteTransactionLogSink {
    pool: SqlitePool,
}

impl SqliteTransactionLogSink {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TransactionLogSink for SqliteTransactionLogSink {
    async fn write(&self, event: &TransactionEvent) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO transaction_log (player_id, kind, amount, old_balance, new_balance,
                streak, source, details_json, occurred_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(event.player_id.to_string())
        .bind(event.kind.as_str())
        .bind(event.amount)
        .bind(event.old_balance)
        .bind(event.new_balance)
        .bind(event.streak)
        .bind(&event.source)
        .bind(event.details.to_string())
        .bind(event.occurred_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(())
    }
}

/// Collects events in memory
#[derive(Default)]
pub struct InMemoryTransactionLog {
    events: Mutex<Vec<TransactionEvent>>,
}

impl InMemoryTransactionLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<TransactionEvent> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl TransactionLogPort for InMemoryTransactionLog {
    fn record(&self, event: TransactionEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}
