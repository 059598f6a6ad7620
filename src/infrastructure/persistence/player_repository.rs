//! SQLite player repository and unit of work
//!
//! SQLite has no row locks. `lock_player` takes the database writer lock with
//! a no-op update, which serializes every writing unit of work in the
//! process. Waits are bounded by the connection's busy timeout and surface as
//! `RepositoryError::Conflict`.

use std::collections::BTreeMap;

use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::{Sqlite, SqliteConnection, SqlitePool, Transaction};

use super::{column, decode_element, decode_time, encode_time, map_sqlx_error};
use crate::application::ports::outbound::{PlayerRepositoryPort, PlayerUnitOfWork, RepositoryError};
use crate::domain::entities::{Esprit, Player};
use crate::domain::value_objects::{EspritBaseId, EspritId, PlayerId};

const PLAYER_COLUMNS: &str = "id, username, level, experience, jijies, total_jijies_earned, \
     inventory_json, daily_streak, last_daily_reward, last_active, created_at";

const ESPRIT_COLUMNS: &str = "id, esprit_base_id, owner_id, quantity, tier, awakening_level, \
     element, created_at, last_modified";

pub struct SqlitePlayerRepository {
    pool: SqlitePool,
}

impl SqlitePlayerRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PlayerRepositoryPort for SqlitePlayerRepository {
    async fn begin(&self) -> Result<Box<dyn PlayerUnitOfWork>, RepositoryError> {
        let tx = self.pool.begin().await.map_err(map_sqlx_error)?;
        Ok(Box::new(SqliteUnitOfWork { tx: Some(tx) }))
    }

    async fn get_player(&self, id: PlayerId) -> Result<Option<Player>, RepositoryError> {
        let row = sqlx::query(&format!("SELECT {} FROM players WHERE id = ?", PLAYER_COLUMNS))
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        row.as_ref().map(player_from_row).transpose()
    }

    async fn list_esprits(&self, owner_id: PlayerId) -> Result<Vec<Esprit>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM esprits WHERE owner_id = ? ORDER BY created_at, id",
            ESPRIT_COLUMNS
        ))
        .bind(owner_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        rows.iter().map(esprit_from_row).collect()
    }
}

/// A sqlx transaction. Dropping it unfinished rolls back.
pub struct SqliteUnitOfWork {
    tx: Option<Transaction<'static, Sqlite>>,
}

impl SqliteUnitOfWork {
    fn conn(&mut self) -> Result<&mut SqliteConnection, RepositoryError> {
        self.tx.as_deref_mut().ok_or(RepositoryError::TransactionClosed)
    }
}

#[async_trait]
impl PlayerUnitOfWork for SqliteUnitOfWork {
    async fn lock_player(&mut self, id: PlayerId) -> Result<Option<Player>, RepositoryError> {
        let conn = self.conn()?;

        let touched = sqlx::query("UPDATE players SET id = id WHERE id = ?")
            .bind(id.to_string())
            .execute(&mut *conn)
            .await
            .map_err(map_sqlx_error)?;
        if touched.rows_affected() == 0 {
            return Ok(None);
        }

        let row = sqlx::query(&format!("SELECT {} FROM players WHERE id = ?", PLAYER_COLUMNS))
            .bind(id.to_string())
            .fetch_optional(&mut *conn)
            .await
            .map_err(map_sqlx_error)?;

        row.as_ref().map(player_from_row).transpose()
    }

    async fn insert_player(&mut self, player: &Player) -> Result<(), RepositoryError> {
        let inventory = encode_inventory(&player.inventory)?;
        let conn = self.conn()?;

        sqlx::query(
            r#"
            INSERT INTO players (id, username, level, experience, jijies, total_jijies_earned,
                inventory_json, daily_streak, last_daily_reward, last_active, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(player.id.to_string())
        .bind(&player.username)
        .bind(player.level)
        .bind(player.experience)
        .bind(player.jijies)
        .bind(player.total_jijies_earned)
        .bind(inventory)
        .bind(player.daily_streak)
        .bind(player.last_daily_reward.as_ref().map(encode_time))
        .bind(encode_time(&player.last_active))
        .bind(encode_time(&player.created_at))
        .execute(&mut *conn)
        .await
        .map_err(map_sqlx_error)?;

        Ok(())
    }

    async fn save_player(&mut self, player: &Player) -> Result<(), RepositoryError> {
        let inventory = encode_inventory(&player.inventory)?;
        let conn = self.conn()?;

        let result = sqlx::query(
            r#"
            UPDATE players
            SET username = ?, level = ?, experience = ?, jijies = ?, total_jijies_earned = ?,
                inventory_json = ?, daily_streak = ?, last_daily_reward = ?, last_active = ?
            WHERE id = ?
            "#,
        )
        .bind(&player.username)
        .bind(player.level)
        .bind(player.experience)
        .bind(player.jijies)
        .bind(player.total_jijies_earned)
        .bind(inventory)
        .bind(player.daily_streak)
        .bind(player.last_daily_reward.as_ref().map(encode_time))
        .bind(encode_time(&player.last_active))
        .bind(player.id.to_string())
        .execute(&mut *conn)
        .await
        .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(format!("player {}", player.id)));
        }
        Ok(())
    }

    async fn add_esprit(&mut self, esprit: &Esprit) -> Result<Esprit, RepositoryError> {
        let conn = self.conn()?;

        let existing = sqlx::query(&format!(
            "SELECT {} FROM esprits WHERE owner_id = ? AND esprit_base_id = ?",
            ESPRIT_COLUMNS
        ))
        .bind(esprit.owner_id.to_string())
        .bind(esprit.esprit_base_id.to_string())
        .fetch_optional(&mut *conn)
        .await
        .map_err(map_sqlx_error)?;

        if let Some(row) = existing {
            let mut stack = esprit_from_row(&row)?;
            stack.quantity += esprit.quantity;
            stack.last_modified = esprit.last_modified;

            sqlx::query("UPDATE esprits SET quantity = ?, last_modified = ? WHERE id = ?")
                .bind(stack.quantity)
                .bind(encode_time(&stack.last_modified))
                .bind(stack.id.to_string())
                .execute(&mut *conn)
                .await
                .map_err(map_sqlx_error)?;

            return Ok(stack);
        }

        sqlx::query(
            r#"
            INSERT INTO esprits (id, esprit_base_id, owner_id, quantity, tier, awakening_level,
                element, created_at, last_modified)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(esprit.id.to_string())
        .bind(esprit.esprit_base_id.to_string())
        .bind(esprit.owner_id.to_string())
        .bind(esprit.quantity)
        .bind(esprit.tier)
        .bind(esprit.awakening_level)
        .bind(esprit.element.as_str())
        .bind(encode_time(&esprit.created_at))
        .bind(encode_time(&esprit.last_modified))
        .execute(&mut *conn)
        .await
        .map_err(map_sqlx_error)?;

        Ok(esprit.clone())
    }

    async fn commit(&mut self) -> Result<(), RepositoryError> {
        let tx = self.tx.take().ok_or(RepositoryError::TransactionClosed)?;
        tx.commit().await.map_err(map_sqlx_error)
    }

    async fn rollback(&mut self) -> Result<(), RepositoryError> {
        let tx = self.tx.take().ok_or(RepositoryError::TransactionClosed)?;
        tx.rollback().await.map_err(map_sqlx_error)
    }
}

fn encode_inventory(inventory: &BTreeMap<String, u32>) -> Result<String, RepositoryError> {
    serde_json::to_string(inventory).map_err(|e| RepositoryError::Database(e.to_string()))
}

fn parse_id<T>(value: &str, parse: fn(&str) -> Result<T, uuid::Error>) -> Result<T, RepositoryError> {
    parse(value).map_err(|e| RepositoryError::Database(format!("Invalid id '{}': {}", value, e)))
}

fn player_from_row(row: &SqliteRow) -> Result<Player, RepositoryError> {
    let id: String = column(row, "id")?;
    let inventory_json: String = column(row, "inventory_json")?;
    let last_daily_reward: Option<String> = column(row, "last_daily_reward")?;
    let last_active: String = column(row, "last_active")?;
    let created_at: String = column(row, "created_at")?;

    Ok(Player {
        id: parse_id(&id, PlayerId::parse)?,
        username: column(row, "username")?,
        level: column(row, "level")?,
        experience: column(row, "experience")?,
        jijies: column(row, "jijies")?,
        total_jijies_earned: column(row, "total_jijies_earned")?,
        inventory: serde_json::from_str(&inventory_json)
            .map_err(|e| RepositoryError::Database(format!("Invalid inventory: {}", e)))?,
        daily_streak: column(row, "daily_streak")?,
        last_daily_reward: last_daily_reward.as_deref().map(decode_time).transpose()?,
        last_active: decode_time(&last_active)?,
        created_at: decode_time(&created_at)?,
    })
}

fn esprit_from_row(row: &SqliteRow) -> Result<Esprit, RepositoryError> {
    let id: String = column(row, "id")?;
    let base_id: String = column(row, "esprit_base_id")?;
    let owner_id: String = column(row, "owner_id")?;
    let element: String = column(row, "element")?;
    let created_at: String = column(row, "created_at")?;
    let last_modified: String = column(row, "last_modified")?;

    Ok(Esprit {
        id: parse_id(&id, EspritId::parse)?,
        esprit_base_id: parse_id(&base_id, EspritBaseId::parse)?,
        owner_id: parse_id(&owner_id, PlayerId::parse)?,
        quantity: column(row, "quantity")?,
        tier: column(row, "tier")?,
        awakening_level: column(row, "awakening_level")?,
        element: decode_element(&element)?,
        created_at: decode_time(&created_at)?,
        last_modified: decode_time(&last_modified)?,
    })
}
