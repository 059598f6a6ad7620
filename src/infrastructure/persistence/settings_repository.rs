use async_trait::async_trait;
use sqlx::SqlitePool;
use crate::application::ports::outbound::{SettingsRepositoryPort, SettingsError};
use crate::domain::value_objects::GameSettings;

pub struct SqliteSettingsRepository {
    pool: SqlitePool,
}

impl SqliteSettingsRepository {
    pub async fn new(pool: SqlitePool) -> Result<Self, sqlx::Error> {
        // Create table if not exists
        sqlx::query(r#"
            CREATE TABLE IF NOT EXISTS settings (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
            )
        "#).execute(&pool).await?;

        Ok(Self { pool })
    }
}

#[async_trait]
impl SettingsRepositoryPort for SqliteSettingsRepository {
    async fn get(&self) -> Result<GameSettings, SettingsError> {
        let mut settings = GameSettings::from_env(); // Start with env defaults

        // Override with DB values
        let rows: Vec<(String, String)> = sqlx::query_as("SELECT key, value FROM settings")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| SettingsError::Database(e.to_string()))?;

        for (key, value) in rows {
            if !settings.apply_override(&key, &value) {
                tracing::warn!("Ignoring stored setting {} = {:?}", key, value);
            }
        }

        Ok(settings)
    }

    async fn save(&self, settings: &GameSettings) -> Result<(), SettingsError> {
        settings.validate()?;
        let mut tx = self.pool.begin().await.map_err(|e| SettingsError::Database(e.to_string()))?;

        for (key, value) in settings.to_pairs() {
            sqlx::query("INSERT OR REPLACE INTO settings (key, value, updated_at) VALUES (?, ?, CURRENT_TIMESTAMP)")
                .bind(key)
                .bind(value)
                .execute(&mut *tx)
                .await
                .map_err(|e| SettingsError::Database(e.to_string()))?;
        }

        tx.commit().await.map_err(|e| SettingsError::Database(e.to_string()))
    }

    async fn reset(&self) -> Result<GameSettings, SettingsError> {
        sqlx::query("DELETE FROM settings")
            .execute(&self.pool)
            .await
            .map_err(|e| SettingsError::Database(e.to_string()))?;

        Ok(GameSettings::from_env())
    }
}
