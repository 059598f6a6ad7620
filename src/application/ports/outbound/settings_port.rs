use async_trait::async_trait;

use crate::domain::value_objects::{ConfigError, GameSettings};

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Invalid settings: {0}")]
    Invalid(#[from] ConfigError),
}

#[async_trait]
pub trait SettingsRepositoryPort: Send + Sync {
    async fn get(&self) -> Result<GameSettings, SettingsError>;
    async fn save(&self, settings: &GameSettings) -> Result<(), SettingsError>;
    async fn reset(&self) -> Result<GameSettings, SettingsError>;
}
