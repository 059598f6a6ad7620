use std::sync::Arc;
use tokio::sync::RwLock;
use crate::application::ports::outbound::{SettingsRepositoryPort, SettingsError};
use crate::domain::value_objects::GameSettings;

pub struct SettingsService {
    repository: Arc<dyn SettingsRepositoryPort>,
    cache: RwLock<Option<GameSettings>>,
}

impl SettingsService {
    pub fn new(repository: Arc<dyn SettingsRepositoryPort>) -> Self {
        Self {
            repository,
            cache: RwLock::new(None),
        }
    }

    /// Get current settings (cached)
    pub async fn get(&self) -> GameSettings {
        let cache = self.cache.read().await;
        if let Some(settings) = &*cache {
            return settings.clone();
        }
        drop(cache);

        self.reload().await
    }

    /// Drop the cache and load from the repository again.
    /// Falls back to env/defaults if storage is unavailable or returns
    /// settings that fail validation.
    pub async fn reload(&self) -> GameSettings {
        let loaded = self
            .repository
            .get()
            .await
            .and_then(|settings| settings.validate().map(|()| settings).map_err(SettingsError::from));
        let settings = match loaded {
            Ok(settings) => settings,
            Err(e) => {
                tracing::warn!("Failed to load game settings, using env defaults: {}", e);
                GameSettings::from_env()
            }
        };
        *self.cache.write().await = Some(settings.clone());
        settings
    }

    /// Validate, persist and cache. Invalid settings are neither stored nor cached.
    pub async fn update(&self, settings: GameSettings) -> Result<(), SettingsError> {
        settings.validate()?;
        self.repository.save(&settings).await?;
        *self.cache.write().await = Some(settings);
        Ok(())
    }

    /// Reset to env/defaults and clear stored values
    pub async fn reset(&self) -> Result<GameSettings, SettingsError> {
        let settings = self.repository.reset().await?;
        *self.cache.write().await = Some(settings.clone());
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct StubRepository {
        stored: Mutex<Option<GameSettings>>,
        fail: bool,
    }

    #[async_trait]
    impl SettingsRepositoryPort for StubRepository {
        async fn get(&self) -> Result<GameSettings, SettingsError> {
            if self.fail {
                return Err(SettingsError::Database("offline".to_string()));
            }
            Ok(self.stored.lock().unwrap().clone().unwrap_or_default())
        }

        async fn save(&self, settings: &GameSettings) -> Result<(), SettingsError> {
            *self.stored.lock().unwrap() = Some(settings.clone());
            Ok(())
        }

        async fn reset(&self) -> Result<GameSettings, SettingsError> {
            *self.stored.lock().unwrap() = None;
            Ok(GameSettings::default())
        }
    }

    #[tokio::test]
    async fn test_get_is_cached_until_reload() {
        let repository = Arc::new(StubRepository::default());
        let service = SettingsService::new(repository.clone());
        assert_eq!(service.get().await.daily_base_jijies, 1000);

        *repository.stored.lock().unwrap() = Some(GameSettings {
            daily_base_jijies: 5000,
            ..GameSettings::default()
        });
        assert_eq!(service.get().await.daily_base_jijies, 1000);
        assert_eq!(service.reload().await.daily_base_jijies, 5000);
        assert_eq!(service.get().await.daily_base_jijies, 5000);
    }

    #[tokio::test]
    async fn test_update_and_reset() {
        let repository = Arc::new(StubRepository::default());
        let service = SettingsService::new(repository.clone());

        let custom = GameSettings {
            daily_max_bonus: 50,
            ..GameSettings::default()
        };
        service.update(custom.clone()).await.unwrap();
        assert_eq!(service.get().await, custom);
        assert_eq!(repository.stored.lock().unwrap().clone(), Some(custom));

        let reset = service.reset().await.unwrap();
        assert_eq!(reset, GameSettings::default());
        assert_eq!(service.get().await, GameSettings::default());
    }

    #[tokio::test]
    async fn test_update_rejects_invalid_settings() {
        let repository = Arc::new(StubRepository::default());
        let service = SettingsService::new(repository.clone());
        let before = service.get().await;

        let result = service
            .update(GameSettings {
                daily_max_bonus: -5000,
                ..GameSettings::default()
            })
            .await;

        assert!(matches!(result, Err(SettingsError::Invalid(_))));
        assert_eq!(repository.stored.lock().unwrap().clone(), None);
        assert_eq!(service.get().await, before);
    }

    #[tokio::test]
    async fn test_invalid_stored_settings_fall_back_on_reload() {
        let repository = Arc::new(StubRepository::default());
        *repository.stored.lock().unwrap() = Some(GameSettings {
            base_capture_chance: -3.0,
            ..GameSettings::default()
        });
        let service = SettingsService::new(repository);

        assert_eq!(service.reload().await.base_capture_chance, GameSettings::from_env().base_capture_chance);
    }

    #[tokio::test]
    async fn test_storage_failure_falls_back_to_defaults() {
        let service = SettingsService::new(Arc::new(StubRepository {
            fail: true,
            ..StubRepository::default()
        }));
        assert_eq!(service.get().await.daily_bonus_per_day, GameSettings::from_env().daily_bonus_per_day);
    }
}
