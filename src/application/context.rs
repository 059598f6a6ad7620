//! Game context - the explicitly constructed dependencies every service uses
//!
//! Built once at startup and shared behind an `Arc`. Settings have an
//! explicit `init` / `reload` lifecycle instead of living in global state.

use std::sync::{Arc, Mutex, PoisonError};

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::application::ports::outbound::{
    ClockPort, EspritCatalogPort, PlayerRepositoryPort, TransactionLogPort,
};
use crate::application::services::SettingsService;
use crate::domain::services::LevelProgression;
use crate::domain::value_objects::GameSettings;

/// Process-wide randomness, swappable for a seeded generator in tests
#[derive(Clone)]
pub struct RandomSource {
    inner: Arc<Mutex<StdRng>>,
}

impl RandomSource {
    pub fn from_entropy() -> Self {
        Self::from_rng(StdRng::from_entropy())
    }

    pub fn seeded(seed: u64) -> Self {
        Self::from_rng(StdRng::seed_from_u64(seed))
    }

    pub fn from_rng(rng: StdRng) -> Self {
        Self {
            inner: Arc::new(Mutex::new(rng)),
        }
    }

    /// Run `f` with exclusive access to the generator. Never hold this across an await.
    pub fn with<T>(&self, f: impl FnOnce(&mut StdRng) -> T) -> T {
        let mut rng = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut rng)
    }
}

impl Default for RandomSource {
    fn default() -> Self {
        Self::from_entropy()
    }
}

/// Dependencies shared by the application services
pub struct GameContext {
    pub players: Arc<dyn PlayerRepositoryPort>,
    pub catalog: Arc<dyn EspritCatalogPort>,
    pub transaction_log: Arc<dyn TransactionLogPort>,
    pub clock: Arc<dyn ClockPort>,
    pub settings: Arc<SettingsService>,
    pub leveling: Arc<dyn LevelProgression>,
    pub rng: RandomSource,
}

impl GameContext {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        players: Arc<dyn PlayerRepositoryPort>,
        catalog: Arc<dyn EspritCatalogPort>,
        transaction_log: Arc<dyn TransactionLogPort>,
        clock: Arc<dyn ClockPort>,
        settings: Arc<SettingsService>,
        leveling: Arc<dyn LevelProgression>,
        rng: RandomSource,
    ) -> Self {
        Self {
            players,
            catalog,
            transaction_log,
            clock,
            settings,
            leveling,
            rng,
        }
    }

    /// Load settings before the first request is served
    pub async fn init(&self) -> GameSettings {
        let settings = self.settings.reload().await;
        tracing::info!(?settings, "Game settings loaded");
        settings
    }

    /// Re-read settings from storage. Last write wins.
    pub async fn reload_settings(&self) -> GameSettings {
        let settings = self.settings.reload().await;
        tracing::info!(?settings, "Game settings reloaded");
        settings
    }
}
