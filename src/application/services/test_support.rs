//! Shared fixtures for service tests

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};

use crate::application::context::{GameContext, RandomSource};
use crate::application::ports::outbound::{EspritCatalogPort, PlayerRepositoryPort};
use crate::application::services::SettingsService;
use crate::domain::entities::{EspritBase, Player};
use crate::domain::services::CurveProgression;
use crate::infrastructure::clock::FixedClock;
use crate::infrastructure::persistence::{
    InMemoryEspritCatalog, InMemoryPlayerRepository, InMemorySettingsRepository,
};
use crate::infrastructure::transaction_log::InMemoryTransactionLog;

pub fn at(year: i32, month: u32, day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, hour, 0, 0).unwrap()
}

pub struct Harness {
    pub ctx: Arc<GameContext>,
    pub players: Arc<InMemoryPlayerRepository>,
    pub catalog: Arc<InMemoryEspritCatalog>,
    pub settings: Arc<InMemorySettingsRepository>,
    pub log: Arc<InMemoryTransactionLog>,
    pub clock: Arc<FixedClock>,
}

impl Harness {
    pub fn new(seed: u64) -> Self {
        Self::with_lock_timeout(seed, Duration::from_secs(5))
    }

    pub fn with_lock_timeout(seed: u64, lock_timeout: Duration) -> Self {
        let players = Arc::new(InMemoryPlayerRepository::with_lock_timeout(lock_timeout));
        let catalog = Arc::new(InMemoryEspritCatalog::new());
        let settings = Arc::new(InMemorySettingsRepository::new());
        let log = Arc::new(InMemoryTransactionLog::new());
        let clock = Arc::new(FixedClock::new(at(2026, 1, 1, 0)));

        let ctx = Arc::new(GameContext::new(
            players.clone(),
            catalog.clone(),
            log.clone(),
            clock.clone(),
            Arc::new(SettingsService::new(settings.clone())),
            Arc::new(CurveProgression::default()),
            RandomSource::seeded(seed),
        ));

        Self {
            ctx,
            players,
            catalog,
            settings,
            log,
            clock,
        }
    }

    pub async fn add_player(&self, player: Player) -> Player {
        let mut uow = self.players.begin().await.unwrap();
        uow.insert_player(&player).await.unwrap();
        uow.commit().await.unwrap();
        player
    }

    pub async fn add_species(&self, base: EspritBase) -> EspritBase {
        self.catalog.insert(&base).await.unwrap();
        base
    }
}
