//! In-memory adapters for development and testing
//!
//! Unlike SQLite these hold a real lock per player: each player id maps to an
//! async mutex that a unit of work keeps until it commits or rolls back.
//! Writes are staged inside the unit of work and applied in one step on
//! commit, so readers never observe half of a mutation.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard, RwLock};

use crate::application::ports::outbound::{
    EspritCatalogPort, PlayerRepositoryPort, PlayerUnitOfWork, RepositoryError, SettingsError,
    SettingsRepositoryPort,
};
use crate::domain::entities::{Esprit, EspritBase, Player};
use crate::domain::value_objects::{EspritBaseId, GameSettings, PlayerId};

const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(5);

type StackKey = (PlayerId, EspritBaseId);

#[derive(Default)]
struct Store {
    players: HashMap<PlayerId, Player>,
    esprits: HashMap<StackKey, Esprit>,
}

#[derive(Default)]
struct LockTable {
    locks: Mutex<HashMap<PlayerId, Arc<AsyncMutex<()>>>>,
}

impl LockTable {
    fn lock_for(&self, id: PlayerId) -> Arc<AsyncMutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        locks.entry(id).or_default().clone()
    }

    /// Forget locks nobody holds or waits on
    fn prune(&self, ids: impl IntoIterator<Item = PlayerId>) {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        for id in ids {
            if locks.get(&id).is_some_and(|lock| Arc::strong_count(lock) == 1) {
                locks.remove(&id);
            }
        }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.locks.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

// =============================================================================
// Players
// =============================================================================

pub struct InMemoryPlayerRepository {
    store: Arc<RwLock<Store>>,
    locks: Arc<LockTable>,
    lock_timeout: Duration,
}

impl InMemoryPlayerRepository {
    pub fn new() -> Self {
        Self::with_lock_timeout(DEFAULT_LOCK_TIMEOUT)
    }

    pub fn with_lock_timeout(lock_timeout: Duration) -> Self {
        Self {
            store: Arc::new(RwLock::new(Store::default())),
            locks: Arc::new(LockTable::default()),
            lock_timeout,
        }
    }
}

impl Default for InMemoryPlayerRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PlayerRepositoryPort for InMemoryPlayerRepository {
    async fn begin(&self) -> Result<Box<dyn PlayerUnitOfWork>, RepositoryError> {
        Ok(Box::new(InMemoryUnitOfWork {
            store: self.store.clone(),
            locks: self.locks.clone(),
            lock_timeout: self.lock_timeout,
            held: HashMap::new(),
            players: HashMap::new(),
            esprits: HashMap::new(),
            closed: false,
        }))
    }

    async fn get_player(&self, id: PlayerId) -> Result<Option<Player>, RepositoryError> {
        Ok(self.store.read().await.players.get(&id).cloned())
    }

    async fn list_esprits(&self, owner_id: PlayerId) -> Result<Vec<Esprit>, RepositoryError> {
        let store = self.store.read().await;
        let mut owned: Vec<Esprit> = store
            .esprits
            .values()
            .filter(|esprit| esprit.owner_id == owner_id)
            .cloned()
            .collect();
        owned.sort_by_key(|esprit| (esprit.created_at, esprit.id));
        Ok(owned)
    }
}

struct InMemoryUnitOfWork {
    store: Arc<RwLock<Store>>,
    locks: Arc<LockTable>,
    lock_timeout: Duration,
    held: HashMap<PlayerId, OwnedMutexGuard<()>>,
    players: HashMap<PlayerId, Player>,
    esprits: HashMap<StackKey, Esprit>,
    closed: bool,
}

impl InMemoryUnitOfWork {
    fn ensure_open(&self) -> Result<(), RepositoryError> {
        if self.closed {
            Err(RepositoryError::TransactionClosed)
        } else {
            Ok(())
        }
    }

    async fn acquire(&mut self, id: PlayerId) -> Result<(), RepositoryError> {
        if self.held.contains_key(&id) {
            return Ok(());
        }
        let lock = self.locks.lock_for(id);
        let guard = tokio::time::timeout(self.lock_timeout, lock.lock_owned())
            .await
            .map_err(|_| RepositoryError::Conflict(format!("player {} is locked", id)))?;
        self.held.insert(id, guard);
        Ok(())
    }

    fn release_locks(&mut self) {
        let ids: Vec<PlayerId> = self.held.keys().copied().collect();
        self.held.clear();
        self.locks.prune(ids);
    }

    fn finish(&mut self) {
        self.players.clear();
        self.esprits.clear();
        self.release_locks();
        self.closed = true;
    }
}

impl Drop for InMemoryUnitOfWork {
    fn drop(&mut self) {
        self.release_locks();
    }
}

#[async_trait]
impl PlayerUnitOfWork for InMemoryUnitOfWork {
    async fn lock_player(&mut self, id: PlayerId) -> Result<Option<Player>, RepositoryError> {
        self.ensure_open()?;
        if let Some(staged) = self.players.get(&id) {
            return Ok(Some(staged.clone()));
        }
        if !self.store.read().await.players.contains_key(&id) {
            return Ok(None);
        }

        self.acquire(id).await?;
        // Re-read under the lock to see the latest committed state
        Ok(self.store.read().await.players.get(&id).cloned())
    }

    async fn insert_player(&mut self, player: &Player) -> Result<(), RepositoryError> {
        self.ensure_open()?;
        if self.players.contains_key(&player.id)
            || self.store.read().await.players.contains_key(&player.id)
        {
            return Err(RepositoryError::Database(format!("player {} already exists", player.id)));
        }
        self.acquire(player.id).await?;
        self.players.insert(player.id, player.clone());
        Ok(())
    }

    async fn save_player(&mut self, player: &Player) -> Result<(), RepositoryError> {
        self.ensure_open()?;
        if !self.held.contains_key(&player.id) {
            return Err(RepositoryError::Database(format!(
                "player {} was not locked in this unit of work",
                player.id
            )));
        }
        self.players.insert(player.id, player.clone());
        Ok(())
    }

    async fn add_esprit(&mut self, esprit: &Esprit) -> Result<Esprit, RepositoryError> {
        self.ensure_open()?;
        let key = (esprit.owner_id, esprit.esprit_base_id);

        let existing = match self.esprits.get(&key) {
            Some(staged) => Some(staged.clone()),
            None => self.store.read().await.esprits.get(&key).cloned(),
        };

        let stack = match existing {
            Some(mut stack) => {
                stack.quantity += esprit.quantity;
                stack.last_modified = esprit.last_modified;
                stack
            }
            None => esprit.clone(),
        };
        self.esprits.insert(key, stack.clone());
        Ok(stack)
    }

    async fn commit(&mut self) -> Result<(), RepositoryError> {
        self.ensure_open()?;
        {
            let mut store = self.store.write().await;
            for (id, player) in self.players.drain() {
                store.players.insert(id, player);
            }
            for (key, esprit) in self.esprits.drain() {
                store.esprits.insert(key, esprit);
            }
        }
        self.finish();
        Ok(())
    }

    async fn rollback(&mut self) -> Result<(), RepositoryError> {
        self.ensure_open()?;
        self.finish();
        Ok(())
    }
}

// =============================================================================
// Catalog
// =============================================================================

#[derive(Default)]
pub struct InMemoryEspritCatalog {
    bases: RwLock<Vec<EspritBase>>,
}

impl InMemoryEspritCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_bases(bases: Vec<EspritBase>) -> Self {
        Self {
            bases: RwLock::new(bases),
        }
    }
}

#[async_trait]
impl EspritCatalogPort for InMemoryEspritCatalog {
    async fn find_by_name(&self, name: &str) -> Result<Option<EspritBase>, RepositoryError> {
        let wanted = name.trim().to_lowercase();
        let bases = self.bases.read().await;
        Ok(bases
            .iter()
            .find(|base| base.name.to_lowercase() == wanted)
            .cloned())
    }

    async fn get(&self, id: EspritBaseId) -> Result<Option<EspritBase>, RepositoryError> {
        let bases = self.bases.read().await;
        Ok(bases.iter().find(|base| base.id == id).cloned())
    }

    async fn list_by_tiers(&self, tiers: &[u32]) -> Result<Vec<EspritBase>, RepositoryError> {
        let bases = self.bases.read().await;
        let mut matching: Vec<EspritBase> = bases
            .iter()
            .filter(|base| tiers.contains(&base.base_tier))
            .cloned()
            .collect();
        matching.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(matching)
    }

    async fn insert(&self, base: &EspritBase) -> Result<(), RepositoryError> {
        let mut bases = self.bases.write().await;
        let name = base.name.to_lowercase();
        if bases.iter().any(|existing| existing.name.to_lowercase() == name) {
            return Err(RepositoryError::Database(format!("species {} already exists", base.name)));
        }
        bases.push(base.clone());
        Ok(())
    }
}

// =============================================================================
// Settings
// =============================================================================

#[derive(Default)]
pub struct InMemorySettingsRepository {
    stored: RwLock<Option<GameSettings>>,
}

impl InMemorySettingsRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SettingsRepositoryPort for InMemorySettingsRepository {
    async fn get(&self) -> Result<GameSettings, SettingsError> {
        Ok(self.stored.read().await.clone().unwrap_or_else(GameSettings::from_env))
    }

    async fn save(&self, settings: &GameSettings) -> Result<(), SettingsError> {
        settings.validate()?;
        *self.stored.write().await = Some(settings.clone());
        Ok(())
    }

    async fn reset(&self) -> Result<GameSettings, SettingsError> {
        *self.stored.write().await = None;
        Ok(GameSettings::from_env())
    }
}
