//! Repository ports - Interfaces for player and reference data persistence
//!
//! These traits define the contracts that infrastructure repositories must implement.
//! Application services depend on these traits, not concrete implementations.

use async_trait::async_trait;

use crate::domain::entities::{Esprit, EspritBase, Player};
use crate::domain::value_objects::{EspritBaseId, PlayerId};

/// Persistence failures, split so callers can tell contention from breakage
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RepositoryError {
    #[error("Database error: {0}")]
    Database(String),

    /// The row lock could not be acquired in time
    #[error("Lock contention: {0}")]
    Conflict(String),

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Unit of work already completed")]
    TransactionClosed,
}

// =============================================================================
// Player Unit of Work
// =============================================================================

/// A scoped transaction over player-owned rows.
///
/// Every player read through `lock_player` stays exclusively locked until
/// `commit` or `rollback`. Dropping an unfinished unit of work rolls it back,
/// so a mutation is either fully visible after `commit` or not at all.
#[async_trait]
pub trait PlayerUnitOfWork: Send {
    /// Read a player and hold its row lock for the rest of the unit of work
    async fn lock_player(&mut self, id: PlayerId) -> Result<Option<Player>, RepositoryError>;

    /// Insert a new player row
    async fn insert_player(&mut self, player: &Player) -> Result<(), RepositoryError>;

    /// Write back a player previously locked in this unit of work
    async fn save_player(&mut self, player: &Player) -> Result<(), RepositoryError>;

    /// Add esprits to the owner's collection, stacking onto an existing stack
    /// of the same species. Returns the resulting stack.
    async fn add_esprit(&mut self, esprit: &Esprit) -> Result<Esprit, RepositoryError>;

    async fn commit(&mut self) -> Result<(), RepositoryError>;

    async fn rollback(&mut self) -> Result<(), RepositoryError>;
}

// =============================================================================
// Player Repository Port
// =============================================================================

/// Entry point for player persistence
#[async_trait]
pub trait PlayerRepositoryPort: Send + Sync {
    /// Open a new unit of work
    async fn begin(&self) -> Result<Box<dyn PlayerUnitOfWork>, RepositoryError>;

    /// Unlocked read of the last committed state
    async fn get_player(&self, id: PlayerId) -> Result<Option<Player>, RepositoryError>;

    /// Esprit stacks owned by a player
    async fn list_esprits(&self, owner_id: PlayerId) -> Result<Vec<Esprit>, RepositoryError>;
}

// =============================================================================
// Esprit Catalog Port
// =============================================================================

/// Read-only species reference data. Queries take no locks.
#[async_trait]
pub trait EspritCatalogPort: Send + Sync {
    /// Case-insensitive exact name match
    async fn find_by_name(&self, name: &str) -> Result<Option<EspritBase>, RepositoryError>;

    async fn get(&self, id: EspritBaseId) -> Result<Option<EspritBase>, RepositoryError>;

    /// Every species whose tier is in `tiers`
    async fn list_by_tiers(&self, tiers: &[u32]) -> Result<Vec<EspritBase>, RepositoryError>;

    /// Load a species (content seeding)
    async fn insert(&self, base: &EspritBase) -> Result<(), RepositoryError>;
}
