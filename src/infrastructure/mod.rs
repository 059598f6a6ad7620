//! Infrastructure layer - External adapters and implementations
//!
//! This layer contains:
//! - Persistence: SQLite and in-memory adapters for players and reference data
//! - Transaction log: channel-backed audit sink and its worker
//! - Clock: system and fixed clocks
//! - Config: Application configuration
//! - State: Shared application state

pub mod clock;
pub mod config;
pub mod persistence;
pub mod state;
pub mod transaction_log;
