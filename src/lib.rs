//! Esprit Engine - combat, capture and reward rules for a creature-collection game
//!
//! The engine owns:
//! - Boss encounters: damage model, victory rewards and boss captures
//! - Exploration captures: two-phase attempt and confirmation
//! - Daily rewards: streak tracking under a per-player lock
//! - The audit trail of every balance mutation

pub mod application;
pub mod domain;
pub mod infrastructure;

pub use application::context::{GameContext, RandomSource};
pub use application::ports::inbound::GameUseCases;
pub use application::services::GameEngine;
