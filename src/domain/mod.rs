//! Domain layer - Core combat, capture and reward rules with no I/O
//!
//! This layer contains:
//! - Entities: Player, EspritBase, Esprit, BossEncounter
//! - Value Objects: typed ids, elements, quest/area configuration, settings
//! - Domain Events: audit entries for balance mutations and captures
//! - Domain Services: capture rules, daily streak rules, level progression

pub mod entities;
pub mod events;
pub mod services;
pub mod value_objects;
