//! Application layer - Use cases and orchestration
//!
//! This layer contains:
//! - Ports: inbound use-case trait and outbound repository/clock/log traits
//! - Services: unit-of-work orchestration over the domain rules
//! - Context: the dependencies shared by every service

pub mod context;
pub mod ports;
pub mod services;
