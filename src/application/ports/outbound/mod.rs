//! Outbound ports - Interfaces that the application requires from external systems

mod clock_port;
mod repository_port;
mod settings_port;
mod transaction_log_port;

pub use clock_port::ClockPort;
pub use repository_port::{
    EspritCatalogPort, PlayerRepositoryPort, PlayerUnitOfWork, RepositoryError,
};
pub use settings_port::{SettingsError, SettingsRepositoryPort};
pub use transaction_log_port::TransactionLogPort;
