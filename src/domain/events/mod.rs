//! Domain events - Audit records of committed state changes

mod transaction_events;

pub use transaction_events::{TransactionEvent, TransactionKind};
