//! Transaction log port - the append-only audit sink

use crate::domain::events::TransactionEvent;

/// Receives audit events after the owning unit of work commits.
///
/// Implementations must not block, must not retry indefinitely and must not
/// report failure back to the caller. Delivering an event twice is
/// acceptable; losing one without a trace is not.
pub trait TransactionLogPort: Send + Sync {
    fn record(&self, event: TransactionEvent);

    fn record_all(&self, events: Vec<TransactionEvent>) {
        for event in events {
            self.record(event);
        }
    }
}
