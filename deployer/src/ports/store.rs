//! Port counter persistence contract

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::errors::PortError;

/// The single persisted counter row
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PortCounter {
    /// Next host port to hand out
    pub current_port: i64,

    /// Last time the counter was written
    pub updated_at: DateTime<Utc>,
}

/// Storage for the host port counter.
///
/// Implementations are blocking; the allocator drives them from a blocking
/// task.
pub trait PortCounterStore: Send + Sync {
    /// Create the counter row with `initial` if it does not exist yet.
    /// Calling it again is a no-op.
    fn initialize(&self, initial: i64) -> Result<(), PortError>;

    /// Read the counter, persist `value + 1` and return `value`, all as one
    /// atomic unit. A missing row is initialized with `initial` inside the
    /// same critical section.
    fn take_next(&self, initial: i64) -> Result<i64, PortError>;

    /// Read the counter without advancing it
    fn peek(&self) -> Result<Option<PortCounter>, PortError>;
}
