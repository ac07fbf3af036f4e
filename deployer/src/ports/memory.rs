//! In-process port counter, lost on restart

use std::sync::Mutex;

use chrono::Utc;

use crate::errors::PortError;
use crate::ports::store::{PortCounter, PortCounterStore};
use crate::ports::MAX_PORT;

/// Port counter kept in memory
#[derive(Debug, Default)]
pub struct MemoryPortStore {
    counter: Mutex<Option<PortCounter>>,
}

impl MemoryPortStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PortCounterStore for MemoryPortStore {
    fn initialize(&self, initial: i64) -> Result<(), PortError> {
        let mut counter = self
            .counter
            .lock()
            .map_err(|e| PortError::StorageUnavailable(format!("counter lock poisoned: {e}")))?;
        if counter.is_none() {
            *counter = Some(PortCounter {
                current_port: initial,
                updated_at: Utc::now(),
            });
        }
        Ok(())
    }

    fn take_next(&self, initial: i64) -> Result<i64, PortError> {
        let mut counter = self
            .counter
            .lock()
            .map_err(|e| PortError::StorageUnavailable(format!("counter lock poisoned: {e}")))?;
        let row = counter.get_or_insert_with(|| PortCounter {
            current_port: initial,
            updated_at: Utc::now(),
        });

        let current = row.current_port;
        if current > MAX_PORT {
            return Err(PortError::Exhausted(current));
        }
        row.current_port = current + 1;
        row.updated_at = Utc::now();
        Ok(current)
    }

    fn peek(&self) -> Result<Option<PortCounter>, PortError> {
        let counter = self
            .counter
            .lock()
            .map_err(|e| PortError::StorageUnavailable(format!("counter lock poisoned: {e}")))?;
        Ok(counter.clone())
    }
}
