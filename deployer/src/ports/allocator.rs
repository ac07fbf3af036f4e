//! Port allocator service

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::errors::PortError;
use crate::models::deployment::PortAllocation;
use crate::ports::store::{PortCounter, PortCounterStore};

/// Allocator options
#[derive(Debug, Clone, Copy)]
pub struct Options {
    /// Container port every application exposes
    pub container_port: u16,

    /// First host port handed out on a fresh counter
    pub initial_host_port: u16,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            container_port: 3000,
            initial_host_port: 3003,
        }
    }
}

/// Hands out unique (container_port, host_port) pairs.
///
/// Allocations within the process queue on an async mutex, and the store
/// serializes them across processes. The allocator never retries.
pub struct PortAllocator {
    store: Arc<dyn PortCounterStore>,
    options: Options,
    lock: Mutex<()>,
}

impl PortAllocator {
    pub fn new(store: Arc<dyn PortCounterStore>, options: Options) -> Self {
        Self {
            store,
            options,
            lock: Mutex::new(()),
        }
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    fn initial_port(&self) -> Result<i64, PortError> {
        match self.options.initial_host_port {
            0 => Err(PortError::StorageUnavailable(
                "initial host port must be at least 1".to_string(),
            )),
            port => Ok(i64::from(port)),
        }
    }

    /// Create the counter row if needed (done once at startup)
    pub async fn initialize(&self) -> Result<(), PortError> {
        let initial = self.initial_port()?;
        let store = self.store.clone();
        tokio::task::spawn_blocking(move || store.initialize(initial))
            .await
            .map_err(|e| PortError::StorageUnavailable(e.to_string()))??;
        info!(initial_host_port = initial, "port counter initialized");
        Ok(())
    }

    /// Reserve the next host port
    pub async fn allocate(&self) -> Result<PortAllocation, PortError> {
        let initial = self.initial_port()?;
        let _guard = self.lock.lock().await;

        let store = self.store.clone();
        let value = tokio::task::spawn_blocking(move || store.take_next(initial))
            .await
            .map_err(|e| PortError::StorageUnavailable(e.to_string()))?
            .inspect_err(|e| warn!("port allocation failed: {e}"))?;

        if value < 1 {
            return Err(PortError::StorageUnavailable(format!(
                "invalid port counter value {value}"
            )));
        }
        let host_port = u16::try_from(value).map_err(|_| PortError::Exhausted(value))?;
        info!(host_port, container_port = self.options.container_port, "assigned port");

        Ok(PortAllocation {
            container_port: self.options.container_port,
            host_port,
        })
    }

    /// Current counter row, if initialized
    pub async fn current(&self) -> Result<Option<PortCounter>, PortError> {
        let store = self.store.clone();
        tokio::task::spawn_blocking(move || store.peek())
            .await
            .map_err(|e| PortError::StorageUnavailable(e.to_string()))?
    }
}
