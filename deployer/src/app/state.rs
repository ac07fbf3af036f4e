//! Application state management

use std::sync::Arc;

use tracing::{error, info};

use crate::app::options::AppOptions;
use crate::deploy::orchestrator::Orchestrator;
use crate::errors::DeployerError;
use crate::http::client::HttpClient;
use crate::ports::{PortAllocator, SqlitePortStore};

/// Main application state
pub struct AppState {
    /// Coolify API client
    pub http_client: Arc<HttpClient>,

    /// Host port allocator
    pub allocator: Arc<PortAllocator>,

    /// Deployment orchestrator
    pub orchestrator: Arc<Orchestrator>,
}

impl AppState {
    /// Initialize application state
    pub async fn init(options: &AppOptions) -> Result<Self, DeployerError> {
        info!("Initializing application state...");

        let http_client = Arc::new(HttpClient::new(&options.coolify)?);

        let store = Arc::new(SqlitePortStore::new(&options.port_db_path));
        let allocator = Arc::new(PortAllocator::new(store, options.ports));
        // A broken counter store only fails allocations, not startup
        if let Err(e) = allocator.initialize().await {
            error!(
                path = %options.port_db_path.display(),
                "Failed to initialize port counter: {}", e
            );
        }

        let orchestrator = Arc::new(Orchestrator::new(
            http_client.clone(),
            allocator.clone(),
            options.orchestrator.clone(),
        ));

        Ok(Self {
            http_client,
            allocator,
            orchestrator,
        })
    }

    /// Shutdown application state
    pub async fn shutdown(&self) -> Result<(), DeployerError> {
        info!("Shutting down application state...");
        match self.allocator.current().await {
            Ok(Some(counter)) => info!(next_host_port = counter.current_port, "Port counter"),
            Ok(None) => {}
            Err(e) => error!("Failed to read port counter: {}", e),
        }
        Ok(())
    }
}
