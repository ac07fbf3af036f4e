//! Application configuration options

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use crate::deploy::fsm::FsmSettings;
use crate::deploy::orchestrator::OrchestratorSettings;
use crate::ports;
use crate::storage::layout::StorageLayout;
use crate::storage::settings::{CoolifySettings, Settings};

/// Main application options
#[derive(Debug, Clone)]
pub struct AppOptions {
    /// Lifecycle configuration
    pub lifecycle: LifecycleOptions,

    /// Coolify API configuration
    pub coolify: CoolifySettings,

    /// Port counter database
    pub port_db_path: PathBuf,

    /// Port allocator options
    pub ports: ports::Options,

    /// Orchestration settings
    pub orchestrator: OrchestratorSettings,

    /// Server configuration
    pub server: ServerOptions,

    /// Required setting name -> configured
    pub config_status: BTreeMap<String, bool>,
}

impl AppOptions {
    /// Derive runtime options from loaded settings
    pub fn from_settings(settings: &Settings, layout: &StorageLayout) -> Self {
        let missing = settings.missing_required();
        let config_status = ["COOLIFY_URL", "API_TOKEN", "DEPLOY_SERVER_UUID", "DOCKERHUB_IMAGE"]
            .into_iter()
            .map(|key| (key.to_string(), !missing.contains(&key)))
            .collect();

        Self {
            lifecycle: LifecycleOptions::default(),
            coolify: settings.coolify.clone(),
            port_db_path: layout.port_db(&settings.ports.db_path),
            ports: ports::Options {
                container_port: settings.ports.container_port,
                initial_host_port: settings.ports.initial_host_port,
            },
            orchestrator: OrchestratorSettings {
                base_domain: settings.deploy.base_domain.clone(),
                fsm: FsmSettings {
                    settle_delay: Duration::from_millis(settings.deploy.settle_delay_ms),
                    status_probe_delay: Duration::from_millis(settings.deploy.status_probe_delay_ms),
                },
            },
            server: ServerOptions {
                host: settings.server.host.clone(),
                port: settings.server.port,
            },
            config_status,
        }
    }
}

/// Lifecycle options for the service
#[derive(Debug, Clone)]
pub struct LifecycleOptions {
    /// Maximum delay for graceful shutdown
    pub max_shutdown_delay: Duration,
}

impl Default for LifecycleOptions {
    fn default() -> Self {
        Self {
            max_shutdown_delay: Duration::from_secs(30),
        }
    }
}

/// Local HTTP server options
#[derive(Debug, Clone)]
pub struct ServerOptions {
    /// Host to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}
