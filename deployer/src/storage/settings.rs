//! Settings file management
//!
//! Settings are read from `settings.json` under the base directory; any
//! environment variable listed in [`Settings::apply_env_overrides`] wins over
//! the file.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::errors::DeployerError;
use crate::filesys::file::File;
use crate::logs::LogLevel;

/// Service settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,

    /// Emit stdout logs as JSON lines
    #[serde(default)]
    pub log_json: bool,

    /// Coolify API configuration
    #[serde(default)]
    pub coolify: CoolifySettings,

    /// Local HTTP server configuration
    #[serde(default)]
    pub server: ServerSettings,

    /// Port allocation configuration
    #[serde(default)]
    pub ports: PortSettings,

    /// Deployment behavior
    #[serde(default)]
    pub deploy: DeploySettings,
}

impl Settings {
    /// Override fields from the process environment
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(value) = get("COOLIFY_URL") {
            self.coolify.base_url = value;
        }
        if let Some(value) = get("API_TOKEN") {
            self.coolify.api_token = value;
        }
        if let Some(value) = get("DEPLOY_SERVER_UUID") {
            self.coolify.deploy_server_uuid = value;
        }
        if let Some(value) = get("DOCKERHUB_IMAGE") {
            self.coolify.docker_image = Some(value);
        }
        if let Some(value) = get("HOST") {
            self.server.host = value;
        }
        if let Some(value) = get("PORT") {
            match value.parse() {
                Ok(port) => self.server.port = port,
                Err(_) => warn!("Ignoring invalid PORT value: {}", value),
            }
        }
        if let Some(value) = get("PORT_DB_PATH") {
            self.ports.db_path = value;
        }
        if let Some(value) = get("BASE_DOMAIN") {
            self.deploy.base_domain = value;
        }
        if let Some(value) = get("LOG_LEVEL") {
            match value.parse() {
                Ok(level) => self.log_level = level,
                Err(e) => warn!("Ignoring LOG_LEVEL: {}", e),
            }
        }
        if let Some(value) = get("LOG_FORMAT") {
            match value.trim().to_lowercase().as_str() {
                "json" => self.log_json = true,
                "text" | "plain" => self.log_json = false,
                _ => warn!("Ignoring invalid LOG_FORMAT value: {}", value),
            }
        }
    }

    /// Names of required settings that are still unset
    pub fn missing_required(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.coolify.base_url.trim().is_empty() {
            missing.push("COOLIFY_URL");
        }
        if self.coolify.api_token.trim().is_empty() {
            missing.push("API_TOKEN");
        }
        if self.coolify.deploy_server_uuid.trim().is_empty() {
            missing.push("DEPLOY_SERVER_UUID");
        }
        if self.coolify.docker_image.as_deref().map_or(true, |image| image.trim().is_empty()) {
            missing.push("DOCKERHUB_IMAGE");
        }
        missing
    }
}

/// Load settings from `file` (defaults when absent), then apply environment overrides
pub async fn load_settings(file: &File) -> Result<Settings, DeployerError> {
    let mut settings = if file.exists().await {
        file.read_json::<Settings>().await?
    } else {
        Settings::default()
    };
    settings.apply_env_overrides();
    Ok(settings)
}

/// Coolify API settings
#[derive(Clone, Serialize, Deserialize)]
pub struct CoolifySettings {
    /// Base URL of the Coolify instance
    #[serde(default)]
    pub base_url: String,

    /// Bearer token for the Coolify API
    #[serde(default)]
    pub api_token: String,

    /// Server (and destination) every application is placed on
    #[serde(default)]
    pub deploy_server_uuid: String,

    /// Registry image name handed to new applications
    #[serde(default)]
    pub docker_image: Option<String>,

    #[serde(default = "default_build_pack")]
    pub build_pack: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_build_pack() -> String {
    "nixpacks".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

impl Default for CoolifySettings {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            api_token: String::new(),
            deploy_server_uuid: String::new(),
            docker_image: None,
            build_pack: default_build_pack(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl fmt::Debug for CoolifySettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CoolifySettings")
            .field("base_url", &self.base_url)
            .field("api_token", &"[REDACTED]")
            .field("deploy_server_uuid", &self.deploy_server_uuid)
            .field("docker_image", &self.docker_image)
            .field("build_pack", &self.build_pack)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Port allocation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortSettings {
    /// Container port every application exposes
    #[serde(default = "default_container_port")]
    pub container_port: u16,

    /// First host port handed out on a fresh counter
    #[serde(default = "default_initial_host_port")]
    pub initial_host_port: u16,

    /// Counter database path; relative paths resolve against the base directory
    #[serde(default = "default_db_path")]
    pub db_path: String,
}

fn default_container_port() -> u16 {
    3000
}

fn default_initial_host_port() -> u16 {
    3003
}

fn default_db_path() -> String {
    "ports.sqlite".to_string()
}

impl Default for PortSettings {
    fn default() -> Self {
        Self {
            container_port: default_container_port(),
            initial_host_port: default_initial_host_port(),
            db_path: default_db_path(),
        }
    }
}

/// Deployment settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeploySettings {
    /// Domain subdomains are created under
    #[serde(default = "default_base_domain")]
    pub base_domain: String,

    /// Wait after creating an application before writing env vars
    #[serde(default = "default_settle_delay")]
    pub settle_delay_ms: u64,

    /// Wait after triggering a deploy before the first status read
    #[serde(default = "default_status_probe_delay")]
    pub status_probe_delay_ms: u64,
}

fn default_base_domain() -> String {
    "aedify.ai".to_string()
}

fn default_settle_delay() -> u64 {
    3000
}

fn default_status_probe_delay() -> u64 {
    2000
}

impl Default for DeploySettings {
    fn default() -> Self {
        Self {
            base_domain: default_base_domain(),
            settle_delay_ms: default_settle_delay(),
            status_probe_delay_ms: default_status_probe_delay(),
        }
    }
}
