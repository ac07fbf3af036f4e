//! Remote platform capability
//!
//! The orchestrator only talks to the platform through [`RemotePlatform`];
//! the Coolify HTTP implementation lives in [`crate::http`].

use async_trait::async_trait;
use coolify_models::models::DeploymentRecord;

use crate::errors::RemoteError;
use crate::models::deployment::PortAllocation;

/// Environment resolved for a project
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvironmentRef {
    pub uuid: String,
    pub name: String,
}

/// Everything needed to create an application
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplicationSpec {
    pub project_uuid: String,
    pub environment_name: String,
    pub name: String,
    pub git_repository: String,
    pub git_branch: String,
    pub ports: PortAllocation,
    pub base_directory: Option<String>,

    /// Start a build right away. The orchestrator always defers so env vars
    /// are in place before the first build.
    pub instant_deploy: bool,
}

/// A single environment variable write
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvVar {
    pub key: String,
    pub value: String,
    pub is_preview: bool,
    pub is_literal: bool,
}

impl EnvVar {
    /// Non-preview literal variable, the only kind the orchestrator writes
    pub fn literal(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            is_preview: false,
            is_literal: true,
        }
    }
}

/// Operations of the remote deployment platform
#[async_trait]
pub trait RemotePlatform: Send + Sync {
    /// Create a project, returning its uuid
    async fn create_project(&self, name: &str, description: &str) -> Result<String, RemoteError>;

    /// First environment of a project
    async fn get_environment(&self, project_uuid: &str) -> Result<EnvironmentRef, RemoteError>;

    /// Create an application, returning its uuid
    async fn create_application(&self, spec: &ApplicationSpec) -> Result<String, RemoteError>;

    /// Set one environment variable, returning the variable uuid when the platform reports one
    async fn set_env_var(&self, app_uuid: &str, var: &EnvVar) -> Result<Option<String>, RemoteError>;

    /// Queue a deployment of the application
    async fn trigger_deploy(&self, app_uuid: &str) -> Result<(), RemoteError>;

    /// Deployment records of the application, newest first
    async fn list_deployments(&self, app_uuid: &str) -> Result<Vec<DeploymentRecord>, RemoteError>;

    /// Raw application listing
    async fn list_applications(&self) -> Result<serde_json::Value, RemoteError>;

    /// Dashboard location of an application
    fn dashboard_url(&self, app_uuid: &str) -> String;
}
