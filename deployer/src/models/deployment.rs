//! Deployment models

use std::collections::BTreeMap;

use api_models::models::DeploymentResponse;
use serde::{Deserialize, Serialize};

use crate::deploy::status::DeploymentStatus;

/// Environment variable holding the full domain of the application
pub const FQDN_ENV_KEY: &str = "COOLIFY_FQDN";

/// Environment variable holding the full HTTPS URL of the application
pub const URL_ENV_KEY: &str = "URL";

/// A deployment request that passed validation.
///
/// Fields are only reachable through accessors so the request cannot be
/// altered once validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedRequest {
    pub(crate) project_name: String,
    pub(crate) subdomain: String,
    pub(crate) git_repository: String,
    pub(crate) git_branch: String,
    pub(crate) base_directory: Option<String>,
    pub(crate) container_port: Option<u16>,
    pub(crate) host_port: Option<u16>,
    pub(crate) env_vars: BTreeMap<String, String>,
}

impl ValidatedRequest {
    pub fn project_name(&self) -> &str {
        &self.project_name
    }

    pub fn subdomain(&self) -> &str {
        &self.subdomain
    }

    /// Normalized `https://github.com/<owner>/<repo>.git`
    pub fn git_repository(&self) -> &str {
        &self.git_repository
    }

    pub fn git_branch(&self) -> &str {
        &self.git_branch
    }

    pub fn base_directory(&self) -> Option<&str> {
        self.base_directory.as_deref()
    }

    pub fn container_port(&self) -> Option<u16> {
        self.container_port
    }

    pub fn host_port(&self) -> Option<u16> {
        self.host_port
    }

    pub fn env_vars(&self) -> &BTreeMap<String, String> {
        &self.env_vars
    }

    /// Application name: the repository name without `.git`
    pub fn app_name(&self) -> String {
        app_name_from_repository(&self.git_repository)
    }

    /// `{subdomain}.{base_domain}`
    pub fn fqdn(&self, base_domain: &str) -> String {
        format!("{}.{}", self.subdomain, base_domain)
    }
}

/// Last path segment of a repository URL, without the `.git` suffix
pub fn app_name_from_repository(repository: &str) -> String {
    let last = repository
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or(repository);
    last.strip_suffix(".git").unwrap_or(last).to_string()
}

/// System environment variables derived from the application domain
pub fn system_env_vars(fqdn: &str) -> Vec<(String, String)> {
    vec![
        (FQDN_ENV_KEY.to_string(), fqdn.to_string()),
        (URL_ENV_KEY.to_string(), format!("https://{}", fqdn)),
    ]
}

/// Container and host port handed to one application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortAllocation {
    pub container_port: u16,
    pub host_port: u16,
}

impl PortAllocation {
    /// Coolify `ports_mappings` notation
    pub fn mapping(&self) -> String {
        format!("{}:{}", self.host_port, self.container_port)
    }
}

/// Identifiers produced by the orchestration steps that succeeded so far
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartialDeployment {
    pub project_uuid: Option<String>,
    pub environment_uuid: Option<String>,
    pub environment_name: Option<String>,
    pub app_uuid: Option<String>,
}

/// Terminal value of a successful orchestration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentResult {
    pub project_uuid: String,
    pub environment_uuid: String,
    pub app_uuid: String,
    pub app_name: String,
    pub deployment_status: DeploymentStatus,
    pub fqdn: String,
    pub url: String,
    pub dashboard_url: String,
    pub ports: PortAllocation,
}

impl From<DeploymentResult> for DeploymentResponse {
    fn from(result: DeploymentResult) -> Self {
        DeploymentResponse {
            message: format!(
                "Deployment of {} started, it will be available at {}",
                result.app_name, result.url
            ),
            project_uuid: result.project_uuid,
            environment_uuid: result.environment_uuid,
            app_uuid: result.app_uuid,
            app_name: result.app_name,
            deployment_status: result.deployment_status.as_str().to_string(),
            coolify_url: result.dashboard_url,
            fqdn: result.fqdn,
            url: result.url,
            container_port: result.ports.container_port,
            host_port: result.ports.host_port,
        }
    }
}
