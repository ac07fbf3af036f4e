//! Deployment API models

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

fn default_branch() -> String {
    "main".to_string()
}

/// Full deployment request, as sent by callers before validation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentRequest {
    /// Project name (letters and numbers only)
    pub project_name: String,

    /// Subdomain under the base domain
    pub subdomain: String,

    /// GitHub repository URL
    pub git_repository: String,

    #[serde(default = "default_branch")]
    pub git_branch: String,

    /// Base directory inside the repository (e.g. /apps/web)
    #[serde(default)]
    pub base_directory: Option<String>,

    #[serde(default)]
    pub container_port: Option<u16>,

    #[serde(default)]
    pub host_port: Option<u16>,

    #[serde(default)]
    pub env_vars: Option<BTreeMap<String, String>>,
}

/// Full deployment response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeploymentResponse {
    pub project_uuid: String,
    pub environment_uuid: String,
    pub app_uuid: String,
    pub app_name: String,
    pub deployment_status: String,
    pub coolify_url: String,
    pub fqdn: String,
    pub url: String,
    pub container_port: u16,
    pub host_port: u16,
    pub message: String,
}

/// Project creation request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectCreateRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Project creation response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectCreateResponse {
    pub uuid: String,
    pub name: String,
    pub message: String,
}

/// Environment lookup response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvironmentResponse {
    pub environment_uuid: String,
    pub environment_name: String,
    pub project_uuid: String,
}

/// Application creation request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationCreateRequest {
    pub project_uuid: String,
    pub environment_name: String,
    pub git_repository: String,
    #[serde(default = "default_branch")]
    pub git_branch: String,
    pub name: String,
    #[serde(default)]
    pub container_port: Option<u16>,
    #[serde(default)]
    pub host_port: Option<u16>,
    #[serde(default)]
    pub base_directory: Option<String>,
    /// Subdomain; when set the system environment variables are injected
    #[serde(default)]
    pub domain: Option<String>,
}

/// Application creation response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationCreateResponse {
    pub uuid: String,
    pub name: String,
    pub container_port: u16,
    pub host_port: u16,
    pub message: String,
}

/// Environment variable request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvVarRequest {
    pub key: String,
    pub value: String,
    #[serde(default)]
    pub is_preview: bool,
    #[serde(default = "default_true")]
    pub is_literal: bool,
}

fn default_true() -> bool {
    true
}

/// Environment variable response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvVarResponse {
    pub uuid: Option<String>,
    pub message: String,
}

/// Deploy trigger response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeployResponse {
    pub uuid: String,
    pub message: String,
}

/// Deployment status response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeploymentStatusResponse {
    pub status: String,
    pub message: String,
}

/// Health response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub config: BTreeMap<String, bool>,
}

/// A single rejected request field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partial: Option<PartialIds>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FieldError>,
}

/// Identifiers obtained before an orchestration failed
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartialIds {
    pub project_uuid: Option<String>,
    pub environment_uuid: Option<String>,
    pub app_uuid: Option<String>,
}
