//! Coolify API models

use serde::{Deserialize, Serialize};

/// Project creation request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateProjectRequest {
    pub name: String,
    pub description: String,
}

/// Project as returned by the project endpoints
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectSummary {
    pub uuid: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// Answer to a project creation.
///
/// Some Coolify versions answer with the full project list instead of the
/// created project.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CreateProjectResponse {
    Single(ProjectSummary),
    List(Vec<ProjectSummary>),
}

impl CreateProjectResponse {
    /// Pick the created project: the last entry carrying `name`, else the
    /// last entry of the list.
    pub fn into_created(self, name: &str) -> Option<ProjectSummary> {
        match self {
            CreateProjectResponse::Single(project) => Some(project),
            CreateProjectResponse::List(projects) => {
                let matching = projects
                    .iter()
                    .rposition(|p| p.name.as_deref() == Some(name));
                match matching {
                    Some(idx) => projects.into_iter().nth(idx),
                    None => projects.into_iter().last(),
                }
            }
        }
    }
}

/// Project details including its environments
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectDetails {
    pub uuid: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub environments: Vec<Environment>,
}

/// Project environment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Environment {
    pub uuid: String,
    pub name: String,
}

/// Public-repository application creation request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateApplicationRequest {
    pub project_uuid: String,
    pub server_uuid: String,
    pub environment_name: String,
    pub destination_uuid: String,
    pub git_repository: String,
    pub git_branch: String,
    pub build_pack: String,
    pub name: String,
    pub ports_exposes: String,
    pub ports_mappings: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub docker_registry_image_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_directory: Option<String>,
    pub instant_deploy: bool,
}

/// Generic `{ "uuid": ... }` creation answer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatedResource {
    pub uuid: String,
}

/// Environment variable creation request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvVarRequest {
    pub key: String,
    pub value: String,
    pub is_preview: bool,
    pub is_literal: bool,
}

/// Environment variable creation answer
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EnvVarResponse {
    #[serde(default)]
    pub uuid: Option<String>,
}

/// Deploy trigger request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeployRequest {
    pub uuid: String,
}

/// Deployment record, newest first in listings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentRecord {
    #[serde(default)]
    pub deployment_uuid: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}
