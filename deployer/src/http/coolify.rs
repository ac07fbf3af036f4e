//! Coolify implementation of the remote platform

use async_trait::async_trait;
use coolify_models::models::{
    CreateApplicationRequest, CreateProjectRequest, CreateProjectResponse, CreatedResource,
    DeployRequest, DeploymentRecord, EnvVarRequest, EnvVarResponse, ProjectDetails,
};
use tracing::debug;

use crate::errors::RemoteError;
use crate::http::client::HttpClient;
use crate::remote::{ApplicationSpec, EnvVar, EnvironmentRef, RemotePlatform};

#[async_trait]
impl RemotePlatform for HttpClient {
    async fn create_project(&self, name: &str, description: &str) -> Result<String, RemoteError> {
        let request = CreateProjectRequest {
            name: name.to_string(),
            description: description.to_string(),
        };
        let response: CreateProjectResponse = self.post("/api/v1/projects", &request).await?;
        let project = response.into_created(name).ok_or_else(|| {
            RemoteError::Unknown("project creation returned an empty project list".to_string())
        })?;
        debug!(project_uuid = %project.uuid, "project created");
        Ok(project.uuid)
    }

    async fn get_environment(&self, project_uuid: &str) -> Result<EnvironmentRef, RemoteError> {
        let path = format!("/api/v1/projects/{}", project_uuid);
        let project: ProjectDetails = self.get(&path).await?;
        let env = project.environments.into_iter().next().ok_or_else(|| {
            RemoteError::NotFound(format!("no environments found for project {}", project_uuid))
        })?;
        Ok(EnvironmentRef {
            uuid: env.uuid,
            name: env.name,
        })
    }

    async fn create_application(&self, spec: &ApplicationSpec) -> Result<String, RemoteError> {
        let request = CreateApplicationRequest {
            project_uuid: spec.project_uuid.clone(),
            server_uuid: self.deploy_server_uuid.clone(),
            environment_name: spec.environment_name.clone(),
            destination_uuid: self.deploy_server_uuid.clone(),
            git_repository: spec.git_repository.clone(),
            git_branch: spec.git_branch.clone(),
            build_pack: self.build_pack.clone(),
            name: spec.name.clone(),
            ports_exposes: spec.ports.container_port.to_string(),
            ports_mappings: spec.ports.mapping(),
            docker_registry_image_name: self.docker_image.clone(),
            base_directory: spec.base_directory.clone(),
            instant_deploy: spec.instant_deploy,
        };
        let created: CreatedResource = self.post("/api/v1/applications/public", &request).await?;
        Ok(created.uuid)
    }

    async fn set_env_var(&self, app_uuid: &str, var: &EnvVar) -> Result<Option<String>, RemoteError> {
        let path = format!("/api/v1/applications/{}/envs", app_uuid);
        let request = EnvVarRequest {
            key: var.key.clone(),
            value: var.value.clone(),
            is_preview: var.is_preview,
            is_literal: var.is_literal,
        };
        let response: EnvVarResponse = self.post(&path, &request).await?;
        Ok(response.uuid)
    }

    async fn trigger_deploy(&self, app_uuid: &str) -> Result<(), RemoteError> {
        let request = DeployRequest {
            uuid: app_uuid.to_string(),
        };
        let _: serde_json::Value = self.post("/api/v1/deploy", &request).await?;
        Ok(())
    }

    async fn list_deployments(&self, app_uuid: &str) -> Result<Vec<DeploymentRecord>, RemoteError> {
        let path = format!("/api/v1/applications/{}/deployments", app_uuid);
        self.get(&path).await
    }

    async fn list_applications(&self) -> Result<serde_json::Value, RemoteError> {
        self.get("/api/v1/applications").await
    }

    fn dashboard_url(&self, app_uuid: &str) -> String {
        format!("{}/applications/{}", self.base_url(), app_uuid)
    }
}
