//! HTTP request handlers

use std::sync::Arc;

use api_models::models::{
    ApplicationCreateRequest, ApplicationCreateResponse, DeployResponse, DeploymentRequest,
    DeploymentResponse, DeploymentStatusResponse, EnvVarRequest, EnvVarResponse,
    EnvironmentResponse, HealthResponse, ProjectCreateRequest, ProjectCreateResponse,
};
use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use serde_json::json;
use tracing::info;

use crate::deploy::validate::{check_project_name, check_subdomain, normalize_git_repository, validate};
use crate::errors::ValidationErrors;
use crate::models::deployment::app_name_from_repository;
use crate::remote::{ApplicationSpec, EnvVar};
use crate::server::errors::ApiError;
use crate::server::state::ServerState;
use crate::utils::version_info;

/// Service banner
pub async fn root_handler() -> impl IntoResponse {
    Json(json!({
        "service": "aedify-deployer",
        "version": version_info().version,
        "endpoints": {
            "health": "GET /health",
            "create_project": "POST /api/projects",
            "get_environment": "GET /api/projects/{uuid}/environment",
            "list_applications": "GET /api/applications",
            "create_application": "POST /api/applications",
            "set_env_var": "POST /api/applications/{uuid}/envs",
            "deploy_application": "POST /api/applications/{uuid}/deploy",
            "deployment_status": "GET /api/applications/{uuid}/status",
            "deploy": "POST /api/deploy",
        },
    }))
}

/// Health check handler
pub async fn health_handler(State(state): State<Arc<ServerState>>) -> impl IntoResponse {
    let status = if state.is_configured() {
        "healthy"
    } else {
        "misconfigured"
    };
    Json(HealthResponse {
        status: status.to_string(),
        version: version_info().version,
        config: state.config_status.clone(),
    })
}

/// Create a project
pub async fn create_project_handler(
    State(state): State<Arc<ServerState>>,
    Json(request): Json<ProjectCreateRequest>,
) -> Result<Json<ProjectCreateResponse>, ApiError> {
    let name = request.name.trim().to_string();
    check_project_name(&name).map_err(|message| ValidationErrors::single("name", message))?;

    let description = request
        .description
        .filter(|d| !d.trim().is_empty())
        .unwrap_or_else(|| format!("Auto-created project: {}", name));
    let uuid = state.orchestrator.create_project(&name, &description).await?;

    Ok(Json(ProjectCreateResponse {
        uuid,
        name,
        message: "Project created successfully".to_string(),
    }))
}

/// Resolve the environment of a project
pub async fn get_environment_handler(
    State(state): State<Arc<ServerState>>,
    Path(project_uuid): Path<String>,
) -> Result<Json<EnvironmentResponse>, ApiError> {
    let environment = state.orchestrator.resolve_environment(&project_uuid).await?;
    Ok(Json(EnvironmentResponse {
        environment_uuid: environment.uuid,
        environment_name: environment.name,
        project_uuid,
    }))
}

/// Remote application listing, passed through
pub async fn list_applications_handler(
    State(state): State<Arc<ServerState>>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let applications = state.orchestrator.remote().list_applications().await?;
    Ok(Json(applications))
}

/// Create an application without deploying it
pub async fn create_application_handler(
    State(state): State<Arc<ServerState>>,
    Json(request): Json<ApplicationCreateRequest>,
) -> Result<Json<ApplicationCreateResponse>, ApiError> {
    let git_repository = normalize_git_repository(&request.git_repository)
        .map_err(|message| ValidationErrors::single("git_repository", message))?;

    let subdomain = request
        .domain
        .as_deref()
        .map(str::trim)
        .filter(|domain| !domain.is_empty())
        .map(|domain| {
            let base = format!(".{}", state.orchestrator.settings().base_domain);
            domain.strip_suffix(base.as_str()).unwrap_or(domain).to_string()
        });
    if let Some(subdomain) = &subdomain {
        check_subdomain(subdomain).map_err(|message| ValidationErrors::single("domain", message))?;
    }

    let name = match request.name.trim() {
        "" => app_name_from_repository(&git_repository),
        name => name.to_string(),
    };
    let ports = state
        .orchestrator
        .resolve_ports(request.container_port, request.host_port)
        .await?;

    let spec = ApplicationSpec {
        project_uuid: request.project_uuid,
        environment_name: request.environment_name,
        name: name.clone(),
        git_repository,
        git_branch: request.git_branch,
        ports,
        base_directory: request.base_directory.filter(|dir| !dir.trim().is_empty()),
        instant_deploy: false,
    };
    let uuid = state
        .orchestrator
        .create_application(&spec, subdomain.as_deref())
        .await?;

    Ok(Json(ApplicationCreateResponse {
        uuid,
        name,
        container_port: ports.container_port,
        host_port: ports.host_port,
        message: "Application created successfully".to_string(),
    }))
}

/// Set one environment variable
pub async fn set_env_var_handler(
    State(state): State<Arc<ServerState>>,
    Path(app_uuid): Path<String>,
    Json(request): Json<EnvVarRequest>,
) -> Result<Json<EnvVarResponse>, ApiError> {
    if request.key.trim().is_empty() {
        return Err(ValidationErrors::single("key", "Environment variable names cannot be empty").into());
    }

    let var = EnvVar {
        key: request.key,
        value: request.value,
        is_preview: request.is_preview,
        is_literal: request.is_literal,
    };
    let uuid = state.orchestrator.set_env_var(&app_uuid, &var).await?;

    Ok(Json(EnvVarResponse {
        uuid,
        message: format!("Environment variable {} set", var.key),
    }))
}

/// Queue a deployment
pub async fn deploy_application_handler(
    State(state): State<Arc<ServerState>>,
    Path(app_uuid): Path<String>,
) -> Result<Json<DeployResponse>, ApiError> {
    state.orchestrator.trigger_deploy(&app_uuid).await?;
    Ok(Json(DeployResponse {
        uuid: app_uuid,
        message: "Deployment triggered".to_string(),
    }))
}

/// Current deployment status
pub async fn status_handler(
    State(state): State<Arc<ServerState>>,
    Path(app_uuid): Path<String>,
) -> Result<Json<DeploymentStatusResponse>, ApiError> {
    let status = state.orchestrator.poll_status(&app_uuid).await?;
    Ok(Json(DeploymentStatusResponse {
        status: status.as_str().to_string(),
        message: status.message().to_string(),
    }))
}

/// Validate and run the full deployment sequence
pub async fn deploy_handler(
    State(state): State<Arc<ServerState>>,
    Json(request): Json<DeploymentRequest>,
) -> Result<Json<DeploymentResponse>, ApiError> {
    let validated = validate(request, &state.orchestrator.settings().base_domain)?;
    let result = state.orchestrator.orchestrate(&validated).await?;
    info!(app_uuid = %result.app_uuid, "Deployment started: {}", result.url);
    Ok(Json(result.into()))
}
