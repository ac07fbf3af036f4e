//! Deployment orchestrator
//!
//! Drives create project -> resolve environment -> create application ->
//! settle -> set env vars -> trigger deploy, strictly in that order. A failed
//! step stops the sequence; resources created before it are left in place.

use std::sync::Arc;

use tracing::{debug, error, info, info_span, warn, Instrument};

use crate::deploy::fsm::{DeploymentFsm, FsmSettings, OrchestrationEvent, Step};
use crate::deploy::status::{self, DeploymentStatus};
use crate::errors::{EnvVarFailure, OrchestrationError, PortError, RemoteError, StepCause};
use crate::models::deployment::{
    system_env_vars, DeploymentResult, PortAllocation, ValidatedRequest,
};
use crate::ports::PortAllocator;
use crate::remote::{ApplicationSpec, EnvVar, EnvironmentRef, RemotePlatform};

/// Orchestrator settings
#[derive(Debug, Clone)]
pub struct OrchestratorSettings {
    /// Domain the subdomains live under
    pub base_domain: String,

    /// Step delays
    pub fsm: FsmSettings,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            base_domain: "aedify.ai".to_string(),
            fsm: FsmSettings::default(),
        }
    }
}

/// Sequences deployments against the remote platform
pub struct Orchestrator {
    remote: Arc<dyn RemotePlatform>,
    allocator: Arc<PortAllocator>,
    settings: OrchestratorSettings,
}

impl Orchestrator {
    pub fn new(
        remote: Arc<dyn RemotePlatform>,
        allocator: Arc<PortAllocator>,
        settings: OrchestratorSettings,
    ) -> Self {
        Self {
            remote,
            allocator,
            settings,
        }
    }

    pub fn settings(&self) -> &OrchestratorSettings {
        &self.settings
    }

    pub fn remote(&self) -> &Arc<dyn RemotePlatform> {
        &self.remote
    }

    /// Run the full deployment sequence for a validated request
    pub async fn orchestrate(
        &self,
        request: &ValidatedRequest,
    ) -> Result<DeploymentResult, OrchestrationError> {
        let deployment_id = uuid::Uuid::new_v4();
        let span = info_span!(
            "orchestrate",
            %deployment_id,
            project = request.project_name(),
            subdomain = request.subdomain(),
        );
        self.run(request).instrument(span).await
    }

    async fn run(&self, request: &ValidatedRequest) -> Result<DeploymentResult, OrchestrationError> {
        let mut fsm = DeploymentFsm::new();
        let app_name = request.app_name();
        let fqdn = request.fqdn(&self.settings.base_domain);
        info!("Starting deployment of {} to {}", request.git_repository(), fqdn);

        let ports = self
            .resolve_ports(request.container_port(), request.host_port())
            .await
            .map_err(|e| fail(&mut fsm, Step::AllocatePorts, e.into()))?;

        // 1. Project
        let description = format!("Auto-created for {}", app_name);
        let project_uuid = self
            .create_project(request.project_name(), &description)
            .await
            .map_err(|e| fail(&mut fsm, Step::CreateProject, e.into()))?;
        advance(
            &mut fsm,
            OrchestrationEvent::ProjectCreated {
                project_uuid: project_uuid.clone(),
            },
        );

        // 2. Environment
        let environment = self
            .resolve_environment(&project_uuid)
            .await
            .map_err(|e| fail(&mut fsm, Step::ResolveEnvironment, e.into()))?;
        advance(
            &mut fsm,
            OrchestrationEvent::EnvironmentResolved {
                uuid: environment.uuid.clone(),
                name: environment.name.clone(),
            },
        );

        // 3. Application, deferred so env vars land before the first build
        let spec = ApplicationSpec {
            project_uuid: project_uuid.clone(),
            environment_name: environment.name.clone(),
            name: app_name.clone(),
            git_repository: request.git_repository().to_string(),
            git_branch: request.git_branch().to_string(),
            ports,
            base_directory: request.base_directory().map(str::to_string),
            instant_deploy: false,
        };
        let app_uuid = self
            .remote
            .create_application(&spec)
            .await
            .map_err(|e| fail(&mut fsm, Step::CreateApplication, e.into()))?;
        info!(%app_uuid, host_port = ports.host_port, "Application created: {}", app_name);
        advance(
            &mut fsm,
            OrchestrationEvent::ApplicationCreated {
                app_uuid: app_uuid.clone(),
            },
        );

        self.settle().await;
        advance(&mut fsm, OrchestrationEvent::Settled);

        // 4. Environment variables: system ones first, then the caller's
        let mut vars: Vec<EnvVar> = system_env_vars(&fqdn)
            .into_iter()
            .map(|(key, value)| EnvVar::literal(key, value))
            .collect();
        vars.extend(
            request
                .env_vars()
                .iter()
                .map(|(key, value)| EnvVar::literal(key.as_str(), value.as_str())),
        );
        let failures = self.set_env_vars(&app_uuid, &vars).await;
        if !failures.is_empty() {
            return Err(fail(&mut fsm, Step::SetEnvVars, StepCause::EnvVars(failures)));
        }
        advance(&mut fsm, OrchestrationEvent::EnvVarsSet);

        // 5. Deploy
        self.remote
            .trigger_deploy(&app_uuid)
            .await
            .map_err(|e| fail(&mut fsm, Step::TriggerDeploy, e.into()))?;
        info!(%app_uuid, "Deployment job enqueued");
        advance(&mut fsm, OrchestrationEvent::DeployTriggered);

        // Initial status read; the write sequence already succeeded
        let deployment_status = self.probe_status(&app_uuid).await;
        advance(&mut fsm, OrchestrationEvent::StatusObserved(deployment_status));

        Ok(DeploymentResult {
            project_uuid,
            environment_uuid: environment.uuid,
            dashboard_url: self.remote.dashboard_url(&app_uuid),
            app_uuid,
            app_name,
            deployment_status,
            url: format!("https://{}", fqdn),
            fqdn,
            ports,
        })
    }

    /// Use explicit ports when given, else allocate a host port
    pub async fn resolve_ports(
        &self,
        container_port: Option<u16>,
        host_port: Option<u16>,
    ) -> Result<PortAllocation, PortError> {
        let container_port = container_port.unwrap_or(self.allocator.options().container_port);
        match host_port {
            Some(host_port) => {
                debug!(host_port, "using caller-supplied host port");
                Ok(PortAllocation {
                    container_port,
                    host_port,
                })
            }
            None => {
                let allocated = self.allocator.allocate().await?;
                Ok(PortAllocation {
                    container_port,
                    host_port: allocated.host_port,
                })
            }
        }
    }

    /// Step 1
    pub async fn create_project(&self, name: &str, description: &str) -> Result<String, RemoteError> {
        let project_uuid = self.remote.create_project(name, description).await?;
        info!(%project_uuid, "Project created: {}", name);
        Ok(project_uuid)
    }

    /// Step 2
    pub async fn resolve_environment(&self, project_uuid: &str) -> Result<EnvironmentRef, RemoteError> {
        let environment = self.remote.get_environment(project_uuid).await?;
        info!(project_uuid, environment_uuid = %environment.uuid, "Environment: {}", environment.name);
        Ok(environment)
    }

    /// Step 3 on its own: create the application, wait for it to settle and,
    /// when a subdomain is given, inject the system variables best-effort
    pub async fn create_application(
        &self,
        spec: &ApplicationSpec,
        subdomain: Option<&str>,
    ) -> Result<String, RemoteError> {
        let app_uuid = self.remote.create_application(spec).await?;
        info!(%app_uuid, "Application created: {}", spec.name);
        self.settle().await;

        if let Some(subdomain) = subdomain {
            let fqdn = format!("{}.{}", subdomain, self.settings.base_domain);
            let vars: Vec<EnvVar> = system_env_vars(&fqdn)
                .into_iter()
                .map(|(key, value)| EnvVar::literal(key, value))
                .collect();
            for failure in self.set_env_vars(&app_uuid, &vars).await {
                warn!("Failed to set system env var {}: {}", failure.key, failure.error);
            }
        }
        Ok(app_uuid)
    }

    /// Step 4 for a single variable
    pub async fn set_env_var(&self, app_uuid: &str, var: &EnvVar) -> Result<Option<String>, RemoteError> {
        let uuid = self.remote.set_env_var(app_uuid, var).await?;
        info!(app_uuid, key = %var.key, "Environment variable set");
        Ok(uuid)
    }

    /// Step 5
    pub async fn trigger_deploy(&self, app_uuid: &str) -> Result<(), RemoteError> {
        self.remote.trigger_deploy(app_uuid).await?;
        info!(app_uuid, "Deployment triggered");
        Ok(())
    }

    /// Step 6: read-only status
    pub async fn poll_status(&self, app_uuid: &str) -> Result<DeploymentStatus, RemoteError> {
        status::poll_status(self.remote.as_ref(), app_uuid).await
    }

    /// Write every variable, continuing past failures; returns the failures
    async fn set_env_vars(&self, app_uuid: &str, vars: &[EnvVar]) -> Vec<EnvVarFailure> {
        let mut failures = Vec::new();
        for var in vars {
            match self.remote.set_env_var(app_uuid, var).await {
                Ok(_) => debug!(app_uuid, key = %var.key, "env var set"),
                Err(e) => {
                    warn!(app_uuid, key = %var.key, "Failed to set env var: {}", e);
                    failures.push(EnvVarFailure {
                        key: var.key.clone(),
                        error: e,
                    });
                }
            }
        }
        failures
    }

    async fn settle(&self) {
        let delay = self.settings.fsm.settle_delay;
        if !delay.is_zero() {
            debug!("waiting {:?} for the application to settle", delay);
            tokio::time::sleep(delay).await;
        }
    }

    async fn probe_status(&self, app_uuid: &str) -> DeploymentStatus {
        let delay = self.settings.fsm.status_probe_delay;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        match self.poll_status(app_uuid).await {
            Ok(status) => status,
            Err(e) => {
                warn!(app_uuid, "Initial status check failed: {}", e);
                DeploymentStatus::Unknown
            }
        }
    }
}

fn advance(fsm: &mut DeploymentFsm, event: OrchestrationEvent) {
    if let Err(e) = fsm.process(event) {
        // the sequence above only emits forward transitions
        error!("orchestration state machine rejected event: {}", e);
    }
}

fn fail(fsm: &mut DeploymentFsm, step: Step, cause: StepCause) -> OrchestrationError {
    error!("Deployment failed at {}: {}", step, cause);
    advance(
        fsm,
        OrchestrationEvent::StepFailed {
            step,
            error: cause.to_string(),
        },
    );
    OrchestrationError {
        step,
        cause,
        partial: fsm.partial().clone(),
    }
}
