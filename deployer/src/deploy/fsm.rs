//! Finite State Machine for deployment orchestration
//!
//! States only move forward. Any step may fail, which parks the machine in
//! `Failed` with the identifiers gathered so far; there is no rollback.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::deploy::status::DeploymentStatus;
use crate::models::deployment::PartialDeployment;

/// Orchestration settings
#[derive(Debug, Clone)]
pub struct FsmSettings {
    /// Wait between application creation and env var injection
    pub settle_delay: Duration,

    /// Wait between the deploy trigger and the first status read
    pub status_probe_delay: Duration,
}

impl Default for FsmSettings {
    fn default() -> Self {
        Self {
            settle_delay: Duration::from_secs(3),
            status_probe_delay: Duration::from_secs(2),
        }
    }
}

/// Orchestration steps, numbered as reported to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    AllocatePorts,
    CreateProject,
    ResolveEnvironment,
    CreateApplication,
    SetEnvVars,
    TriggerDeploy,
}

impl Step {
    pub fn number(&self) -> u8 {
        match self {
            Step::AllocatePorts => 0,
            Step::CreateProject => 1,
            Step::ResolveEnvironment => 2,
            Step::CreateApplication => 3,
            Step::SetEnvVars => 4,
            Step::TriggerDeploy => 5,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Step::AllocatePorts => "allocate ports",
            Step::CreateProject => "create project",
            Step::ResolveEnvironment => "resolve environment",
            Step::CreateApplication => "create application",
            Step::SetEnvVars => "set environment variables",
            Step::TriggerDeploy => "trigger deploy",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "step {} ({})", self.number(), self.name())
    }
}

/// Orchestration state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrchestrationState {
    /// Nothing created yet
    Pending,

    /// Project exists
    Created,

    /// Environment uuid and name known
    EnvironmentResolved,

    /// Application exists, deferred
    ApplicationCreated,

    /// Settle delay elapsed
    Settled,

    /// All environment variables written
    EnvVarsSet,

    /// Deployment queued on the platform
    DeployTriggered,

    /// Platform reported a successful deployment
    Finished,

    /// A step failed or the platform reported a failed deployment
    Failed { step: Option<Step> },
}

impl OrchestrationState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OrchestrationState::Finished | OrchestrationState::Failed { .. }
        )
    }
}

/// Orchestration event
#[derive(Debug, Clone)]
pub enum OrchestrationEvent {
    ProjectCreated { project_uuid: String },
    EnvironmentResolved { uuid: String, name: String },
    ApplicationCreated { app_uuid: String },
    Settled,
    EnvVarsSet,
    DeployTriggered,
    StatusObserved(DeploymentStatus),
    StepFailed { step: Step, error: String },
}

/// Orchestration FSM, accumulating identifiers as steps succeed
#[derive(Debug, Clone)]
pub struct DeploymentFsm {
    state: OrchestrationState,
    partial: PartialDeployment,
    error: Option<String>,
}

impl DeploymentFsm {
    /// Create a new FSM in pending state
    pub fn new() -> Self {
        Self {
            state: OrchestrationState::Pending,
            partial: PartialDeployment::default(),
            error: None,
        }
    }

    /// Get current state
    pub fn state(&self) -> &OrchestrationState {
        &self.state
    }

    /// Identifiers produced so far
    pub fn partial(&self) -> &PartialDeployment {
        &self.partial
    }

    /// Get error message if any
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Process an event and transition state
    pub fn process(&mut self, event: OrchestrationEvent) -> Result<(), String> {
        use OrchestrationEvent as E;
        use OrchestrationState as S;

        let new_state = match (&self.state, event) {
            (S::Pending, E::ProjectCreated { project_uuid }) => {
                self.partial.project_uuid = Some(project_uuid);
                S::Created
            }
            (S::Created, E::EnvironmentResolved { uuid, name }) => {
                self.partial.environment_uuid = Some(uuid);
                self.partial.environment_name = Some(name);
                S::EnvironmentResolved
            }
            (S::EnvironmentResolved, E::ApplicationCreated { app_uuid }) => {
                self.partial.app_uuid = Some(app_uuid);
                S::ApplicationCreated
            }
            (S::ApplicationCreated, E::Settled) => S::Settled,
            (S::Settled, E::EnvVarsSet) => S::EnvVarsSet,
            (S::EnvVarsSet, E::DeployTriggered) => S::DeployTriggered,

            (S::DeployTriggered, E::StatusObserved(status)) => match status {
                DeploymentStatus::Finished => S::Finished,
                DeploymentStatus::Failed => {
                    self.error = Some("deployment failed on the platform".to_string());
                    S::Failed { step: None }
                }
                DeploymentStatus::InProgress | DeploymentStatus::Unknown => S::DeployTriggered,
            },

            (state, E::StepFailed { step, error }) if !state.is_terminal() => {
                self.error = Some(error);
                S::Failed { step: Some(step) }
            }

            // Invalid transitions
            (state, event) => {
                return Err(format!("Invalid transition: {:?} -> {:?}", state, event));
            }
        };

        self.state = new_state;
        Ok(())
    }
}

impl Default for DeploymentFsm {
    fn default() -> Self {
        Self::new()
    }
}
