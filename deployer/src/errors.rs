//! Error types for the deployment service

use std::fmt;

use thiserror::Error;

use crate::deploy::fsm::Step;
use crate::models::deployment::PartialDeployment;

/// Ambient service errors (startup, configuration, serving)
#[derive(Error, Debug)]
pub enum DeployerError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("HTTP client error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Shutdown error: {0}")]
    ShutdownError(String),

    #[error("Port allocation error: {0}")]
    Ports(#[from] PortError),

    #[error("Remote platform error: {0}")]
    Remote(#[from] RemoteError),

    #[error("{0}")]
    Validation(#[from] ValidationErrors),

    #[error("{0}")]
    Orchestration(#[from] Box<OrchestrationError>),
}

/// Failure reported by the remote platform or the transport to it
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    /// The platform refused the request (naming conflict, invalid git URL, not deployable)
    #[error("rejected by remote platform ({status}): {detail}")]
    Rejected { status: u16, detail: String },

    /// A referenced resource is stale or not yet visible
    #[error("not found: {0}")]
    NotFound(String),

    /// Unclassified transport failure, including timeouts
    #[error("transport failure: {0}")]
    Unknown(String),
}

impl From<reqwest::Error> for RemoteError {
    fn from(err: reqwest::Error) -> Self {
        RemoteError::Unknown(err.to_string())
    }
}

/// Port allocator failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PortError {
    #[error("port storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("host port range exhausted (counter at {0})")]
    Exhausted(i64),
}

impl From<rusqlite::Error> for PortError {
    fn from(err: rusqlite::Error) -> Self {
        PortError::StorageUnavailable(err.to_string())
    }
}

/// One rejected request field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldViolation {
    pub field: &'static str,
    pub message: String,
}

impl fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Every violation found while validating a request
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub struct ValidationErrors {
    pub violations: Vec<FieldViolation>,
}

impl ValidationErrors {
    /// A single violation
    pub fn single(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            violations: vec![FieldViolation {
                field,
                message: message.into(),
            }],
        }
    }

    /// Whether a violation was recorded for `field`
    pub fn has_field(&self, field: &str) -> bool {
        self.violations.iter().any(|v| v.field == field)
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Validation error: ")?;
        for (idx, violation) in self.violations.iter().enumerate() {
            if idx > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{}", violation)?;
        }
        Ok(())
    }
}

/// A single environment variable the platform refused
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvVarFailure {
    pub key: String,
    pub error: RemoteError,
}

/// Underlying cause of a failed orchestration step
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StepCause {
    #[error(transparent)]
    Remote(#[from] RemoteError),

    #[error(transparent)]
    Ports(#[from] PortError),

    #[error("failed to set environment variables: {}", describe_env_failures(.0))]
    EnvVars(Vec<EnvVarFailure>),
}

fn describe_env_failures(failures: &[EnvVarFailure]) -> String {
    failures
        .iter()
        .map(|f| format!("{} ({})", f.key, f.error))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Orchestration halted at `step`; `partial` holds what earlier steps produced
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Deployment failed at {step}: {cause}")]
pub struct OrchestrationError {
    pub step: Step,
    pub cause: StepCause,
    pub partial: PartialDeployment,
}

impl OrchestrationError {
    /// Keys of the environment variables that could not be set, if that is why the step failed
    pub fn failed_env_keys(&self) -> Vec<&str> {
        match &self.cause {
            StepCause::EnvVars(failures) => failures.iter().map(|f| f.key.as_str()).collect(),
            _ => Vec::new(),
        }
    }
}
