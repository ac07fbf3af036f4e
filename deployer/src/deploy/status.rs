//! Deployment status polling

use std::future::Future;
use std::time::Duration;

use coolify_models::models::DeploymentRecord;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::errors::RemoteError;
use crate::remote::RemotePlatform;

/// Deployment state as seen by callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeploymentStatus {
    InProgress,
    Finished,
    Failed,
    Unknown,
}

impl DeploymentStatus {
    /// Map a remote status string
    pub fn from_remote(status: &str) -> Self {
        match status.trim().to_ascii_lowercase().as_str() {
            "finished" => DeploymentStatus::Finished,
            "failed" | "cancelled" | "cancelled-by-user" => DeploymentStatus::Failed,
            "queued" | "in_progress" => DeploymentStatus::InProgress,
            _ => DeploymentStatus::Unknown,
        }
    }

    /// Status of the newest record; `Unknown` when none exists yet
    pub fn from_records(records: &[DeploymentRecord]) -> Self {
        records
            .first()
            .and_then(|record| record.status.as_deref())
            .map(Self::from_remote)
            .unwrap_or(DeploymentStatus::Unknown)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, DeploymentStatus::Finished | DeploymentStatus::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DeploymentStatus::InProgress => "in_progress",
            DeploymentStatus::Finished => "finished",
            DeploymentStatus::Failed => "failed",
            DeploymentStatus::Unknown => "unknown",
        }
    }

    /// Human readable description
    pub fn message(&self) -> &'static str {
        match self {
            DeploymentStatus::InProgress => "Deployment in progress",
            DeploymentStatus::Finished => "Deployment completed successfully",
            DeploymentStatus::Failed => "Deployment failed",
            DeploymentStatus::Unknown => "No deployment recorded yet",
        }
    }
}

impl std::fmt::Display for DeploymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Read the current deployment status of an application
pub async fn poll_status(
    remote: &dyn RemotePlatform,
    app_uuid: &str,
) -> Result<DeploymentStatus, RemoteError> {
    let records = remote.list_deployments(app_uuid).await?;
    let status = DeploymentStatus::from_records(&records);
    debug!(app_uuid, %status, "polled deployment status");
    Ok(status)
}

/// Options for waiting on a terminal status
#[derive(Debug, Clone)]
pub struct WaitOptions {
    /// Delay between two reads
    pub interval: Duration,

    /// Give up after this long
    pub timeout: Duration,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            timeout: Duration::from_secs(600),
        }
    }
}

/// Poll until the deployment finishes or fails, or the timeout elapses.
///
/// Read errors are logged and polling continues. On timeout the last
/// observed status is returned.
pub async fn wait_for_terminal<S, F>(
    remote: &dyn RemotePlatform,
    app_uuid: &str,
    options: &WaitOptions,
    sleep_fn: S,
) -> DeploymentStatus
where
    S: Fn(Duration) -> F,
    F: Future<Output = ()>,
{
    let mut waited = Duration::ZERO;
    let mut last = DeploymentStatus::Unknown;

    loop {
        match poll_status(remote, app_uuid).await {
            Ok(status) if status.is_terminal() => {
                info!(app_uuid, %status, "deployment reached terminal state");
                return status;
            }
            Ok(status) => {
                info!(app_uuid, %status, "deployment not finished yet");
                last = status;
            }
            Err(e) => {
                warn!(app_uuid, "error checking deployment status: {}", e);
            }
        }

        if waited >= options.timeout {
            warn!(app_uuid, "timed out after {:?} waiting for deployment", options.timeout);
            return last;
        }
        sleep_fn(options.interval).await;
        waited += options.interval;
    }
}
