//! One-shot command line flows: deploy a request file, or report a status

use std::path::Path;

use api_models::models::DeploymentRequest;
use colored::Colorize;

use crate::app::options::AppOptions;
use crate::app::state::AppState;
use crate::deploy::status::{wait_for_terminal, DeploymentStatus, WaitOptions};
use crate::deploy::validate::validate;
use crate::errors::DeployerError;
use crate::filesys::file::File;
use crate::models::deployment::DeploymentResult;

/// Deploy the request stored in `request_path`, optionally waiting for the build
pub async fn deploy_once(
    options: &AppOptions,
    request_path: &Path,
    wait: bool,
) -> Result<DeploymentResult, DeployerError> {
    ensure_configured(options)?;

    let request: DeploymentRequest = File::new(request_path).read_json().await?;
    let validated = validate(request, &options.orchestrator.base_domain)?;

    println!();
    println!("{}", "Deployment plan:".bold());
    println!("  Project:    {}", validated.project_name().cyan());
    println!("  Repository: {} ({})", validated.git_repository().cyan(), validated.git_branch());
    println!(
        "  Domain:     {}",
        validated.fqdn(&options.orchestrator.base_domain).cyan()
    );
    for key in validated.env_vars().keys() {
        println!("  Env:        {}", key);
    }
    println!();

    let state = AppState::init(options).await?;
    let result = state
        .orchestrator
        .orchestrate(&validated)
        .await
        .map_err(Box::new)?;

    println!("{}", "✓ Deployment started".green().bold());
    println!("  App:        {} ({})", result.app_name.cyan(), result.app_uuid);
    println!("  Ports:      {}", result.ports.mapping());
    println!("  URL:        {}", result.url.cyan());
    println!("  Dashboard:  {}", result.dashboard_url);
    println!("  Status:     {}", colorize(result.deployment_status));

    if wait && !result.deployment_status.is_terminal() {
        let status = wait_for_terminal(
            &**state.orchestrator.remote(),
            &result.app_uuid,
            &WaitOptions::default(),
            tokio::time::sleep,
        )
        .await;
        println!("  Final:      {}", colorize(status));
    }

    Ok(result)
}

/// Print the deployment status of an application, optionally waiting for a terminal state
pub async fn status_once(
    options: &AppOptions,
    app_uuid: &str,
    wait: bool,
) -> Result<DeploymentStatus, DeployerError> {
    ensure_configured(options)?;

    let state = AppState::init(options).await?;
    let status = if wait {
        wait_for_terminal(
            &**state.orchestrator.remote(),
            app_uuid,
            &WaitOptions::default(),
            tokio::time::sleep,
        )
        .await
    } else {
        state.orchestrator.poll_status(app_uuid).await?
    };

    println!("{}: {} ({})", app_uuid, colorize(status), status.message());
    Ok(status)
}

fn ensure_configured(options: &AppOptions) -> Result<(), DeployerError> {
    let missing: Vec<&str> = options
        .config_status
        .iter()
        .filter(|(_, configured)| !**configured)
        .map(|(key, _)| key.as_str())
        .collect();
    if missing.is_empty() {
        return Ok(());
    }
    Err(DeployerError::ConfigError(format!(
        "missing required settings: {}",
        missing.join(", ")
    )))
}

fn colorize(status: DeploymentStatus) -> colored::ColoredString {
    match status {
        DeploymentStatus::Finished => status.as_str().green(),
        DeploymentStatus::Failed => status.as_str().red(),
        DeploymentStatus::InProgress => status.as_str().yellow(),
        DeploymentStatus::Unknown => status.as_str().dimmed(),
    }
}
