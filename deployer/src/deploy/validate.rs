//! Deployment request validation
//!
//! Validation runs before any remote call and reports every violation it
//! finds, not only the first one.

use std::collections::BTreeMap;

use api_models::models::DeploymentRequest;
use url::Url;

use crate::errors::{FieldViolation, ValidationErrors};
use crate::models::deployment::{ValidatedRequest, FQDN_ENV_KEY, URL_ENV_KEY};

const MAX_SUBDOMAIN_LEN: usize = 63;

/// Validate and normalize a deployment request.
///
/// `base_domain` is stripped from the subdomain when the caller included it.
pub fn validate(
    request: DeploymentRequest,
    base_domain: &str,
) -> Result<ValidatedRequest, ValidationErrors> {
    let mut violations = Vec::new();
    let mut check = |field: &'static str, result: Result<(), String>| {
        if let Err(message) = result {
            violations.push(FieldViolation { field, message });
        }
    };

    let project_name = request.project_name.trim().to_string();
    check("project_name", check_project_name(&project_name));

    let subdomain = strip_base_domain(request.subdomain.trim(), base_domain).to_string();
    check("subdomain", check_subdomain(&subdomain));

    let git_repository = match normalize_git_repository(&request.git_repository) {
        Ok(url) => url,
        Err(message) => {
            check("git_repository", Err(message));
            String::new()
        }
    };

    let git_branch = match request.git_branch.trim() {
        "" => "main".to_string(),
        branch => branch.to_string(),
    };
    check("git_branch", check_branch(&git_branch));

    let base_directory = request
        .base_directory
        .as_deref()
        .map(str::trim)
        .filter(|dir| !dir.is_empty())
        .map(str::to_string);
    if let Some(dir) = &base_directory {
        check("base_directory", check_base_directory(dir));
    }

    check("container_port", check_port(request.container_port));
    check("host_port", check_port(request.host_port));

    let env_vars: BTreeMap<String, String> = request.env_vars.unwrap_or_default();
    for key in env_vars.keys() {
        check("env_vars", check_env_key(key));
    }

    if !violations.is_empty() {
        return Err(ValidationErrors { violations });
    }

    Ok(ValidatedRequest {
        project_name,
        subdomain,
        git_repository,
        git_branch,
        base_directory,
        container_port: request.container_port,
        host_port: request.host_port,
        env_vars,
    })
}

/// Letters and digits only
pub fn check_project_name(name: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err("Project name cannot be empty".to_string());
    }
    if !name.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(
            "Project name can only contain letters and numbers (no spaces or special characters)"
                .to_string(),
        );
    }
    Ok(())
}

/// Lowercase letters, digits and inner hyphens
pub fn check_subdomain(subdomain: &str) -> Result<(), String> {
    if subdomain.is_empty() {
        return Err("Subdomain cannot be empty".to_string());
    }
    if !subdomain
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        return Err(
            "Subdomain can only contain lowercase letters, numbers, and hyphens".to_string(),
        );
    }
    if subdomain.starts_with('-') || subdomain.ends_with('-') {
        return Err("Subdomain cannot start or end with a hyphen".to_string());
    }
    if subdomain.len() > MAX_SUBDOMAIN_LEN {
        return Err(format!(
            "Subdomain cannot be longer than {} characters",
            MAX_SUBDOMAIN_LEN
        ));
    }
    Ok(())
}

fn strip_base_domain<'a>(subdomain: &'a str, base_domain: &str) -> &'a str {
    if base_domain.is_empty() {
        return subdomain;
    }
    subdomain
        .strip_suffix(base_domain)
        .and_then(|rest| rest.strip_suffix('.'))
        .unwrap_or(subdomain)
}

/// Normalize a GitHub URL to `https://github.com/<owner>/<repo>.git`
pub fn normalize_git_repository(raw: &str) -> Result<String, String> {
    let raw = raw.trim();
    if !raw.starts_with("https://github.com/") && !raw.starts_with("http://github.com/") {
        return Err("URL must be a GitHub repository (https://github.com/<owner>/<repo>)".to_string());
    }

    let url = Url::parse(raw).map_err(|e| format!("Invalid repository URL: {}", e))?;
    if url.query().is_some() || url.fragment().is_some() {
        return Err("Repository URL cannot carry a query or fragment".to_string());
    }

    let segments: Vec<&str> = url
        .path_segments()
        .map(|segments| segments.filter(|s| !s.is_empty()).collect())
        .unwrap_or_default();
    let &[owner, repo] = segments.as_slice() else {
        return Err("Repository URL must have the form https://github.com/<owner>/<repo>".to_string());
    };
    let repo = repo.strip_suffix(".git").unwrap_or(repo);

    let valid = |part: &str| {
        !part.is_empty()
            && part
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
    };
    if !valid(owner) || !valid(repo) {
        return Err("Repository owner and name may only contain letters, numbers, '-', '_' and '.'".to_string());
    }

    Ok(format!("https://github.com/{}/{}.git", owner, repo))
}

fn check_branch(branch: &str) -> Result<(), String> {
    if branch.chars().any(char::is_whitespace) {
        return Err("Branch name cannot contain whitespace".to_string());
    }
    Ok(())
}

fn check_base_directory(dir: &str) -> Result<(), String> {
    if !dir.starts_with('/') {
        return Err("Base directory must start with '/'".to_string());
    }
    if dir.split('/').any(|segment| segment == "..") {
        return Err("Base directory cannot contain '..'".to_string());
    }
    Ok(())
}

fn check_port(port: Option<u16>) -> Result<(), String> {
    match port {
        Some(0) => Err("Port must be between 1 and 65535".to_string()),
        _ => Ok(()),
    }
}

fn check_env_key(key: &str) -> Result<(), String> {
    if key.trim().is_empty() {
        return Err("Environment variable names cannot be empty".to_string());
    }
    if key == FQDN_ENV_KEY || key == URL_ENV_KEY {
        return Err(format!("{} is set by the platform and cannot be overridden", key));
    }
    Ok(())
}
