//! Mapping of service errors to HTTP responses

use api_models::models::{ErrorResponse, FieldError, PartialIds};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tracing::warn;

use crate::errors::{
    OrchestrationError, PortError, RemoteError, StepCause, ValidationErrors,
};

/// Error returned by every API handler
#[derive(Debug)]
pub enum ApiError {
    Validation(ValidationErrors),
    Remote(RemoteError),
    Ports(PortError),
    Orchestration(Box<OrchestrationError>),
}

impl From<ValidationErrors> for ApiError {
    fn from(err: ValidationErrors) -> Self {
        ApiError::Validation(err)
    }
}

impl From<RemoteError> for ApiError {
    fn from(err: RemoteError) -> Self {
        ApiError::Remote(err)
    }
}

impl From<PortError> for ApiError {
    fn from(err: PortError) -> Self {
        ApiError::Ports(err)
    }
}

impl From<OrchestrationError> for ApiError {
    fn from(err: OrchestrationError) -> Self {
        ApiError::Orchestration(Box::new(err))
    }
}

/// Status code for a remote failure; remote 4xx/5xx pass through
pub fn remote_status(err: &RemoteError) -> StatusCode {
    match err {
        RemoteError::Rejected { status, .. } => StatusCode::from_u16(*status)
            .ok()
            .filter(|code| code.is_client_error() || code.is_server_error())
            .unwrap_or(StatusCode::BAD_GATEWAY),
        RemoteError::NotFound(_) => StatusCode::NOT_FOUND,
        RemoteError::Unknown(_) => StatusCode::BAD_GATEWAY,
    }
}

fn remote_kind(err: &RemoteError) -> &'static str {
    match err {
        RemoteError::Rejected { .. } => "remote_rejected",
        RemoteError::NotFound(_) => "not_found",
        RemoteError::Unknown(_) => "remote_unavailable",
    }
}

fn port_kind(err: &PortError) -> &'static str {
    match err {
        PortError::StorageUnavailable(_) => "port_storage_unavailable",
        PortError::Exhausted(_) => "ports_exhausted",
    }
}

fn field_errors(err: &ValidationErrors) -> Vec<FieldError> {
    err.violations
        .iter()
        .map(|v| FieldError {
            field: v.field.to_string(),
            message: v.message.clone(),
        })
        .collect()
}

fn plain(error: &str, message: String) -> ErrorResponse {
    ErrorResponse {
        error: error.to_string(),
        message,
        step: None,
        step_name: None,
        partial: None,
        fields: Vec::new(),
    }
}

impl ApiError {
    fn to_parts(&self) -> (StatusCode, ErrorResponse) {
        match self {
            ApiError::Validation(err) => {
                let mut body = plain("validation_error", err.to_string());
                body.fields = field_errors(err);
                (StatusCode::BAD_REQUEST, body)
            }
            ApiError::Remote(err) => (remote_status(err), plain(remote_kind(err), err.to_string())),
            ApiError::Ports(err) => (
                StatusCode::SERVICE_UNAVAILABLE,
                plain(port_kind(err), err.to_string()),
            ),
            ApiError::Orchestration(err) => {
                let (status, kind) = match &err.cause {
                    StepCause::Remote(cause) => (remote_status(cause), remote_kind(cause)),
                    StepCause::Ports(cause) => (StatusCode::SERVICE_UNAVAILABLE, port_kind(cause)),
                    // the application never became visible after the settle delay
                    StepCause::EnvVars(failures)
                        if !failures.is_empty()
                            && failures
                                .iter()
                                .all(|f| matches!(f.error, RemoteError::NotFound(_))) =>
                    {
                        (StatusCode::NOT_FOUND, "not_found")
                    }
                    StepCause::EnvVars(_) => (StatusCode::BAD_GATEWAY, "env_vars_failed"),
                };
                let mut body = plain(kind, err.to_string());
                body.step = Some(err.step.number());
                body.step_name = Some(err.step.name().to_string());
                body.partial = Some(PartialIds {
                    project_uuid: err.partial.project_uuid.clone(),
                    environment_uuid: err.partial.environment_uuid.clone(),
                    app_uuid: err.partial.app_uuid.clone(),
                });
                if let StepCause::EnvVars(failures) = &err.cause {
                    body.fields = failures
                        .iter()
                        .map(|f| FieldError {
                            field: format!("env_vars.{}", f.key),
                            message: f.error.to_string(),
                        })
                        .collect();
                }
                (status, body)
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = self.to_parts();
        if status.is_server_error() {
            warn!(status = status.as_u16(), "request failed: {}", body.message);
        }
        (status, Json(body)).into_response()
    }
}
