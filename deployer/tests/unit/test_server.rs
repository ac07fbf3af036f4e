//! HTTP surface tests

use std::collections::BTreeMap;
use std::sync::Arc;

use aedify_deployer::errors::RemoteError;
use aedify_deployer::server::serve::router;
use aedify_deployer::server::state::ServerState;
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use crate::support::{memory_allocator, orchestrator, Call, FakeRemote, Faults, APP_UUID};

fn app(remote: Arc<FakeRemote>, configured: bool) -> Router {
    let config_status: BTreeMap<String, bool> = ["API_TOKEN", "COOLIFY_URL"]
        .into_iter()
        .map(|key| (key.to_string(), configured))
        .collect();
    let orchestrator = Arc::new(orchestrator(remote, memory_allocator()));
    router(Arc::new(ServerState::new(orchestrator, config_status)))
}

async fn send(app: Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

fn deploy_body() -> Value {
    json!({
        "project_name": "Shop",
        "subdomain": "shop",
        "git_repository": "https://github.com/acme/shop",
        "env_vars": {"NODE_ENV": "production"}
    })
}

#[tokio::test]
async fn test_health_reports_configuration() {
    let (status, body) = send(app(FakeRemote::new(), true), "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["config"]["API_TOKEN"], true);

    let (_, body) = send(app(FakeRemote::new(), false), "GET", "/health", None).await;
    assert_eq!(body["status"], "misconfigured");
}

#[tokio::test]
async fn test_root_lists_endpoints() {
    let (status, body) = send(app(FakeRemote::new(), true), "GET", "/", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["endpoints"]["deploy"], "POST /api/deploy");
}

#[tokio::test]
async fn test_deploy_returns_identifiers() {
    let remote = FakeRemote::new();
    remote.push_status("queued");

    let (status, body) = send(app(remote.clone(), true), "POST", "/api/deploy", Some(deploy_body())).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["app_uuid"], APP_UUID);
    assert_eq!(body["fqdn"], "shop.aedify.ai");
    assert_eq!(body["host_port"], 3003);
    assert_eq!(body["deployment_status"], "in_progress");
    assert_eq!(body["coolify_url"], "https://coolify.test/applications/app-1");
    assert_eq!(remote.count(|c| matches!(c, Call::TriggerDeploy { .. })), 1);
}

#[tokio::test]
async fn test_deploy_validation_error_makes_no_remote_calls() {
    let remote = FakeRemote::new();
    let mut body = deploy_body();
    body["project_name"] = json!("my app");
    body["subdomain"] = json!("-bad");

    let (status, body) = send(app(remote.clone(), true), "POST", "/api/deploy", Some(body)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");
    assert_eq!(body["fields"].as_array().unwrap().len(), 2);
    assert!(remote.calls().is_empty());
}

#[tokio::test]
async fn test_deploy_failure_reports_step_and_partial_ids() {
    let remote = FakeRemote::with_faults(Faults {
        create_application: Some(RemoteError::Rejected {
            status: 422,
            detail: "name taken".to_string(),
        }),
        ..Default::default()
    });

    let (status, body) = send(app(remote, true), "POST", "/api/deploy", Some(deploy_body())).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["step"], 3);
    assert_eq!(body["step_name"], "create application");
    assert_eq!(body["partial"]["project_uuid"], "project-1");
    assert_eq!(body["partial"]["app_uuid"], Value::Null);
}

#[tokio::test]
async fn test_create_project_endpoint() {
    let remote = FakeRemote::new();
    let (status, body) = send(
        app(remote.clone(), true),
        "POST",
        "/api/projects",
        Some(json!({"name": "Shop"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["uuid"], "project-1");
    assert_eq!(
        remote.calls(),
        vec![Call::CreateProject {
            name: "Shop".to_string(),
            description: "Auto-created project: Shop".to_string(),
        }]
    );
}

#[tokio::test]
async fn test_environment_not_found_maps_to_404() {
    let remote = FakeRemote::with_faults(Faults {
        get_environment: Some(RemoteError::NotFound("no environments".to_string())),
        ..Default::default()
    });
    let (status, body) = send(app(remote, true), "GET", "/api/projects/p-9/environment", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");
}

#[tokio::test]
async fn test_create_application_endpoint_allocates_port() {
    let remote = FakeRemote::new();
    let (status, body) = send(
        app(remote.clone(), true),
        "POST",
        "/api/applications",
        Some(json!({
            "project_uuid": "project-1",
            "environment_name": "production",
            "git_repository": "https://github.com/acme/shop",
            "name": "shop",
            "domain": "shop.aedify.ai"
        })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["uuid"], APP_UUID);
    assert_eq!(body["host_port"], 3003);
    assert_eq!(remote.env_keys(), vec!["COOLIFY_FQDN", "URL"]);
}

#[tokio::test]
async fn test_env_deploy_and_status_endpoints() {
    let remote = FakeRemote::new();
    remote.push_status("finished");
    let app = app(remote.clone(), true);

    let (status, body) = send(
        app.clone(),
        "POST",
        "/api/applications/app-1/envs",
        Some(json!({"key": "A", "value": "1"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["uuid"], "env-A");

    let (status, _) = send(app.clone(), "POST", "/api/applications/app-1/deploy", None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(app, "GET", "/api/applications/app-1/status", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "finished");
    assert_eq!(body["message"], "Deployment completed successfully");
}

#[tokio::test]
async fn test_list_applications_passthrough() {
    let (status, body) = send(app(FakeRemote::new(), true), "GET", "/api/applications", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["uuid"], APP_UUID);
}
