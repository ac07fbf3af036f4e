//! Orchestration sequencing tests

use std::collections::HashMap;
use std::sync::Arc;

use aedify_deployer::deploy::fsm::Step;
use aedify_deployer::deploy::status::DeploymentStatus;
use aedify_deployer::deploy::validate::validate;
use aedify_deployer::errors::{PortError, RemoteError, StepCause};
use aedify_deployer::models::deployment::PortAllocation;
use aedify_deployer::ports::{Options, PortAllocator};
use aedify_deployer::remote::ApplicationSpec;

use crate::support::{
    memory_allocator, orchestrator, record, request, request_with_env, BrokenStore, Call,
    FakeRemote, Faults, APP_UUID, ENVIRONMENT_NAME, ENVIRONMENT_UUID, PROJECT_UUID,
};

fn rejected(status: u16, detail: &str) -> RemoteError {
    RemoteError::Rejected {
        status,
        detail: detail.to_string(),
    }
}

#[tokio::test]
async fn test_full_sequence_threads_identifiers() {
    let remote = FakeRemote::new();
    remote.push_status("queued");
    let orchestrator = orchestrator(remote.clone(), memory_allocator());

    let validated = validate(request_with_env(&[("NODE_ENV", "production")]), "aedify.ai").unwrap();
    let result = orchestrator.orchestrate(&validated).await.unwrap();

    assert_eq!(result.project_uuid, PROJECT_UUID);
    assert_eq!(result.environment_uuid, ENVIRONMENT_UUID);
    assert_eq!(result.app_uuid, APP_UUID);
    assert_eq!(result.app_name, "shop");
    assert_eq!(result.fqdn, "shop.aedify.ai");
    assert_eq!(result.url, "https://shop.aedify.ai");
    assert_eq!(result.dashboard_url, "https://coolify.test/applications/app-1");
    assert_eq!(result.deployment_status, DeploymentStatus::InProgress);
    assert_eq!(
        result.ports,
        PortAllocation {
            container_port: 3000,
            host_port: 3003
        }
    );

    let expected = vec![
        Call::CreateProject {
            name: "Shop".to_string(),
            description: "Auto-created for shop".to_string(),
        },
        Call::GetEnvironment {
            project_uuid: PROJECT_UUID.to_string(),
        },
        Call::CreateApplication(ApplicationSpec {
            project_uuid: PROJECT_UUID.to_string(),
            environment_name: ENVIRONMENT_NAME.to_string(),
            name: "shop".to_string(),
            git_repository: "https://github.com/acme/shop.git".to_string(),
            git_branch: "main".to_string(),
            ports: result.ports,
            base_directory: None,
            instant_deploy: false,
        }),
        Call::SetEnvVar {
            app_uuid: APP_UUID.to_string(),
            key: "COOLIFY_FQDN".to_string(),
            value: "shop.aedify.ai".to_string(),
        },
        Call::SetEnvVar {
            app_uuid: APP_UUID.to_string(),
            key: "URL".to_string(),
            value: "https://shop.aedify.ai".to_string(),
        },
        Call::SetEnvVar {
            app_uuid: APP_UUID.to_string(),
            key: "NODE_ENV".to_string(),
            value: "production".to_string(),
        },
        Call::TriggerDeploy {
            app_uuid: APP_UUID.to_string(),
        },
        Call::ListDeployments {
            app_uuid: APP_UUID.to_string(),
        },
    ];
    assert_eq!(remote.calls(), expected);
}

#[tokio::test]
async fn test_create_application_rejected_stops_at_step_3() {
    let remote = FakeRemote::with_faults(Faults {
        create_application: Some(rejected(422, "invalid git repository")),
        ..Default::default()
    });
    let orchestrator = orchestrator(remote.clone(), memory_allocator());

    let validated = validate(request(), "aedify.ai").unwrap();
    let err = orchestrator.orchestrate(&validated).await.unwrap_err();

    assert_eq!(err.step, Step::CreateApplication);
    assert_eq!(err.step.number(), 3);
    assert_eq!(err.cause, StepCause::Remote(rejected(422, "invalid git repository")));
    assert_eq!(err.partial.project_uuid.as_deref(), Some(PROJECT_UUID));
    assert_eq!(err.partial.environment_uuid.as_deref(), Some(ENVIRONMENT_UUID));
    assert!(err.partial.app_uuid.is_none());

    assert_eq!(remote.count(|c| matches!(c, Call::SetEnvVar { .. })), 0);
    assert_eq!(remote.count(|c| matches!(c, Call::TriggerDeploy { .. })), 0);
}

#[tokio::test]
async fn test_project_conflict_fails_step_1_without_identifiers() {
    let remote = FakeRemote::with_faults(Faults {
        create_project: Some(rejected(409, "project already exists")),
        ..Default::default()
    });
    let orchestrator = orchestrator(remote.clone(), memory_allocator());

    let validated = validate(request(), "aedify.ai").unwrap();
    let err = orchestrator.orchestrate(&validated).await.unwrap_err();

    assert_eq!(err.step, Step::CreateProject);
    assert_eq!(err.partial, Default::default());
    assert_eq!(remote.calls().len(), 1);
}

#[tokio::test]
async fn test_env_var_failure_attempts_every_key() {
    let mut env_keys = HashMap::new();
    env_keys.insert("B".to_string(), rejected(422, "invalid value"));
    let remote = FakeRemote::with_faults(Faults {
        env_keys,
        ..Default::default()
    });
    let orchestrator = orchestrator(remote.clone(), memory_allocator());

    let validated = validate(request_with_env(&[("A", "1"), ("B", "2"), ("C", "3")]), "aedify.ai").unwrap();
    let err = orchestrator.orchestrate(&validated).await.unwrap_err();

    assert_eq!(err.step, Step::SetEnvVars);
    assert_eq!(err.failed_env_keys(), vec!["B"]);
    assert_eq!(err.partial.app_uuid.as_deref(), Some(APP_UUID));
    assert!(err.to_string().contains("B"));

    assert_eq!(remote.env_keys(), vec!["COOLIFY_FQDN", "URL", "A", "B", "C"]);
    assert_eq!(remote.count(|c| matches!(c, Call::TriggerDeploy { .. })), 0);
}

#[tokio::test]
async fn test_trigger_failure_reports_app_uuid() {
    let remote = FakeRemote::with_faults(Faults {
        trigger_deploy: Some(RemoteError::Unknown("connection reset".to_string())),
        ..Default::default()
    });
    let orchestrator = orchestrator(remote.clone(), memory_allocator());

    let validated = validate(request(), "aedify.ai").unwrap();
    let err = orchestrator.orchestrate(&validated).await.unwrap_err();

    assert_eq!(err.step, Step::TriggerDeploy);
    assert_eq!(err.partial.app_uuid.as_deref(), Some(APP_UUID));
}

#[tokio::test]
async fn test_status_probe_failure_yields_unknown() {
    let remote = FakeRemote::new();
    remote.push_deployments(Err(RemoteError::Unknown("timeout".to_string())));
    let orchestrator = orchestrator(remote.clone(), memory_allocator());

    let validated = validate(request(), "aedify.ai").unwrap();
    let result = orchestrator.orchestrate(&validated).await.unwrap();
    assert_eq!(result.deployment_status, DeploymentStatus::Unknown);
}

#[tokio::test]
async fn test_finished_status_is_reported() {
    let remote = FakeRemote::new();
    remote.push_deployments(Ok(vec![record("finished"), record("failed")]));
    let orchestrator = orchestrator(remote, memory_allocator());

    let validated = validate(request(), "aedify.ai").unwrap();
    let result = orchestrator.orchestrate(&validated).await.unwrap();
    assert_eq!(result.deployment_status, DeploymentStatus::Finished);
}

#[tokio::test]
async fn test_explicit_host_port_skips_allocator() {
    let remote = FakeRemote::new();
    let allocator = memory_allocator();
    let orchestrator = orchestrator(remote, allocator.clone());

    let mut req = request();
    req.host_port = Some(8080);
    req.container_port = Some(5000);
    let validated = validate(req, "aedify.ai").unwrap();
    let result = orchestrator.orchestrate(&validated).await.unwrap();

    assert_eq!(result.ports.mapping(), "8080:5000");
    assert!(allocator.current().await.unwrap().is_none());
}

#[tokio::test]
async fn test_port_storage_failure_makes_no_remote_calls() {
    let remote = FakeRemote::new();
    let allocator = Arc::new(PortAllocator::new(Arc::new(BrokenStore), Options::default()));
    let orchestrator = orchestrator(remote.clone(), allocator);

    let validated = validate(request(), "aedify.ai").unwrap();
    let err = orchestrator.orchestrate(&validated).await.unwrap_err();

    assert_eq!(err.step, Step::AllocatePorts);
    assert!(matches!(err.cause, StepCause::Ports(PortError::StorageUnavailable(_))));
    assert!(remote.calls().is_empty());
}

#[tokio::test]
async fn test_concurrent_orchestrations_get_distinct_ports() {
    let remote = FakeRemote::new();
    let orchestrator = Arc::new(orchestrator(remote.clone(), memory_allocator()));
    let validated = validate(request(), "aedify.ai").unwrap();

    let runs = (0..8).map(|_| {
        let orchestrator = orchestrator.clone();
        let validated = validated.clone();
        async move { orchestrator.orchestrate(&validated).await }
    });
    let results = futures::future::join_all(runs).await;

    let mut ports: Vec<u16> = results
        .into_iter()
        .map(|r| r.unwrap().ports.host_port)
        .collect();
    ports.sort_unstable();
    assert_eq!(ports, (3003..3011).collect::<Vec<u16>>());
    assert_eq!(remote.count(|c| matches!(c, Call::CreateProject { .. })), 8);
}

#[tokio::test]
async fn test_discrete_create_application_injects_system_vars() {
    let remote = FakeRemote::new();
    let orchestrator = orchestrator(remote.clone(), memory_allocator());

    let ports = orchestrator.resolve_ports(None, None).await.unwrap();
    let spec = ApplicationSpec {
        project_uuid: PROJECT_UUID.to_string(),
        environment_name: ENVIRONMENT_NAME.to_string(),
        name: "shop".to_string(),
        git_repository: "https://github.com/acme/shop.git".to_string(),
        git_branch: "main".to_string(),
        ports,
        base_directory: Some("/apps/web".to_string()),
        instant_deploy: false,
    };
    let app_uuid = orchestrator.create_application(&spec, Some("shop")).await.unwrap();

    assert_eq!(app_uuid, APP_UUID);
    assert_eq!(remote.env_keys(), vec!["COOLIFY_FQDN", "URL"]);

    let without_domain = orchestrator.create_application(&spec, None).await.unwrap();
    assert_eq!(without_domain, APP_UUID);
    assert_eq!(remote.env_keys().len(), 2);
}
