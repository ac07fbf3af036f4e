//! Request validation tests

use aedify_deployer::deploy::validate::{check_project_name, normalize_git_repository, validate};

use crate::support::{request, request_with_env};

#[test]
fn test_valid_request_is_normalized() {
    let mut req = request();
    req.git_repository = "https://github.com/acme/shop".to_string();
    req.subdomain = " shop.aedify.ai ".to_string();
    req.git_branch = "".to_string();

    let validated = validate(req, "aedify.ai").unwrap();
    assert_eq!(validated.git_repository(), "https://github.com/acme/shop.git");
    assert_eq!(validated.subdomain(), "shop");
    assert_eq!(validated.git_branch(), "main");
    assert_eq!(validated.app_name(), "shop");
    assert_eq!(validated.fqdn("aedify.ai"), "shop.aedify.ai");
}

#[test]
fn test_project_name_with_space_is_rejected() {
    let mut req = request();
    req.project_name = "my app".to_string();

    let err = validate(req, "aedify.ai").unwrap_err();
    assert!(err.has_field("project_name"));
    assert_eq!(err.violations.len(), 1);
}

#[test]
fn test_subdomain_rules() {
    for bad in ["-shop", "shop-", "ABC", "sh_op", ""] {
        let mut req = request();
        req.subdomain = bad.to_string();
        let err = validate(req, "aedify.ai").unwrap_err();
        assert!(err.has_field("subdomain"), "{bad:?} should be rejected");
    }

    let mut req = request();
    req.subdomain = "a".repeat(64);
    assert!(validate(req, "aedify.ai").unwrap_err().has_field("subdomain"));

    let mut req = request();
    req.subdomain = "my-shop-2".to_string();
    assert!(validate(req, "aedify.ai").is_ok());
}

#[test]
fn test_non_github_repository_is_rejected() {
    let mut req = request();
    req.git_repository = "https://gitlab.com/acme/shop".to_string();
    assert!(validate(req, "aedify.ai").unwrap_err().has_field("git_repository"));
}

#[test]
fn test_every_violation_is_reported() {
    let mut req = request();
    req.project_name = "my app".to_string();
    req.subdomain = "-bad".to_string();
    req.git_repository = "ftp://example.com/repo".to_string();
    req.host_port = Some(0);

    let err = validate(req, "aedify.ai").unwrap_err();
    for field in ["project_name", "subdomain", "git_repository", "host_port"] {
        assert!(err.has_field(field), "missing violation for {field}");
    }
}

#[test]
fn test_system_env_keys_are_reserved() {
    let err = validate(request_with_env(&[("URL", "https://elsewhere")]), "aedify.ai").unwrap_err();
    assert!(err.has_field("env_vars"));

    let err = validate(request_with_env(&[("COOLIFY_FQDN", "x")]), "aedify.ai").unwrap_err();
    assert!(err.has_field("env_vars"));

    assert!(validate(request_with_env(&[("DATABASE_URL", "postgres://db")]), "aedify.ai").is_ok());
}

#[test]
fn test_base_directory_rules() {
    let mut req = request();
    req.base_directory = Some("apps/web".to_string());
    assert!(validate(req, "aedify.ai").unwrap_err().has_field("base_directory"));

    let mut req = request();
    req.base_directory = Some("/apps/../secret".to_string());
    assert!(validate(req, "aedify.ai").unwrap_err().has_field("base_directory"));

    let mut req = request();
    req.base_directory = Some("/apps/web".to_string());
    assert_eq!(validate(req, "aedify.ai").unwrap().base_directory(), Some("/apps/web"));
}

#[test]
fn test_project_name_examples() {
    assert!(check_project_name("MyProject1").is_ok());
    assert!(check_project_name("My Project!").is_err());

    let mut req = request();
    req.project_name = "My Project!".to_string();
    assert!(validate(req, "aedify.ai").unwrap_err().has_field("project_name"));

    let mut req = request();
    req.project_name = "MyProject1".to_string();
    assert_eq!(validate(req, "aedify.ai").unwrap().project_name(), "MyProject1");
}

#[test]
fn test_repository_examples() {
    assert_eq!(
        normalize_git_repository("https://github.com/user/repo").unwrap(),
        "https://github.com/user/repo.git"
    );
    assert!(normalize_git_repository("github.com/user/repo").is_err());

    let mut req = request();
    req.git_repository = "github.com/user/repo".to_string();
    assert!(validate(req, "aedify.ai").unwrap_err().has_field("git_repository"));

    let mut req = request();
    req.git_repository = "https://github.com/user/repo".to_string();
    assert_eq!(
        validate(req, "aedify.ai").unwrap().git_repository(),
        "https://github.com/user/repo.git"
    );
}
