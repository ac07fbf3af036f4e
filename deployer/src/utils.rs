//! Utility functions

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Options that require a `=value`
const VALUE_OPTIONS: [&str; 3] = ["base-dir", "deploy", "status"];

pub const USAGE: &str = "usage: aedify-deployer [--base-dir=PATH] [--version] \
[--deploy=REQUEST.json [--wait]] [--status=APP_UUID [--wait]]";

/// Version information for the service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionInfo {
    pub version: String,
    pub git_hash: String,
    pub build_time: String,
}

/// Get version information
pub fn version_info() -> VersionInfo {
    VersionInfo {
        version: env!("CARGO_PKG_VERSION").to_string(),
        git_hash: option_env!("GIT_HASH").unwrap_or("unknown").to_string(),
        build_time: option_env!("BUILD_TIME").unwrap_or("unknown").to_string(),
    }
}

/// Parse `--key=value` options and `--flag` switches (flags map to "true")
pub fn parse_cli_args<I>(args: I) -> Result<HashMap<String, String>, String>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    let mut cli_args = HashMap::new();
    for arg in args {
        let arg = arg.as_ref();
        if let Some((key, value)) = arg.split_once('=') {
            let key = key.trim_start_matches('-');
            if VALUE_OPTIONS.contains(&key) && value.trim().is_empty() {
                return Err(format!("--{key} requires a value"));
            }
            cli_args.insert(key.to_string(), value.to_string());
        } else if arg.starts_with("--") {
            let key = arg.trim_start_matches('-');
            if VALUE_OPTIONS.contains(&key) {
                return Err(format!("--{key} requires a value (--{key}=...)"));
            }
            cli_args.insert(key.to_string(), "true".to_string());
        }
    }
    Ok(cli_args)
}
