//! Aedify Deployer - Entry Point
//!
//! Deployment service for the Aedify platform. Runs an HTTP API that turns a
//! deployment request into a Coolify project, application and deployment.

use std::env;
use std::path::Path;

use aedify_deployer::app::oneshot::{deploy_once, status_once};
use aedify_deployer::app::options::AppOptions;
use aedify_deployer::app::run::run;
use aedify_deployer::logs::{init_logging, LogOptions};
use aedify_deployer::storage::layout::StorageLayout;
use aedify_deployer::storage::settings::load_settings;
use aedify_deployer::utils::{parse_cli_args, version_info, USAGE};

use colored::Colorize;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() {
    // Parse command line arguments
    let cli_args = match parse_cli_args(env::args().skip(1)) {
        Ok(cli_args) => cli_args,
        Err(e) => {
            eprintln!("{} {}", "✗".red(), e);
            eprintln!("{}", USAGE);
            std::process::exit(2);
        }
    };

    // Print version and exit
    let version = version_info();
    if cli_args.contains_key("version") {
        match serde_json::to_string_pretty(&version) {
            Ok(json) => println!("{}", json),
            Err(_) => println!("{}", version.version),
        }
        return;
    }

    let layout = match cli_args.get("base-dir") {
        Some(dir) => StorageLayout::new(dir),
        None => StorageLayout::default(),
    };

    // Retrieve the settings file
    let settings = match load_settings(&layout.settings_file()).await {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Unable to read settings file: {}", e);
            std::process::exit(1);
        }
    };

    let one_shot = cli_args.contains_key("deploy") || cli_args.contains_key("status");

    // Initialize logging
    let mut log_options = LogOptions {
        log_level: settings.log_level.clone(),
        json_format: settings.log_json,
        ..Default::default()
    };
    if !one_shot {
        match layout.setup().await {
            Ok(()) => log_options.log_dir = Some(layout.logs_dir().path().to_path_buf()),
            Err(e) => eprintln!("Unable to create storage directories: {e}"),
        }
    }
    let _log_guard = match init_logging(log_options) {
        Ok(guard) => guard,
        Err(e) => {
            println!("Failed to initialize logging: {e}");
            None
        }
    };

    let options = AppOptions::from_settings(&settings, &layout);
    let wait = cli_args.contains_key("wait");

    // One-shot deploy
    if let Some(request_path) = cli_args.get("deploy") {
        if let Err(e) = deploy_once(&options, Path::new(request_path), wait).await {
            eprintln!("{} {}", "✗".red(), e);
            std::process::exit(1);
        }
        return;
    }

    // One-shot status
    if let Some(app_uuid) = cli_args.get("status") {
        if let Err(e) = status_once(&options, app_uuid, wait).await {
            eprintln!("{} {}", "✗".red(), e);
            std::process::exit(1);
        }
        return;
    }

    // Run the server
    for (key, configured) in &options.config_status {
        if !configured {
            warn!("{} is not configured; deployments will fail", key);
        }
    }
    info!("Running Aedify Deployer {} with options: {:?}", version.version, options);
    let result = run(options, await_shutdown_signal()).await;
    if let Err(e) = result {
        error!("Failed to run the deployer: {e}");
        std::process::exit(1);
    }
}

async fn await_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let (mut sigterm, mut sigint) = match (
            signal(SignalKind::terminate()),
            signal(SignalKind::interrupt()),
        ) {
            (Ok(sigterm), Ok(sigint)) => (sigterm, sigint),
            _ => {
                error!("Failed to install signal handlers, falling back to Ctrl+C");
                let _ = tokio::signal::ctrl_c().await;
                return;
            }
        };

        tokio::select! {
            _ = sigterm.recv() => {
                info!("SIGTERM received, shutting down...");
            }
            _ = sigint.recv() => {
                info!("SIGINT received, shutting down...");
            }
        }
    }

    #[cfg(not(unix))]
    {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
        }
        info!("Ctrl+C received, shutting down...");
    }
}
