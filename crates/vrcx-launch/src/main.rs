//! VRCX Launch - process entry point with single-instance coordination.
//!
//! Parses the launch arguments, exits early when another instance owns the
//! same config directory (forwarding the deep-link command to it), and
//! otherwise serves the launch channel until shutdown.

mod handler;

use anyhow::Result;
use handler::LaunchCommandHandler;
use std::sync::Arc;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;
use vrcx_launch_core::config::{AppConfig, IpcConfig};
use vrcx_launch_core::platform::{self, default_notifier};
use vrcx_launch_core::{
    IpcEndpoint, IpcServer, LaunchIntent, StartupCheck, StartupDecision, SystemProcessInspector,
};

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let intent = LaunchIntent::parse(&args);

    // Set up logging
    let log_level = if intent.is_debug { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(false)
        .compact()
        .init();

    info!(
        "Starting {} on {}",
        AppConfig::APP_NAME,
        platform::current_platform()
    );

    let endpoint = IpcEndpoint::for_current_session();
    let inspector = SystemProcessInspector::new();
    let notifier = default_notifier();

    let check = StartupCheck::new(&inspector, notifier.as_ref(), endpoint.clone());
    let decision = check.run(intent, &args).await;

    let intent = match decision {
        StartupDecision::Proceed(intent) => intent,
        exit @ StartupDecision::Exit(_) => {
            info!("Startup stopped: {:?}", exit);
            std::process::exit(exit.exit_code().unwrap_or(0));
        }
    };

    let data_dir = intent.ensure_app_data_directory()?;
    info!("Data directory: {}", data_dir.display());
    if let Some(proxy) = &intent.proxy_url {
        info!("Proxy server: {}", proxy);
    }
    if intent.is_startup {
        info!("Launched by autostart");
    }

    let handler = Arc::new(LaunchCommandHandler::new());
    if let Some(command) = intent.launch_command.clone() {
        handler.push(command).await;
    }

    // A duplicate's handoff or an upgrade's old instance may still own the
    // endpoint. Keep running without a channel if it never frees up.
    let _server = match IpcServer::start_with_retry(
        endpoint,
        handler.clone(),
        IpcConfig::BIND_RETRY_TIMEOUT,
    )
    .await
    {
        Ok(server) => Some(server),
        Err(e) => {
            warn!("Launch channel unavailable: {}", e);
            None
        }
    };

    info!("VRCX running");

    // Wait for shutdown signal
    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received, exiting");

    let unhandled = handler.drain().await;
    if !unhandled.is_empty() {
        info!("{} launch command(s) left unhandled", unhandled.len());
    }

    Ok(())
}
