// # instctld - Instance Control Daemon
//
// Thin integration layer. It is responsible for:
// 1. Reading settings from environment variables
// 2. Loading and validating the JSON service config
// 3. Registering providers and building the instance controller
// 4. Serving the HTTP API until SIGTERM or SIGINT
//
// No validation, workflow or DNS logic lives here; see `instctl-core`.
//
// ## Configuration
//
// See `instctld::settings` for the environment variables and
// `instctl_core::config` for the service config file.
//
// ## Example
//
// ```bash
// export INSTCTL_CONFIG=/etc/instctl/config.json
// export INSTCTL_LOG_LEVEL=info
//
// instctld
// ```

use anyhow::Result;
use instctl_core::{InstanceController, ProviderRegistry, ServiceConfig};
use instctld::shutdown::shutdown_signal;
use instctld::{AppState, Settings, create_router_with_state};
use std::process::ExitCode;
use tracing::{error, info, warn};
use tracing_subscriber::FmtSubscriber;

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown
/// - 1: Configuration or startup error
/// - 2: Runtime error (unexpected)
#[derive(Debug, Clone, Copy)]
enum InstctlExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (unexpected failure)
    RuntimeError = 2,
}

impl From<InstctlExitCode> for ExitCode {
    fn from(code: InstctlExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

fn main() -> ExitCode {
    // Load settings from environment
    let settings = match Settings::from_env() {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            return InstctlExitCode::ConfigError.into();
        }
    };

    if let Err(e) = settings.validate() {
        eprintln!("Configuration validation error: {:#}", e);
        return InstctlExitCode::ConfigError.into();
    }

    // Initialize tracing
    let log_level = match settings.log_level() {
        Ok(level) => level,
        Err(e) => {
            eprintln!("Configuration validation error: {:#}", e);
            return InstctlExitCode::ConfigError.into();
        }
    };

    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return InstctlExitCode::ConfigError.into();
    }

    info!("Starting instctld daemon");

    let config = match settings.load_service_config() {
        Ok(config) => config,
        Err(e) => {
            error!("Configuration error: {:#}", e);
            return InstctlExitCode::ConfigError.into();
        }
    };

    if settings.dns_dry_run() {
        warn!("DNS mode is dry-run: record updates will be logged, not sent");
    }

    let controller = match build_controller(&config) {
        Ok(controller) => controller,
        Err(e) => {
            error!("Startup error: {:#}", e);
            return InstctlExitCode::ConfigError.into();
        }
    };

    info!(
        "Configuration loaded: compute={} dns_accounts={} tolerance={}s",
        config.compute.type_name(),
        controller.dns_target_count(),
        controller.gate().tolerance_secs()
    );

    // Enter tokio runtime
    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return InstctlExitCode::RuntimeError.into();
        }
    };

    let result = rt.block_on(async {
        if let Err(e) = serve(&config.server.bind_addr, AppState::new(controller)).await {
            error!("Daemon error: {:#}", e);
            InstctlExitCode::RuntimeError
        } else {
            InstctlExitCode::CleanShutdown
        }
    });

    result.into()
}

/// Register built-in providers and build the controller
fn build_controller(config: &ServiceConfig) -> Result<InstanceController> {
    #[allow(unused_mut)]
    let mut registry = ProviderRegistry::new();

    #[cfg(feature = "lightsail")]
    {
        info!("Registering Lightsail provider");
        instctl_provider_lightsail::register(&mut registry);
    }

    #[cfg(feature = "cloudflare")]
    {
        info!("Registering Cloudflare provider");
        instctl_provider_cloudflare::register(&mut registry);
    }

    info!(
        "Registered providers: compute={:?} dns={:?}",
        registry.list_compute(),
        registry.list_dns()
    );

    Ok(InstanceController::from_config(config, &registry)?)
}

/// Serve the API until a shutdown signal arrives
async fn serve(bind_addr: &str, state: AppState) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind {}: {}", bind_addr, e))?;

    info!("Listening on {}", listener.local_addr()?);

    let shutdown = shutdown_signal()?;

    axum::serve(listener, create_router_with_state(state))
        .with_graceful_shutdown(shutdown)
        .await?;

    info!("Shutting down daemon");
    Ok(())
}
