// Shutdown signal handling for the daemon.
//
// Handlers are installed up front so a failure is reported to the caller
// instead of being mistaken for a shutdown request.

use anyhow::Result;
use std::future::Future;
use tracing::info;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// Install SIGTERM and SIGINT handlers
///
/// The returned future resolves once either signal arrives.
/// Must be called from within a tokio runtime.
#[cfg(unix)]
pub fn shutdown_signal() -> Result<impl Future<Output = ()> + Send + 'static> {
    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGINT handler: {}", e))?;

    Ok(async move {
        let name = tokio::select! {
            _ = sigterm.recv() => "SIGTERM",
            _ = sigint.recv() => "SIGINT",
        };
        info!("Received shutdown signal: {}", name);
    })
}

/// Wait for CTRL-C
///
/// Fallback implementation for non-Unix platforms. If the handler cannot be
/// registered the future never resolves, so the server keeps running.
#[cfg(not(unix))]
pub fn shutdown_signal() -> Result<impl Future<Output = ()> + Send + 'static> {
    Ok(async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Received shutdown signal: SIGINT"),
            Err(e) => {
                tracing::error!("Failed to wait for CTRL-C: {}", e);
                std::future::pending::<()>().await
            }
        }
    })
}
