// src/shutdown.rs

//! Signal-driven shutdown.
//!
//! A single background task listens for SIGINT and SIGTERM (Ctrl-C only on
//! platforms without Unix signals) for the whole process lifetime. On
//! receipt it gracefully kills the supervised child and exits with a
//! non-zero status. This is the only path that terminates the process in
//! response to an external signal; kill-on-error escalation is internal to
//! the supervisor and the build loop.

use std::sync::Arc;

use tracing::{error, info};

use crate::exec::Supervisor;

/// Install the shutdown hook. Call exactly once at startup.
pub fn spawn_shutdown_hook(runner: Arc<Supervisor>) {
    tokio::spawn(async move {
        wait_for_signal().await;
        info!("shutdown signal received; stopping child");
        if let Err(err) = runner.kill().await {
            error!(error = %err, "error killing child during shutdown");
        }
        std::process::exit(1);
    });
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    let mut term = match signal(SignalKind::terminate()) {
        Ok(term) => term,
        Err(err) => {
            error!(error = %err, "failed to install SIGTERM handler; falling back to Ctrl-C only");
            if let Err(err) = tokio::signal::ctrl_c().await {
                error!(error = %err, "failed to listen for Ctrl-C");
            }
            return;
        }
    };

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {}
        _ = term.recv() => {}
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(error = %err, "failed to listen for Ctrl-C");
    }
}
