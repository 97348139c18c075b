// src/engine/build_loop.rs

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::sleep;
use tracing::{error, info, warn};

use crate::build::Builder;
use crate::errors::FatalError;
use crate::exec::Runner;

/// Drives the rebuild cycle: initial build at startup, then one cycle per
/// change event.
///
/// Per cycle: Idle -> Building -> {BuildFailed, BuildSucceeded}. A failed
/// build returns to Idle (or terminates the process under kill-on-error); a
/// successful one starts the child in immediate mode, otherwise the proxy
/// starts it lazily on the first inbound request.
pub struct BuildLoop<B, R> {
    builder: B,
    runner: Arc<R>,
    interval: Duration,
    kill_on_error: bool,
    immediate: bool,
    last_failure: Option<String>,
}

impl<B: Builder, R: Runner> BuildLoop<B, R> {
    pub fn new(
        builder: B,
        runner: Arc<R>,
        interval: Duration,
        kill_on_error: bool,
        immediate: bool,
    ) -> Self {
        Self {
            builder,
            runner,
            interval,
            kill_on_error,
            immediate,
            last_failure: None,
        }
    }

    /// Diagnostics of the most recent failed build; `None` after a success.
    pub fn last_failure(&self) -> Option<&str> {
        self.last_failure.as_deref()
    }

    /// Run one build cycle: build, apply the failure policy, start the child
    /// in immediate mode, then sleep for the configured interval so
    /// back-to-back failures stay rate-limited.
    pub async fn trigger(&mut self) -> Result<(), FatalError> {
        match self.builder.build().await {
            Err(err) => {
                error!(error = %err, "build failed");
                self.last_failure = Some(self.builder.diagnostics().to_string());
                println!("{}", self.builder.diagnostics());

                if self.kill_on_error {
                    error!("kill-on-error is set; shutting down");
                    return Err(FatalError::BuildFailed);
                }
            }
            Ok(()) => {
                info!("build succeeded");
                self.last_failure = None;

                if self.immediate
                    && let Err(err) = self.runner.run().await
                {
                    error!(error = %err, "failed to start child");
                    if self.kill_on_error {
                        error!("kill-on-error is set; shutting down");
                        return Err(FatalError::RunFailed);
                    }
                }
            }
        }

        sleep(self.interval).await;
        Ok(())
    }

    /// Build once at startup, then rebuild on every change event until the
    /// channel closes or a fatal error surfaces.
    ///
    /// Before each change-triggered rebuild the running child is killed, so
    /// the new binary is never started while stale output is mid-flight; a
    /// failed kill is logged but never wedges the loop.
    pub async fn run(mut self, mut changes: mpsc::Receiver<PathBuf>) -> Result<(), FatalError> {
        self.trigger().await?;

        while let Some(path) = changes.recv().await {
            info!(path = %path.display(), "change detected; rebuilding");
            if let Err(err) = self.runner.kill().await {
                warn!(error = %err, "error killing child before rebuild");
            }
            self.trigger().await?;
        }

        Ok(())
    }
}
