// src/errors.rs

//! Typed errors for the builder and supervisor layers.
//!
//! Wiring-level code (config loading, proxy setup) uses `anyhow`; these
//! enums cover the failures the build loop has to tell apart, because the
//! kill-on-error policy treats them differently from ordinary log noise.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failure of one build attempt.
///
/// The diagnostic text of a failed build is *not* carried here; it stays on
/// the builder and is retrieved via [`crate::build::Builder::diagnostics`].
#[derive(Debug, Error)]
pub enum BuildError {
    /// The build command itself could not be started.
    #[error("failed to invoke build command `{command}`: {source}")]
    Invoke {
        command: String,
        #[source]
        source: io::Error,
    },

    /// The build command ran and exited non-zero.
    #[error("build command failed")]
    Failed,
}

/// Failure to get a child process running.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("failed to spawn `{bin}`: {source}")]
    Spawn {
        bin: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Terminal conditions raised by the build loop when kill-on-error is set.
///
/// These bubble up to `main`, which exits with a non-zero status. Without
/// kill-on-error the underlying build/run failures are logged and the loop
/// keeps watching.
#[derive(Debug, Error)]
pub enum FatalError {
    #[error("build failed and kill-on-error is set")]
    BuildFailed,

    #[error("child process failed and kill-on-error is set")]
    RunFailed,
}
