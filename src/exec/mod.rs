// src/exec/mod.rs

//! Process supervision layer.
//!
//! This module owns the single managed child process: starting it from the
//! built binary, watching for its exit, and killing it gracefully (with a
//! bounded escalation to a hard kill).
//!
//! - [`supervisor`] contains the [`Supervisor`] and its per-child waiter
//!   task.
//! - [`Runner`] is the capability set the build loop, proxy, and shutdown
//!   hook need from it, so tests can substitute a fake.

pub mod supervisor;

use std::fs;
use std::io;

use crate::errors::RunError;

pub use supervisor::{GRACE_TIMEOUT, OutputSink, Supervisor};

/// Capability set of the process supervisor.
#[allow(async_fn_in_trait)]
pub trait Runner: Send + Sync {
    /// Ensure a fresh, live child is running the configured binary.
    async fn run(&self) -> Result<(), RunError>;

    /// Gracefully stop the tracked child, if any. Idempotent and bounded.
    async fn kill(&self) -> Result<(), RunError>;

    /// Filesystem metadata of the configured binary path.
    fn binary_metadata(&self) -> io::Result<fs::Metadata>;
}
