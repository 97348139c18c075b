// src/build.rs

//! The builder collaborator: compiles the watched tree into the service
//! binary.
//!
//! The build loop only depends on the [`Builder`] trait; the shipped
//! [`CommandBuilder`] shells out to a configured build command and keeps the
//! diagnostic text of the last failed build for the loop to print.

use std::path::{Path, PathBuf};

use tokio::process::Command;
use tracing::info;

use crate::errors::BuildError;

/// Capability set the build loop needs from a builder.
#[allow(async_fn_in_trait)]
pub trait Builder {
    /// Compile the watched tree to the configured binary path.
    async fn build(&mut self) -> Result<(), BuildError>;

    /// Diagnostic output of the last build; empty after a successful one.
    fn diagnostics(&self) -> &str;

    /// Resolved path of the output binary.
    fn binary(&self) -> &Path;
}

/// Builder that runs a shell command (default: `cargo build`) and captures
/// its combined output as diagnostics on failure.
pub struct CommandBuilder {
    command: String,
    binary: PathBuf,
    diagnostics: String,
}

impl CommandBuilder {
    pub fn new(command: impl Into<String>, binary: impl Into<PathBuf>) -> Self {
        Self {
            command: command.into(),
            binary: binary.into(),
            diagnostics: String::new(),
        }
    }
}

impl Builder for CommandBuilder {
    async fn build(&mut self) -> Result<(), BuildError> {
        info!(command = %self.command, "building");

        let output = shell_command(&self.command)
            .output()
            .await
            .map_err(|source| BuildError::Invoke {
                command: self.command.clone(),
                source,
            })?;

        if output.status.success() {
            self.diagnostics.clear();
            return Ok(());
        }

        let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
        text.push_str(&String::from_utf8_lossy(&output.stderr));
        self.diagnostics = text;

        Err(BuildError::Failed)
    }

    fn diagnostics(&self) -> &str {
        &self.diagnostics
    }

    fn binary(&self) -> &Path {
        &self.binary
    }
}

/// Build a shell command appropriate for the platform.
fn shell_command(command: &str) -> Command {
    if cfg!(windows) {
        let mut c = Command::new("cmd");
        c.arg("/C").arg(command);
        c
    } else {
        let mut c = Command::new("sh");
        c.arg("-c").arg(command);
        c
    }
}
