// src/config/settings.rs

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;

use crate::cli::CliArgs;
use crate::config::model::ConfigFile;
use crate::config::validate::validate_settings;

/// Immutable runtime configuration, fixed at startup.
///
/// Resolution order for every field: CLI flag, then `Stoker.toml`, then the
/// built-in default.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Root of the watched source tree.
    pub watch_path: PathBuf,

    /// Directory names whose subtrees are never scanned (`.git` is always
    /// excluded on top of these).
    pub exclude: Vec<String>,

    /// Extensions (without the dot) that count as tracked source files.
    pub extensions: Vec<String>,

    /// Poll interval for the change scanner; also the post-cycle sleep of
    /// the build loop.
    pub interval: Duration,

    /// Exit stoker itself on any build or run failure.
    pub kill_on_error: bool,

    /// Start the child right after each successful build.
    pub immediate: bool,

    /// Shell command that compiles the tree.
    pub build_command: String,

    /// Path of the binary the build command produces.
    pub binary: PathBuf,

    /// Arguments passed to the child binary.
    pub child_args: Vec<String>,

    /// Proxy listen address; empty means all interfaces.
    pub listen_addr: String,

    /// Proxy listen port.
    pub port: u16,

    /// Port the child service listens on (exported as `PORT`).
    pub app_port: u16,
}

impl Settings {
    /// Merge CLI flags over file values over defaults, then validate.
    pub fn resolve(args: &CliArgs, file: &ConfigFile) -> Result<Self> {
        let watch_path = PathBuf::from(
            args.path
                .clone()
                .or_else(|| file.watch.path.clone())
                .unwrap_or_else(|| ".".to_string()),
        );

        let exclude = args
            .exclude
            .clone()
            .or_else(|| file.watch.exclude.clone())
            .unwrap_or_else(|| vec!["target".to_string(), "vendor".to_string()]);

        let extensions = args
            .ext
            .clone()
            .or_else(|| file.watch.extensions.clone())
            .unwrap_or_else(|| vec!["rs".to_string()]);

        let interval_ms = args.interval.or(file.watch.interval_ms).unwrap_or(200);

        let build_command = args
            .build_cmd
            .clone()
            .or_else(|| file.build.command.clone())
            .unwrap_or_else(|| "cargo build".to_string());

        let binary = args
            .bin
            .clone()
            .or_else(|| file.build.binary.clone().map(PathBuf::from))
            .unwrap_or_else(|| default_binary(&watch_path));

        // Boolean flags can only be switched on from the CLI, so OR them
        // with the file values.
        let kill_on_error = args.kill_on_error || file.build.kill_on_error.unwrap_or(false);
        let immediate = args.immediate || file.run.immediate.unwrap_or(false);

        let child_args = resolve_child_args(args, file)?;

        let listen_addr = args
            .listen
            .clone()
            .or_else(|| file.proxy.listen.clone())
            .unwrap_or_default();

        let port = args.port.or(file.proxy.port).unwrap_or(3000);
        let app_port = args.app_port.or(file.proxy.app_port).unwrap_or(3001);

        let settings = Settings {
            watch_path,
            exclude,
            extensions,
            interval: Duration::from_millis(interval_ms),
            kill_on_error,
            immediate,
            build_command,
            binary,
            child_args,
            listen_addr,
            port,
            app_port,
        };

        validate_settings(&settings)?;
        Ok(settings)
    }

    /// Address the proxy forwards inbound connections to.
    pub fn backend_addr(&self) -> String {
        format!("127.0.0.1:{}", self.app_port)
    }
}

/// At most one positional argument is accepted; it is forwarded to the
/// child with backtick characters stripped (so shells that refuse to pass
/// raw `--flags` can wrap them).
fn resolve_child_args(args: &CliArgs, file: &ConfigFile) -> Result<Vec<String>> {
    if args.child_arg.len() > 1 {
        anyhow::bail!(
            "expected zero or one child arguments, got {}",
            args.child_arg.len()
        );
    }

    if let Some(arg) = args.child_arg.first() {
        return Ok(vec![arg.replace('`', "")]);
    }

    Ok(file.run.args.clone().unwrap_or_default())
}

/// Guess the binary path for a cargo project: `target/debug/<dir-name>`.
fn default_binary(watch_path: &Path) -> PathBuf {
    let name = watch_path
        .canonicalize()
        .ok()
        .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
        .unwrap_or_else(|| "app".to_string());

    watch_path.join("target").join("debug").join(name)
}
