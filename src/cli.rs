// src/cli.rs

//! CLI argument parsing using `clap`.
//!
//! Every flag is optional here; defaults and the merge with `Stoker.toml`
//! happen in [`crate::config::Settings::resolve`], so "flag not given" and
//! "flag given with the default value" stay distinguishable.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Command-line arguments for `stoker`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "stoker",
    version,
    about = "Watch a source tree, rebuild on change, and keep the service binary running behind a local proxy.",
    long_about = None
)]
pub struct CliArgs {
    /// Listening address for the proxy server.
    #[arg(long, short = 'l', value_name = "ADDR")]
    pub listen: Option<String>,

    /// Port for the proxy server.
    #[arg(long, short = 'p', value_name = "PORT")]
    pub port: Option<u16>,

    /// Port the managed service listens on (exported to the child as PORT).
    #[arg(long, short = 'a', value_name = "PORT")]
    pub app_port: Option<u16>,

    /// Start the service right after each successful build instead of on
    /// the first inbound request.
    #[arg(long, short = 'i')]
    pub immediate: bool,

    /// Directory names to exclude from watching (`.git` is always excluded).
    #[arg(long, short = 'e', value_name = "NAME", value_delimiter = ',')]
    pub exclude: Option<Vec<String>>,

    /// Path to watch files from.
    #[arg(long, value_name = "PATH")]
    pub path: Option<String>,

    /// Interval for polling in ms. Lower values require more CPU time.
    #[arg(long, value_name = "MS")]
    pub interval: Option<u64>,

    /// Exit stoker itself if an error occurs during build or run.
    #[arg(long)]
    pub kill_on_error: bool,

    /// Build command to run on each detected change.
    #[arg(long, value_name = "CMD")]
    pub build_cmd: Option<String>,

    /// Path of the binary produced by the build command.
    #[arg(long, value_name = "PATH")]
    pub bin: Option<PathBuf>,

    /// File extensions that count as tracked source files.
    #[arg(long, value_name = "EXT", value_delimiter = ',')]
    pub ext: Option<Vec<String>>,

    /// Path to the config file (TOML).
    #[arg(long, value_name = "PATH", default_value = "Stoker.toml")]
    pub config: String,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `STOKER_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Extra argument passed through to the managed binary.
    ///
    /// At most one is accepted; backtick characters are stripped.
    #[arg(value_name = "CHILD_ARG")]
    pub child_arg: Vec<String>,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
