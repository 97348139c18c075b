// src/lib.rs

pub mod build;
pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod proxy;
pub mod shutdown;
pub mod watch;

use std::path::Path;
use std::sync::Arc;
use std::time::SystemTime;

use anyhow::Result;
use tokio::sync::mpsc;
use tracing::info;

use crate::build::{Builder, CommandBuilder};
use crate::cli::CliArgs;
use crate::config::{Settings, load_optional};
use crate::engine::BuildLoop;
use crate::exec::Supervisor;
use crate::proxy::{Proxy, ProxyConfig, TcpProxy};
use crate::watch::{Scanner, spawn_scanner};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - settings (CLI flags over optional `Stoker.toml`)
/// - the process supervisor and the builder
/// - the TCP proxy (start-on-demand path)
/// - the signal-driven shutdown hook
/// - the change scanner and the build loop
///
/// Returns only on a fatal error; otherwise the loop runs until the process
/// is signaled.
pub async fn run(args: CliArgs) -> Result<()> {
    let file = load_optional(Path::new(&args.config))?;
    let settings = Settings::resolve(&args, &file)?;

    info!(
        path = %settings.watch_path.display(),
        binary = %settings.binary.display(),
        "stoker starting"
    );

    let builder = CommandBuilder::new(settings.build_command.clone(), settings.binary.clone());

    // The child discovers its listen port through the environment.
    let env = vec![("PORT".to_string(), settings.app_port.to_string())];
    let runner = Arc::new(Supervisor::new(
        builder.binary().to_path_buf(),
        settings.child_args.clone(),
        env,
        settings.kill_on_error,
    ));

    let proxy = TcpProxy::new(Arc::clone(&runner));
    let proxy_config = ProxyConfig {
        listen_addr: settings.listen_addr.clone(),
        port: settings.port,
        backend: settings.backend_addr(),
    };
    proxy.run(&proxy_config).await?;

    if settings.listen_addr.is_empty() {
        info!(port = settings.port, "listening");
    } else {
        info!(addr = %settings.listen_addr, port = settings.port, "listening");
    }

    shutdown::spawn_shutdown_hook(Arc::clone(&runner));

    // Changes made before startup are considered already built.
    let scanner = Scanner::new(
        &settings.watch_path,
        &settings.exclude,
        settings.extensions.clone(),
        SystemTime::now(),
    )?;
    let (changes_tx, changes_rx) = mpsc::channel(1);
    let _scanner_handle = spawn_scanner(scanner, settings.interval, changes_tx);

    let build_loop = BuildLoop::new(
        builder,
        Arc::clone(&runner),
        settings.interval,
        settings.kill_on_error,
        settings.immediate,
    );
    build_loop.run(changes_rx).await?;

    Ok(())
}
