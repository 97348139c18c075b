// src/proxy.rs

//! The proxy collaborator: fronts the managed child so browser requests
//! always reach a live process.
//!
//! The shipped [`TcpProxy`] works at the connection level: for every inbound
//! connection it first asks the supervisor to ensure a current child is
//! running (this is the start-on-demand path that non-immediate mode relies
//! on), then splices bytes to the backend. Anything smarter than
//! connect-and-splice is out of scope.

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::io::copy_bidirectional;
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, error, info, warn};

use crate::exec::Supervisor;

/// Where the proxy listens and where it forwards to.
#[derive(Debug, Clone)]
pub struct ProxyConfig {
    /// Listen address; empty means all interfaces.
    pub listen_addr: String,

    /// Listen port.
    pub port: u16,

    /// Backend `host:port` the child serves on.
    pub backend: String,
}

impl ProxyConfig {
    pub fn bind_addr(&self) -> String {
        let host = if self.listen_addr.is_empty() {
            "0.0.0.0"
        } else {
            &self.listen_addr
        };
        format!("{host}:{}", self.port)
    }
}

/// Contract the core needs from a proxy: bind and start serving. Returns
/// once the listener is up; serving continues in the background.
#[allow(async_fn_in_trait)]
pub trait Proxy {
    async fn run(&self, config: &ProxyConfig) -> Result<()>;
}

/// Connection-level TCP proxy in front of the supervised child.
pub struct TcpProxy {
    runner: Arc<Supervisor>,
}

impl TcpProxy {
    pub fn new(runner: Arc<Supervisor>) -> Self {
        Self { runner }
    }
}

impl Proxy for TcpProxy {
    async fn run(&self, config: &ProxyConfig) -> Result<()> {
        let bind_addr = config.bind_addr();
        let listener = TcpListener::bind(&bind_addr)
            .await
            .with_context(|| format!("binding proxy listener on {bind_addr}"))?;

        info!(addr = %bind_addr, backend = %config.backend, "proxy listening");

        let runner = Arc::clone(&self.runner);
        let backend = config.backend.clone();

        tokio::spawn(async move {
            loop {
                let (inbound, peer) = match listener.accept().await {
                    Ok(conn) => conn,
                    Err(err) => {
                        warn!(error = %err, "accept failed");
                        continue;
                    }
                };
                debug!(%peer, "inbound connection");

                let runner = Arc::clone(&runner);
                let backend = backend.clone();
                tokio::spawn(async move {
                    forward(inbound, &backend, &runner).await;
                });
            }
        });

        Ok(())
    }
}

/// Ensure a current child is serving, then splice the connection to it.
async fn forward(mut inbound: TcpStream, backend: &str, runner: &Supervisor) {
    if let Err(err) = runner.run().await {
        error!(error = %err, "could not start child for inbound connection");
        return;
    }

    match TcpStream::connect(backend).await {
        Ok(mut outbound) => {
            if let Err(err) = copy_bidirectional(&mut inbound, &mut outbound).await {
                debug!(error = %err, "proxy stream closed with error");
            }
        }
        Err(err) => {
            error!(error = %err, backend = %backend, "failed to connect to backend");
        }
    }
}
