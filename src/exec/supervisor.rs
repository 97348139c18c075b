// src/exec/supervisor.rs

use std::fs;
use std::io;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, SystemTime};

use tokio::process::{Child, Command};
use tokio::sync::{Mutex, mpsc, watch};
use tokio::time::{sleep, timeout};
use tracing::{debug, error, info, warn};

use crate::errors::RunError;
use crate::exec::Runner;

/// Window a child gets to exit after the soft termination signal before a
/// forceful kill is issued.
pub const GRACE_TIMEOUT: Duration = Duration::from_secs(3);

/// Give a freshly spawned server a moment to bind its port.
const BOOT_DELAY: Duration = Duration::from_millis(250);

/// Delay before a kill-on-error escalation exits, so pending log output of
/// the crashed child can flush.
const LOG_FLUSH_DELAY: Duration = Duration::from_secs(5);

/// Where the child's stdout/stderr go.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputSink {
    /// Pass through to stoker's own stdout/stderr.
    #[default]
    Inherit,
    /// Silence the child entirely.
    Discard,
}

/// The single child process currently tracked by the supervisor.
///
/// The `Child` itself is owned by the waiter task; this handle only carries
/// what `run`/`kill` need: identity, start time, the explicit-kill flag
/// shared with the waiter, and the channels to request a kill and observe
/// the confirmed exit.
struct ManagedChild {
    pid: Option<u32>,
    started_at: SystemTime,
    killed: Arc<AtomicBool>,
    kill_tx: mpsc::Sender<()>,
    exit_rx: watch::Receiver<bool>,
}

impl ManagedChild {
    fn exited(&self) -> bool {
        *self.exit_rx.borrow()
    }
}

/// Owns at most one child process at a time.
///
/// `run` and `kill` serialize on the internal mutex, so the old child is
/// always confirmed dead before a new one is spawned, and concurrent callers
/// (the build loop, the proxy's start-on-demand path, the shutdown hook)
/// never race each other.
pub struct Supervisor {
    bin: PathBuf,
    args: Vec<String>,
    env: Vec<(String, String)>,
    kill_on_error: bool,
    sink: OutputSink,
    grace: Duration,
    current: Mutex<Option<ManagedChild>>,
}

impl Supervisor {
    pub fn new(
        bin: impl Into<PathBuf>,
        args: Vec<String>,
        env: Vec<(String, String)>,
        kill_on_error: bool,
    ) -> Self {
        Self {
            bin: bin.into(),
            args,
            env,
            kill_on_error,
            sink: OutputSink::default(),
            grace: GRACE_TIMEOUT,
            current: Mutex::new(None),
        }
    }

    /// Redirect the child's output; defaults to [`OutputSink::Inherit`].
    pub fn output(mut self, sink: OutputSink) -> Self {
        self.sink = sink;
        self
    }

    /// Ensure a fresh, live child is running the configured binary.
    ///
    /// If the on-disk binary is newer than the running child, the child is
    /// killed and cleared first. If a live child is already tracked, this is
    /// a no-op.
    pub async fn run(&self) -> Result<(), RunError> {
        let mut current = self.current.lock().await;

        if self.binary_changed(current.as_ref()) {
            debug!("binary is newer than the running child; restarting");
            if let Err(err) = self.kill_locked(&mut current).await {
                warn!(error = %err, "error killing stale child");
            }
        }

        if let Some(child) = current.as_ref()
            && !child.exited()
        {
            debug!(pid = child.pid, "child still running; not restarting");
            return Ok(());
        }

        *current = Some(self.spawn_child()?);
        drop(current);

        sleep(BOOT_DELAY).await;
        Ok(())
    }

    /// Gracefully stop the tracked child, if any.
    ///
    /// Idempotent: with no child tracked this succeeds trivially. Otherwise
    /// the child is flagged as explicitly killed (so the waiter does not
    /// escalate under kill-on-error), asked to terminate softly, and
    /// force-killed if it outlives the grace timeout. Returns only once the
    /// child is confirmed dead (or the bounded confirmation window lapses).
    pub async fn kill(&self) -> Result<(), RunError> {
        let mut current = self.current.lock().await;
        self.kill_locked(&mut current).await
    }

    /// Filesystem metadata of the configured binary path.
    pub fn binary_metadata(&self) -> io::Result<fs::Metadata> {
        fs::metadata(&self.bin)
    }

    /// Pid of the tracked child, if one is running. Mainly for tests and
    /// diagnostics.
    pub async fn current_pid(&self) -> Option<u32> {
        let current = self.current.lock().await;
        current.as_ref().filter(|c| !c.exited()).and_then(|c| c.pid)
    }

    fn binary_changed(&self, current: Option<&ManagedChild>) -> bool {
        let Some(child) = current else {
            return false;
        };
        match self.binary_metadata().and_then(|m| m.modified()) {
            Ok(modified) => modified > child.started_at,
            Err(_) => false,
        }
    }

    async fn kill_locked(&self, current: &mut Option<ManagedChild>) -> Result<(), RunError> {
        let Some(child) = current.take() else {
            return Ok(());
        };

        child.killed.store(true, Ordering::SeqCst);
        // The waiter may already be gone if the child exited on its own.
        let _ = child.kill_tx.try_send(());

        // The waiter guarantees bounded completion (grace timeout, then a
        // hard kill); the extra margin here only covers its own scheduling.
        let mut exit_rx = child.exit_rx.clone();
        let bound = self.grace + Duration::from_secs(2);
        match timeout(bound, exit_rx.wait_for(|done| *done)).await {
            Ok(Ok(_)) => debug!(pid = child.pid, "child confirmed dead"),
            Ok(Err(_)) => debug!(pid = child.pid, "waiter gone; treating child as dead"),
            Err(_) => warn!(pid = child.pid, "timed out waiting for kill confirmation"),
        }

        Ok(())
    }

    fn spawn_child(&self) -> Result<ManagedChild, RunError> {
        let mut cmd = Command::new(&self.bin);
        cmd.args(&self.args).stdin(Stdio::null());
        if self.sink == OutputSink::Discard {
            cmd.stdout(Stdio::null()).stderr(Stdio::null());
        }
        for (key, value) in &self.env {
            cmd.env(key, value);
        }

        let child = cmd.spawn().map_err(|source| RunError::Spawn {
            bin: self.bin.clone(),
            source,
        })?;

        let pid = child.id();
        info!(bin = %self.bin.display(), pid, "child process started");

        let killed = Arc::new(AtomicBool::new(false));
        let (kill_tx, kill_rx) = mpsc::channel(1);
        let (exit_tx, exit_rx) = watch::channel(false);
        self.spawn_waiter(child, pid, Arc::clone(&killed), kill_rx, exit_tx);

        Ok(ManagedChild {
            pid,
            started_at: SystemTime::now(),
            killed,
            kill_tx,
            exit_rx,
        })
    }

    /// One waiter per spawned child. It owns the `Child` handle outright:
    /// kill requests arrive as messages, so only one task ever touches the
    /// process, and the exit is confirmed back over the watch channel.
    fn spawn_waiter(
        &self,
        mut child: Child,
        pid: Option<u32>,
        killed: Arc<AtomicBool>,
        mut kill_rx: mpsc::Receiver<()>,
        exit_tx: watch::Sender<bool>,
    ) {
        let kill_on_error = self.kill_on_error;
        let grace = self.grace;

        tokio::spawn(async move {
            tokio::select! {
                status = child.wait() => {
                    match &status {
                        Ok(s) if s.success() => info!(pid, "child exited cleanly"),
                        Ok(s) => warn!(pid, status = %s, "child exited with failure"),
                        Err(err) => error!(pid, error = %err, "error waiting for child"),
                    }
                    let _ = exit_tx.send(true);

                    if !killed.load(Ordering::SeqCst) && kill_on_error {
                        error!("child exited without an explicit kill and kill-on-error is set; shutting down");
                        sleep(LOG_FLUSH_DELAY).await;
                        std::process::exit(1);
                    }
                }
                _ = kill_rx.recv() => {
                    soft_kill(pid, &mut child);
                    if timeout(grace, child.wait()).await.is_err() {
                        warn!(pid, "grace timeout elapsed; force-killing child");
                        if let Err(err) = child.start_kill() {
                            warn!(pid, error = %err, "force kill failed");
                        }
                        let _ = child.wait().await;
                    }
                    let _ = exit_tx.send(true);
                }
            }
        });
    }
}

impl Runner for Supervisor {
    async fn run(&self) -> Result<(), RunError> {
        Supervisor::run(self).await
    }

    async fn kill(&self) -> Result<(), RunError> {
        Supervisor::kill(self).await
    }

    fn binary_metadata(&self) -> io::Result<fs::Metadata> {
        Supervisor::binary_metadata(self)
    }
}

/// Soft termination: SIGINT where the platform supports it, so the child can
/// shut down cleanly; a direct hard kill elsewhere.
#[cfg(unix)]
fn soft_kill(pid: Option<u32>, child: &mut Child) {
    use nix::sys::signal::{Signal, kill};
    use nix::unistd::Pid;

    let Some(pid) = pid else {
        // No pid means the handle is already spent; nothing soft to do.
        let _ = child.start_kill();
        return;
    };

    debug!(pid, "sending SIGINT to child");
    if let Err(err) = kill(Pid::from_raw(pid as i32), Signal::SIGINT) {
        warn!(pid, error = %err, "SIGINT failed; falling back to hard kill");
        let _ = child.start_kill();
    }
}

#[cfg(not(unix))]
fn soft_kill(_pid: Option<u32>, child: &mut Child) {
    let _ = child.start_kill();
}
