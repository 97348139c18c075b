use std::collections::VecDeque;
use std::error::Error;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use tokio::sync::mpsc;

use stoker::build::Builder;
use stoker::engine::BuildLoop;
use stoker::errors::{BuildError, FatalError, RunError};
use stoker::exec::Runner;

type TestResult = Result<(), Box<dyn Error>>;

const INTERVAL: Duration = Duration::from_millis(1);

/// Builder with a scripted outcome per build attempt; anything past the
/// script succeeds.
struct ScriptedBuilder {
    outcomes: VecDeque<bool>,
    builds: Arc<AtomicUsize>,
    diagnostics: String,
    binary: PathBuf,
}

impl ScriptedBuilder {
    fn new(outcomes: &[bool]) -> (Self, Arc<AtomicUsize>) {
        let builds = Arc::new(AtomicUsize::new(0));
        (
            Self {
                outcomes: outcomes.iter().copied().collect(),
                builds: Arc::clone(&builds),
                diagnostics: String::new(),
                binary: PathBuf::from("target/debug/app"),
            },
            builds,
        )
    }
}

impl Builder for ScriptedBuilder {
    async fn build(&mut self) -> Result<(), BuildError> {
        self.builds.fetch_add(1, Ordering::SeqCst);
        if self.outcomes.pop_front().unwrap_or(true) {
            self.diagnostics.clear();
            Ok(())
        } else {
            self.diagnostics = "error[E0308]: mismatched types".to_string();
            Err(BuildError::Failed)
        }
    }

    fn diagnostics(&self) -> &str {
        &self.diagnostics
    }

    fn binary(&self) -> &Path {
        &self.binary
    }
}

/// Runner that records calls instead of touching real processes.
#[derive(Default)]
struct RecordingRunner {
    runs: AtomicUsize,
    kills: AtomicUsize,
    fail_runs: bool,
}

impl Runner for RecordingRunner {
    async fn run(&self) -> Result<(), RunError> {
        self.runs.fetch_add(1, Ordering::SeqCst);
        if self.fail_runs {
            return Err(RunError::Spawn {
                bin: PathBuf::from("missing"),
                source: io::Error::new(io::ErrorKind::NotFound, "no such binary"),
            });
        }
        Ok(())
    }

    async fn kill(&self) -> Result<(), RunError> {
        self.kills.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn binary_metadata(&self) -> io::Result<fs::Metadata> {
        fs::metadata(".")
    }
}

#[tokio::test]
async fn failure_is_recorded_and_the_loop_continues() -> TestResult {
    let (builder, _) = ScriptedBuilder::new(&[false]);
    let runner = Arc::new(RecordingRunner::default());
    let mut build_loop = BuildLoop::new(builder, Arc::clone(&runner), INTERVAL, false, true);

    build_loop.trigger().await?;

    let failure = build_loop.last_failure().expect("failure recorded");
    assert!(failure.contains("mismatched types"));
    assert_eq!(runner.runs.load(Ordering::SeqCst), 0, "no run after a failed build");

    Ok(())
}

#[tokio::test]
async fn failed_build_is_fatal_with_kill_on_error() -> TestResult {
    let (builder, _) = ScriptedBuilder::new(&[false]);
    let runner = Arc::new(RecordingRunner::default());
    let mut build_loop = BuildLoop::new(builder, runner, INTERVAL, true, false);

    let err = build_loop.trigger().await.unwrap_err();
    assert!(matches!(err, FatalError::BuildFailed));

    Ok(())
}

#[tokio::test]
async fn success_clears_the_recorded_failure() -> TestResult {
    let (builder, _) = ScriptedBuilder::new(&[false, true]);
    let runner = Arc::new(RecordingRunner::default());
    let mut build_loop = BuildLoop::new(builder, runner, INTERVAL, false, false);

    build_loop.trigger().await?;
    assert!(build_loop.last_failure().is_some());

    build_loop.trigger().await?;
    assert_eq!(build_loop.last_failure(), None);

    Ok(())
}

#[tokio::test]
async fn immediate_mode_starts_the_child_after_a_build() -> TestResult {
    let (builder, _) = ScriptedBuilder::new(&[true]);
    let runner = Arc::new(RecordingRunner::default());
    let mut build_loop = BuildLoop::new(builder, Arc::clone(&runner), INTERVAL, false, true);

    build_loop.trigger().await?;
    assert_eq!(runner.runs.load(Ordering::SeqCst), 1);

    Ok(())
}

#[tokio::test]
async fn without_immediate_mode_the_start_is_left_to_the_proxy() -> TestResult {
    let (builder, _) = ScriptedBuilder::new(&[true]);
    let runner = Arc::new(RecordingRunner::default());
    let mut build_loop = BuildLoop::new(builder, Arc::clone(&runner), INTERVAL, false, false);

    build_loop.trigger().await?;
    assert_eq!(runner.runs.load(Ordering::SeqCst), 0);

    Ok(())
}

#[tokio::test]
async fn run_failure_respects_kill_on_error() -> TestResult {
    let (builder, _) = ScriptedBuilder::new(&[true]);
    let runner = Arc::new(RecordingRunner {
        fail_runs: true,
        ..RecordingRunner::default()
    });
    let mut build_loop = BuildLoop::new(builder, runner, INTERVAL, true, true);

    let err = build_loop.trigger().await.unwrap_err();
    assert!(matches!(err, FatalError::RunFailed));

    Ok(())
}

#[tokio::test]
async fn run_failure_is_survivable_without_kill_on_error() -> TestResult {
    let (builder, _) = ScriptedBuilder::new(&[true]);
    let runner = Arc::new(RecordingRunner {
        fail_runs: true,
        ..RecordingRunner::default()
    });
    let mut build_loop = BuildLoop::new(builder, Arc::clone(&runner), INTERVAL, false, true);

    build_loop.trigger().await?;
    assert_eq!(runner.runs.load(Ordering::SeqCst), 1);

    Ok(())
}

#[tokio::test]
async fn change_events_kill_the_child_before_rebuilding() -> TestResult {
    let (builder, builds) = ScriptedBuilder::new(&[true, true]);
    let runner = Arc::new(RecordingRunner::default());
    let build_loop = BuildLoop::new(builder, Arc::clone(&runner), INTERVAL, false, false);

    let (tx, rx) = mpsc::channel(1);
    tx.send(PathBuf::from("src/main.rs")).await?;
    drop(tx);

    // Initial build plus one change-triggered cycle, then the channel
    // closes and the loop returns.
    build_loop.run(rx).await?;

    assert_eq!(builds.load(Ordering::SeqCst), 2);
    assert_eq!(runner.kills.load(Ordering::SeqCst), 1);

    Ok(())
}
