// src/watch/scanner.rs

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use tokio::sync::mpsc;
use tokio::time::sleep;
use tracing::{debug, info};
use walkdir::{DirEntry, WalkDir};

/// Polling change detector for the watched source tree.
///
/// Each pass walks the tree, pruning `.git`, excluded directory names, and
/// dot-prefixed entries, and short-circuits on the first file whose
/// extension is tracked and whose mtime is strictly after the last detected
/// change. On a hit the baseline timestamp is reset to "now" before the path
/// is reported, so edits made during a rebuild are caught on the next pass
/// and edits already seen never re-trigger.
pub struct Scanner {
    root: PathBuf,
    exclude: GlobSet,
    extensions: Vec<String>,
    last_change: SystemTime,
}

impl Scanner {
    /// `since` is the initial baseline; changes at or before it are ignored.
    pub fn new(
        root: impl Into<PathBuf>,
        exclude: &[String],
        extensions: Vec<String>,
        since: SystemTime,
    ) -> Result<Self> {
        let mut builder = GlobSetBuilder::new();
        builder.add(Glob::new(".git")?);
        for name in exclude {
            let glob = Glob::new(name)
                .with_context(|| format!("invalid exclude pattern: {name}"))?;
            builder.add(glob);
        }

        Ok(Self {
            root: root.into(),
            exclude: builder.build()?,
            extensions,
            last_change: since,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// One detection pass. Returns at most one changed path; `None` means
    /// nothing tracked changed since the last hit.
    pub fn scan_once(&mut self) -> Option<PathBuf> {
        let hit = self.find_changed();
        if hit.is_some() {
            self.last_change = SystemTime::now();
        }
        hit
    }

    fn find_changed(&self) -> Option<PathBuf> {
        let walker = WalkDir::new(&self.root)
            .into_iter()
            .filter_entry(|entry| self.should_visit(entry));

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    debug!(error = %err, "skipping unreadable entry");
                    continue;
                }
            };

            if !entry.file_type().is_file() || !self.is_tracked(entry.path()) {
                continue;
            }

            let Ok(meta) = entry.metadata() else { continue };
            let Ok(modified) = meta.modified() else { continue };

            if modified > self.last_change {
                return Some(entry.into_path());
            }
        }

        None
    }

    /// Prune hidden entries and excluded directory subtrees. The walk root
    /// itself is always visited (it may legitimately be `.`).
    fn should_visit(&self, entry: &DirEntry) -> bool {
        if entry.depth() == 0 {
            return true;
        }

        let name = entry.file_name().to_string_lossy();
        if name.starts_with('.') {
            return false;
        }

        if entry.file_type().is_dir() && self.exclude.is_match(name.as_ref()) {
            return false;
        }

        true
    }

    fn is_tracked(&self, path: &Path) -> bool {
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            return false;
        };
        self.extensions.iter().any(|tracked| tracked == ext)
    }
}

/// Spawn the polling loop: one pass, then sleep for `interval`, forever.
///
/// Detected paths are sent into `changes_tx`; the channel has capacity 1 and
/// the send awaits, so the scanner naturally stalls while the build loop is
/// busy instead of piling up triggers.
pub fn spawn_scanner(
    mut scanner: Scanner,
    interval: Duration,
    changes_tx: mpsc::Sender<PathBuf>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        info!(root = %scanner.root().display(), "change scanner started");
        loop {
            if let Some(path) = scanner.scan_once() {
                debug!(path = %path.display(), "source change detected");
                if changes_tx.send(path).await.is_err() {
                    debug!("change receiver dropped; stopping scanner");
                    return;
                }
            }
            sleep(interval).await;
        }
    })
}
