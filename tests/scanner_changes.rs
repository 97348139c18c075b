use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use filetime::FileTime;
use tempfile::TempDir;

use stoker::watch::Scanner;

type TestResult = Result<(), Box<dyn Error>>;

fn past() -> SystemTime {
    SystemTime::now() - Duration::from_secs(60)
}

fn scanner_for(dir: &TempDir) -> Scanner {
    Scanner::new(
        dir.path(),
        &["target".to_string(), "vendor".to_string()],
        vec!["rs".to_string()],
        past(),
    )
    .expect("scanner construction")
}

fn touch(root: &Path, rel: &str) -> PathBuf {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent dirs");
    }
    fs::write(&path, b"fn main() {}\n").expect("write file");
    path
}

#[test]
fn reports_a_modified_tracked_file() -> TestResult {
    let dir = TempDir::new()?;
    let expected = touch(dir.path(), "src/main.rs");

    let mut scanner = scanner_for(&dir);
    let hit = scanner.scan_once().expect("change should be detected");
    assert!(hit.ends_with("main.rs"), "got {hit:?}");
    assert_eq!(hit.canonicalize()?, expected.canonicalize()?);

    Ok(())
}

#[test]
fn one_report_per_pass_even_with_many_changes() -> TestResult {
    let dir = TempDir::new()?;
    for i in 0..10 {
        touch(dir.path(), &format!("src/mod_{i}.rs"));
    }

    let mut scanner = scanner_for(&dir);
    assert!(scanner.scan_once().is_some());

    // The baseline was reset after the hit, so the other nine files from
    // the same burst must not re-trigger.
    assert_eq!(scanner.scan_once(), None);

    Ok(())
}

#[test]
fn excluded_directories_never_trigger() -> TestResult {
    let dir = TempDir::new()?;
    touch(dir.path(), "target/debug/generated.rs");
    touch(dir.path(), "vendor/dep/lib.rs");
    touch(dir.path(), ".git/hooks/hook.rs");

    let mut scanner = scanner_for(&dir);
    assert_eq!(scanner.scan_once(), None);

    Ok(())
}

#[test]
fn hidden_entries_never_trigger() -> TestResult {
    let dir = TempDir::new()?;
    touch(dir.path(), ".cache/snippet.rs");
    touch(dir.path(), ".scratch.rs");

    let mut scanner = scanner_for(&dir);
    assert_eq!(scanner.scan_once(), None);

    Ok(())
}

#[test]
fn untracked_extensions_are_ignored() -> TestResult {
    let dir = TempDir::new()?;
    touch(dir.path(), "notes.txt");
    touch(dir.path(), "assets/logo.svg");
    touch(dir.path(), "README");

    let mut scanner = scanner_for(&dir);
    assert_eq!(scanner.scan_once(), None);

    Ok(())
}

#[test]
fn edits_after_a_hit_trigger_the_next_pass() -> TestResult {
    let dir = TempDir::new()?;
    let file = touch(dir.path(), "src/lib.rs");

    let mut scanner = scanner_for(&dir);
    assert!(scanner.scan_once().is_some());
    assert_eq!(scanner.scan_once(), None);

    // Simulate an edit landing after the previous hit.
    let future = FileTime::from_system_time(SystemTime::now() + Duration::from_secs(60));
    filetime::set_file_mtime(&file, future)?;

    assert!(scanner.scan_once().is_some());

    Ok(())
}

#[test]
fn quiet_tree_reports_nothing() -> TestResult {
    let dir = TempDir::new()?;
    touch(dir.path(), "src/main.rs");

    // Baseline in the future: everything on disk is older than it.
    let mut scanner = Scanner::new(
        dir.path(),
        &[],
        vec!["rs".to_string()],
        SystemTime::now() + Duration::from_secs(60),
    )?;
    assert_eq!(scanner.scan_once(), None);

    Ok(())
}
