//! Dry-run report, deletion, and quarantine tests.

use std::fs;
use std::path::{Path, PathBuf};

use vdedup::execution::{ExecutionMode, execute, render_report, unique_destination};
use vdedup::{Decision, DedupError, DetectionReport};

fn touch(path: &Path, content: &[u8]) {
    fs::write(path, content).expect("Failed to write file");
}

fn report_for(directory: &Path) -> DetectionReport {
    let keep = directory.join("keep.mp4");
    let drop_a = directory.join("copy_a.mp4");
    let drop_b = directory.join("copy_b.mp4");
    touch(&keep, b"keep");
    touch(&drop_a, b"copy a");
    touch(&drop_b, b"copy b");

    DetectionReport {
        decisions: vec![
            Decision {
                keep: keep.clone(),
                drop: drop_a,
            },
            Decision {
                keep,
                drop: drop_b,
            },
        ],
        bad_files: vec![directory.join("broken.mp4")],
    }
}

// ── Report rendering ───────────────────────────────────────────────

#[test]
fn render_lists_skips_and_pairs() {
    let report = DetectionReport {
        decisions: vec![Decision {
            keep: PathBuf::from("a.mp4"),
            drop: PathBuf::from("b.mp4"),
        }],
        bad_files: vec![PathBuf::from("bad.mp4")],
    };

    let text = render_report(&report);
    let lines: Vec<&str> = text.lines().collect();
    assert!(lines.contains(&"SKIP: bad.mp4"));

    let keep_line = lines.iter().position(|line| *line == "KEEP: a.mp4").unwrap();
    assert_eq!(lines[keep_line + 1], "DEL : b.mp4");
}

#[test]
fn render_empty_report() {
    let text = render_report(&DetectionReport::default());
    assert!(!text.contains("SKIP:"));
    assert!(!text.contains("KEEP:"));
    assert!(text.contains("No near-duplicate videos found."));
}

// ── Execution ──────────────────────────────────────────────────────

#[test]
fn dry_run_touches_nothing() {
    let temporary_directory = tempfile::tempdir().expect("Failed to create temp dir");
    let report = report_for(temporary_directory.path());

    let summary = execute(&report, &ExecutionMode::DryRun);
    assert!(summary.is_success());
    assert_eq!(summary.processed.len(), 2);
    for decision in &report.decisions {
        assert!(decision.keep.exists());
        assert!(decision.drop.exists());
    }
}

#[test]
fn delete_removes_only_dropped_files() {
    let temporary_directory = tempfile::tempdir().expect("Failed to create temp dir");
    let report = report_for(temporary_directory.path());

    let summary = execute(&report, &ExecutionMode::Delete);
    assert!(summary.is_success());
    assert_eq!(summary.processed.len(), 2);
    for decision in &report.decisions {
        assert!(decision.keep.exists());
        assert!(!decision.drop.exists());
    }
}

#[test]
fn delete_failures_do_not_abort() {
    let temporary_directory = tempfile::tempdir().expect("Failed to create temp dir");
    let report = report_for(temporary_directory.path());
    fs::remove_file(&report.decisions[0].drop).expect("Failed to remove file");

    let summary = execute(&report, &ExecutionMode::Delete);
    assert_eq!(summary.failures.len(), 1);
    assert!(matches!(
        summary.failures[0],
        DedupError::ExecutionFailed { .. }
    ));
    assert_eq!(summary.processed.len(), 1);
    assert!(!report.decisions[1].drop.exists());
}

#[test]
fn move_into_quarantine() {
    let temporary_directory = tempfile::tempdir().expect("Failed to create temp dir");
    let report = report_for(temporary_directory.path());
    let quarantine = temporary_directory.path().join("quarantine");

    let summary = execute(
        &report,
        &ExecutionMode::Move {
            quarantine: quarantine.clone(),
        },
    );
    assert!(summary.is_success());
    assert!(quarantine.join("copy_a.mp4").exists());
    assert!(quarantine.join("copy_b.mp4").exists());
    assert!(!report.decisions[0].drop.exists());
    assert!(report.decisions[0].keep.exists());
    assert_eq!(
        summary.processed[0].1.as_deref(),
        Some(quarantine.join("copy_a.mp4").as_path())
    );
}

#[test]
fn move_disambiguates_collisions() {
    let temporary_directory = tempfile::tempdir().expect("Failed to create temp dir");
    let quarantine = temporary_directory.path().join("quarantine");
    fs::create_dir_all(&quarantine).expect("Failed to create dir");
    touch(&quarantine.join("clip.mp4"), b"already here");

    let first = temporary_directory.path().join("one");
    let second = temporary_directory.path().join("two");
    fs::create_dir_all(&first).expect("Failed to create dir");
    fs::create_dir_all(&second).expect("Failed to create dir");
    touch(&first.join("clip.mp4"), b"first");
    touch(&second.join("clip.mp4"), b"second");

    let report = DetectionReport {
        decisions: vec![
            Decision {
                keep: temporary_directory.path().join("keep.mp4"),
                drop: first.join("clip.mp4"),
            },
            Decision {
                keep: temporary_directory.path().join("keep.mp4"),
                drop: second.join("clip.mp4"),
            },
        ],
        bad_files: Vec::new(),
    };

    let summary = execute(&report, &ExecutionMode::Move { quarantine: quarantine.clone() });
    assert!(summary.is_success());
    assert_eq!(fs::read(quarantine.join("clip.mp4")).unwrap(), b"already here");
    assert_eq!(fs::read(quarantine.join("clip_1.mp4")).unwrap(), b"first");
    assert_eq!(fs::read(quarantine.join("clip_2.mp4")).unwrap(), b"second");
}

#[test]
fn bad_files_are_never_touched() {
    let temporary_directory = tempfile::tempdir().expect("Failed to create temp dir");
    let broken = temporary_directory.path().join("broken.mp4");
    touch(&broken, b"garbage");

    let report = DetectionReport {
        decisions: Vec::new(),
        bad_files: vec![broken.clone()],
    };
    let summary = execute(&report, &ExecutionMode::Delete);
    assert!(summary.processed.is_empty());
    assert!(broken.exists());
}

// ── Destination naming ─────────────────────────────────────────────

#[test]
fn unique_destination_free_name() {
    let temporary_directory = tempfile::tempdir().expect("Failed to create temp dir");
    let destination = unique_destination(temporary_directory.path(), Path::new("movie.mkv"));
    assert_eq!(destination, temporary_directory.path().join("movie.mkv"));
}

#[test]
fn unique_destination_without_extension() {
    let temporary_directory = tempfile::tempdir().expect("Failed to create temp dir");
    touch(&temporary_directory.path().join("movie"), b"");
    touch(&temporary_directory.path().join("movie_1"), b"");

    let destination = unique_destination(temporary_directory.path(), Path::new("movie"));
    assert_eq!(destination, temporary_directory.path().join("movie_2"));
}
