//! Decoding and error handling integration tests.
//!
//! Fixture-based tests require files from
//! `tests/fixtures/generate_fixtures.sh` and are skipped when they are absent.

use std::path::{Path, PathBuf};

use vdedup::{
    DedupError, DetectionOptions, DuplicateDetector, Fidelity, FrameSource, InProcessSource,
    MediaFile, SignatureBuilder,
};

fn sample_video_path() -> &'static str {
    "tests/fixtures/sample_video.mp4"
}

fn sample_video_reencoded_path() -> &'static str {
    "tests/fixtures/sample_video_small.mkv"
}

fn sample_audio_only_path() -> &'static str {
    "tests/fixtures/sample_audio_only.mp4"
}

#[test]
fn open_nonexistent_file() {
    let result = MediaFile::open("this_file_does_not_exist.mp4");
    assert!(result.is_err());

    let error_message = result.unwrap_err().to_string();
    assert!(
        error_message.contains("Failed to open media file"),
        "Error message should mention file open failure: {error_message}",
    );
}

#[test]
fn open_invalid_file() {
    // Create a temporary file with garbage content.
    let temporary_directory = tempfile::tempdir().expect("Failed to create temp dir");
    let invalid_file_path = temporary_directory.path().join("invalid.mp4");
    std::fs::write(&invalid_file_path, b"this is not a media file")
        .expect("Failed to write invalid file");

    let result = MediaFile::open(&invalid_file_path);
    assert!(result.is_err(), "Expected error for invalid media file");
}

#[test]
fn in_process_tier_rejects_garbage() {
    let temporary_directory = tempfile::tempdir().expect("Failed to create temp dir");
    let invalid_file_path = temporary_directory.path().join("invalid.mp4");
    std::fs::write(&invalid_file_path, b"this is not a media file")
        .expect("Failed to write invalid file");

    assert!(InProcessSource.open(&invalid_file_path).is_err());
}

#[test]
fn garbage_file_becomes_bad_file() {
    let temporary_directory = tempfile::tempdir().expect("Failed to create temp dir");
    let invalid_file_path = temporary_directory.path().join("invalid.mp4");
    std::fs::write(&invalid_file_path, b"this is not a media file")
        .expect("Failed to write invalid file");

    // Point the external tier at programs that do not exist so the result
    // does not depend on the host's FFmpeg installation.
    let options = DetectionOptions::new()
        .with_ffmpeg_program("vdedup-missing-ffmpeg")
        .with_ffprobe_program("vdedup-missing-ffprobe");
    let detector = DuplicateDetector::new(options).expect("Failed to create detector");

    let report = detector
        .find_duplicates(&[invalid_file_path.clone()])
        .expect("Detection should not fail as a whole");
    assert!(report.decisions.is_empty());
    assert_eq!(report.bad_files, vec![invalid_file_path]);
}

#[test]
fn audio_only_file_has_no_video_stream() {
    let path = sample_audio_only_path();
    if !Path::new(path).exists() {
        return;
    }

    let result = MediaFile::open(path);
    assert!(matches!(result, Err(DedupError::NoVideoStream(_))));
}

#[test]
fn frame_at_start_and_middle() {
    let path = sample_video_path();
    if !Path::new(path).exists() {
        return;
    }

    let mut media = MediaFile::open(path).expect("Failed to open test video");
    let metadata = media.metadata().clone();
    let duration = metadata.duration_seconds().expect("Fixture should have a duration");

    let first = media.frame_at(0.0).expect("Failed to decode first frame");
    assert_eq!(first.width(), metadata.resolution.width);
    assert_eq!(first.height(), metadata.resolution.height);

    let middle = media
        .frame_at(duration / 2.0)
        .expect("Failed to decode middle frame");
    assert_eq!(middle.dimensions(), first.dimensions());
}

#[test]
fn frame_beyond_end_falls_back_to_last_frame() {
    let path = sample_video_path();
    if !Path::new(path).exists() {
        return;
    }

    let mut media = MediaFile::open(path).expect("Failed to open test video");
    // 1 hour is way beyond a 5-second video.
    let result = media.frame_at(3600.0);
    if let Err(error) = result {
        assert!(
            matches!(error, DedupError::DecodeFailure { .. }),
            "Unexpected error kind: {error}",
        );
    }
}

#[test]
fn fixture_gets_sampled_signature() {
    let path = sample_video_path();
    if !Path::new(path).exists() {
        return;
    }

    let builder = SignatureBuilder::from_options(&DetectionOptions::new().with_sample_count(4));
    let signature = builder.build(Path::new(path)).expect("Failed to sign fixture");
    assert_eq!(signature.fidelity(), Fidelity::Sampled);
    assert_eq!(signature.hashes().len(), 4);
    assert!(signature.duration() > 0.0);
}

#[test]
fn reencoded_fixture_is_detected_as_duplicate() {
    let original = sample_video_path();
    let reencoded = sample_video_reencoded_path();
    if !Path::new(original).exists() || !Path::new(reencoded).exists() {
        return;
    }

    let detector = DuplicateDetector::new(DetectionOptions::new()).expect("Failed to create detector");
    let report = detector
        .find_duplicates(&[PathBuf::from(original), PathBuf::from(reencoded)])
        .expect("Detection failed");

    assert_eq!(report.decisions.len(), 1);
    // The original is larger in both dimensions.
    assert_eq!(report.decisions[0].keep, Path::new(original));
    assert_eq!(report.decisions[0].drop, Path::new(reencoded));
}
