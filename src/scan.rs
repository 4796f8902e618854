//! Directory scanning for video files.
//!
//! [`collect_video_files`] walks a directory (recursively or only its top
//! level) and returns every regular file whose extension is in the
//! recognised set, sorted so runs over the same tree see the same order.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::DedupError;

/// Collect video files under `root`.
///
/// Extensions are matched case-insensitively and given without the dot.
/// Unreadable directory entries are skipped.
///
/// # Errors
///
/// Returns [`DedupError::IoError`] if `root` is not a readable directory.
pub fn collect_video_files<S: AsRef<str>>(
    root: &Path,
    recursive: bool,
    extensions: &[S],
) -> Result<Vec<PathBuf>, DedupError> {
    if !std::fs::metadata(root)?.is_dir() {
        return Err(DedupError::IoError(std::io::Error::new(
            std::io::ErrorKind::NotADirectory,
            format!("{} is not a directory", root.display()),
        )));
    }

    let walker = WalkDir::new(root).follow_links(false);
    let walker = if recursive { walker } else { walker.max_depth(1) };

    let mut files: Vec<PathBuf> = walker
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(error) => {
                log::warn!("skipping unreadable entry: {error}");
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| has_video_extension(path, extensions))
        .collect();

    files.sort();
    log::info!("found {} video file(s) under {}", files.len(), root.display());
    Ok(files)
}

/// `true` if `path` ends in one of `extensions` (case-insensitive).
pub fn has_video_extension<S: AsRef<str>>(path: &Path, extensions: &[S]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            extensions
                .iter()
                .any(|known| known.as_ref().eq_ignore_ascii_case(ext))
        })
}
