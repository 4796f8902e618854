//! Keeper selection.
//!
//! Within a cluster exactly one file is kept. Candidates are ranked by, in
//! order: resolution area (larger wins), file size on disk (larger wins),
//! and finally the path itself (lexicographically greatest wins). The ranking
//! is a total order, so the keeper does not depend on member order.

use std::cmp::Ordering;
use std::fs;
use std::path::{Path, PathBuf};

use crate::cluster::Cluster;
use crate::metadata::Resolution;
use crate::signature::Signature;

/// One cluster member with the facts the ranking looks at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeeperCandidate {
    pub path: PathBuf,
    pub resolution: Resolution,
    /// Size in bytes; 0 when the file cannot be stat'ed.
    pub file_size: u64,
}

impl KeeperCandidate {
    /// Rank by (area, size, path); greater is better.
    pub fn rank(&self, other: &KeeperCandidate) -> Ordering {
        self.resolution
            .area()
            .cmp(&other.resolution.area())
            .then(self.file_size.cmp(&other.file_size))
            .then_with(|| self.path.as_os_str().cmp(other.path.as_os_str()))
    }
}

/// Outcome of keeper selection for one cluster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub keeper: PathBuf,
    /// The other members, in cluster order.
    pub dropped: Vec<PathBuf>,
}

/// Pick the keeper among `candidates`.
///
/// Returns `None` only for an empty slice.
pub fn select_keeper(candidates: &[KeeperCandidate]) -> Option<Selection> {
    let keeper = candidates.iter().max_by(|a, b| a.rank(b))?;
    let dropped = candidates
        .iter()
        .filter(|candidate| candidate.path != keeper.path)
        .map(|candidate| candidate.path.clone())
        .collect();
    Some(Selection {
        keeper: keeper.path.clone(),
        dropped,
    })
}

/// Build candidates for a cluster, using `signature_of` for resolutions and
/// the filesystem for sizes, then pick the keeper.
pub fn select_for_cluster<'a, F>(cluster: &Cluster, signature_of: F) -> Option<Selection>
where
    F: Fn(&Path) -> Option<&'a Signature>,
{
    let candidates: Vec<KeeperCandidate> = cluster
        .members()
        .iter()
        .map(|path| KeeperCandidate {
            path: path.clone(),
            resolution: signature_of(path)
                .map(Signature::resolution)
                .unwrap_or(Resolution::UNKNOWN),
            file_size: file_size(path),
        })
        .collect();
    select_keeper(&candidates)
}

fn file_size(path: &Path) -> u64 {
    fs::metadata(path).map(|metadata| metadata.len()).unwrap_or(0)
}
