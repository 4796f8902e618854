//! Keep/drop decisions handed to the execution layer.
//!
//! A [`DetectionReport`] is the complete output of a run: one [`Decision`]
//! per file to drop, and the files no signature could be produced for. It is
//! pure data; nothing here touches the filesystem.

use std::path::PathBuf;

use serde::Serialize;

use crate::keeper::Selection;

/// Keep `keep`, drop `drop`. Several decisions may share a keeper.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Decision {
    pub keep: PathBuf,
    pub drop: PathBuf,
}

/// Result of a detection run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[must_use]
pub struct DetectionReport {
    /// Decisions in cluster order, then member order.
    pub decisions: Vec<Decision>,
    /// Files that could not be probed or signed. Never clustered.
    pub bad_files: Vec<PathBuf>,
}

impl DetectionReport {
    /// `true` when there is nothing to drop and nothing unreadable.
    pub fn is_empty(&self) -> bool {
        self.decisions.is_empty() && self.bad_files.is_empty()
    }

    /// Paths to drop, in decision order.
    pub fn dropped(&self) -> impl Iterator<Item = &PathBuf> {
        self.decisions.iter().map(|decision| &decision.drop)
    }
}

/// Flatten selections into decisions and attach the bad files.
pub fn emit_decisions<I>(selections: I, bad_files: Vec<PathBuf>) -> DetectionReport
where
    I: IntoIterator<Item = Selection>,
{
    let decisions = selections
        .into_iter()
        .flat_map(|selection| {
            let keep = selection.keeper;
            selection.dropped.into_iter().map(move |drop| Decision {
                keep: keep.clone(),
                drop,
            })
        })
        .collect();

    DetectionReport {
        decisions,
        bad_files,
    }
}
