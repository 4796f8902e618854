//! Detection run orchestration.
//!
//! [`DuplicateDetector`] drives one run end to end:
//!
//! 1. optional probe-only validation gate;
//! 2. signature construction for every remaining file, in parallel when the
//!    `rayon` feature is enabled;
//! 3. once every file has a signature or has failed, duration bucketing and
//!    clustering;
//! 4. keeper selection per cluster and decision emission.
//!
//! Per-file failures never end the run: they become bad files. Only
//! cancellation does.
//!
//! # Example
//!
//! ```no_run
//! use vdedup::{DetectionOptions, DuplicateDetector};
//!
//! let detector = DuplicateDetector::new(DetectionOptions::default())?;
//! let report = detector.find_duplicates_in("videos", true)?;
//! for decision in &report.decisions {
//!     println!("keep {} / drop {}", decision.keep.display(), decision.drop.display());
//! }
//! # Ok::<(), vdedup::DedupError>(())
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

#[cfg(feature = "rayon")]
use ::rayon::iter::{IntoParallelRefIterator, ParallelIterator};

use crate::builder::SignatureBuilder;
use crate::cluster::find_clusters;
use crate::configuration::DetectionOptions;
use crate::decision::{DetectionReport, emit_decisions};
use crate::error::DedupError;
use crate::keeper::select_for_cluster;
use crate::probe::{FfprobeProbe, MetadataProbe};
use crate::progress::{OperationType, ProgressTracker};
use crate::scan::collect_video_files;
use crate::signature::Signature;
use crate::validation::validate_metadata;

/// Near-duplicate video detector.
pub struct DuplicateDetector {
    options: DetectionOptions,
    builder: SignatureBuilder,
    gate_probe: Box<dyn MetadataProbe>,
}

impl DuplicateDetector {
    /// Create a detector with the standard decode chain.
    ///
    /// # Errors
    ///
    /// Returns [`DedupError::InvalidConfiguration`] if `options` fail
    /// [`DetectionOptions::validate`].
    pub fn new(options: DetectionOptions) -> Result<Self, DedupError> {
        let builder = SignatureBuilder::from_options(&options);
        Self::with_builder(options, builder)
    }

    /// Create a detector around a custom [`SignatureBuilder`].
    ///
    /// # Errors
    ///
    /// Returns [`DedupError::InvalidConfiguration`] for invalid options.
    pub fn with_builder(
        options: DetectionOptions,
        builder: SignatureBuilder,
    ) -> Result<Self, DedupError> {
        options.validate()?;
        let gate_probe = Box::new(FfprobeProbe::new(
            options.ffprobe_program.clone(),
            options.probe_timeout,
        ));
        Ok(Self {
            options,
            builder,
            gate_probe,
        })
    }

    /// Replace the probe used by the validation gate (`ffprobe` by default).
    pub fn with_gate_probe(mut self, probe: Box<dyn MetadataProbe>) -> Self {
        self.gate_probe = probe;
        self
    }

    pub fn options(&self) -> &DetectionOptions {
        &self.options
    }

    /// Scan `root` for recognised video files and run detection on them.
    ///
    /// # Errors
    ///
    /// Returns [`DedupError::IoError`] if `root` is not a readable directory,
    /// or [`DedupError::Cancelled`].
    pub fn find_duplicates_in<P: AsRef<Path>>(
        &self,
        root: P,
        recursive: bool,
    ) -> Result<DetectionReport, DedupError> {
        let paths = collect_video_files(root.as_ref(), recursive, &self.options.video_extensions)?;
        self.find_duplicates(&paths)
    }

    /// Run detection over an explicit list of files.
    ///
    /// Decisions follow cluster formation order; bad files follow input
    /// order. An empty input yields an empty report.
    ///
    /// # Errors
    ///
    /// Returns [`DedupError::Cancelled`] if the run was cancelled.
    pub fn find_duplicates(&self, paths: &[PathBuf]) -> Result<DetectionReport, DedupError> {
        if paths.is_empty() {
            return Ok(DetectionReport::default());
        }

        let admitted = self.gate(paths)?;
        let candidates: Vec<PathBuf> = paths
            .iter()
            .zip(&admitted)
            .filter(|(_, admitted)| **admitted)
            .map(|(path, _)| path.clone())
            .collect();

        let outcomes = self.sign_all(&candidates)?;
        let mut outcome_of: HashMap<&Path, &Result<Signature, DedupError>> = outcomes
            .iter()
            .map(|(path, outcome)| (path.as_path(), outcome))
            .collect();

        let mut signed: Vec<(PathBuf, Signature)> = Vec::with_capacity(outcomes.len());
        let mut bad_files = Vec::new();
        for path in paths {
            match outcome_of.remove(path.as_path()) {
                Some(Ok(signature)) => signed.push((path.clone(), signature.clone())),
                Some(Err(error)) => {
                    log::warn!("{error}");
                    bad_files.push(path.clone());
                }
                // Rejected by the gate, or a repeated path already handled.
                None => {
                    if !signed.iter().any(|(seen, _)| seen == path) && !bad_files.contains(path) {
                        bad_files.push(path.clone());
                    }
                }
            }
        }

        let clusters = find_clusters(
            &signed,
            self.options.duration_tolerance,
            self.options.hash_threshold,
        );

        let signature_index: HashMap<&Path, &Signature> = signed
            .iter()
            .map(|(path, signature)| (path.as_path(), signature))
            .collect();
        let selections = clusters.iter().filter_map(|cluster| {
            select_for_cluster(cluster, |path| signature_index.get(path).copied())
        });

        let report = emit_decisions(selections.collect::<Vec<_>>(), bad_files);
        log::info!(
            "{} file(s): {} signed, {} cluster(s), {} to drop, {} unreadable",
            paths.len(),
            signed.len(),
            clusters.len(),
            report.decisions.len(),
            report.bad_files.len()
        );
        Ok(report)
    }

    /// Build signatures for `paths`, returning each file's outcome in input
    /// order. Per-file failures are values, not errors.
    ///
    /// # Errors
    ///
    /// Returns [`DedupError::Cancelled`] if the run was cancelled before
    /// every file was scheduled.
    pub fn sign_all(
        &self,
        paths: &[PathBuf],
    ) -> Result<Vec<(PathBuf, Result<Signature, DedupError>)>, DedupError> {
        let signatures = self.map_files(paths, OperationType::Signing, |path| {
            self.builder.build(path)
        })?;
        Ok(paths.iter().cloned().zip(signatures).collect())
    }

    /// One flag per path: `true` if the file may be signed.
    fn gate(&self, paths: &[PathBuf]) -> Result<Vec<bool>, DedupError> {
        if !self.options.validate {
            return Ok(vec![true; paths.len()]);
        }

        let tool_missing_reported = AtomicBool::new(false);
        self.map_files(paths, OperationType::Validation, |path| {
            match self.gate_probe.probe(path) {
                Ok(metadata) => {
                    let report = validate_metadata(&metadata);
                    if !report.is_valid() {
                        log::warn!("{} failed validation: {}", path.display(), report.errors.join("; "));
                    }
                    report.is_valid()
                }
                Err(error @ DedupError::ExternalToolMissing { .. }) => {
                    if !tool_missing_reported.swap(true, Ordering::Relaxed) {
                        log::warn!("{error}; validation gate skipped");
                    }
                    true
                }
                Err(error) => {
                    log::warn!("{} failed validation: {error}", path.display());
                    false
                }
            }
        })
    }

    fn map_files<T, F>(
        &self,
        paths: &[PathBuf],
        operation: OperationType,
        work: F,
    ) -> Result<Vec<T>, DedupError>
    where
        T: Send,
        F: Fn(&Path) -> T + Send + Sync,
    {
        let tracker = ProgressTracker::new(
            self.options.progress.clone(),
            operation,
            Some(paths.len() as u64),
        );
        let step = |path: &PathBuf| -> Result<T, DedupError> {
            if self.options.is_cancelled() {
                return Err(DedupError::Cancelled);
            }
            let value = work(path);
            tracker.advance(Some(path.clone()));
            Ok(value)
        };

        #[cfg(feature = "rayon")]
        {
            match self.options.threads {
                Some(threads) => {
                    let pool = ::rayon::ThreadPoolBuilder::new()
                        .num_threads(threads)
                        .build()
                        .map_err(|error| {
                            DedupError::InvalidConfiguration(format!(
                                "cannot start {threads} worker thread(s): {error}"
                            ))
                        })?;
                    pool.install(|| paths.par_iter().map(step).collect())
                }
                None => paths.par_iter().map(step).collect(),
            }
        }

        #[cfg(not(feature = "rayon"))]
        {
            paths.iter().map(step).collect()
        }
    }
}
