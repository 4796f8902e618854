//! Progress reporting and cancellation support.
//!
//! This module provides [`ProgressCallback`] for monitoring a detection run,
//! [`CancellationToken`] for cooperative cancellation at file granularity,
//! and [`ProgressInfo`] for detailed progress snapshots.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use vdedup::{DetectionOptions, DuplicateDetector, ProgressCallback, ProgressInfo};
//!
//! struct PrintProgress;
//!
//! impl ProgressCallback for PrintProgress {
//!     fn on_progress(&self, info: &ProgressInfo) {
//!         if let Some(pct) = info.percentage {
//!             println!("[{:?}] {pct:.1}% complete", info.operation);
//!         }
//!     }
//! }
//!
//! let options = DetectionOptions::new().with_progress(Arc::new(PrintProgress));
//! let detector = DuplicateDetector::new(options)?;
//! let report = detector.find_duplicates_in("videos", true)?;
//! # Ok::<(), vdedup::DedupError>(())
//! ```

use std::path::PathBuf;
use std::sync::{
    Arc, Mutex,
    atomic::{AtomicBool, Ordering},
};
use std::time::{Duration, Instant};

/// The kind of operation currently in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum OperationType {
    /// Running the probe-only validation gate.
    Validation,
    /// Building per-file signatures.
    Signing,
}

/// A snapshot of run progress.
#[derive(Debug, Clone)]
pub struct ProgressInfo {
    /// What kind of work is being performed.
    pub operation: OperationType,
    /// How many files have been processed so far.
    pub current: u64,
    /// Total files expected, if known ahead of time.
    pub total: Option<u64>,
    /// Completion percentage (0.0 – 100.0), if `total` is known.
    pub percentage: Option<f32>,
    /// Wall-clock time elapsed since the operation started.
    pub elapsed: Duration,
    /// Estimated time remaining, based on current throughput.
    pub estimated_remaining: Option<Duration>,
    /// The file that just finished, if any.
    pub current_path: Option<PathBuf>,
}

/// Trait for receiving progress updates during a detection run.
///
/// Implementations must be [`Send`] and [`Sync`] because callbacks are
/// invoked from signing worker threads.
///
/// Progress callbacks are **infallible**: they observe but cannot halt
/// the run. Use [`CancellationToken`] for cooperative cancellation.
pub trait ProgressCallback: Send + Sync {
    /// Called once per processed file.
    fn on_progress(&self, info: &ProgressInfo);
}

/// A no-op implementation that discards all progress notifications.
pub(crate) struct NoOpProgress;

impl ProgressCallback for NoOpProgress {
    fn on_progress(&self, _info: &ProgressInfo) {}
}

/// Cooperative cancellation token backed by an [`AtomicBool`].
///
/// Clone this token and share it between threads; call
/// [`cancel`](CancellationToken::cancel) from any thread. The detector checks
/// the token before scheduling each file, so the file currently being signed
/// finishes and no new file is started.
///
/// # Example
///
/// ```
/// use vdedup::CancellationToken;
///
/// let token = CancellationToken::new();
/// assert!(!token.is_cancelled());
///
/// token.cancel();
/// assert!(token.is_cancelled());
/// ```
#[derive(Debug, Clone)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Create a new, non-cancelled token.
    pub fn new() -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Request cancellation. All clones of this token observe it.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Check whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

struct TrackerState {
    current: u64,
    start_time: Instant,
}

/// Internal helper that tracks progress timing and emits callbacks.
///
/// Shared by reference between signing workers, hence the interior mutex.
pub(crate) struct ProgressTracker {
    callback: Arc<dyn ProgressCallback>,
    operation: OperationType,
    total: Option<u64>,
    state: Mutex<TrackerState>,
}

impl ProgressTracker {
    pub(crate) fn new(
        callback: Arc<dyn ProgressCallback>,
        operation: OperationType,
        total: Option<u64>,
    ) -> Self {
        Self {
            callback,
            operation,
            total,
            state: Mutex::new(TrackerState {
                current: 0,
                start_time: Instant::now(),
            }),
        }
    }

    /// Record one completed file and fire the callback.
    pub(crate) fn advance(&self, path: Option<PathBuf>) {
        let info = {
            let mut state = match self.state.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            state.current += 1;
            self.snapshot(state.current, state.start_time.elapsed(), path)
        };
        self.callback.on_progress(&info);
    }

    fn snapshot(&self, current: u64, elapsed: Duration, path: Option<PathBuf>) -> ProgressInfo {
        let percentage = self
            .total
            .filter(|&t| t > 0)
            .map(|t| (current as f32 / t as f32) * 100.0);

        let estimated_remaining = if current > 0 {
            self.total.map(|t| {
                let remaining = t.saturating_sub(current);
                let per_item = elapsed / current as u32;
                per_item * remaining as u32
            })
        } else {
            None
        };

        ProgressInfo {
            operation: self.operation,
            current,
            total: self.total,
            percentage,
            elapsed,
            estimated_remaining,
            current_path: path,
        }
    }
}
