//! Matrix builder: fills missing/placeholder entries for a point set.
//!
//! Strictly sequential over `i < j` pairs in input order, one distance call
//! per unmeasured pair. Per-pair failures are absorbed (the placeholder
//! stays, so the next run retries the pair); store failures abort the run.
//! Progress is checkpointed every `save_interval` calculated pairs to bound
//! lost work on interruption, and a fixed delay after every pair bounds the
//! request rate.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{BuildError, StoreError};
use crate::matrix::{DEFAULT_COORDINATE_PRECISION, matrix_key, point_pairs, total_pairs};
use crate::model::Point;
use crate::traits::{DistanceProvider, MatrixStore};

#[derive(Debug, Clone)]
pub struct BuildConfig {
    /// Decimal places for matrix keys.
    pub coordinate_precision: usize,
    /// Persist after this many newly calculated pairs.
    pub save_interval: usize,
    /// Delay after every pair, regardless of outcome.
    pub request_delay: Duration,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            coordinate_precision: DEFAULT_COORDINATE_PRECISION,
            save_interval: 10,
            request_delay: Duration::from_millis(100),
        }
    }
}

/// Cumulative counters, emitted after every pair and returned on exit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BuildProgress {
    pub calculated: usize,
    pub skipped: usize,
    pub failed: usize,
    pub total: usize,
}

/// Single-slot lease enforcing "at most one build per point-set resource".
///
/// Two concurrent builds would each load a stale matrix copy and persist
/// incomplete views, silently discarding the other's progress. Keep one slot
/// per matrix resource and pass it to every [`MatrixBuilder::spawn`] call.
#[derive(Debug, Clone, Default)]
pub struct BuildSlot {
    busy: Arc<AtomicBool>,
}

impl BuildSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims the slot, or `None` if a build already holds it. The permit
    /// releases the slot when dropped, including on panic.
    pub fn try_acquire(&self) -> Option<BuildPermit> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| BuildPermit {
                busy: Arc::clone(&self.busy),
            })
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

#[derive(Debug)]
pub struct BuildPermit {
    busy: Arc<AtomicBool>,
}

impl Drop for BuildPermit {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}

pub struct MatrixBuilder<S, D> {
    store: S,
    provider: D,
    config: BuildConfig,
}

impl<S, D> MatrixBuilder<S, D>
where
    S: MatrixStore,
    D: DistanceProvider,
{
    pub fn new(store: S, provider: D, config: BuildConfig) -> Self {
        Self {
            store,
            provider,
            config,
        }
    }

    /// Runs the build to completion on the current thread, invoking
    /// `on_progress` after every pair.
    ///
    /// Pair order is fixed for a given input order; reordering the same set
    /// changes iteration order but not the resulting matrix.
    pub fn build(
        &self,
        points: &[Point],
        mut on_progress: impl FnMut(BuildProgress),
    ) -> Result<BuildProgress, StoreError> {
        let mut matrix = self.store.load()?;
        let mut progress = BuildProgress {
            total: total_pairs(points.len()),
            ..BuildProgress::default()
        };

        info!(
            points = points.len(),
            pairs = progress.total,
            "building distance matrix"
        );

        for (a, b) in point_pairs(points) {
            let key = matrix_key(a.coords(), b.coords(), self.config.coordinate_precision);

            if matrix.is_calculated(&key) {
                progress.skipped += 1;
            } else {
                match self.provider.pair_cost(a.coords(), b.coords()) {
                    Ok(cost) => {
                        matrix.insert_measured(&key, cost.distance, cost.duration);
                        progress.calculated += 1;

                        if self.config.save_interval > 0
                            && progress.calculated % self.config.save_interval == 0
                        {
                            matrix.touch();
                            self.store.save(&matrix)?;
                            debug!(
                                calculated = progress.calculated,
                                skipped = progress.skipped,
                                failed = progress.failed,
                                total = progress.total,
                                "matrix checkpoint saved"
                            );
                        }
                    }
                    Err(err) => {
                        // Placeholder stays untouched; the pair is retried
                        // on the next run.
                        warn!(from = %a.name, to = %b.name, error = %err, "distance lookup failed");
                        progress.failed += 1;
                    }
                }
            }

            on_progress(progress);

            if !self.config.request_delay.is_zero() {
                thread::sleep(self.config.request_delay);
            }
        }

        matrix.touch();
        self.store.save(&matrix)?;

        info!(
            calculated = progress.calculated,
            skipped = progress.skipped,
            failed = progress.failed,
            total = progress.total,
            "matrix build finished"
        );

        Ok(progress)
    }
}

impl<S, D> MatrixBuilder<S, D>
where
    S: MatrixStore + Send + 'static,
    D: DistanceProvider + Send + 'static,
{
    /// Starts the build on a background thread and returns immediately.
    ///
    /// Fails with [`BuildError::InProgress`] if `slot` is already held.
    /// There is no cancellation; the run continues to completion or failure
    /// and callers poll [`BackgroundBuild::progress`].
    pub fn spawn(self, points: Vec<Point>, slot: &BuildSlot) -> Result<BackgroundBuild, BuildError> {
        let permit = slot.try_acquire().ok_or(BuildError::InProgress)?;

        let progress = Arc::new(Mutex::new(BuildProgress {
            total: total_pairs(points.len()),
            ..BuildProgress::default()
        }));
        let shared = Arc::clone(&progress);

        let handle = thread::spawn(move || {
            let _permit = permit;
            self.build(&points, |update| {
                *shared.lock().unwrap_or_else(PoisonError::into_inner) = update;
            })
        });

        Ok(BackgroundBuild { progress, handle })
    }
}

/// Handle to a build running on a background thread.
pub struct BackgroundBuild {
    progress: Arc<Mutex<BuildProgress>>,
    handle: JoinHandle<Result<BuildProgress, StoreError>>,
}

impl BackgroundBuild {
    /// Latest cumulative counters.
    pub fn progress(&self) -> BuildProgress {
        *self.progress.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Blocks until the run exits and returns its outcome.
    pub fn join(self) -> thread::Result<Result<BuildProgress, StoreError>> {
        self.handle.join()
    }
}
