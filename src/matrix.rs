//! Distance-matrix cache: key derivation, the matrix document, and status
//! reporting.
//!
//! The persisted document keeps two parallel maps (distances in kilometers,
//! durations in seconds) keyed by a symmetric coordinate key. A stored value
//! below zero is a placeholder: the pair is identified but not yet measured.
//! Absence of a key means the pair was never identified at all. The
//! [`MatrixEntry`] view keeps that sentinel out of call sites.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::StoreError;
use crate::model::Point;
use crate::traits::MatrixStore;

/// Decimal places kept when deriving a key from coordinates.
///
/// Changing this re-keys the whole cache: previously measured entries become
/// orphaned under the old keys and every pair reverts to a placeholder. That
/// is a migration hazard to handle deliberately, not silently. Note the
/// flip side: two points within rounding distance (~0.11 m at 6 places)
/// share a cache entry, which is deliberate deduplication.
pub const DEFAULT_COORDINATE_PRECISION: usize = 6;

/// Sentinel stored for "identified but not yet measured".
pub const PLACEHOLDER: f64 = -1.0;

/// How many unmeasured pairs a status report lists by name.
pub const MISSING_SAMPLE_LIMIT: usize = 10;

/// Derives the symmetric cache key for a pair of `(lat, lng)` coordinates.
///
/// Both points are rounded to `precision` decimals, formatted `"lat,lng"`,
/// ordered lexicographically and joined with `:`. The ordering makes the key
/// independent of argument order, and rounding makes it stable across point
/// re-creation at identical coordinates.
pub fn matrix_key(a: (f64, f64), b: (f64, f64), precision: usize) -> String {
    let key_a = format_coords(a, precision);
    let key_b = format_coords(b, precision);
    if key_a <= key_b {
        format!("{key_a}:{key_b}")
    } else {
        format!("{key_b}:{key_a}")
    }
}

fn format_coords((lat, lng): (f64, f64), precision: usize) -> String {
    format!("{lat:.precision$},{lng:.precision$}")
}

/// State of one pair in the matrix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MatrixEntry {
    /// Key absent: the pair was never identified.
    Unmeasured,
    /// Placeholder row: identified, awaiting measurement. Pairs whose
    /// measurement failed stay in this state so the next build retries them.
    Placeholder,
    Measured { distance: f64, duration: f64 },
}

/// The persisted matrix document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DistanceMatrix {
    pub distances: HashMap<String, f64>,
    pub durations: HashMap<String, f64>,
    #[serde(rename = "lastUpdated")]
    pub last_updated: Option<DateTime<Utc>>,
}

impl DistanceMatrix {
    pub fn entry(&self, key: &str) -> MatrixEntry {
        match self.distances.get(key) {
            None => MatrixEntry::Unmeasured,
            Some(distance) if *distance < 0.0 => MatrixEntry::Placeholder,
            Some(distance) => MatrixEntry::Measured {
                distance: *distance,
                duration: self.durations.get(key).copied().unwrap_or(PLACEHOLDER),
            },
        }
    }

    /// True iff the key is present with a non-negative distance.
    pub fn is_calculated(&self, key: &str) -> bool {
        matches!(self.entry(key), MatrixEntry::Measured { .. })
    }

    pub fn insert_placeholder(&mut self, key: &str) {
        self.distances.insert(key.to_string(), PLACEHOLDER);
        self.durations.insert(key.to_string(), PLACEHOLDER);
    }

    pub fn insert_measured(&mut self, key: &str, distance: f64, duration: f64) {
        self.distances.insert(key.to_string(), distance);
        self.durations.insert(key.to_string(), duration);
    }

    /// Refreshes the last-updated timestamp. Called on every durable save of
    /// measured values, not on placeholder initialization.
    pub fn touch(&mut self) {
        self.last_updated = Some(Utc::now());
    }
}

/// Unordered pairs `(i, j)` with `i < j`, in input order.
pub fn point_pairs(points: &[Point]) -> impl Iterator<Item = (&Point, &Point)> {
    points
        .iter()
        .enumerate()
        .flat_map(|(i, a)| points[i + 1..].iter().map(move |b| (a, b)))
}

/// Number of unordered pairs for `n` points.
pub fn total_pairs(n: usize) -> usize {
    n * (n - 1) / 2
}

/// Counts pairs of `points` whose entry is measured.
pub fn count_calculated(matrix: &DistanceMatrix, points: &[Point], precision: usize) -> usize {
    point_pairs(points)
        .filter(|(a, b)| matrix.is_calculated(&matrix_key(a.coords(), b.coords(), precision)))
        .count()
}

/// Inserts placeholder rows for every pair lacking any entry, leaving
/// placeholder and measured rows untouched. Persists only if at least one
/// row was added, so a repeat call on an unchanged point set performs zero
/// writes. Returns the number of rows added.
pub fn ensure_entries<M: MatrixStore>(
    store: &M,
    points: &[Point],
    precision: usize,
) -> Result<usize, StoreError> {
    let mut matrix = store.load()?;
    let mut added = 0;

    for (a, b) in point_pairs(points) {
        let key = matrix_key(a.coords(), b.coords(), precision);
        if matrix.entry(&key) == MatrixEntry::Unmeasured {
            matrix.insert_placeholder(&key);
            added += 1;
        }
    }

    if added > 0 {
        info!(added, "initialized missing matrix entries");
        store.save(&matrix)?;
    }

    Ok(added)
}

/// Status report for the matrix over one point set.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatrixStatusReport {
    pub total_points: usize,
    pub total_pairs: usize,
    pub calculated_pairs: usize,
    pub missing_pairs: usize,
    pub percent_complete: f64,
    pub last_updated: Option<DateTime<Utc>>,
    /// Bounded sample of unmeasured pairs, by point name.
    pub sample_missing: Vec<MissingPair>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MissingPair {
    pub from: String,
    pub to: String,
}

/// Recomputes the status from a freshly loaded matrix, so it reflects the
/// latest persisted state at call time.
pub fn matrix_status<M: MatrixStore>(
    store: &M,
    points: &[Point],
    precision: usize,
) -> Result<MatrixStatusReport, StoreError> {
    let matrix = store.load()?;
    let total = total_pairs(points.len());
    let calculated = count_calculated(&matrix, points, precision);

    let sample_missing = point_pairs(points)
        .filter(|(a, b)| !matrix.is_calculated(&matrix_key(a.coords(), b.coords(), precision)))
        .take(MISSING_SAMPLE_LIMIT)
        .map(|(a, b)| MissingPair {
            from: a.name.clone(),
            to: b.name.clone(),
        })
        .collect();

    Ok(MatrixStatusReport {
        total_points: points.len(),
        total_pairs: total,
        calculated_pairs: calculated,
        missing_pairs: total - calculated,
        percent_complete: if total > 0 {
            calculated as f64 / total as f64 * 100.0
        } else {
            100.0
        },
        last_updated: matrix.last_updated,
        sample_missing,
    })
}
