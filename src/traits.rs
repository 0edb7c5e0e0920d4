//! Core seams for the trip planner.
//!
//! These are intentionally minimal. Concrete HTTP clients live in
//! [`crate::valhalla`] and [`crate::vroom`]; tests substitute in-memory
//! implementations.

use serde_json::Value;

use crate::error::{StoreError, UpstreamError};
use crate::matrix::DistanceMatrix;
use crate::model::{OptimizedTrip, PairCost};
use crate::polyline::Polyline;

/// Measures the travel cost of one unordered coordinate pair.
///
/// Network-fallible; the matrix builder absorbs individual failures.
pub trait DistanceProvider {
    /// Coordinates are `(lat, lng)` pairs.
    fn pair_cost(&self, from: (f64, f64), to: (f64, f64)) -> Result<PairCost, UpstreamError>;
}

/// Single-vehicle TSP request. Job ids map 1:1 to 1-based input point
/// positions so the visiting order can be mapped back unambiguously.
#[derive(Debug, Clone, PartialEq)]
pub struct SolverRequest {
    pub start: (f64, f64),
    pub end: (f64, f64),
    pub jobs: Vec<SolverJob>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SolverJob {
    pub id: u64,
    pub location: (f64, f64),
    /// Service time at the stop, in seconds.
    pub service: u32,
}

/// Solver output: job ids in visiting order, plus the raw response body for
/// passthrough to callers.
#[derive(Debug, Clone)]
pub struct SolverSolution {
    pub visit_order: Vec<u64>,
    pub raw: Value,
}

/// External TSP solver. Solving is iterative, so implementations use a
/// minutes-scale timeout.
pub trait TripSolver {
    fn solve(&self, request: &SolverRequest) -> Result<SolverSolution, UpstreamError>;
}

/// Route resolved by the routing engine for an ordered waypoint list.
#[derive(Debug, Clone)]
pub struct PlannedRoute {
    pub distance: f64,
    pub duration: f64,
    /// Decoded leg geometries, one per consecutive waypoint pair.
    pub geometry: Vec<Polyline>,
    pub raw: Value,
}

/// External routing engine producing totals and turn-by-turn geometry.
pub trait RoutePlanner {
    /// Waypoints are `(lat, lng)` pairs, already in visiting order.
    fn plan_route(&self, waypoints: &[(f64, f64)]) -> Result<PlannedRoute, UpstreamError>;
}

/// Whole-document store for the distance matrix.
///
/// `save` must replace the resource atomically: a crash mid-write never
/// corrupts the last durably-saved version. Writers per resource must be
/// serialized by the caller.
pub trait MatrixStore {
    /// Returns the persisted matrix, or an empty one if none exists yet.
    fn load(&self) -> Result<DistanceMatrix, StoreError>;
    fn save(&self, matrix: &DistanceMatrix) -> Result<(), StoreError>;
}

/// Whole-document store for the optimized-trip snapshot.
pub trait TripStore {
    fn load(&self) -> Result<Option<OptimizedTrip>, StoreError>;
    fn save(&self, trip: &OptimizedTrip) -> Result<(), StoreError>;
}

// Shared handles delegate, so a store or provider can be held by a
// background build and inspected by its caller at the same time.

impl<T: DistanceProvider + ?Sized> DistanceProvider for &T {
    fn pair_cost(&self, from: (f64, f64), to: (f64, f64)) -> Result<PairCost, UpstreamError> {
        (**self).pair_cost(from, to)
    }
}

impl<T: DistanceProvider + ?Sized> DistanceProvider for std::sync::Arc<T> {
    fn pair_cost(&self, from: (f64, f64), to: (f64, f64)) -> Result<PairCost, UpstreamError> {
        (**self).pair_cost(from, to)
    }
}

impl<T: MatrixStore + ?Sized> MatrixStore for &T {
    fn load(&self) -> Result<DistanceMatrix, StoreError> {
        (**self).load()
    }

    fn save(&self, matrix: &DistanceMatrix) -> Result<(), StoreError> {
        (**self).save(matrix)
    }
}

impl<T: MatrixStore + ?Sized> MatrixStore for std::sync::Arc<T> {
    fn load(&self) -> Result<DistanceMatrix, StoreError> {
        (**self).load()
    }

    fn save(&self, matrix: &DistanceMatrix) -> Result<(), StoreError> {
        (**self).save(matrix)
    }
}

impl<T: TripStore + ?Sized> TripStore for &T {
    fn load(&self) -> Result<Option<OptimizedTrip>, StoreError> {
        (**self).load()
    }

    fn save(&self, trip: &OptimizedTrip) -> Result<(), StoreError> {
        (**self).save(trip)
    }
}
