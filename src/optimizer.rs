//! Trip optimization pipeline: VALIDATE → SOLVE → ROUTE → PERSIST.
//!
//! Each stage returns a result and the pipeline fails fast: a half-computed
//! trip is strictly worse than none, so the previous snapshot is only
//! replaced after routing fully succeeds. Retry policy belongs to the
//! caller.

use chrono::Utc;
use serde_json::Value;
use tracing::info;

use crate::error::{OptimizeError, StoreError, UpstreamError};
use crate::matrix::{DEFAULT_COORDINATE_PRECISION, count_calculated, total_pairs};
use crate::model::{Location, OptimizedStop, OptimizedTrip, Point};
use crate::traits::{MatrixStore, RoutePlanner, SolverJob, SolverRequest, TripSolver, TripStore};

/// Fixed service time assumed at each stop, in seconds.
pub const DEFAULT_SERVICE_SECS: u32 = 300;

/// Completeness of the matrix over one point set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatrixCompleteness {
    pub complete: bool,
    pub calculated: usize,
    pub total: usize,
}

impl MatrixCompleteness {
    /// Human-readable completion percentage for precondition errors.
    pub fn percent(&self) -> f64 {
        if self.total > 0 {
            self.calculated as f64 / self.total as f64 * 100.0
        } else {
            100.0
        }
    }
}

/// Checks that every pair of `points` has been measured, against a freshly
/// loaded matrix.
pub fn validate_matrix_complete<M: MatrixStore>(
    store: &M,
    points: &[Point],
    precision: usize,
) -> Result<MatrixCompleteness, StoreError> {
    let matrix = store.load()?;
    let total = total_pairs(points.len());
    let calculated = count_calculated(&matrix, points, precision);

    Ok(MatrixCompleteness {
        complete: calculated >= total,
        calculated,
        total,
    })
}

#[derive(Debug, Clone, PartialEq)]
pub struct OptimizeRequest {
    pub origin: Location,
    pub destination: Option<Location>,
    pub points: Vec<Point>,
    pub round_trip: bool,
}

impl OptimizeRequest {
    /// Where the trip ends: back at the origin for round trips, else the
    /// explicit destination if supplied, else the origin.
    fn closing_point(&self) -> (f64, f64) {
        if self.round_trip {
            self.origin.coords()
        } else {
            self.destination
                .as_ref()
                .map_or(self.origin.coords(), Location::coords)
        }
    }
}

/// Successful pipeline output. Raw solver/routing bodies are passed through
/// for callers that surface upstream detail verbatim.
#[derive(Debug, Clone)]
pub struct OptimizeOutcome {
    pub solver: Value,
    pub route: Value,
    pub optimized_order: Vec<OptimizedStop>,
    pub trip: OptimizedTrip,
}

pub struct TripOptimizer<M, T, S, R> {
    matrix_store: M,
    trip_store: T,
    solver: S,
    router: R,
    coordinate_precision: usize,
    service_secs: u32,
}

impl<M, T, S, R> TripOptimizer<M, T, S, R>
where
    M: MatrixStore,
    T: TripStore,
    S: TripSolver,
    R: RoutePlanner,
{
    pub fn new(matrix_store: M, trip_store: T, solver: S, router: R) -> Self {
        Self {
            matrix_store,
            trip_store,
            solver,
            router,
            coordinate_precision: DEFAULT_COORDINATE_PRECISION,
            service_secs: DEFAULT_SERVICE_SECS,
        }
    }

    /// Must match the precision the matrix was built with.
    pub fn with_coordinate_precision(mut self, precision: usize) -> Self {
        self.coordinate_precision = precision;
        self
    }

    pub fn optimize(&self, request: &OptimizeRequest) -> Result<OptimizeOutcome, OptimizeError> {
        // VALIDATE
        let completeness = validate_matrix_complete(
            &self.matrix_store,
            &request.points,
            self.coordinate_precision,
        )?;
        if !completeness.complete {
            return Err(OptimizeError::MatrixIncomplete {
                calculated: completeness.calculated,
                total: completeness.total,
            });
        }

        info!(points = request.points.len(), "optimizing trip");

        // SOLVE
        let solution = self
            .solver
            .solve(&self.solver_request(request))
            .map_err(OptimizeError::Solver)?;
        let stops = stops_in_visit_order(&request.points, &solution.visit_order)
            .map_err(OptimizeError::Solver)?;

        // ROUTE
        let mut waypoints = Vec::with_capacity(stops.len() + 2);
        waypoints.push(request.origin.coords());
        waypoints.extend(stops.iter().map(|stop| (stop.lat, stop.lng)));
        waypoints.push(request.closing_point());

        let route = self
            .router
            .plan_route(&waypoints)
            .map_err(OptimizeError::Routing)?;

        // PERSIST: wholesale replace, only after routing succeeded.
        let trip = OptimizedTrip {
            origin: request.origin.clone(),
            destination: if request.round_trip {
                None
            } else {
                request.destination.clone()
            },
            round_trip: request.round_trip,
            optimized_order: stops.clone(),
            last_optimized: Utc::now(),
        };
        self.trip_store.save(&trip)?;

        info!(
            stops = trip.optimized_order.len(),
            distance = route.distance,
            duration = route.duration,
            "trip optimization complete"
        );

        Ok(OptimizeOutcome {
            solver: solution.raw,
            route: route.raw,
            optimized_order: stops,
            trip,
        })
    }

    fn solver_request(&self, request: &OptimizeRequest) -> SolverRequest {
        SolverRequest {
            start: request.origin.coords(),
            end: request.closing_point(),
            jobs: request
                .points
                .iter()
                .enumerate()
                .map(|(index, point)| SolverJob {
                    id: index as u64 + 1,
                    location: point.coords(),
                    service: self.service_secs,
                })
                .collect(),
        }
    }
}

/// Maps the solver's visiting order (1-based job ids) back to stops with
/// 1-based sequences. An id outside the input range is a data error.
fn stops_in_visit_order(
    points: &[Point],
    visit_order: &[u64],
) -> Result<Vec<OptimizedStop>, UpstreamError> {
    visit_order
        .iter()
        .enumerate()
        .map(|(index, job_id)| {
            let point = job_id
                .checked_sub(1)
                .and_then(|i| points.get(i as usize))
                .ok_or_else(|| {
                    UpstreamError::Malformed(format!(
                        "solver returned job id {job_id} for {} jobs",
                        points.len()
                    ))
                })?;
            Ok(OptimizedStop {
                lat: point.lat,
                lng: point.lng,
                sequence: index as u32 + 1,
                name: point.name.clone(),
            })
        })
        .collect()
}
