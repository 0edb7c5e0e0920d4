//! Shared test fixtures: in-memory stores, scripted providers, and sample
//! Las Vegas points (coordinates from OpenStreetMap).

#![allow(dead_code)] // each test binary uses a subset

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::Receiver;

use serde_json::{Value, json};

use trip_planner::error::{StoreError, UpstreamError};
use trip_planner::matrix::DistanceMatrix;
use trip_planner::model::{OptimizedTrip, PairCost, Point};
use trip_planner::traits::{
    DistanceProvider, MatrixStore, PlannedRoute, RoutePlanner, SolverRequest, SolverSolution,
    TripSolver, TripStore,
};

pub fn point(id: &str, name: &str, lat: f64, lng: f64) -> Point {
    Point {
        id: id.to_string(),
        name: name.to_string(),
        lat,
        lng,
        notes: None,
        sequence: None,
    }
}

pub fn vegas_points() -> Vec<Point> {
    vec![
        point("p1", "Welcome Sign", 36.082157, -115.172661),
        point("p2", "Fremont Street", 36.170727, -115.144566),
        point("p3", "Red Rock Canyon", 36.135512, -115.427505),
        point("p4", "Hoover Dam", 36.016066, -114.737732),
    ]
}

// ---------- stores ----------

/// Matrix store over a mutex, counting saves so tests can assert write
/// (and zero-write) behavior.
#[derive(Debug, Default)]
pub struct MemoryMatrixStore {
    matrix: Mutex<DistanceMatrix>,
    saves: AtomicUsize,
}

impl MemoryMatrixStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_matrix(matrix: DistanceMatrix) -> Self {
        Self {
            matrix: Mutex::new(matrix),
            saves: AtomicUsize::new(0),
        }
    }

    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    pub fn snapshot(&self) -> DistanceMatrix {
        self.matrix.lock().unwrap().clone()
    }
}

impl MatrixStore for MemoryMatrixStore {
    fn load(&self) -> Result<DistanceMatrix, StoreError> {
        Ok(self.matrix.lock().unwrap().clone())
    }

    fn save(&self, matrix: &DistanceMatrix) -> Result<(), StoreError> {
        *self.matrix.lock().unwrap() = matrix.clone();
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MemoryTripStore {
    trip: Mutex<Option<OptimizedTrip>>,
    saves: AtomicUsize,
}

impl MemoryTripStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

impl TripStore for MemoryTripStore {
    fn load(&self) -> Result<Option<OptimizedTrip>, StoreError> {
        Ok(self.trip.lock().unwrap().clone())
    }

    fn save(&self, trip: &OptimizedTrip) -> Result<(), StoreError> {
        *self.trip.lock().unwrap() = Some(trip.clone());
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

// ---------- distance providers ----------

#[derive(Debug, Clone, Copy)]
enum ProviderMode {
    Succeed,
    Fail,
}

/// Scripted distance provider counting calls.
#[derive(Debug)]
pub struct ScriptedDistance {
    mode: ProviderMode,
    calls: AtomicUsize,
}

impl ScriptedDistance {
    pub fn succeeding() -> Self {
        Self {
            mode: ProviderMode::Succeed,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            mode: ProviderMode::Fail,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl DistanceProvider for ScriptedDistance {
    fn pair_cost(&self, from: (f64, f64), to: (f64, f64)) -> Result<PairCost, UpstreamError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.mode {
            ProviderMode::Succeed => {
                // Deterministic but pair-dependent values.
                let spread = (from.0 - to.0).abs() + (from.1 - to.1).abs();
                Ok(PairCost {
                    distance: spread * 100.0,
                    duration: spread * 9000.0,
                })
            }
            ProviderMode::Fail => Err(UpstreamError::Malformed("scripted failure".to_string())),
        }
    }
}

/// Provider that blocks on a channel before answering, so tests can hold a
/// background build in flight deterministically.
pub struct GatedDistance {
    gate: Mutex<Receiver<()>>,
}

impl GatedDistance {
    pub fn new(gate: Receiver<()>) -> Self {
        Self {
            gate: Mutex::new(gate),
        }
    }
}

impl DistanceProvider for GatedDistance {
    fn pair_cost(&self, _from: (f64, f64), _to: (f64, f64)) -> Result<PairCost, UpstreamError> {
        self.gate
            .lock()
            .unwrap()
            .recv()
            .map_err(|_| UpstreamError::Malformed("gate closed".to_string()))?;
        Ok(PairCost {
            distance: 1.0,
            duration: 60.0,
        })
    }
}

// ---------- solver / router ----------

/// Solver returning a fixed visiting order and capturing the request.
pub struct ScriptedSolver {
    visit_order: Vec<u64>,
    captured: Mutex<Option<SolverRequest>>,
}

impl ScriptedSolver {
    pub fn new(visit_order: Vec<u64>) -> Self {
        Self {
            visit_order,
            captured: Mutex::new(None),
        }
    }

    pub fn captured_request(&self) -> Option<SolverRequest> {
        self.captured.lock().unwrap().clone()
    }

    pub fn raw_body(&self) -> Value {
        let mut steps = vec![json!({ "type": "start" })];
        steps.extend(
            self.visit_order
                .iter()
                .map(|job| json!({ "type": "job", "job": job })),
        );
        steps.push(json!({ "type": "end" }));
        json!({ "code": 0, "routes": [{ "steps": steps }] })
    }
}

impl TripSolver for &ScriptedSolver {
    fn solve(&self, request: &SolverRequest) -> Result<SolverSolution, UpstreamError> {
        *self.captured.lock().unwrap() = Some(request.clone());
        Ok(SolverSolution {
            visit_order: self.visit_order.clone(),
            raw: self.raw_body(),
        })
    }
}

pub struct FailingSolver;

impl TripSolver for FailingSolver {
    fn solve(&self, _request: &SolverRequest) -> Result<SolverSolution, UpstreamError> {
        Err(UpstreamError::Malformed("solver down".to_string()))
    }
}

/// Router returning fixed totals and capturing waypoint lists.
pub struct CapturingRouter {
    captured: Mutex<Vec<Vec<(f64, f64)>>>,
}

impl CapturingRouter {
    pub fn new() -> Self {
        Self {
            captured: Mutex::new(Vec::new()),
        }
    }

    pub fn captured_waypoints(&self) -> Vec<Vec<(f64, f64)>> {
        self.captured.lock().unwrap().clone()
    }
}

impl RoutePlanner for &CapturingRouter {
    fn plan_route(&self, waypoints: &[(f64, f64)]) -> Result<PlannedRoute, UpstreamError> {
        self.captured.lock().unwrap().push(waypoints.to_vec());
        Ok(PlannedRoute {
            distance: 42.0,
            duration: 3600.0,
            geometry: Vec::new(),
            raw: json!({ "trip": { "summary": { "length": 42.0, "time": 3600.0 }, "legs": [] } }),
        })
    }
}

pub struct FailingRouter;

impl RoutePlanner for FailingRouter {
    fn plan_route(&self, _waypoints: &[(f64, f64)]) -> Result<PlannedRoute, UpstreamError> {
        Err(UpstreamError::Malformed("router down".to_string()))
    }
}
