//! VROOM HTTP adapter for the TSP solver.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::UpstreamError;
use crate::traits::{SolverRequest, SolverSolution, TripSolver};

#[derive(Debug, Clone)]
pub struct VroomConfig {
    pub base_url: String,
    pub profile: String,
    /// Solving is iterative, so the timeout is minutes-scale.
    pub timeout_secs: u64,
}

impl Default for VroomConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            profile: "auto".to_string(),
            timeout_secs: 600,
        }
    }
}

impl VroomConfig {
    /// Defaults with the base URL taken from `VROOM_URL` when set.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(url) = std::env::var("VROOM_URL") {
            config.base_url = url;
        }
        config
    }
}

#[derive(Debug, Clone)]
pub struct VroomClient {
    config: VroomConfig,
    client: reqwest::blocking::Client,
}

impl VroomClient {
    pub fn new(config: VroomConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { config, client })
    }
}

impl TripSolver for VroomClient {
    fn solve(&self, request: &SolverRequest) -> Result<SolverSolution, UpstreamError> {
        let body = WireRequest {
            vehicles: vec![WireVehicle {
                id: 1,
                // VROOM takes [lng, lat].
                start: [request.start.1, request.start.0],
                end: [request.end.1, request.end.0],
                profile: &self.config.profile,
            }],
            jobs: request
                .jobs
                .iter()
                .map(|job| WireJob {
                    id: job.id,
                    location: [job.location.1, job.location.0],
                    service: job.service,
                })
                .collect(),
            options: WireOptions { g: true },
        };

        let raw = self
            .client
            .post(format!("{}/", self.config.base_url))
            .json(&body)
            .send()?
            .error_for_status()?
            .json::<Value>()?;

        let visit_order = extract_visit_order(&raw)?;
        Ok(SolverSolution { visit_order, raw })
    }
}

/// Pulls the visited job ids, in order, from the first route of a VROOM
/// response.
fn extract_visit_order(raw: &Value) -> Result<Vec<u64>, UpstreamError> {
    let response: WireResponse = serde_json::from_value(raw.clone())
        .map_err(|err| UpstreamError::Malformed(err.to_string()))?;
    let route = response
        .routes
        .into_iter()
        .next()
        .ok_or_else(|| UpstreamError::Malformed("solution has no routes".to_string()))?;

    Ok(route
        .steps
        .into_iter()
        .filter(|step| step.kind == "job")
        .filter_map(|step| step.job)
        .collect())
}

#[derive(Debug, Serialize)]
struct WireRequest<'a> {
    vehicles: Vec<WireVehicle<'a>>,
    jobs: Vec<WireJob>,
    options: WireOptions,
}

#[derive(Debug, Serialize)]
struct WireVehicle<'a> {
    id: u64,
    start: [f64; 2],
    end: [f64; 2],
    profile: &'a str,
}

#[derive(Debug, Serialize)]
struct WireJob {
    id: u64,
    location: [f64; 2],
    service: u32,
}

#[derive(Debug, Serialize)]
struct WireOptions {
    g: bool,
}

#[derive(Debug, Deserialize)]
struct WireResponse {
    #[serde(default)]
    routes: Vec<WireRoute>,
}

#[derive(Debug, Deserialize)]
struct WireRoute {
    #[serde(default)]
    steps: Vec<WireStep>,
}

#[derive(Debug, Deserialize)]
struct WireStep {
    #[serde(rename = "type")]
    kind: String,
    job: Option<u64>,
}
